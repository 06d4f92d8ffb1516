//! A sealed-bid, lowest-price reverse auction for units of work with an
//! integrated escrow ledger.
//!
//! # Description
//! Requesters deposit CCD into the contract and open a work request with a
//! maximum price, which gets locked in escrow. Workers bid at or below that
//! price while the auction window is open. Once the window has passed anyone
//! may finalize the auction: the cheapest bid wins, the earliest one among
//! equal prices, and an auction without bids refunds the requester. The
//! administrator then commits the completed work, which pays the worker and
//! releases the unspent part of the locked price back to the requester.
//!
//! Balances live in the contract and leave it only through `withdraw`.
#![cfg_attr(not(feature = "std"), no_std)]

mod auction;
mod contract;
mod events;
mod external;
mod ledger;
mod state;

use commons::{
    AUCTION_FAILED_TAG, BID_WON_TAG, DEPOSIT_TAG, NEW_BID_TAG, NEW_REQUEST_TAG,
    REQUEST_COMPLETED_TAG, SETTINGS_UPDATED_TAG, WITHDRAW_TAG,
};
use concordium_std::*;

use crate::auction::{AuctionId, Payout};
use crate::external::AuctionSettings;

/// New work request event data.
#[derive(Debug, Serial)]
pub struct NewRequestEvent<'a> {
    pub id: AuctionId,
    pub requester: &'a AccountAddress,
    pub max_price: Amount,
    /// Deadline under the auction duration at creation time. Settings updates
    /// move the effective deadline of running auctions.
    pub deadline: Timestamp,
}

/// Bid event data.
#[derive(Debug, Serial)]
pub struct NewBidEvent<'a> {
    pub id: AuctionId,
    pub bidder: &'a AccountAddress,
    pub price: Amount,
}

/// Auction finalization with a winner.
#[derive(Debug, Serial)]
pub struct BidWonEvent<'a> {
    pub id: AuctionId,
    pub winner: &'a AccountAddress,
    pub price: Amount,
}

/// Committed work event data.
#[derive(Debug, Serial)]
pub struct RequestCompletedEvent<'a> {
    pub id: AuctionId,
    pub requester: &'a AccountAddress,
    pub worker: &'a AccountAddress,
    /// Paid to the worker.
    pub price: Amount,
    /// Returned to the requester.
    pub refund: Amount,
}

/// Auction finalization without bids.
#[derive(Debug, Serial)]
pub struct AuctionFailedEvent<'a> {
    pub id: AuctionId,
    pub requester: &'a AccountAddress,
    /// Unlocked back to the requester.
    pub max_price: Amount,
}

/// Deposit or withdrawal event data.
#[derive(Debug, Serial)]
pub struct BalanceEvent<'a> {
    pub principal: &'a AccountAddress,
    pub amount: Amount,
}

/// Tagged Custom event to be serialized for the event log.
#[derive(Debug)]
pub enum WorkAuctionEvent<'a> {
    NewRequest(NewRequestEvent<'a>),
    NewBid(NewBidEvent<'a>),
    BidWon(BidWonEvent<'a>),
    RequestCompleted(RequestCompletedEvent<'a>),
    AuctionFailed(AuctionFailedEvent<'a>),
    Deposit(BalanceEvent<'a>),
    Withdraw(BalanceEvent<'a>),
    SettingsUpdated(&'a AuctionSettings),
}

impl<'a> WorkAuctionEvent<'a> {
    pub fn new_request(
        id: AuctionId,
        requester: &'a AccountAddress,
        max_price: Amount,
        deadline: Timestamp,
    ) -> Self {
        Self::NewRequest(NewRequestEvent {
            id,
            requester,
            max_price,
            deadline,
        })
    }

    pub fn new_bid(id: AuctionId, bidder: &'a AccountAddress, price: Amount) -> Self {
        Self::NewBid(NewBidEvent { id, bidder, price })
    }

    pub fn bid_won(id: AuctionId, winner: &'a AccountAddress, price: Amount) -> Self {
        Self::BidWon(BidWonEvent { id, winner, price })
    }

    pub fn request_completed(id: AuctionId, payout: &'a Payout) -> Self {
        Self::RequestCompleted(RequestCompletedEvent {
            id,
            requester: &payout.requester,
            worker: &payout.worker,
            price: payout.price,
            refund: payout.refund,
        })
    }

    pub fn auction_failed(
        id: AuctionId,
        requester: &'a AccountAddress,
        max_price: Amount,
    ) -> Self {
        Self::AuctionFailed(AuctionFailedEvent {
            id,
            requester,
            max_price,
        })
    }

    pub fn deposit(principal: &'a AccountAddress, amount: Amount) -> Self {
        Self::Deposit(BalanceEvent { principal, amount })
    }

    pub fn withdraw(principal: &'a AccountAddress, amount: Amount) -> Self {
        Self::Withdraw(BalanceEvent { principal, amount })
    }
}

impl<'a> Serial for WorkAuctionEvent<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            WorkAuctionEvent::NewRequest(event) => {
                out.write_u8(NEW_REQUEST_TAG)?;
                event.serial(out)
            }
            WorkAuctionEvent::NewBid(event) => {
                out.write_u8(NEW_BID_TAG)?;
                event.serial(out)
            }
            WorkAuctionEvent::BidWon(event) => {
                out.write_u8(BID_WON_TAG)?;
                event.serial(out)
            }
            WorkAuctionEvent::RequestCompleted(event) => {
                out.write_u8(REQUEST_COMPLETED_TAG)?;
                event.serial(out)
            }
            WorkAuctionEvent::AuctionFailed(event) => {
                out.write_u8(AUCTION_FAILED_TAG)?;
                event.serial(out)
            }
            WorkAuctionEvent::Deposit(event) => {
                out.write_u8(DEPOSIT_TAG)?;
                event.serial(out)
            }
            WorkAuctionEvent::Withdraw(event) => {
                out.write_u8(WITHDRAW_TAG)?;
                event.serial(out)
            }
            WorkAuctionEvent::SettingsUpdated(settings) => {
                out.write_u8(SETTINGS_UPDATED_TAG)?;
                settings.serial(out)
            }
        }
    }
}

//! It exposes the error codes, event tags and access control shared by the
//! work auction contracts.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{authority::*, constants::*, errors::*};

mod authority;
mod constants;
mod errors;

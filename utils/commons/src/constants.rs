/// Tag for the NewRequest event.
pub const NEW_REQUEST_TAG: u8 = u8::MAX;

/// Tag for the NewBid event.
pub const NEW_BID_TAG: u8 = u8::MAX - 1;

/// Tag for the BidWon event.
pub const BID_WON_TAG: u8 = u8::MAX - 2;

/// Tag for the RequestCompleted event.
pub const REQUEST_COMPLETED_TAG: u8 = u8::MAX - 3;

/// Tag for the AuctionFailed event.
pub const AUCTION_FAILED_TAG: u8 = u8::MAX - 4;

/// Tag for the Deposit event.
pub const DEPOSIT_TAG: u8 = u8::MAX - 5;

/// Tag for the Withdraw event.
pub const WITHDRAW_TAG: u8 = u8::MAX - 6;

/// Tag for the SettingsUpdated event.
pub const SETTINGS_UPDATED_TAG: u8 = u8::MAX - 7;

use concordium_std::*;

use crate::auction::AuctionId;

/// Global auction parameters. Also used as the init parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct AuctionSettings {
    /// How long bids are accepted, counted from the request submission.
    pub auction_duration: Duration,
}

impl AuctionSettings {
    pub fn is_valid(&self) -> bool {
        self.auction_duration.millis() > 0
    }
}

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct CreateParams {
    /// Highest price the requester is willing to pay. Gets locked until settlement.
    pub max_price: Amount,
}

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct BidParams {
    pub id: AuctionId,
    pub price: Amount,
}

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct WithdrawParams {
    pub amount: Amount,
}

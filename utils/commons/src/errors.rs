use concordium_std::*;

/// The custom errors the contract can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Failed to invoke a transfer (Error code: -4).
    InvokeTransferError,
    /// Only account addresses can hold balances (Error code: -5).
    OnlyAccountAddress,
    /// Sender is not the administrator (Error code: -6).
    Unauthorized,
    /// Available balance does not cover the amount to lock (Error code: -7).
    InsufficientFunds,
    /// Withdrawal amount is zero or exceeds the available balance (Error code: -8).
    InvalidWithdrawal,
    /// Deposit without any CCD attached (Error code: -9).
    InvalidDeposit,
    /// Balance arithmetic would overflow (Error code: -10).
    AmountOverflow,
    /// Unknown auction id (Error code: -11).
    NotFound,
    /// Bid placed on an auction that is finalized or past its deadline (Error code: -12).
    AuctionClosed,
    /// Bid price is above the requested maximum price (Error code: -13).
    BidTooExpensive,
    /// Auction was already finalized (Error code: -14).
    AlreadyFinalized,
    /// Attempt to finalize the auction before its deadline (Error code: -15).
    AuctionStillOpen,
    /// Auction is not waiting for a commit (Error code: -16).
    InvalidCommitState,
    /// Auction duration must be positive (Error code: -17).
    InvalidDuration,
}

/// Mapping the logging errors to CustomContractError.
impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

/// Mapping errors related to transfers to CustomContractError.
impl From<TransferError> for CustomContractError {
    fn from(_te: TransferError) -> Self {
        Self::InvokeTransferError
    }
}

use commons::CustomContractError;
use concordium_std::*;

/// Sequence number of an auction in the registry.
pub type AuctionId = u64;

/// Lifecycle of an auction entry.
///
/// `Running` moves to exactly one of `NoWinner` or `WaitCommit`, and
/// `WaitCommit` moves to `ReceivedCommit`. `NoWinner` and `ReceivedCommit`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum AuctionStatus {
    /// Accepting bids until the deadline, waiting for finalization afterwards.
    Running,
    /// Finalized without bids, the requester got refunded.
    NoWinner,
    /// Winner selected, funds stay locked until the work is committed.
    WaitCommit,
    /// Work committed, worker paid and requester refunded the spread.
    ReceivedCommit,
}

/// Unit of work put up for auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct WorkRequest {
    pub requester: AccountAddress,
    pub submission_time: Timestamp,
    pub max_price: Amount,
}

impl WorkRequest {
    pub fn deadline(&self, duration: Duration) -> Timestamp {
        deadline(self.submission_time, duration)
    }
}

/// Last moment bids are accepted for a request submitted at `submission_time`.
pub fn deadline(submission_time: Timestamp, duration: Duration) -> Timestamp {
    submission_time
        .checked_add(duration)
        .unwrap_or_else(|| Timestamp::from_timestamp_millis(u64::MAX))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct Bid {
    pub bidder: AccountAddress,
    pub price: Amount,
}

/// Cheapest bid of the pool. Among equal prices the earliest bid wins.
pub fn lowest_bid(bids: &[Bid]) -> Option<&Bid> {
    let mut bids = bids.iter();
    let mut lowest = bids.next()?;
    for bid in bids {
        if bid.price < lowest.price {
            lowest = bid;
        }
    }
    Some(lowest)
}

/// Outcome of finalizing a running auction.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionResult {
    /// Lowest bid. Locked funds stay in escrow until commit.
    Winner(Bid),
    /// No bids were placed. The locked price MUST be returned to the requester.
    Refund {
        requester: AccountAddress,
        amount: Amount,
    },
}

/// Fund movements of a committed auction. The requester's lock of
/// `max_price` is fully released, `price` goes to the worker and `refund`
/// back to the requester.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub requester: AccountAddress,
    pub worker: AccountAddress,
    pub max_price: Amount,
    pub price: Amount,
    pub refund: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct AuctionEntry {
    id: AuctionId,
    status: AuctionStatus,
    work_request: WorkRequest,
    /// Bids in submission order.
    bids: Vec<Bid>,
    winner: Option<Bid>,
}

impl AuctionEntry {
    pub fn new(id: AuctionId, work_request: WorkRequest) -> Self {
        Self {
            id,
            status: AuctionStatus::Running,
            work_request,
            bids: Vec::new(),
            winner: None,
        }
    }

    pub fn id(&self) -> AuctionId {
        self.id
    }

    pub fn status(&self) -> AuctionStatus {
        self.status
    }

    pub fn work_request(&self) -> &WorkRequest {
        &self.work_request
    }

    pub fn bids(&self) -> &[Bid] {
        &self.bids
    }

    pub fn winner(&self) -> Option<&Bid> {
        self.winner.as_ref()
    }

    /// Append a bid to the pool. `duration` is the currently configured auction duration.
    pub fn place_bid(
        &mut self,
        bidder: AccountAddress,
        price: Amount,
        slot_time: Timestamp,
        duration: Duration,
    ) -> Result<(), CustomContractError> {
        ensure_eq!(
            self.status,
            AuctionStatus::Running,
            CustomContractError::AuctionClosed
        );
        ensure!(
            slot_time <= self.work_request.deadline(duration),
            CustomContractError::AuctionClosed
        );
        ensure!(
            price <= self.work_request.max_price,
            CustomContractError::BidTooExpensive
        );

        self.bids.push(Bid { bidder, price });
        Ok(())
    }

    /// Close the auction and select the winner, if there is any.
    pub fn finalize(
        &mut self,
        slot_time: Timestamp,
        duration: Duration,
    ) -> Result<AuctionResult, CustomContractError> {
        ensure_eq!(
            self.status,
            AuctionStatus::Running,
            CustomContractError::AlreadyFinalized
        );
        ensure!(
            slot_time > self.work_request.deadline(duration),
            CustomContractError::AuctionStillOpen
        );

        let result = match lowest_bid(&self.bids).copied() {
            Some(bid) => {
                self.winner = Some(bid);
                self.status = AuctionStatus::WaitCommit;
                AuctionResult::Winner(bid)
            }
            None => {
                self.status = AuctionStatus::NoWinner;
                AuctionResult::Refund {
                    requester: self.work_request.requester,
                    amount: self.work_request.max_price,
                }
            }
        };
        Ok(result)
    }

    /// Mark the work of the winning bid as done. Can only happen once.
    pub fn commit(&mut self) -> Result<Payout, CustomContractError> {
        ensure_eq!(
            self.status,
            AuctionStatus::WaitCommit,
            CustomContractError::InvalidCommitState
        );
        let winner = self.winner.ok_or(CustomContractError::InvalidCommitState)?;
        let max_price = self.work_request.max_price;
        // Bids above `max_price` are rejected on placement
        let refund = max_price
            .micro_ccd
            .checked_sub(winner.price.micro_ccd)
            .map(Amount::from_micro_ccd)
            .ok_or(CustomContractError::BidTooExpensive)?;

        self.status = AuctionStatus::ReceivedCommit;
        Ok(Payout {
            requester: self.work_request.requester,
            worker: winner.bidder,
            max_price,
            price: winner.price,
            refund,
        })
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    const REQUESTER: AccountAddress = AccountAddress([16; 32]);
    const WORKER_1: AccountAddress = AccountAddress([17; 32]);
    const WORKER_2: AccountAddress = AccountAddress([18; 32]);
    const WORKER_3: AccountAddress = AccountAddress([19; 32]);

    const SUBMISSION: u64 = 10_000;
    const DURATION: u64 = 1_000;

    fn duration() -> Duration {
        Duration::from_millis(DURATION)
    }

    fn at(millis: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(millis)
    }

    fn bid(bidder: AccountAddress, price: u64) -> Bid {
        Bid {
            bidder,
            price: Amount::from_micro_ccd(price),
        }
    }

    fn running_entry() -> AuctionEntry {
        AuctionEntry::new(
            0,
            WorkRequest {
                requester: REQUESTER,
                submission_time: at(SUBMISSION),
                max_price: Amount::from_micro_ccd(40),
            },
        )
    }

    #[concordium_test]
    fn test_lowest_bid() {
        claim_eq!(lowest_bid(&[]), None);

        let bids = [bid(WORKER_1, 30), bid(WORKER_2, 20), bid(WORKER_3, 25)];
        claim_eq!(lowest_bid(&bids), Some(&bids[1]));

        // Last bid being the cheapest must not be skipped
        let bids = [bid(WORKER_1, 30), bid(WORKER_2, 20), bid(WORKER_3, 10)];
        claim_eq!(lowest_bid(&bids), Some(&bids[2]));
    }

    #[concordium_test]
    fn test_lowest_bid_earliest_tie_wins() {
        let bids = [
            bid(WORKER_1, 30),
            bid(WORKER_2, 25),
            bid(WORKER_3, 25),
            bid(WORKER_1, 25),
        ];
        claim_eq!(lowest_bid(&bids), Some(&bids[1]));

        // Duplicates of the same bidder are kept apart by position
        let bids = [bid(WORKER_3, 5), bid(WORKER_3, 5)];
        let lowest = lowest_bid(&bids).expect_report("Lowest bid must exist");
        claim!(core::ptr::eq(lowest, &bids[0]));
    }

    #[concordium_test]
    fn test_deadline_saturates() {
        let endless = Duration::from_millis(u64::MAX);
        claim_eq!(deadline(at(SUBMISSION), endless), at(u64::MAX));
        claim_eq!(
            deadline(at(SUBMISSION), duration()),
            at(SUBMISSION + DURATION)
        );
    }

    #[concordium_test]
    fn test_place_bid() {
        let mut entry = running_entry();

        // Deadline itself is still open
        let result = entry.place_bid(
            WORKER_1,
            Amount::from_micro_ccd(40),
            at(SUBMISSION + DURATION),
            duration(),
        );
        claim_eq!(result, Ok(()));

        let result = entry.place_bid(
            WORKER_2,
            Amount::from_micro_ccd(41),
            at(SUBMISSION),
            duration(),
        );
        claim_eq!(result, Err(CustomContractError::BidTooExpensive));

        let result = entry.place_bid(
            WORKER_2,
            Amount::from_micro_ccd(10),
            at(SUBMISSION + DURATION + 1),
            duration(),
        );
        claim_eq!(result, Err(CustomContractError::AuctionClosed));

        claim_eq!(entry.bids(), &[bid(WORKER_1, 40)][..]);
    }

    #[concordium_test]
    fn test_finalize_without_bids() {
        let mut entry = running_entry();

        let result = entry.finalize(at(SUBMISSION + DURATION), duration());
        claim_eq!(result, Err(CustomContractError::AuctionStillOpen));
        claim_eq!(entry.status(), AuctionStatus::Running);

        let result = entry.finalize(at(SUBMISSION + DURATION + 1), duration());
        claim_eq!(
            result,
            Ok(AuctionResult::Refund {
                requester: REQUESTER,
                amount: Amount::from_micro_ccd(40),
            })
        );
        claim_eq!(entry.status(), AuctionStatus::NoWinner);
        claim_eq!(entry.winner(), None);

        let result = entry.finalize(at(SUBMISSION + DURATION + 1), duration());
        claim_eq!(result, Err(CustomContractError::AlreadyFinalized));
        claim_eq!(entry.commit(), Err(CustomContractError::InvalidCommitState));
    }

    #[concordium_test]
    fn test_finalize_and_commit() {
        let mut entry = running_entry();
        for (bidder, price) in [(WORKER_1, 30), (WORKER_2, 20), (WORKER_3, 20)] {
            claim_eq!(
                entry.place_bid(
                    bidder,
                    Amount::from_micro_ccd(price),
                    at(SUBMISSION),
                    duration()
                ),
                Ok(())
            );
        }

        // Nothing to commit before finalization
        claim_eq!(entry.commit(), Err(CustomContractError::InvalidCommitState));

        let result = entry.finalize(at(SUBMISSION + DURATION + 1), duration());
        claim_eq!(result, Ok(AuctionResult::Winner(bid(WORKER_2, 20))));
        claim_eq!(entry.status(), AuctionStatus::WaitCommit);
        claim_eq!(entry.winner(), Some(&bid(WORKER_2, 20)));

        let result = entry.place_bid(
            WORKER_1,
            Amount::from_micro_ccd(1),
            at(SUBMISSION),
            duration(),
        );
        claim_eq!(result, Err(CustomContractError::AuctionClosed));

        claim_eq!(
            entry.commit(),
            Ok(Payout {
                requester: REQUESTER,
                worker: WORKER_2,
                max_price: Amount::from_micro_ccd(40),
                price: Amount::from_micro_ccd(20),
                refund: Amount::from_micro_ccd(20),
            })
        );
        claim_eq!(entry.status(), AuctionStatus::ReceivedCommit);

        claim_eq!(entry.commit(), Err(CustomContractError::InvalidCommitState));
    }

    #[concordium_test]
    fn test_duration_is_read_on_every_check() {
        let mut entry = running_entry();
        let longer = Duration::from_millis(DURATION * 5);

        // Past the original deadline, but within a longer one
        let slot_time = at(SUBMISSION + DURATION * 2);
        claim_eq!(
            entry.finalize(slot_time, longer),
            Err(CustomContractError::AuctionStillOpen)
        );
        claim_eq!(
            entry.place_bid(WORKER_1, Amount::from_micro_ccd(5), slot_time, longer),
            Ok(())
        );
        claim_eq!(
            entry.finalize(slot_time, duration()),
            Ok(AuctionResult::Winner(bid(WORKER_1, 5)))
        );
    }
}

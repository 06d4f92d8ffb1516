use commons::{Authority, CustomContractError};
use concordium_std::*;

use crate::auction::{AuctionEntry, AuctionId, AuctionResult, Payout, WorkRequest};
use crate::external::AuctionSettings;
use crate::ledger::Ledger;

/// The contract state.
///
/// Every transition loads a copy of the auction entry, applies it together
/// with the ledger changes, and only stores the entry back once both
/// succeeded.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Administrator allowed to update settings and commit completed work.
    pub authority: Authority,
    /// Auction parameters, applied to running auctions as well.
    pub settings: AuctionSettings,
    /// Next auction id, equal to the number of auctions created so far.
    counter: u64,
    /// Auction registry. Entries are never removed.
    auctions: StateMap<AuctionId, AuctionEntry, S>,
    /// Escrowed balances.
    pub ledger: Ledger<S>,
}

impl<S: HasStateApi> State<S> {
    /// Create a new state with no auctions and an empty ledger.
    pub fn new(
        state_builder: &mut StateBuilder<S>,
        admin: Address,
        settings: AuctionSettings,
    ) -> Self {
        State {
            authority: Authority::new(admin),
            settings,
            counter: 0,
            auctions: state_builder.new_map(),
            ledger: Ledger::new(state_builder),
        }
    }

    pub fn count(&self) -> u64 {
        self.counter
    }

    pub fn auction(&self, id: AuctionId) -> Result<AuctionEntry, CustomContractError> {
        self.auctions
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(CustomContractError::NotFound)
    }

    /// Entries in the requested order. Fails on the first unknown id.
    pub fn auction_batch(
        &self,
        ids: &[AuctionId],
    ) -> Result<Vec<AuctionEntry>, CustomContractError> {
        ids.iter().map(|id| self.auction(*id)).collect()
    }

    /// Lock `max_price` of the requester and open a new auction.
    pub fn create(
        &mut self,
        requester: AccountAddress,
        max_price: Amount,
        slot_time: Timestamp,
    ) -> Result<AuctionId, CustomContractError> {
        self.ledger.lock(requester, max_price)?;

        let id = self.counter;
        let work_request = WorkRequest {
            requester,
            submission_time: slot_time,
            max_price,
        };
        self.auctions.insert(id, AuctionEntry::new(id, work_request));
        self.counter += 1;

        Ok(id)
    }

    pub fn bid(
        &mut self,
        id: AuctionId,
        bidder: AccountAddress,
        price: Amount,
        slot_time: Timestamp,
    ) -> Result<(), CustomContractError> {
        let mut entry = self.auction(id)?;
        entry.place_bid(bidder, price, slot_time, self.settings.auction_duration)?;
        self.auctions.insert(id, entry);
        Ok(())
    }

    /// Close the auction. Without bids the requester gets the locked price back.
    pub fn finalize(
        &mut self,
        id: AuctionId,
        slot_time: Timestamp,
    ) -> Result<AuctionResult, CustomContractError> {
        let mut entry = self.auction(id)?;
        let result = entry.finalize(slot_time, self.settings.auction_duration)?;

        if let AuctionResult::Refund { requester, amount } = result {
            self.ledger.unlock(requester, amount)?;
        }
        self.auctions.insert(id, entry);

        Ok(result)
    }

    /// Pay the winner and refund the spread to the requester.
    pub fn commit(&mut self, id: AuctionId) -> Result<Payout, CustomContractError> {
        let mut entry = self.auction(id)?;
        let payout = entry.commit()?;

        self.ledger.settle(&payout)?;
        self.auctions.insert(id, entry);

        Ok(payout)
    }

    pub fn update_settings(
        &mut self,
        settings: AuctionSettings,
    ) -> Result<(), CustomContractError> {
        ensure!(settings.is_valid(), CustomContractError::InvalidDuration);
        self.settings = settings;
        Ok(())
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::auction::{AuctionStatus, Bid};
    use crate::ledger::UserBalanceEntry;
    use test_infrastructure::*;

    const ADMIN: AccountAddress = AccountAddress([1; 32]);
    const REQUESTER: AccountAddress = AccountAddress([16; 32]);
    const WORKER_1: AccountAddress = AccountAddress([17; 32]);
    const WORKER_2: AccountAddress = AccountAddress([18; 32]);

    const START: u64 = 10_000;
    const DURATION: u64 = 1_000;

    fn at(millis: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(millis)
    }

    fn ccd(micro_ccd: u64) -> Amount {
        Amount::from_micro_ccd(micro_ccd)
    }

    fn total_funds(state: &State<TestStateApi>, principals: &[AccountAddress]) -> u64 {
        principals
            .iter()
            .map(|principal| {
                let balance = state.ledger.balance(principal);
                balance.available.micro_ccd + balance.locked.micro_ccd
            })
            .sum()
    }

    fn funded_state() -> State<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        let mut state = State::new(
            &mut state_builder,
            Address::Account(ADMIN),
            AuctionSettings {
                auction_duration: Duration::from_millis(DURATION),
            },
        );
        claim!(state.ledger.deposit(REQUESTER, ccd(100)).is_ok());
        state
    }

    #[concordium_test]
    fn test_ids_are_dense() {
        let mut state = funded_state();
        claim_eq!(state.count(), 0);

        for expected in 0..3u64 {
            claim_eq!(state.create(REQUESTER, ccd(10), at(START)), Ok(expected));
            claim_eq!(state.count(), expected + 1);
        }

        // Failed creation does not consume an id
        claim_eq!(
            state.create(REQUESTER, ccd(71), at(START)),
            Err(CustomContractError::InsufficientFunds)
        );
        claim_eq!(state.count(), 3);
        claim_eq!(state.auction(3), Err(CustomContractError::NotFound));

        for id in 0..3u64 {
            let entry = state.auction(id).expect_report("Auction must exist");
            claim_eq!(entry.id(), id);
        }
    }

    #[concordium_test]
    fn test_batch_lookup() {
        let mut state = funded_state();
        for price in [10, 20, 30] {
            claim!(state.create(REQUESTER, ccd(price), at(START)).is_ok());
        }

        let entries = state
            .auction_batch(&[2, 0, 2])
            .expect_report("Batch lookup must succeed");
        let ids: Vec<AuctionId> = entries.iter().map(|entry| entry.id()).collect();
        claim_eq!(ids, vec![2, 0, 2]);
        claim_eq!(entries[0].work_request().max_price, ccd(30));

        claim_eq!(state.auction_batch(&[]), Ok(Vec::new()));
        claim_eq!(
            state.auction_batch(&[0, 3, 1]),
            Err(CustomContractError::NotFound)
        );
    }

    #[concordium_test]
    fn test_rejected_bid_does_not_change_pool() {
        let mut state = funded_state();
        let id = state
            .create(REQUESTER, ccd(40), at(START))
            .expect_report("Create must succeed");

        claim_eq!(state.bid(id, WORKER_1, ccd(30), at(START + 1)), Ok(()));
        claim_eq!(
            state.bid(id, WORKER_2, ccd(41), at(START + 1)),
            Err(CustomContractError::BidTooExpensive)
        );
        claim_eq!(
            state.bid(id, WORKER_2, ccd(20), at(START + DURATION + 1)),
            Err(CustomContractError::AuctionClosed)
        );
        claim_eq!(
            state.bid(id + 1, WORKER_2, ccd(20), at(START + 1)),
            Err(CustomContractError::NotFound)
        );

        let entry = state.auction(id).expect_report("Auction must exist");
        claim_eq!(
            entry.bids(),
            &[Bid {
                bidder: WORKER_1,
                price: ccd(30),
            }][..]
        );
    }

    #[concordium_test]
    fn test_funds_are_conserved() {
        let principals = [REQUESTER, WORKER_1, WORKER_2];
        let mut state = funded_state();
        claim_eq!(total_funds(&state, &principals), 100);

        let failed = state
            .create(REQUESTER, ccd(30), at(START))
            .expect_report("Create must succeed");
        let settled = state
            .create(REQUESTER, ccd(50), at(START))
            .expect_report("Create must succeed");
        claim_eq!(
            state.ledger.balance(&REQUESTER),
            UserBalanceEntry {
                available: ccd(20),
                locked: ccd(80),
            }
        );
        claim_eq!(total_funds(&state, &principals), 100);

        claim_eq!(state.bid(settled, WORKER_1, ccd(45), at(START)), Ok(()));
        claim_eq!(state.bid(settled, WORKER_2, ccd(35), at(START)), Ok(()));

        let after_deadline = at(START + DURATION + 1);
        claim_eq!(
            state.finalize(failed, after_deadline),
            Ok(AuctionResult::Refund {
                requester: REQUESTER,
                amount: ccd(30),
            })
        );
        claim_eq!(total_funds(&state, &principals), 100);

        claim!(state.finalize(settled, after_deadline).is_ok());
        claim_eq!(total_funds(&state, &principals), 100);

        let payout = state.commit(settled).expect_report("Commit must succeed");
        claim_eq!(payout.refund.micro_ccd + payout.price.micro_ccd, 50);
        claim_eq!(total_funds(&state, &principals), 100);

        claim_eq!(
            state.ledger.balance(&REQUESTER),
            UserBalanceEntry {
                available: ccd(65),
                locked: ccd(0),
            }
        );
        claim_eq!(state.ledger.balance(&WORKER_1), UserBalanceEntry::zero());
        claim_eq!(
            state.ledger.balance(&WORKER_2),
            UserBalanceEntry {
                available: ccd(35),
                locked: ccd(0),
            }
        );
    }

    #[concordium_test]
    fn test_failed_transitions_do_not_mutate() {
        let mut state = funded_state();
        let id = state
            .create(REQUESTER, ccd(40), at(START))
            .expect_report("Create must succeed");
        claim_eq!(state.bid(id, WORKER_1, ccd(20), at(START)), Ok(()));

        claim_eq!(
            state.commit(id),
            Err(CustomContractError::InvalidCommitState)
        );
        claim_eq!(
            state.finalize(id, at(START + DURATION)),
            Err(CustomContractError::AuctionStillOpen)
        );
        let before = state.auction(id).expect_report("Auction must exist");
        claim_eq!(before.status(), AuctionStatus::Running);

        claim!(state.finalize(id, at(START + DURATION + 1)).is_ok());
        let finalized = state.auction(id).expect_report("Auction must exist");
        let balance = state.ledger.balance(&REQUESTER);

        claim_eq!(
            state.finalize(id, at(START + DURATION + 1)),
            Err(CustomContractError::AlreadyFinalized)
        );
        claim_eq!(state.auction(id), Ok(finalized));
        claim_eq!(state.ledger.balance(&REQUESTER), balance);

        claim!(state.commit(id).is_ok());
        let committed = state.auction(id).expect_report("Auction must exist");
        let balance = state.ledger.balance(&REQUESTER);
        let worker_balance = state.ledger.balance(&WORKER_1);

        claim_eq!(
            state.commit(id),
            Err(CustomContractError::InvalidCommitState)
        );
        claim_eq!(state.auction(id), Ok(committed));
        claim_eq!(state.ledger.balance(&REQUESTER), balance);
        claim_eq!(state.ledger.balance(&WORKER_1), worker_balance);
    }

    #[concordium_test]
    fn test_update_settings() {
        let mut state = funded_state();
        let longer = AuctionSettings {
            auction_duration: Duration::from_millis(DURATION * 3),
        };

        claim_eq!(
            state.update_settings(AuctionSettings {
                auction_duration: Duration::from_millis(0),
            }),
            Err(CustomContractError::InvalidDuration)
        );
        claim_eq!(
            state.settings.auction_duration,
            Duration::from_millis(DURATION)
        );

        claim_eq!(state.update_settings(longer), Ok(()));
        claim_eq!(state.settings, longer);
    }
}

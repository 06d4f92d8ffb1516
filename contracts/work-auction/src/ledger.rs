use commons::CustomContractError;
use concordium_std::*;

use crate::auction::Payout;

/// Escrowed funds of a single principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct UserBalanceEntry {
    /// Funds that can be withdrawn or locked for a new request.
    pub available: Amount,
    /// Funds locked for running or unsettled requests.
    pub locked: Amount,
}

impl UserBalanceEntry {
    pub fn zero() -> Self {
        Self {
            available: Amount::zero(),
            locked: Amount::zero(),
        }
    }
}

/// Per-principal balances. The only place value moves between principals.
///
/// Every operation computes the new balances before storing any of them, so a
/// rejected operation leaves the ledger untouched.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct Ledger<S: HasStateApi> {
    balances: StateMap<AccountAddress, UserBalanceEntry, S>,
}

impl<S: HasStateApi> Ledger<S> {
    pub fn new(state_builder: &mut StateBuilder<S>) -> Self {
        Self {
            balances: state_builder.new_map(),
        }
    }

    /// Balance of `principal`. Unseen principals have a zero balance, which is
    /// not stored until their first deposit.
    pub fn balance(&self, principal: &AccountAddress) -> UserBalanceEntry {
        self.balances
            .get(principal)
            .map(|entry| *entry)
            .unwrap_or_else(UserBalanceEntry::zero)
    }

    fn store(&mut self, principal: AccountAddress, entry: UserBalanceEntry) {
        self.balances.insert(principal, entry);
    }

    /// Credit CCD transferred into the contract.
    pub fn deposit(
        &mut self,
        principal: AccountAddress,
        amount: Amount,
    ) -> Result<UserBalanceEntry, CustomContractError> {
        ensure!(amount > Amount::zero(), CustomContractError::InvalidDeposit);

        let mut entry = self.balance(&principal);
        entry.available = checked_add(entry.available, amount)?;
        self.store(principal, entry);
        Ok(entry)
    }

    /// Debit available funds. The caller MUST transfer `amount` to the principal.
    pub fn withdraw(
        &mut self,
        principal: AccountAddress,
        amount: Amount,
    ) -> Result<UserBalanceEntry, CustomContractError> {
        let mut entry = self.balance(&principal);
        ensure!(
            amount > Amount::zero() && amount <= entry.available,
            CustomContractError::InvalidWithdrawal
        );

        entry.available = checked_sub(entry.available, amount)?;
        self.store(principal, entry);
        Ok(entry)
    }

    /// Move `amount` from available to locked.
    pub(crate) fn lock(
        &mut self,
        principal: AccountAddress,
        amount: Amount,
    ) -> Result<(), CustomContractError> {
        let mut entry = self.balance(&principal);
        ensure!(
            entry.available >= amount,
            CustomContractError::InsufficientFunds
        );

        entry.available = checked_sub(entry.available, amount)?;
        entry.locked = checked_add(entry.locked, amount)?;
        self.store(principal, entry);
        Ok(())
    }

    /// Move `amount` from locked back to available.
    pub(crate) fn unlock(
        &mut self,
        principal: AccountAddress,
        amount: Amount,
    ) -> Result<(), CustomContractError> {
        let mut entry = self.balance(&principal);
        entry.locked = checked_sub(entry.locked, amount)?;
        entry.available = checked_add(entry.available, amount)?;
        self.store(principal, entry);
        Ok(())
    }

    /// Release the requester's lock, pay the worker and refund the spread.
    pub(crate) fn settle(&mut self, payout: &Payout) -> Result<(), CustomContractError> {
        let mut requester = self.balance(&payout.requester);
        requester.locked = checked_sub(requester.locked, payout.max_price)?;
        requester.available = checked_add(requester.available, payout.refund)?;

        if payout.worker == payout.requester {
            requester.available = checked_add(requester.available, payout.price)?;
            self.store(payout.requester, requester);
        } else {
            let mut worker = self.balance(&payout.worker);
            worker.available = checked_add(worker.available, payout.price)?;
            self.store(payout.requester, requester);
            self.store(payout.worker, worker);
        }
        Ok(())
    }
}

fn checked_add(left: Amount, right: Amount) -> Result<Amount, CustomContractError> {
    left.micro_ccd
        .checked_add(right.micro_ccd)
        .map(Amount::from_micro_ccd)
        .ok_or(CustomContractError::AmountOverflow)
}

// Lock accounting guarantees `right <= left` for every ledger debit, any
// violation is reported as missing funds.
fn checked_sub(left: Amount, right: Amount) -> Result<Amount, CustomContractError> {
    left.micro_ccd
        .checked_sub(right.micro_ccd)
        .map(Amount::from_micro_ccd)
        .ok_or(CustomContractError::InsufficientFunds)
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use test_infrastructure::*;

    const REQUESTER: AccountAddress = AccountAddress([16; 32]);
    const WORKER: AccountAddress = AccountAddress([17; 32]);
    const STRANGER: AccountAddress = AccountAddress([18; 32]);

    fn ccd(micro_ccd: u64) -> Amount {
        Amount::from_micro_ccd(micro_ccd)
    }

    fn balance(available: u64, locked: u64) -> UserBalanceEntry {
        UserBalanceEntry {
            available: ccd(available),
            locked: ccd(locked),
        }
    }

    fn funded_ledger() -> Ledger<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        let mut ledger = Ledger::new(&mut state_builder);
        claim_eq!(ledger.deposit(REQUESTER, ccd(100)), Ok(balance(100, 0)));
        ledger
    }

    #[concordium_test]
    fn test_unseen_principal_is_not_stored() {
        let ledger = funded_ledger();

        claim_eq!(ledger.balance(&STRANGER), UserBalanceEntry::zero());
        claim!(ledger.balances.get(&STRANGER).is_none());
        claim_eq!(ledger.balance(&REQUESTER), balance(100, 0));
    }

    #[concordium_test]
    fn test_deposit() {
        let mut ledger = funded_ledger();

        claim_eq!(ledger.deposit(REQUESTER, ccd(20)), Ok(balance(120, 0)));
        claim_eq!(
            ledger.deposit(STRANGER, Amount::zero()),
            Err(CustomContractError::InvalidDeposit)
        );
        claim!(ledger.balances.get(&STRANGER).is_none());
        claim_eq!(
            ledger.deposit(REQUESTER, ccd(u64::MAX)),
            Err(CustomContractError::AmountOverflow)
        );
        claim_eq!(ledger.balance(&REQUESTER), balance(120, 0));
    }

    #[concordium_test]
    fn test_withdraw() {
        let mut ledger = funded_ledger();

        claim_eq!(
            ledger.withdraw(REQUESTER, ccd(101)),
            Err(CustomContractError::InvalidWithdrawal)
        );
        claim_eq!(
            ledger.withdraw(REQUESTER, Amount::zero()),
            Err(CustomContractError::InvalidWithdrawal)
        );
        claim_eq!(
            ledger.withdraw(STRANGER, ccd(1)),
            Err(CustomContractError::InvalidWithdrawal)
        );
        claim_eq!(ledger.balance(&REQUESTER), balance(100, 0));

        claim_eq!(ledger.withdraw(REQUESTER, ccd(100)), Ok(balance(0, 0)));
    }

    #[concordium_test]
    fn test_locked_funds_cannot_be_withdrawn() {
        let mut ledger = funded_ledger();

        claim_eq!(ledger.lock(REQUESTER, ccd(40)), Ok(()));
        claim_eq!(ledger.balance(&REQUESTER), balance(60, 40));
        claim_eq!(
            ledger.withdraw(REQUESTER, ccd(61)),
            Err(CustomContractError::InvalidWithdrawal)
        );
        claim_eq!(
            ledger.lock(REQUESTER, ccd(61)),
            Err(CustomContractError::InsufficientFunds)
        );
        claim_eq!(ledger.balance(&REQUESTER), balance(60, 40));

        claim_eq!(ledger.unlock(REQUESTER, ccd(40)), Ok(()));
        claim_eq!(ledger.balance(&REQUESTER), balance(100, 0));
        claim_eq!(
            ledger.unlock(REQUESTER, ccd(1)),
            Err(CustomContractError::InsufficientFunds)
        );
        claim_eq!(ledger.balance(&REQUESTER), balance(100, 0));
    }

    #[concordium_test]
    fn test_settle() {
        let mut ledger = funded_ledger();
        claim_eq!(ledger.lock(REQUESTER, ccd(40)), Ok(()));

        let payout = Payout {
            requester: REQUESTER,
            worker: WORKER,
            max_price: ccd(40),
            price: ccd(15),
            refund: ccd(25),
        };
        claim_eq!(ledger.settle(&payout), Ok(()));
        claim_eq!(ledger.balance(&REQUESTER), balance(85, 0));
        claim_eq!(ledger.balance(&WORKER), balance(15, 0));

        // Lock is already released, nothing gets paid twice
        claim_eq!(
            ledger.settle(&payout),
            Err(CustomContractError::InsufficientFunds)
        );
        claim_eq!(ledger.balance(&REQUESTER), balance(85, 0));
        claim_eq!(ledger.balance(&WORKER), balance(15, 0));
    }

    #[concordium_test]
    fn test_settle_requester_as_worker() {
        let mut ledger = funded_ledger();
        claim_eq!(ledger.lock(REQUESTER, ccd(40)), Ok(()));

        let payout = Payout {
            requester: REQUESTER,
            worker: REQUESTER,
            max_price: ccd(40),
            price: ccd(10),
            refund: ccd(30),
        };
        claim_eq!(ledger.settle(&payout), Ok(()));
        claim_eq!(ledger.balance(&REQUESTER), balance(100, 0));
    }
}

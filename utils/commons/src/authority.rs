use crate::CustomContractError;
use concordium_std::*;

/// The single administrative principal of a contract instance.
///
/// It is fixed on initialization and there is no way to replace it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct Authority {
    /// Trusted address allowed to update settings and attest completed work.
    admin: Address,
}

impl Authority {
    pub fn new(admin: Address) -> Self {
        Self { admin }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn has_admin_rights(&self, address: &Address) -> bool {
        self.admin == *address
    }

    /// Reject with [CustomContractError::Unauthorized] unless `sender` is the administrator.
    pub fn ensure_admin(&self, sender: &Address) -> Result<(), CustomContractError> {
        ensure!(
            self.has_admin_rights(sender),
            CustomContractError::Unauthorized
        );
        Ok(())
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    const ADMIN_ACCOUNT: AccountAddress = AccountAddress([1; 32]);
    const ADMIN_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 1,
    };

    const USER_1: AccountAddress = AccountAddress([16; 32]);
    const CONTRACT_1: ContractAddress = ContractAddress {
        index: 16,
        subindex: 16,
    };

    #[concordium_test]
    fn test_account_admin() {
        let authority = Authority::new(Address::Account(ADMIN_ACCOUNT));

        claim!(authority.has_admin_rights(&Address::Account(ADMIN_ACCOUNT)));
        claim!(!authority.has_admin_rights(&Address::Account(USER_1)));
        claim!(!authority.has_admin_rights(&Address::Contract(CONTRACT_1)));
        claim_eq!(authority.admin(), Address::Account(ADMIN_ACCOUNT));
    }

    #[concordium_test]
    fn test_contract_admin() {
        let authority = Authority::new(Address::Contract(ADMIN_CONTRACT));

        claim!(authority.has_admin_rights(&Address::Contract(ADMIN_CONTRACT)));
        // Same index on a different subindex is a different contract
        claim!(!authority.has_admin_rights(&Address::Contract(ContractAddress {
            index: 1,
            subindex: 0,
        })));
        claim!(!authority.has_admin_rights(&Address::Account(ADMIN_ACCOUNT)));
    }

    #[concordium_test]
    fn test_ensure_admin() {
        let authority = Authority::new(Address::Account(ADMIN_ACCOUNT));

        claim_eq!(
            authority.ensure_admin(&Address::Account(ADMIN_ACCOUNT)),
            Ok(())
        );
        claim_eq!(
            authority.ensure_admin(&Address::Account(USER_1)),
            Err(CustomContractError::Unauthorized)
        );
        claim_eq!(
            authority.ensure_admin(&Address::Contract(CONTRACT_1)),
            Err(CustomContractError::Unauthorized)
        );
    }
}

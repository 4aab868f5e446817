//! Access Control Module
//!
//! Two-step ownership for administered components (fuse boxes, factories).
//!
//! ## Key Features
//!
//! - **Explicit state machine**: `Owned`, `PendingTransfer`, `Renounced`
//! - **Two-step transfer**: the nominated owner must accept before control moves
//! - **Irreversible renounce**: a renounced authority rejects every admin call

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{CogError, CogResult};
use crate::types::{is_zero_address, Address, ZERO_ADDRESS};

// ============================================================================
// Types
// ============================================================================

/// Ownership of an administered component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Authority {
    /// Single owner, no transfer in flight
    Owned(Address),
    /// Owner has nominated a successor who has not accepted yet
    PendingTransfer { owner: Address, pending: Address },
    /// Ownership given up for good
    Renounced,
}

impl Authority {
    /// Create an authority owned by `owner`
    pub fn new(owner: Address) -> Self {
        Authority::Owned(owner)
    }

    /// Current owner, or the zero address once renounced
    pub fn owner(&self) -> Address {
        match self {
            Authority::Owned(owner) => *owner,
            Authority::PendingTransfer { owner, .. } => *owner,
            Authority::Renounced => ZERO_ADDRESS,
        }
    }

    /// Nominated successor, or the zero address if none
    pub fn pending_owner(&self) -> Address {
        match self {
            Authority::PendingTransfer { pending, .. } => *pending,
            _ => ZERO_ADDRESS,
        }
    }

    /// True once ownership has been renounced
    pub fn is_renounced(&self) -> bool {
        matches!(self, Authority::Renounced)
    }

    /// Fail with `Unauthorized` unless `caller` is the current owner
    pub fn require_owner(&self, caller: &Address) -> CogResult<()> {
        let owner = self.owner();
        if self.is_renounced() || owner != *caller {
            return Err(CogError::Unauthorized {
                expected: owner,
                actual: *caller,
            });
        }
        Ok(())
    }

    // ============================================================================
    // Transitions
    // ============================================================================

    /// Nominate `new_owner`. Nominating the zero address cancels a pending transfer.
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> CogResult<()> {
        self.require_owner(caller)?;
        let owner = self.owner();
        *self = if is_zero_address(&new_owner) {
            Authority::Owned(owner)
        } else {
            Authority::PendingTransfer { owner, pending: new_owner }
        };
        Ok(())
    }

    /// Complete a transfer. Only the nominated owner may call this.
    ///
    /// Returns the previous owner.
    pub fn accept_ownership(&mut self, caller: &Address) -> CogResult<Address> {
        match *self {
            Authority::PendingTransfer { owner, pending } if pending == *caller => {
                *self = Authority::Owned(pending);
                Ok(owner)
            }
            _ => Err(CogError::Unauthorized {
                expected: self.pending_owner(),
                actual: *caller,
            }),
        }
    }

    /// Give up ownership permanently. Returns the previous owner.
    pub fn renounce_ownership(&mut self, caller: &Address) -> CogResult<Address> {
        self.require_owner(caller)?;
        let owner = self.owner();
        *self = Authority::Renounced;
        Ok(owner)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        [1u8; 32]
    }

    fn successor() -> Address {
        [2u8; 32]
    }

    fn stranger() -> Address {
        [9u8; 32]
    }

    #[test]
    fn test_new_authority() {
        let auth = Authority::new(owner());
        assert_eq!(auth.owner(), owner());
        assert_eq!(auth.pending_owner(), ZERO_ADDRESS);
        assert!(auth.require_owner(&owner()).is_ok());
    }

    #[test]
    fn test_non_owner_cannot_transfer() {
        let mut auth = Authority::new(owner());
        let result = auth.transfer_ownership(&stranger(), successor());
        assert!(matches!(result, Err(CogError::Unauthorized { .. })));
        assert_eq!(auth, Authority::Owned(owner()));
    }

    #[test]
    fn test_two_step_transfer() {
        let mut auth = Authority::new(owner());
        auth.transfer_ownership(&owner(), successor()).unwrap();

        // Still owned by the old owner until accepted
        assert_eq!(auth.owner(), owner());
        assert_eq!(auth.pending_owner(), successor());

        // Only the nominee may accept
        assert!(matches!(
            auth.accept_ownership(&stranger()),
            Err(CogError::Unauthorized { .. })
        ));

        let previous = auth.accept_ownership(&successor()).unwrap();
        assert_eq!(previous, owner());
        assert_eq!(auth, Authority::Owned(successor()));

        // Old owner lost control
        assert!(auth.require_owner(&owner()).is_err());
    }

    #[test]
    fn test_accept_without_pending_fails() {
        let mut auth = Authority::new(owner());
        assert!(auth.accept_ownership(&owner()).is_err());
    }

    #[test]
    fn test_zero_nomination_cancels() {
        let mut auth = Authority::new(owner());
        auth.transfer_ownership(&owner(), successor()).unwrap();
        auth.transfer_ownership(&owner(), ZERO_ADDRESS).unwrap();
        assert_eq!(auth, Authority::Owned(owner()));
        assert!(auth.accept_ownership(&successor()).is_err());
    }

    #[test]
    fn test_renounce_is_final() {
        let mut auth = Authority::new(owner());
        assert!(auth.renounce_ownership(&stranger()).is_err());

        auth.renounce_ownership(&owner()).unwrap();
        assert_eq!(auth.owner(), ZERO_ADDRESS);
        assert!(auth.is_renounced());

        assert!(auth.require_owner(&owner()).is_err());
        assert!(auth.require_owner(&ZERO_ADDRESS).is_err());
        assert!(auth.transfer_ownership(&owner(), successor()).is_err());
    }
}

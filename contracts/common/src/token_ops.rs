//! Token Operations Module
//!
//! The token capability a pair consumes. Implementations own their balance
//! bookkeeping and guarantee that a transfer either fully succeeds or fully
//! fails.
//!
//! ## Key Features
//!
//! - **Pull / push**: `transfer_from` pulls with allowance, `transfer` pushes
//! - **Verbatim errors**: `InsufficientBalance` / `InsufficientAllowance`
//!   are surfaced to the caller unchanged
//! - **Identity**: `token_id` lets a pair verify it was handed the right ledger

use crate::errors::{CogError, CogResult};
use crate::math::safe_add;
use crate::types::{Address, Amount};

/// Fungible token ledger
pub trait TokenLedger {
    /// Address identifying this token
    fn token_id(&self) -> Address;

    /// Balance held by `account`
    fn balance_of(&self, account: &Address) -> Amount;

    /// Move `amount` from `from` to `to`, authorized by `from` itself
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> CogResult<()>;

    /// Move `amount` from `owner` to `to`, spending `spender`'s allowance
    fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> CogResult<()>;
}

/// Fail with `CollaboratorMismatch` unless `token` is the ledger bound as `expected`
pub fn require_token(token: &dyn TokenLedger, expected: &Address, role: &'static str) -> CogResult<()> {
    if token.token_id() != *expected {
        return Err(CogError::CollaboratorMismatch { role });
    }
    Ok(())
}

/// Fail with `InsufficientBalance` unless `account` holds at least `amount`
pub fn require_balance(token: &dyn TokenLedger, account: &Address, amount: Amount) -> CogResult<()> {
    let available = token.balance_of(account);
    if available < amount {
        return Err(CogError::InsufficientBalance {
            available,
            requested: amount,
        });
    }
    Ok(())
}

/// Fail unless `token` can move `amount` from `from` to `to` by a plain transfer
pub fn require_transferable(token: &dyn TokenLedger, from: &Address, to: &Address, amount: Amount) -> CogResult<()> {
    require_balance(token, from, amount)?;
    if from != to {
        safe_add(token.balance_of(to), amount)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct FixedLedger {
        id: Address,
        balances: BTreeMap<Address, Amount>,
    }

    impl TokenLedger for FixedLedger {
        fn token_id(&self) -> Address {
            self.id
        }

        fn balance_of(&self, account: &Address) -> Amount {
            self.balances.get(account).copied().unwrap_or(0)
        }

        fn transfer(&mut self, _from: &Address, _to: &Address, _amount: Amount) -> CogResult<()> {
            Ok(())
        }

        fn transfer_from(&mut self, _: &Address, _: &Address, _: &Address, _: Amount) -> CogResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_require_token_identity() {
        let ledger = FixedLedger { id: [7u8; 32], balances: BTreeMap::new() };
        assert!(require_token(&ledger, &[7u8; 32], "asset").is_ok());
        assert_eq!(
            require_token(&ledger, &[8u8; 32], "asset"),
            Err(CogError::CollaboratorMismatch { role: "asset" })
        );
    }

    #[test]
    fn test_require_balance() {
        let mut balances = BTreeMap::new();
        balances.insert([1u8; 32], 100);
        let ledger = FixedLedger { id: [7u8; 32], balances };

        assert!(require_balance(&ledger, &[1u8; 32], 100).is_ok());
        assert_eq!(
            require_balance(&ledger, &[1u8; 32], 101),
            Err(CogError::InsufficientBalance { available: 100, requested: 101 })
        );
    }

    #[test]
    fn test_require_transferable() {
        let mut balances = BTreeMap::new();
        balances.insert([1u8; 32], 100);
        balances.insert([2u8; 32], Amount::MAX - 10);
        let ledger = FixedLedger { id: [7u8; 32], balances };

        assert!(require_transferable(&ledger, &[1u8; 32], &[3u8; 32], 100).is_ok());
        assert!(require_transferable(&ledger, &[1u8; 32], &[2u8; 32], 10).is_ok());
        assert_eq!(
            require_transferable(&ledger, &[1u8; 32], &[2u8; 32], 11),
            Err(CogError::Overflow)
        );
        assert!(matches!(
            require_transferable(&ledger, &[1u8; 32], &[3u8; 32], 101),
            Err(CogError::InsufficientBalance { .. })
        ));
    }
}

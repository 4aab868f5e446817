//! Cog Token Ledger
//!
//! In-memory fungible token used as the asset and collateral collaborator of
//! Cog lending pairs in tests and simulations.
//!
//! Balances and allowances live in ordered maps, so state dumps are
//! deterministic. Every mutation either applies completely or leaves the
//! ledger untouched.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::trace;

use cog_common::{
    errors::{CogError, CogResult},
    math::{safe_add, safe_sub},
    token_ops::TokenLedger,
    types::{Address, Amount},
};

// ============ Token Metadata ============

/// Static token description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMetadata {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}

// ============ Token Ledger ============

/// ERC-20 style balance book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Erc20Ledger {
    id: Address,
    metadata: TokenMetadata,
    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<(Address, Address), Amount>,
}

impl Erc20Ledger {
    /// Create an empty ledger identified by `id`
    pub fn new(id: Address, metadata: TokenMetadata) -> Self {
        Self {
            id,
            metadata,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    /// 18-decimal token with a throwaway name
    pub fn with_id(id: Address) -> Self {
        Self::new(id, TokenMetadata::new("Test Token", "TEST", 18))
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Credit `amount` new tokens to `to`
    pub fn mint(&mut self, to: &Address, amount: Amount) -> CogResult<()> {
        if amount == 0 {
            return Err(CogError::ZeroAmount);
        }
        let supply = safe_add(self.total_supply, amount)?;
        let balance = safe_add(self.balance_of(to), amount)?;

        self.total_supply = supply;
        self.balances.insert(*to, balance);
        trace!(amount, supply, "mint");
        Ok(())
    }

    /// Destroy `amount` tokens held by `from`
    pub fn burn(&mut self, from: &Address, amount: Amount) -> CogResult<()> {
        if amount == 0 {
            return Err(CogError::ZeroAmount);
        }
        let balance = self.debit_amount(from, amount)?;
        let supply = safe_sub(self.total_supply, amount)?;

        self.total_supply = supply;
        self.balances.insert(*from, balance);
        trace!(amount, supply, "burn");
        Ok(())
    }

    /// Set `spender`'s allowance over `owner`'s tokens
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances.insert((*owner, *spender), amount);
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    // ============ Internal ============

    fn debit_amount(&self, from: &Address, amount: Amount) -> CogResult<Amount> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(CogError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        Ok(available - amount)
    }

    fn move_tokens(&mut self, from: &Address, to: &Address, amount: Amount) -> CogResult<()> {
        let from_balance = self.debit_amount(from, amount)?;
        if from == to {
            return Ok(());
        }
        let to_balance = safe_add(self.balance_of(to), amount)?;

        self.balances.insert(*from, from_balance);
        self.balances.insert(*to, to_balance);
        Ok(())
    }
}

impl TokenLedger for Erc20Ledger {
    fn token_id(&self) -> Address {
        self.id
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> CogResult<()> {
        self.move_tokens(from, to, amount)?;
        trace!(amount, "transfer");
        Ok(())
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> CogResult<()> {
        let allowance = self.allowance(owner, spender);
        let self_spend = spender == owner;
        if !self_spend && allowance < amount {
            return Err(CogError::InsufficientAllowance {
                available: allowance,
                requested: amount,
            });
        }

        self.move_tokens(owner, to, amount)?;
        if !self_spend && allowance != Amount::MAX {
            self.allowances.insert((*owner, *spender), allowance - amount);
        }
        trace!(amount, "transfer_from");
        Ok(())
    }
}

// ============ Tests ============

//! Rebase Ledger
//!
//! Aggregate debt as an elastic/base pair. `elastic` is what borrowers owe in
//! asset units and grows with interest; `base` is the number of debt shares
//! outstanding and only moves with principal. A borrower's debt is their
//! share of `base`, so interest compounds onto every position at once.
//!
//! ## Key Features
//!
//! - **1:1 bootstrap**: the first borrow into an empty ledger mints shares 1:1
//! - **Directed rounding**: callers choose rounding per conversion
//! - **Invariant**: `elastic >= base` holds after every mutation

use alloy_primitives::U256;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::precision::WAD;
use crate::errors::{CogError, CogResult};
use crate::math::{mul_div, narrow, safe_add, safe_sub, u256};
use crate::types::{Amount, UserPosition};

/// Elastic/base debt totals
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Rebase {
    /// Total debt owed, in asset units
    pub elastic: Amount,
    /// Total debt shares issued
    pub base: Amount,
}

impl Rebase {
    pub fn new(elastic: Amount, base: Amount) -> CogResult<Self> {
        let rebase = Self { elastic, base };
        rebase.check_invariant()?;
        Ok(rebase)
    }

    /// Fail with `DebtInvariantViolated` if `elastic < base`
    pub fn check_invariant(&self) -> CogResult<()> {
        if self.elastic < self.base {
            return Err(CogError::DebtInvariantViolated {
                elastic: self.elastic,
                base: self.base,
            });
        }
        Ok(())
    }

    // ============ Conversions ============

    /// Debt shares worth `elastic` asset units
    pub fn to_base(&self, elastic: Amount, round_up: bool) -> CogResult<Amount> {
        if self.base == 0 {
            return Ok(elastic);
        }
        mul_div(elastic, self.base, self.elastic, round_up)
    }

    /// Asset units owed for `base` debt shares
    pub fn to_elastic(&self, base: Amount, round_up: bool) -> CogResult<Amount> {
        if self.base == 0 {
            return Ok(base);
        }
        mul_div(base, self.elastic, self.base, round_up)
    }

    // ============ Raw Mutations ============

    /// Add `elastic` asset units of debt, returning the shares issued
    pub fn add(&mut self, elastic: Amount, round_up: bool) -> CogResult<Amount> {
        let base = self.to_base(elastic, round_up)?;
        let next = Rebase {
            elastic: safe_add(self.elastic, elastic)?,
            base: safe_add(self.base, base)?,
        };
        next.check_invariant()?;
        *self = next;
        Ok(base)
    }

    /// Remove `base` debt shares, returning the asset units they were worth
    pub fn sub(&mut self, base: Amount, round_up: bool) -> CogResult<Amount> {
        let elastic = self.to_elastic(base, round_up)?;
        let next = Rebase {
            elastic: safe_sub(self.elastic, elastic)?,
            base: safe_sub(self.base, base)?,
        };
        next.check_invariant()?;
        *self = next;
        Ok(elastic)
    }

    // ============ Ledger Operations ============

    /// Borrow `amount` asset units into `position`, returning the shares minted.
    pub fn add_debt(&mut self, position: &mut UserPosition, amount: Amount, round_up: bool) -> CogResult<Amount> {
        let mut next = *self;
        let shares = next.add(amount, round_up)?;
        position.borrow_part = safe_add(position.borrow_part, shares)?;
        *self = next;
        Ok(shares)
    }

    /// Burn `shares` of `position`'s debt, returning the asset amount owed
    /// for them (rounded up, so a full repayment clears the debt exactly).
    pub fn sub_debt(&mut self, position: &mut UserPosition, shares: Amount) -> CogResult<Amount> {
        if shares > position.borrow_part {
            return Err(CogError::InsufficientDebt {
                held: position.borrow_part,
                requested: shares,
            });
        }
        let amount = self.sub(shares, true)?;
        position.borrow_part -= shares;
        Ok(amount)
    }

    /// Grow `elastic` by `elastic * rate_per_second * elapsed / 1e18`.
    ///
    /// Returns the interest added. `base` is untouched.
    pub fn accrue(&mut self, elapsed: u64, rate_per_second: u64) -> CogResult<Amount> {
        if elapsed == 0 || self.elastic == 0 {
            return Ok(0);
        }
        let interest = u256(self.elastic)
            .checked_mul(U256::from(rate_per_second))
            .and_then(|v| v.checked_mul(U256::from(elapsed)))
            .ok_or(CogError::Overflow)?
            / u256(WAD);
        let interest = narrow(interest)?;
        self.elastic = safe_add(self.elastic, interest)?;
        Ok(interest)
    }
}

//! Mathematical Utilities for Cog Lending Pairs
//!
//! Checked fixed-point arithmetic. Amounts are stored as `u128`; every
//! product that can exceed 128 bits is computed in `U256` and narrowed back
//! with an overflow check.
//!
//! ## Scales
//!
//! - **1e18** ([`Wad`]): exchange rates, utilization, interest per second
//! - **1e5** ([`CollateralizationRate`], [`BorrowFeeRate`])
//! - **1e6** ([`ProtocolFeeRate`])
//!
//! Values on different scales are only combined after [`Ratio::rescale`].

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::constants::{interest, precision};
use crate::errors::{CogError, CogResult};

// ============ U256 Helpers ============

/// Widen a `u128` into `U256`
#[inline]
pub fn u256(value: u128) -> U256 {
    U256::from(value)
}

/// Narrow a `U256` back to `u128`, failing on overflow
#[inline]
pub fn narrow(value: U256) -> CogResult<u128> {
    u128::try_from(value).map_err(|_| CogError::Overflow)
}

/// The rate controller's elasticity (28800e36)
pub fn interest_elasticity() -> U256 {
    u256(interest::INTEREST_ELASTICITY_E36) * u256(precision::WAD) * u256(precision::WAD)
}

/// `a * b / denominator` in 256 bits, rounded down
pub fn mul_div_u256(a: U256, b: U256, denominator: U256) -> CogResult<U256> {
    if denominator.is_zero() {
        return Err(CogError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(CogError::Overflow)?;
    Ok(product / denominator)
}

/// `a * b / denominator` in 256 bits, rounded up
pub fn mul_div_u256_up(a: U256, b: U256, denominator: U256) -> CogResult<U256> {
    if denominator.is_zero() {
        return Err(CogError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(CogError::Overflow)?;
    let quotient = product / denominator;
    if (product % denominator).is_zero() {
        Ok(quotient)
    } else {
        quotient.checked_add(U256::from(1u8)).ok_or(CogError::Overflow)
    }
}

/// `a * b / denominator`, rounded down
pub fn mul_div_down(a: u128, b: u128, denominator: u128) -> CogResult<u128> {
    narrow(mul_div_u256(u256(a), u256(b), u256(denominator))?)
}

/// `a * b / denominator`, rounded up
pub fn mul_div_up(a: u128, b: u128, denominator: u128) -> CogResult<u128> {
    narrow(mul_div_u256_up(u256(a), u256(b), u256(denominator))?)
}

/// `a * b / denominator` with caller-selected rounding
pub fn mul_div(a: u128, b: u128, denominator: u128, round_up: bool) -> CogResult<u128> {
    if round_up {
        mul_div_up(a, b, denominator)
    } else {
        mul_div_down(a, b, denominator)
    }
}

/// Safe addition with overflow check
#[inline]
pub fn safe_add(a: u128, b: u128) -> CogResult<u128> {
    a.checked_add(b).ok_or(CogError::Overflow)
}

/// Safe subtraction with underflow check
#[inline]
pub fn safe_sub(a: u128, b: u128) -> CogResult<u128> {
    a.checked_sub(b).ok_or(CogError::Underflow)
}

// ============ Fixed-Point Ratios ============

/// A fixed-point value expressed against the integer denominator `SCALE`.
///
/// `Ratio::<100_000>::new(75_000)` is 0.75.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ratio<const SCALE: u128>(u128);

/// 1e18-scaled value (exchange rate, utilization)
pub type Wad = Ratio<{ precision::WAD }>;

/// Fraction of collateral value that may be borrowed against (1e5 scale)
pub type CollateralizationRate = Ratio<{ precision::COLLATERIZATION_RATE_PRECISION }>;

/// Opening fee charged on borrows (1e5 scale)
pub type BorrowFeeRate = Ratio<{ precision::BORROW_OPENING_FEE_PRECISION }>;

/// Protocol share of accrued interest (1e6 scale)
pub type ProtocolFeeRate = Ratio<{ precision::PROTOCOL_FEE_DIVISOR }>;

impl<const SCALE: u128> Ratio<SCALE> {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Exactly one
    pub const ONE: Self = Self(SCALE);

    /// Wrap a raw fixed-point value
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// The raw fixed-point integer
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// The denominator of this scale
    pub const fn scale() -> u128 {
        SCALE
    }

    /// True if the value lies in `[0, 1]`
    pub fn is_fraction(self) -> bool {
        self.0 <= SCALE
    }

    /// `amount * self`, rounded down
    pub fn apply_down(self, amount: u128) -> CogResult<u128> {
        mul_div_down(amount, self.0, SCALE)
    }

    /// `amount * self`, rounded up
    pub fn apply_up(self, amount: u128) -> CogResult<u128> {
        mul_div_up(amount, self.0, SCALE)
    }

    /// Re-express the value on another scale
    pub fn rescale<const TO: u128>(self, round_up: bool) -> CogResult<Ratio<TO>> {
        Ok(Ratio(mul_div(self.0, TO, SCALE, round_up)?))
    }

    /// `numerator / denominator` on this scale, rounded down
    pub fn from_fraction(numerator: u128, denominator: u128) -> CogResult<Self> {
        Ok(Self(mul_div_down(numerator, SCALE, denominator)?))
    }
}

impl<const SCALE: u128> Default for Ratio<SCALE> {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WAD: u128 = precision::WAD;

    #[test]
    fn test_mul_div_rounding() {
        assert_eq!(mul_div_down(10, 1, 3).unwrap(), 3);
        assert_eq!(mul_div_up(10, 1, 3).unwrap(), 4);
        assert_eq!(mul_div_up(9, 1, 3).unwrap(), 3);
    }

    #[test]
    fn test_mul_div_large_intermediate() {
        // 1e27 * 1e27 overflows u128 but not U256
        let big = 1_000_000_000 * WAD;
        assert_eq!(mul_div_down(big, big, big).unwrap(), big);
    }

    #[test]
    fn test_mul_div_division_by_zero() {
        assert_eq!(mul_div_down(1, 1, 0), Err(CogError::DivisionByZero));
        assert_eq!(mul_div_up(1, 1, 0), Err(CogError::DivisionByZero));
    }

    #[test]
    fn test_narrow_overflow() {
        let too_big = u256(u128::MAX) + U256::from(1u8);
        assert_eq!(narrow(too_big), Err(CogError::Overflow));
        assert_eq!(mul_div_down(u128::MAX, 2, 1), Err(CogError::Overflow));
    }

    #[test]
    fn test_safe_math() {
        assert_eq!(safe_add(1, 2).unwrap(), 3);
        assert_eq!(safe_add(u128::MAX, 1), Err(CogError::Overflow));
        assert_eq!(safe_sub(1, 2), Err(CogError::Underflow));
    }

    #[test]
    fn test_elasticity() {
        assert_eq!(interest_elasticity(), U256::from(28_800u64) * u256(WAD) * u256(WAD));
    }

    #[test]
    fn test_ratio_apply() {
        let cr = CollateralizationRate::new(75_000);
        assert_eq!(cr.apply_down(1000).unwrap(), 750);
        assert!(cr.is_fraction());

        let fee = BorrowFeeRate::new(50);
        // 0.05% of 1000e18 = 0.5e18
        assert_eq!(fee.apply_down(1000 * WAD).unwrap(), WAD / 2);
        assert_eq!(fee.apply_up(1).unwrap(), 1);
        assert_eq!(fee.apply_down(1).unwrap(), 0);
    }

    #[test]
    fn test_ratio_rescale() {
        let cr = CollateralizationRate::new(75_000);
        let as_wad: Wad = cr.rescale(false).unwrap();
        assert_eq!(as_wad.raw(), 750_000_000_000_000_000);

        let fee = ProtocolFeeRate::new(100_000);
        let back: ProtocolFeeRate = fee.rescale::<{ precision::WAD }>(false).unwrap().rescale(false).unwrap();
        assert_eq!(back, fee);
    }

    #[test]
    fn test_ratio_from_fraction() {
        let u = Wad::from_fraction(1, 4).unwrap();
        assert_eq!(u.raw(), WAD / 4);
        assert_eq!(Wad::from_fraction(1, 0), Err(CogError::DivisionByZero));
    }

    proptest! {
        #[test]
        fn prop_round_up_never_below_round_down(a in 0u128..u64::MAX as u128, b in 0u128..u64::MAX as u128, d in 1u128..u64::MAX as u128) {
            let down = mul_div_down(a, b, d).unwrap();
            let up = mul_div_up(a, b, d).unwrap();
            prop_assert!(up >= down);
            prop_assert!(up - down <= 1);
        }
    }
}

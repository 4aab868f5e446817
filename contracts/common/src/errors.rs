//! Error Types for Cog Lending Pairs
//!
//! Every rejection in the protocol is a typed, synchronous failure of the
//! whole call. Variants carry the amounts and addresses involved so callers
//! (bots, frontends, tests) can decide how to resubmit.

use thiserror::Error;

use crate::types::Address;

/// Result type alias for Cog operations
pub type CogResult<T> = Result<T, CogError>;

/// Main error enum for all Cog protocol errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CogError {
    // ============ Solvency Errors ============
    /// Borrow or collateral removal would leave the position insolvent
    #[error("insufficient collateral: {collateral_value} available against {debt_value} of debt")]
    InsufficientCollateral { collateral_value: u128, debt_value: u128 },

    /// Position is solvent and cannot be liquidated
    #[error("cannot liquidate solvent user")]
    CannotLiquidateSolventUser { user: Address },

    /// No exchange rate has ever been observed by the pair
    #[error("exchange rate unavailable")]
    ExchangeRateUnavailable,

    // ============ Debt Errors ============
    /// Debt share operation references more shares than the user holds
    #[error("insufficient debt: user holds {held} debt shares, {requested} requested")]
    InsufficientDebt { held: u128, requested: u128 },

    /// Repayment exceeds the outstanding borrow part
    #[error("overpayment: outstanding borrow part {outstanding}, repay of {requested} requested")]
    Overpayment { outstanding: u128, requested: u128 },

    /// Ledger mutation would break the elastic >= base invariant
    #[error("debt invariant violated: elastic {elastic} < base {base}")]
    DebtInvariantViolated { elastic: u128, base: u128 },

    // ============ Token Errors ============
    /// Token collaborator: source account lacks funds
    #[error("insufficient balance: {available} available, {requested} requested")]
    InsufficientBalance { available: u128, requested: u128 },

    /// Token collaborator: spender lacks allowance
    #[error("insufficient allowance: {available} approved, {requested} requested")]
    InsufficientAllowance { available: u128, requested: u128 },

    /// Pool holds fewer assets than a withdrawal asks for
    #[error("insufficient liquidity: {available} held, {requested} requested")]
    InsufficientLiquidity { available: u128, requested: u128 },

    /// Lender share allowance too small for a delegated withdraw/redeem
    #[error("insufficient share allowance: {available} approved, {requested} requested")]
    InsufficientShareAllowance { available: u128, requested: u128 },

    /// Borrow allowance too small for a delegated borrow
    #[error("insufficient borrow allowance: {available} approved, {requested} requested")]
    InsufficientBorrowAllowance { available: u128, requested: u128 },

    /// Zero amount not allowed
    #[error("zero amount")]
    ZeroAmount,

    // ============ Authorization Errors ============
    /// Caller is not authorized for this operation
    #[error("unauthorized caller")]
    Unauthorized { expected: Address, actual: Address },

    // ============ State Errors ============
    /// Mutating call on a paused pool
    #[error("pool is paused")]
    PoolPaused,

    /// Collaborator handed to a pool is not the one it was bound to
    #[error("collaborator mismatch for {role}")]
    CollaboratorMismatch { role: &'static str },

    /// A pair for this (asset, collateral, oracle, tier) already exists
    #[error("pair already exists")]
    PairAlreadyExists { pair_id: [u8; 32] },

    // ============ Parameter Errors ============
    /// Fee or parameter beyond its hard cap
    #[error("{param} out of bounds: {value} exceeds cap {max}")]
    ParameterOutOfBounds { param: &'static str, value: u128, max: u128 },

    /// Invalid input parameter
    #[error("invalid {param}: {reason}")]
    InvalidInput { param: &'static str, reason: &'static str },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow occurred
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,
}

impl CogError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientCollateral { .. } => "E001_INSUFFICIENT_COLLATERAL",
            Self::CannotLiquidateSolventUser { .. } => "E002_SOLVENT_USER",
            Self::ExchangeRateUnavailable => "E003_NO_EXCHANGE_RATE",
            Self::InsufficientDebt { .. } => "E010_INSUFFICIENT_DEBT",
            Self::Overpayment { .. } => "E011_OVERPAYMENT",
            Self::DebtInvariantViolated { .. } => "E012_DEBT_INVARIANT",
            Self::InsufficientBalance { .. } => "E020_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E021_INSUFFICIENT_ALLOWANCE",
            Self::InsufficientLiquidity { .. } => "E022_INSUFFICIENT_LIQUIDITY",
            Self::InsufficientShareAllowance { .. } => "E023_SHARE_ALLOWANCE",
            Self::InsufficientBorrowAllowance { .. } => "E024_BORROW_ALLOWANCE",
            Self::ZeroAmount => "E025_ZERO_AMOUNT",
            Self::Unauthorized { .. } => "E030_UNAUTHORIZED",
            Self::PoolPaused => "E040_PAUSED",
            Self::CollaboratorMismatch { .. } => "E041_COLLABORATOR_MISMATCH",
            Self::PairAlreadyExists { .. } => "E042_PAIR_EXISTS",
            Self::ParameterOutOfBounds { .. } => "E050_OUT_OF_BOUNDS",
            Self::InvalidInput { .. } => "E051_INVALID_INPUT",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
        }
    }

    /// Returns true if this error is recoverable (caller can fix it)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientCollateral { .. } => true, // Add more collateral
            Self::InsufficientBalance { .. } => true,    // Get more funds
            Self::InsufficientAllowance { .. } => true,  // Approve more
            Self::Overpayment { .. } => true,            // Clamp the repay
            Self::InsufficientLiquidity { .. } => true,  // Wait for repayments
            Self::ExchangeRateUnavailable => true,       // Refresh the rate
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            CogError::InsufficientCollateral { collateral_value: 1, debt_value: 2 },
            CogError::CannotLiquidateSolventUser { user: [0u8; 32] },
            CogError::ExchangeRateUnavailable,
            CogError::InsufficientDebt { held: 0, requested: 1 },
            CogError::Overpayment { outstanding: 0, requested: 1 },
            CogError::DebtInvariantViolated { elastic: 0, base: 1 },
            CogError::InsufficientBalance { available: 0, requested: 1 },
            CogError::InsufficientAllowance { available: 0, requested: 1 },
            CogError::InsufficientLiquidity { available: 0, requested: 1 },
            CogError::InsufficientShareAllowance { available: 0, requested: 1 },
            CogError::InsufficientBorrowAllowance { available: 0, requested: 1 },
            CogError::ZeroAmount,
            CogError::Unauthorized { expected: [0u8; 32], actual: [1u8; 32] },
            CogError::PoolPaused,
            CogError::CollaboratorMismatch { role: "oracle" },
            CogError::PairAlreadyExists { pair_id: [0u8; 32] },
            CogError::ParameterOutOfBounds { param: "fee", value: 2, max: 1 },
            CogError::InvalidInput { param: "x", reason: "y" },
            CogError::Overflow,
            CogError::Underflow,
            CogError::DivisionByZero,
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_display_carries_amounts() {
        let err = CogError::InsufficientBalance { available: 5, requested: 9 };
        assert_eq!(err.to_string(), "insufficient balance: 5 available, 9 requested");

        let err = CogError::ParameterOutOfBounds { param: "borrow_fee", value: 50_001, max: 50_000 };
        assert!(err.to_string().contains("50001"));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(CogError::InsufficientCollateral { collateral_value: 0, debt_value: 1 }.is_recoverable());
        assert!(!CogError::PoolPaused.is_recoverable());
        assert!(!CogError::Unauthorized { expected: [0u8; 32], actual: [1u8; 32] }.is_recoverable());
    }
}

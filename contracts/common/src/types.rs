//! Core Types for Cog Lending Pairs
//!
//! Identifiers and per-account records shared by every crate in the
//! workspace.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

// ============ Identifiers ============

/// 32-byte account / contract address
pub type Address = [u8; 32];

/// Unique identifier for a deployed pair (SHA-256 of its binding)
pub type PairId = [u8; 32];

/// Token amount in the token's smallest unit
pub type Amount = u128;

/// Seconds since the Unix epoch
pub type Timestamp = u64;

/// The zero address: a renounced owner, or "nobody"
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Returns true if the address is the zero address
pub fn is_zero_address(address: &Address) -> bool {
    address == &ZERO_ADDRESS
}

// ============ Positions ============

/// A borrower's position inside a pair.
///
/// Positions are created implicitly on first use and are never removed;
/// a fully closed position simply holds zeros.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct UserPosition {
    /// Collateral token units owned inside the pair (1:1 with deposits)
    pub collateral_share: Amount,
    /// Debt shares drawn from the pair's total borrow base
    pub borrow_part: Amount,
}

impl UserPosition {
    /// True if the position carries no debt
    pub fn is_debt_free(&self) -> bool {
        self.borrow_part == 0
    }

    /// True if the position holds neither collateral nor debt
    pub fn is_empty(&self) -> bool {
        self.collateral_share == 0 && self.borrow_part == 0
    }
}

//! Protocol Events for Cog Lending Pairs
//!
//! Events are emitted during execution into the caller's [`EventLog`] and
//! can be indexed off-chain for dashboards, liquidation bots and analytics.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, PairId, Timestamp};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Lending Events (0x01 - 0x1F)
    Deposit = 0x01,
    Withdraw = 0x02,
    AddCollateral = 0x03,
    RemoveCollateral = 0x04,
    Borrow = 0x05,
    Repay = 0x06,
    Liquidate = 0x07,
    BorrowApproval = 0x08,
    ShareTransfer = 0x09,
    ShareApproval = 0x0A,

    // Interest Events (0x20 - 0x3F)
    LogAccrue = 0x20,
    SurgeStarted = 0x21,
    SurgeEnded = 0x22,
    FeesRolledOver = 0x23,

    // Oracle Events (0x40 - 0x5F)
    ExchangeRateUpdated = 0x40,
    SourceActivated = 0x41,
    SourceDefused = 0x42,

    // Admin Events (0x60 - 0x7F)
    Paused = 0x60,
    Unpaused = 0x61,
    FeeUpdated = 0x62,
    OwnershipTransferStarted = 0x63,
    OwnershipTransferred = 0x64,

    // Factory Events (0x80 - 0x9F)
    PairDeployed = 0x80,
    PrivilegedUserUpdated = 0x81,
    FeeToChanged = 0x82,
}

/// Which adjustable fee an update touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum FeeKind {
    /// Borrow opening fee (1e5 scale)
    BorrowOpening = 0,
    /// Default protocol share of interest (1e6 scale)
    DefaultProtocol = 1,
}

/// Main event enum containing all possible protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum CogEvent {
    // ============ Lending Events ============

    /// Assets deposited for lender shares
    Deposit {
        caller: Address,
        owner: Address,
        assets: Amount,
        shares: Amount,
        timestamp: Timestamp,
    },

    /// Lender shares burned for assets
    Withdraw {
        caller: Address,
        receiver: Address,
        owner: Address,
        assets: Amount,
        shares: Amount,
        timestamp: Timestamp,
    },

    /// Collateral credited to a position
    AddCollateral {
        from: Address,
        to: Address,
        amount: Amount,
        timestamp: Timestamp,
    },

    /// Collateral released from a position
    RemoveCollateral {
        from: Address,
        to: Address,
        amount: Amount,
        timestamp: Timestamp,
    },

    /// Assets borrowed against collateral
    Borrow {
        owner: Address,
        receiver: Address,
        amount: Amount,
        fee: Amount,
        part: Amount,
        timestamp: Timestamp,
    },

    /// Debt repaid
    Repay {
        payer: Address,
        to: Address,
        amount: Amount,
        part: Amount,
        timestamp: Timestamp,
    },

    /// Insolvent position liquidated
    Liquidate {
        liquidator: Address,
        to: Address,
        user: Address,
        part: Amount,
        amount: Amount,
        collateral_seized: Amount,
        timestamp: Timestamp,
    },

    /// Borrow allowance granted
    BorrowApproval {
        owner: Address,
        spender: Address,
        amount: Amount,
        timestamp: Timestamp,
    },

    /// Lender shares moved between accounts
    ShareTransfer {
        from: Address,
        to: Address,
        shares: Amount,
        timestamp: Timestamp,
    },

    /// Lender share allowance granted
    ShareApproval {
        owner: Address,
        spender: Address,
        shares: Amount,
        timestamp: Timestamp,
    },

    // ============ Interest Events ============

    /// Interest accrued onto the debt ledger
    LogAccrue {
        interest: Amount,
        protocol_fee: Amount,
        interest_per_second: u64,
        utilization: u128,
        timestamp: Timestamp,
    },

    /// Protocol fee jumped to the surge value
    SurgeStarted {
        utilization: u128,
        timestamp: Timestamp,
    },

    /// Protocol fee returned to its default
    SurgeEnded {
        utilization: u128,
        timestamp: Timestamp,
    },

    /// Accrued protocol fees minted as lender shares
    FeesRolledOver {
        fee_to: Address,
        assets: Amount,
        shares: Amount,
        timestamp: Timestamp,
    },

    // ============ Oracle Events ============

    /// Pair cached a fresh exchange rate
    ExchangeRateUpdated {
        rate: u128,
        timestamp: Timestamp,
    },

    /// Fuse box source re-enabled
    SourceActivated {
        index: u8,
        by: Address,
        timestamp: Timestamp,
    },

    /// Fuse box source disabled
    SourceDefused {
        index: u8,
        by: Address,
        timestamp: Timestamp,
    },

    // ============ Admin Events ============

    /// Pair paused
    Paused {
        by: Address,
        timestamp: Timestamp,
    },

    /// Pair unpaused
    Unpaused {
        by: Address,
        timestamp: Timestamp,
    },

    /// Adjustable fee changed
    FeeUpdated {
        kind: FeeKind,
        old_fee: u128,
        new_fee: u128,
        timestamp: Timestamp,
    },

    /// Two-step ownership transfer initiated
    OwnershipTransferStarted {
        owner: Address,
        pending_owner: Address,
        timestamp: Timestamp,
    },

    /// Ownership transfer completed (zero new owner = renounced)
    OwnershipTransferred {
        old_owner: Address,
        new_owner: Address,
        timestamp: Timestamp,
    },

    // ============ Factory Events ============

    /// New pair deployed
    PairDeployed {
        pair_id: PairId,
        asset: Address,
        collateral: Address,
        oracle: Address,
        tier: u8,
        timestamp: Timestamp,
    },

    /// Pause privilege granted or revoked
    PrivilegedUserUpdated {
        user: Address,
        status: bool,
        timestamp: Timestamp,
    },

    /// Fee recipient changed
    FeeToChanged {
        old_fee_to: Address,
        new_fee_to: Address,
        timestamp: Timestamp,
    },
}

impl CogEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Deposit { .. } => EventType::Deposit,
            Self::Withdraw { .. } => EventType::Withdraw,
            Self::AddCollateral { .. } => EventType::AddCollateral,
            Self::RemoveCollateral { .. } => EventType::RemoveCollateral,
            Self::Borrow { .. } => EventType::Borrow,
            Self::Repay { .. } => EventType::Repay,
            Self::Liquidate { .. } => EventType::Liquidate,
            Self::BorrowApproval { .. } => EventType::BorrowApproval,
            Self::ShareTransfer { .. } => EventType::ShareTransfer,
            Self::ShareApproval { .. } => EventType::ShareApproval,
            Self::LogAccrue { .. } => EventType::LogAccrue,
            Self::SurgeStarted { .. } => EventType::SurgeStarted,
            Self::SurgeEnded { .. } => EventType::SurgeEnded,
            Self::FeesRolledOver { .. } => EventType::FeesRolledOver,
            Self::ExchangeRateUpdated { .. } => EventType::ExchangeRateUpdated,
            Self::SourceActivated { .. } => EventType::SourceActivated,
            Self::SourceDefused { .. } => EventType::SourceDefused,
            Self::Paused { .. } => EventType::Paused,
            Self::Unpaused { .. } => EventType::Unpaused,
            Self::FeeUpdated { .. } => EventType::FeeUpdated,
            Self::OwnershipTransferStarted { .. } => EventType::OwnershipTransferStarted,
            Self::OwnershipTransferred { .. } => EventType::OwnershipTransferred,
            Self::PairDeployed { .. } => EventType::PairDeployed,
            Self::PrivilegedUserUpdated { .. } => EventType::PrivilegedUserUpdated,
            Self::FeeToChanged { .. } => EventType::FeeToChanged,
        }
    }

    /// Get the timestamp when the event occurred
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Deposit { timestamp, .. }
            | Self::Withdraw { timestamp, .. }
            | Self::AddCollateral { timestamp, .. }
            | Self::RemoveCollateral { timestamp, .. }
            | Self::Borrow { timestamp, .. }
            | Self::Repay { timestamp, .. }
            | Self::Liquidate { timestamp, .. }
            | Self::BorrowApproval { timestamp, .. }
            | Self::ShareTransfer { timestamp, .. }
            | Self::ShareApproval { timestamp, .. }
            | Self::LogAccrue { timestamp, .. }
            | Self::SurgeStarted { timestamp, .. }
            | Self::SurgeEnded { timestamp, .. }
            | Self::FeesRolledOver { timestamp, .. }
            | Self::ExchangeRateUpdated { timestamp, .. }
            | Self::SourceActivated { timestamp, .. }
            | Self::SourceDefused { timestamp, .. }
            | Self::Paused { timestamp, .. }
            | Self::Unpaused { timestamp, .. }
            | Self::FeeUpdated { timestamp, .. }
            | Self::OwnershipTransferStarted { timestamp, .. }
            | Self::OwnershipTransferred { timestamp, .. }
            | Self::PairDeployed { timestamp, .. }
            | Self::PrivilegedUserUpdated { timestamp, .. }
            | Self::FeeToChanged { timestamp, .. } => *timestamp,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting multiple events during execution
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<CogEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: CogEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[CogEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<CogEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&CogEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Drop events recorded after `len`, used when a call is rolled back
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = CogEvent::Borrow {
            owner: [1u8; 32],
            receiver: [2u8; 32],
            amount: 1_000,
            fee: 1,
            part: 1_001,
            timestamp: 100,
        };

        assert_eq!(event.event_type(), EventType::Borrow);
        assert_eq!(event.timestamp(), 100);
    }

    #[test]
    fn test_event_serialization() {
        let event = CogEvent::FeeUpdated {
            kind: FeeKind::DefaultProtocol,
            old_fee: 100_000,
            new_fee: 500_000,
            timestamp: 200,
        };

        let bytes = event.to_bytes();
        let restored = CogEvent::from_bytes(&bytes).unwrap();

        assert_eq!(event, restored);
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();

        log.emit(CogEvent::Deposit {
            caller: [1u8; 32],
            owner: [1u8; 32],
            assets: 100,
            shares: 100,
            timestamp: 1,
        });
        log.emit(CogEvent::SurgeStarted { utilization: 990_000_000_000_000_000, timestamp: 2 });

        assert_eq!(log.len(), 2);
        assert!(log.has_events());
        assert_eq!(log.filter_by_type(EventType::SurgeStarted).len(), 1);

        log.truncate(1);
        assert_eq!(log.len(), 1);
        assert!(log.filter_by_type(EventType::SurgeStarted).is_empty());

        log.clear();
        assert!(!log.has_events());
    }
}

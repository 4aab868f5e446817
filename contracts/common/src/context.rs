//! Call context for administered components

use crate::clock::Clock;
use crate::events::EventLog;
use crate::types::{Address, Timestamp};

/// Who is calling, when, and where events go
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Caller address
    pub signer: Address,
    /// Time of the call
    pub timestamp: Timestamp,
    /// Event log
    pub events: EventLog,
}

impl CallContext {
    pub fn new(signer: Address, timestamp: Timestamp) -> Self {
        Self {
            signer,
            timestamp,
            events: EventLog::new(),
        }
    }

    /// Context stamped with the clock's current time
    pub fn at(signer: Address, clock: &dyn Clock) -> Self {
        Self::new(signer, clock.current_timestamp())
    }
}

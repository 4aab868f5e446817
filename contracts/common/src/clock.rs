//! Clock capability
//!
//! Time only advances interest when an operation reads it; a pair never
//! accrues in the background.

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::{CogError, CogResult};
use crate::types::Timestamp;

/// Monotonically non-decreasing source of seconds
pub trait Clock {
    fn current_timestamp(&self) -> Timestamp;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_timestamp(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// Hand-driven clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { now: Cell::new(start) }
    }

    /// Move forward by `seconds`
    pub fn advance(&self, seconds: u64) {
        self.now.set(self.now.get().saturating_add(seconds));
    }

    /// Jump to `timestamp`; moving backwards is rejected
    pub fn set(&self, timestamp: Timestamp) -> CogResult<()> {
        if timestamp < self.now.get() {
            return Err(CogError::InvalidInput {
                param: "timestamp",
                reason: "clock cannot move backwards",
            });
        }
        self.now.set(timestamp);
        Ok(())
    }
}

impl Clock for ManualClock {
    fn current_timestamp(&self) -> Timestamp {
        self.now.get()
    }
}

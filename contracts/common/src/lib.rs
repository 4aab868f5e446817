//! Cog Common Library
//!
//! Shared types, constants, and utilities for Cog lending pairs.
//!
//! ## Modules
//!
//! - **Rebase Ledger**: elastic/base debt accounting with directed rounding
//! - **Interest Controller**: utilization-targeting rate with surge mode
//! - **Math**: checked fixed-point arithmetic with 256-bit intermediates
//! - **Collaborators**: token, price feed and clock capabilities, plus
//!   hand-driven doubles for tests and simulations
//! - **Access Control**: two-step ownership
//! - **Events**: typed protocol events and the per-call event log
//! - **Configuration**: risk tier presets and pool parameters

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod access_control;
pub mod rebase;
pub mod interest;
pub mod config;
pub mod token_ops;
pub mod oracle;
pub mod clock;
pub mod context;

// Re-exports for convenience
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use access_control::*;
pub use rebase::*;
pub use interest::*;
pub use config::*;
pub use token_ops::*;
pub use oracle::*;
pub use clock::*;
pub use context::*;

//! Cog Pair - Isolated Lending Pool
//!
//! One pair lends a single asset token against a single collateral token.
//! Lenders hold ERC-4626 style shares over the pool's assets; borrowers post
//! collateral and draw debt shares from a rebasing ledger that grows with
//! interest.
//!
//! ## Core Operations
//!
//! - **Deposit / Mint / Withdraw / Redeem**: lender share accounting
//! - **AddCollateral / RemoveCollateral**: manage a borrower's collateral
//! - **Borrow / Repay**: draw and return debt shares
//! - **Liquidate**: cover an insolvent position's debt for its collateral
//! - **Accrue**: charge the interest banked since the last interaction
//! - **RollOverPol**: mint accrued protocol fees as lender shares
//!
//! ## Execution Model
//!
//! Every entry point takes `&mut self`, runs to completion and either
//! commits fully or leaves the pair untouched. Collaborators (token ledgers,
//! price feed, clock) are handed in per call through [`PairEnv`] and checked
//! against the identities the pair was deployed with.
//!
//! ## Exchange Rate
//!
//! The cached exchange rate is the amount of collateral (1e18 fixed point)
//! worth one unit of asset. A position is solvent while
//! `collateral * COLLATERIZATION_RATE >= owed * exchange_rate`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cog_common::{
    clock::Clock,
    config::PoolConfig,
    constants::fees::{MAX_BORROW_OPENING_FEE, MAX_PROTOCOL_FEE},
    context::CallContext,
    errors::{CogError, CogResult},
    events::{CogEvent, EventLog, FeeKind},
    interest::{AccrueInfo, InterestController, SurgeTransition},
    math::{BorrowFeeRate, ProtocolFeeRate, Wad},
    oracle::PriceFeed,
    rebase::Rebase,
    token_ops::{require_token, TokenLedger},
    types::{Address, Amount, Timestamp, UserPosition},
};

pub mod lending;
pub mod solvency;
pub mod vault;

pub use solvency::LiquidationOutcome;
pub use vault::ShareLedger;

#[cfg(test)]
mod test_utils;

// ============ Pair Identity ============

/// Addresses a pair is bound to at deploy time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairBinding {
    /// The pair's own account on both token ledgers
    pub pair: Address,
    pub asset: Address,
    pub collateral: Address,
    pub oracle: Address,
}

// ============ Call Environment ============

/// Collaborators and caller of one pair operation
pub struct PairEnv<'a> {
    /// Caller address
    pub signer: Address,
    /// Time of the call, read once from the clock
    pub timestamp: Timestamp,
    pub asset: &'a mut dyn TokenLedger,
    pub collateral: &'a mut dyn TokenLedger,
    pub oracle: &'a dyn PriceFeed,
    /// Events emitted by the call
    pub events: EventLog,
}

impl<'a> PairEnv<'a> {
    pub fn new(
        signer: Address,
        clock: &dyn Clock,
        asset: &'a mut dyn TokenLedger,
        collateral: &'a mut dyn TokenLedger,
        oracle: &'a dyn PriceFeed,
    ) -> Self {
        Self {
            signer,
            timestamp: clock.current_timestamp(),
            asset,
            collateral,
            oracle,
            events: EventLog::new(),
        }
    }
}

// ============ Pair State ============

/// Mutable state of a pair; cloned as a snapshot around every mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairState {
    /// Aggregate debt
    pub total_borrow: Rebase,
    /// Rate controller, accrual bookkeeping and surge state
    pub interest: InterestController,
    /// Collateral units held for borrowers
    pub total_collateral_share: Amount,
    /// Asset units held by the pair (not lent out)
    pub held_assets: Amount,
    /// Borrower positions
    pub positions: BTreeMap<Address, UserPosition>,
    /// (owner, spender) -> assets the spender may borrow for the owner
    pub borrow_allowances: BTreeMap<(Address, Address), Amount>,
    /// Lender shares
    pub shares: ShareLedger,
    /// Last exchange rate seen from the oracle (0 = never)
    pub exchange_rate: u128,
    pub borrow_opening_fee: BorrowFeeRate,
    pub default_protocol_fee: ProtocolFeeRate,
    /// Recipient of rolled-over protocol fees
    pub fee_to: Address,
    pub paused: bool,
}

/// A lending pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CogPair {
    binding: PairBinding,
    /// Deployer; the only caller allowed to pause and tune fees
    factory: Address,
    config: PoolConfig,
    state: PairState,
}

impl CogPair {
    /// Deploy a pair. Interest starts accruing from `now`.
    pub fn new(
        binding: PairBinding,
        factory: Address,
        fee_to: Address,
        config: PoolConfig,
        now: Timestamp,
    ) -> CogResult<Self> {
        config.validate()?;
        Ok(Self {
            binding,
            factory,
            config,
            state: PairState {
                total_borrow: Rebase::default(),
                interest: InterestController::new(config.interest, config.surge, now),
                total_collateral_share: 0,
                held_assets: 0,
                positions: BTreeMap::new(),
                borrow_allowances: BTreeMap::new(),
                shares: ShareLedger::default(),
                exchange_rate: 0,
                borrow_opening_fee: config.borrow_opening_fee,
                default_protocol_fee: config.default_protocol_fee,
                fee_to,
                paused: false,
            },
        })
    }

    // ============ Queries ============

    pub fn binding(&self) -> &PairBinding {
        &self.binding
    }

    pub fn address(&self) -> Address {
        self.binding.pair
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn state(&self) -> &PairState {
        &self.state
    }

    pub fn total_borrow(&self) -> Rebase {
        self.state.total_borrow
    }

    pub fn accrue_info(&self) -> AccrueInfo {
        self.state.interest.accrue_info
    }

    pub fn position(&self, user: &Address) -> UserPosition {
        self.state.positions.get(user).copied().unwrap_or_default()
    }

    pub fn user_collateral_share(&self, user: &Address) -> Amount {
        self.position(user).collateral_share
    }

    pub fn user_borrow_part(&self, user: &Address) -> Amount {
        self.position(user).borrow_part
    }

    pub fn total_collateral_share(&self) -> Amount {
        self.state.total_collateral_share
    }

    pub fn held_assets(&self) -> Amount {
        self.state.held_assets
    }

    pub fn borrow_allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state
            .borrow_allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn exchange_rate(&self) -> u128 {
        self.state.exchange_rate
    }

    pub fn is_surging(&self) -> bool {
        self.state.interest.is_surging()
    }

    /// Protocol share of interest currently in force (1e6 scale)
    pub fn protocol_fee(&self) -> ProtocolFeeRate {
        if self.is_surging() {
            self.config.surge_protocol_fee
        } else {
            self.state.default_protocol_fee
        }
    }

    pub fn borrow_opening_fee(&self) -> BorrowFeeRate {
        self.state.borrow_opening_fee
    }

    pub fn fee_to(&self) -> Address {
        self.state.fee_to
    }

    pub fn paused(&self) -> bool {
        self.state.paused
    }

    /// Debt outstanding over everything the pool manages
    pub fn utilization(&self) -> CogResult<Wad> {
        cog_common::interest::utilization(self.state.total_borrow.elastic, self.state.held_assets)
    }

    // ============ Interest ============

    /// Charge interest for the time since the last accrual
    pub fn accrue(&mut self, env: &mut PairEnv) -> CogResult<()> {
        self.atomically(env, |pair, env| {
            pair.begin(env)?;
            Ok(())
        })
    }

    /// Refresh the cached exchange rate from the oracle.
    ///
    /// Returns the oracle's freshness flag and the rate now cached; a stale
    /// reading leaves the cached rate in place.
    pub fn get_exchange_rate(&mut self, env: &mut PairEnv) -> CogResult<(bool, u128)> {
        self.atomically(env, |pair, env| {
            pair.require_not_paused()?;
            pair.require_collaborators(env)?;
            pair.update_exchange_rate(env)
        })
    }

    // ============ Admin ============

    pub fn pause(&mut self, ctx: &mut CallContext) -> CogResult<()> {
        self.require_factory(&ctx.signer)?;
        self.state.paused = true;
        info!("pair paused");
        ctx.events.emit(CogEvent::Paused { by: ctx.signer, timestamp: ctx.timestamp });
        Ok(())
    }

    pub fn unpause(&mut self, ctx: &mut CallContext) -> CogResult<()> {
        self.require_factory(&ctx.signer)?;
        self.state.paused = false;
        info!("pair unpaused");
        ctx.events.emit(CogEvent::Unpaused { by: ctx.signer, timestamp: ctx.timestamp });
        Ok(())
    }

    /// Set the borrow opening fee (1e5 scale, capped at 50%)
    pub fn set_borrow_fee(&mut self, ctx: &mut CallContext, fee: BorrowFeeRate) -> CogResult<()> {
        self.require_factory(&ctx.signer)?;
        if fee.raw() > MAX_BORROW_OPENING_FEE {
            return Err(CogError::ParameterOutOfBounds {
                param: "borrow_opening_fee",
                value: fee.raw(),
                max: MAX_BORROW_OPENING_FEE,
            });
        }
        let old_fee = self.state.borrow_opening_fee;
        self.state.borrow_opening_fee = fee;
        ctx.events.emit(CogEvent::FeeUpdated {
            kind: FeeKind::BorrowOpening,
            old_fee: old_fee.raw(),
            new_fee: fee.raw(),
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    /// Set the protocol share of interest outside surge (1e6 scale, capped at 100%)
    pub fn set_default_protocol_fee(&mut self, ctx: &mut CallContext, fee: ProtocolFeeRate) -> CogResult<()> {
        self.require_factory(&ctx.signer)?;
        if fee.raw() > MAX_PROTOCOL_FEE {
            return Err(CogError::ParameterOutOfBounds {
                param: "default_protocol_fee",
                value: fee.raw(),
                max: MAX_PROTOCOL_FEE,
            });
        }
        let old_fee = self.state.default_protocol_fee;
        self.state.default_protocol_fee = fee;
        ctx.events.emit(CogEvent::FeeUpdated {
            kind: FeeKind::DefaultProtocol,
            old_fee: old_fee.raw(),
            new_fee: fee.raw(),
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    /// Point protocol fee roll-overs at `fee_to`
    pub fn set_fee_to(&mut self, ctx: &mut CallContext, fee_to: Address) -> CogResult<()> {
        self.require_factory(&ctx.signer)?;
        self.state.fee_to = fee_to;
        Ok(())
    }

    // ============ Internal ============

    /// Run `op`, restoring state and dropping its events if it fails
    pub(crate) fn atomically<R>(
        &mut self,
        env: &mut PairEnv,
        op: impl FnOnce(&mut Self, &mut PairEnv) -> CogResult<R>,
    ) -> CogResult<R> {
        let snapshot = self.state.clone();
        let mark = env.events.len();
        let result = op(self, env);
        if result.is_err() {
            self.state = snapshot;
            env.events.truncate(mark);
        }
        result
    }

    /// Common prologue of every mutating entry point
    pub(crate) fn begin(&mut self, env: &mut PairEnv) -> CogResult<()> {
        self.require_not_paused()?;
        self.require_collaborators(env)?;
        self.accrue_at(env)
    }

    pub(crate) fn require_not_paused(&self) -> CogResult<()> {
        if self.state.paused {
            return Err(CogError::PoolPaused);
        }
        Ok(())
    }

    fn require_factory(&self, caller: &Address) -> CogResult<()> {
        if *caller != self.factory {
            return Err(CogError::Unauthorized {
                expected: self.factory,
                actual: *caller,
            });
        }
        Ok(())
    }

    fn require_collaborators(&self, env: &PairEnv) -> CogResult<()> {
        require_token(&*env.asset, &self.binding.asset, "asset")?;
        require_token(&*env.collateral, &self.binding.collateral, "collateral")?;
        if env.oracle.feed_id() != self.binding.oracle {
            return Err(CogError::CollaboratorMismatch { role: "oracle" });
        }
        Ok(())
    }

    fn accrue_at(&mut self, env: &mut PairEnv) -> CogResult<()> {
        let fee = self.protocol_fee();
        let outcome = self.state.interest.accrue(
            &mut self.state.total_borrow,
            self.state.held_assets,
            fee,
            env.timestamp,
        )?;
        let Some(outcome) = outcome else {
            return Ok(());
        };

        env.events.emit(CogEvent::LogAccrue {
            interest: outcome.interest,
            protocol_fee: outcome.protocol_fee,
            interest_per_second: outcome.interest_per_second,
            utilization: outcome.utilization.raw(),
            timestamp: env.timestamp,
        });
        match outcome.transition {
            Some(SurgeTransition::Started) => env.events.emit(CogEvent::SurgeStarted {
                utilization: outcome.utilization.raw(),
                timestamp: env.timestamp,
            }),
            Some(SurgeTransition::Ended) => env.events.emit(CogEvent::SurgeEnded {
                utilization: outcome.utilization.raw(),
                timestamp: env.timestamp,
            }),
            None => {}
        }
        Ok(())
    }

    pub(crate) fn update_exchange_rate(&mut self, env: &mut PairEnv) -> CogResult<(bool, u128)> {
        let reading = env.oracle.get();
        if reading.updated && reading.price > 0 {
            self.state.exchange_rate = reading.price;
            env.events.emit(CogEvent::ExchangeRateUpdated {
                rate: reading.price,
                timestamp: env.timestamp,
            });
        } else {
            warn!(cached = self.state.exchange_rate, "stale exchange rate, keeping cached value");
        }
        Ok((reading.updated, self.state.exchange_rate))
    }

    pub(crate) fn position_mut(&mut self, user: &Address) -> &mut UserPosition {
        self.state.positions.entry(*user).or_default()
    }
}

// ============ Tests ============

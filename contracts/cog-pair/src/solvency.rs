//! Solvency and Liquidation
//!
//! A position is solvent while its collateral, discounted by the
//! collateralization rate, covers what it owes at the cached exchange rate:
//!
//! ```text
//! collateral_share * CR >= owed(borrow_part) * exchange_rate
//! ```
//!
//! Both sides are compared in 256-bit arithmetic on the 1e18 scale. Owed
//! amounts round up so the check never flatters the borrower.
//!
//! Liquidators repay debt shares of an insolvent position and receive the
//! collateral those assets are worth, grossed up by the same
//! collateralization rate.

use serde::{Deserialize, Serialize};
use tracing::info;

use cog_common::{
    constants::precision::{COLLATERIZATION_RATE_PRECISION, WAD},
    errors::{CogError, CogResult},
    events::CogEvent,
    math::{mul_div_down, mul_div_u256, narrow, safe_add, safe_sub, u256, Wad},
    token_ops::require_transferable,
    types::{Address, Amount},
};

use crate::{CogPair, PairEnv};

/// Result of a liquidation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationOutcome {
    /// Debt shares burned
    pub part: Amount,
    /// Assets paid by the liquidator
    pub amount: Amount,
    /// Collateral sent to the liquidator
    pub collateral_seized: Amount,
}

impl CogPair {
    /// True if `user` is solvent at the cached exchange rate.
    ///
    /// Debt-free positions are always solvent; indebted ones are not while
    /// no rate has been observed.
    pub fn is_solvent(&self, user: &Address) -> CogResult<bool> {
        let position = self.position(user);
        if position.borrow_part == 0 {
            return Ok(true);
        }
        let rate = self.state.exchange_rate;
        if rate == 0 {
            return Ok(false);
        }
        let cr: Wad = self.config.collateralization_rate.rescale(false)?;
        let owed = self.state.total_borrow.to_elastic(position.borrow_part, true)?;
        Ok(u256(position.collateral_share) * u256(cr.raw()) >= u256(owed) * u256(rate))
    }

    /// Fail with `InsufficientCollateral` unless `user` is solvent.
    ///
    /// The error reports both sides in collateral units.
    pub(crate) fn require_solvent(&self, user: &Address) -> CogResult<()> {
        if self.is_solvent(user)? {
            return Ok(());
        }
        let rate = self.state.exchange_rate;
        if rate == 0 {
            return Err(CogError::ExchangeRateUnavailable);
        }
        let position = self.position(user);
        let owed = self.state.total_borrow.to_elastic(position.borrow_part, true)?;
        let debt_value = narrow(mul_div_u256(u256(owed), u256(rate), u256(WAD))?)?;
        Err(CogError::InsufficientCollateral {
            collateral_value: self.config.collateralization_rate.apply_down(position.collateral_share)?,
            debt_value,
        })
    }

    /// Repay up to `part` debt shares of an insolvent `user` and send the
    /// matching collateral to `to`.
    ///
    /// The caller funds the repayment. `part` is clamped to the user's
    /// outstanding shares, so partial and full liquidations go through the
    /// same path.
    pub fn liquidate(
        &mut self,
        env: &mut PairEnv,
        user: Address,
        part: Amount,
        to: Address,
    ) -> CogResult<LiquidationOutcome> {
        self.atomically(env, |pair, env| {
            pair.begin(env)?;
            if part == 0 {
                return Err(CogError::ZeroAmount);
            }
            pair.update_exchange_rate(env)?;
            let rate = pair.state.exchange_rate;
            if rate == 0 {
                return Err(CogError::ExchangeRateUnavailable);
            }
            if pair.is_solvent(&user)? {
                return Err(CogError::CannotLiquidateSolventUser { user });
            }

            let mut position = pair.position(&user);
            let part = part.min(position.borrow_part);
            let amount = pair.state.total_borrow.sub_debt(&mut position, part)?;

            let value = mul_div_down(amount, rate, WAD)?;
            let collateral_seized = mul_div_down(
                value,
                COLLATERIZATION_RATE_PRECISION,
                pair.config.collateralization_rate.raw(),
            )?
            .min(position.collateral_share);
            position.collateral_share -= collateral_seized;
            pair.state.positions.insert(user, position);
            pair.state.total_collateral_share = safe_sub(pair.state.total_collateral_share, collateral_seized)?;
            pair.state.held_assets = safe_add(pair.state.held_assets, amount)?;

            let this = pair.binding.pair;
            let liquidator = env.signer;
            // The collateral push must not fail once the repayment is pulled
            require_transferable(&*env.collateral, &this, &to, collateral_seized)?;
            env.asset.transfer_from(&this, &liquidator, &this, amount)?;
            if collateral_seized > 0 {
                env.collateral.transfer(&this, &to, collateral_seized)?;
            }

            info!(
                user = ?user,
                to = ?to,
                part,
                amount,
                collateral_seized,
                rate,
                "position liquidated"
            );
            env.events.emit(CogEvent::Liquidate {
                liquidator,
                to,
                user,
                part,
                amount,
                collateral_seized,
                timestamp: env.timestamp,
            });
            Ok(LiquidationOutcome {
                part,
                amount,
                collateral_seized,
            })
        })
    }
}

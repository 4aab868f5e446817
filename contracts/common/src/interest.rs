//! Interest Rate Controller
//!
//! Steers `interest_per_second` toward a target utilization band and flips
//! the protocol into surge mode when utilization stays pinned near 100%.
//!
//! ## Key Features
//!
//! - **Utilization targeting**: rate decays below the band and grows above it,
//!   quadratically in the distance from the band edge
//! - **Clamped**: rate never leaves `[minimum, maximum]` interest per second
//! - **Banked time**: nothing happens between calls; the next accrual charges
//!   the whole elapsed interval at once
//! - **Surge**: sustained utilization above the surge threshold raises the
//!   protocol fee to its surge value until a cooldown below the threshold

use alloy_primitives::U256;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::precision::{FACTOR_PRECISION, WAD};
use crate::constants::{risk_tiers, surge};
use crate::errors::{CogError, CogResult};
use crate::math::{interest_elasticity, mul_div_u256, narrow, safe_add, u256, ProtocolFeeRate, Wad};
use crate::rebase::Rebase;
use crate::types::{Amount, Timestamp};

// ============================================================================
// Parameters
// ============================================================================

/// Utilization band and rate bounds of a risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestParams {
    pub minimum_target_utilization: Wad,
    pub maximum_target_utilization: Wad,
    pub starting_interest_per_second: u64,
    pub minimum_interest_per_second: u64,
    pub maximum_interest_per_second: u64,
}

impl InterestParams {
    pub const HIGH: Self = Self {
        minimum_target_utilization: Wad::new(risk_tiers::high::MINIMUM_TARGET_UTILIZATION),
        maximum_target_utilization: Wad::new(risk_tiers::high::MAXIMUM_TARGET_UTILIZATION),
        starting_interest_per_second: risk_tiers::high::STARTING_INTEREST_PER_SECOND,
        minimum_interest_per_second: risk_tiers::high::MINIMUM_INTEREST_PER_SECOND,
        maximum_interest_per_second: risk_tiers::high::MAXIMUM_INTEREST_PER_SECOND,
    };

    pub const MEDIUM: Self = Self {
        minimum_target_utilization: Wad::new(risk_tiers::medium::MINIMUM_TARGET_UTILIZATION),
        maximum_target_utilization: Wad::new(risk_tiers::medium::MAXIMUM_TARGET_UTILIZATION),
        starting_interest_per_second: risk_tiers::medium::STARTING_INTEREST_PER_SECOND,
        minimum_interest_per_second: risk_tiers::medium::MINIMUM_INTEREST_PER_SECOND,
        maximum_interest_per_second: risk_tiers::medium::MAXIMUM_INTEREST_PER_SECOND,
    };

    pub const LOW: Self = Self {
        minimum_target_utilization: Wad::new(risk_tiers::low::MINIMUM_TARGET_UTILIZATION),
        maximum_target_utilization: Wad::new(risk_tiers::low::MAXIMUM_TARGET_UTILIZATION),
        starting_interest_per_second: risk_tiers::low::STARTING_INTEREST_PER_SECOND,
        minimum_interest_per_second: risk_tiers::low::MINIMUM_INTEREST_PER_SECOND,
        maximum_interest_per_second: risk_tiers::low::MAXIMUM_INTEREST_PER_SECOND,
    };

    pub const STABLE: Self = Self {
        minimum_target_utilization: Wad::new(risk_tiers::stable::MINIMUM_TARGET_UTILIZATION),
        maximum_target_utilization: Wad::new(risk_tiers::stable::MAXIMUM_TARGET_UTILIZATION),
        starting_interest_per_second: risk_tiers::stable::STARTING_INTEREST_PER_SECOND,
        minimum_interest_per_second: risk_tiers::stable::MINIMUM_INTEREST_PER_SECOND,
        maximum_interest_per_second: risk_tiers::stable::MAXIMUM_INTEREST_PER_SECOND,
    };

    /// Reject inconsistent bands and bounds
    pub fn validate(&self) -> CogResult<()> {
        if self.minimum_target_utilization > self.maximum_target_utilization {
            return Err(CogError::InvalidInput {
                param: "target_utilization",
                reason: "minimum above maximum",
            });
        }
        if self.maximum_target_utilization.raw() >= WAD {
            return Err(CogError::InvalidInput {
                param: "maximum_target_utilization",
                reason: "must be below 100%",
            });
        }
        if self.minimum_interest_per_second > self.starting_interest_per_second
            || self.starting_interest_per_second > self.maximum_interest_per_second
        {
            return Err(CogError::InvalidInput {
                param: "interest_per_second",
                reason: "starting rate must lie within [minimum, maximum]",
            });
        }
        if self.minimum_interest_per_second == 0 {
            return Err(CogError::InvalidInput {
                param: "minimum_interest_per_second",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

/// Surge trigger configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurgeParams {
    /// Utilization at or above which time counts toward surging
    pub threshold: Wad,
    /// Sustained high utilization needed to start surging (seconds)
    pub activation_window: u64,
    /// Sustained low utilization needed to stop surging (seconds)
    pub cooldown_window: u64,
}

impl SurgeParams {
    /// Threshold halfway between the band's upper edge and 100%
    pub fn for_band(maximum_target_utilization: Wad) -> Self {
        let headroom = WAD.saturating_sub(maximum_target_utilization.raw());
        Self {
            threshold: Wad::new(maximum_target_utilization.raw() + headroom / 2),
            activation_window: surge::ACTIVATION_WINDOW,
            cooldown_window: surge::COOLDOWN_WINDOW,
        }
    }

    pub fn validate(&self, params: &InterestParams) -> CogResult<()> {
        if self.threshold <= params.maximum_target_utilization || self.threshold.raw() > WAD {
            return Err(CogError::InvalidInput {
                param: "surge_threshold",
                reason: "must lie above the target band and at most 100%",
            });
        }
        Ok(())
    }
}

// ============================================================================
// State
// ============================================================================

/// Accrual bookkeeping of a pair
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct AccrueInfo {
    /// Current rate, 1e18 fixed point per second
    pub interest_per_second: u64,
    /// Time of the last accrual
    pub last_accrued: Timestamp,
    /// Protocol share of interest not yet rolled over (asset units)
    pub fees_earned_fraction: Amount,
}

/// Surge mode state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum SurgeState {
    /// Default fee; `pressured_since` marks the start of a high-utilization streak
    Normal { pressured_since: Option<Timestamp> },
    /// Surge fee; `calm_since` marks the start of a low-utilization streak
    Surging { calm_since: Option<Timestamp> },
}

impl Default for SurgeState {
    fn default() -> Self {
        SurgeState::Normal { pressured_since: None }
    }
}

/// A surge mode change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurgeTransition {
    Started,
    Ended,
}

impl SurgeState {
    pub fn is_surging(&self) -> bool {
        matches!(self, SurgeState::Surging { .. })
    }

    /// Record that utilization sat at `utilization` over `[from, to]`.
    pub fn observe(
        &mut self,
        params: &SurgeParams,
        utilization: Wad,
        from: Timestamp,
        to: Timestamp,
    ) -> Option<SurgeTransition> {
        let high = utilization >= params.threshold;
        match *self {
            SurgeState::Normal { pressured_since } => {
                if !high {
                    *self = SurgeState::Normal { pressured_since: None };
                    return None;
                }
                let since = pressured_since.unwrap_or(from);
                if to.saturating_sub(since) >= params.activation_window {
                    *self = SurgeState::Surging { calm_since: None };
                    Some(SurgeTransition::Started)
                } else {
                    *self = SurgeState::Normal { pressured_since: Some(since) };
                    None
                }
            }
            SurgeState::Surging { calm_since } => {
                if high {
                    *self = SurgeState::Surging { calm_since: None };
                    return None;
                }
                let since = calm_since.unwrap_or(from);
                if to.saturating_sub(since) >= params.cooldown_window {
                    *self = SurgeState::Normal { pressured_since: None };
                    Some(SurgeTransition::Ended)
                } else {
                    *self = SurgeState::Surging { calm_since: Some(since) };
                    None
                }
            }
        }
    }
}

// ============================================================================
// Rate Update
// ============================================================================

/// Rate after `elapsed` seconds at `utilization`.
///
/// Below the band: `rate * E / (E + under² * elapsed)`, floored at the minimum.
/// Above the band: `rate * (E + over² * elapsed) / E`, capped at the maximum.
/// `under`/`over` are the relative distances from the band edge (1e18 = 100%).
pub fn next_interest_rate(
    params: &InterestParams,
    current: u64,
    utilization: Wad,
    elapsed: u64,
) -> CogResult<u64> {
    let min_target = params.minimum_target_utilization.raw();
    let max_target = params.maximum_target_utilization.raw();
    let u = utilization.raw();
    let elasticity = interest_elasticity();

    if u < min_target {
        let under = u256(min_target - u) * u256(FACTOR_PRECISION) / u256(min_target);
        let scale = under
            .checked_mul(under)
            .and_then(|v| v.checked_mul(U256::from(elapsed)))
            .and_then(|v| v.checked_add(elasticity))
            .ok_or(CogError::Overflow)?;
        let rate = mul_div_u256(U256::from(current), elasticity, scale)?;
        let rate = narrow(rate)?;
        Ok((rate as u64).max(params.minimum_interest_per_second))
    } else if u > max_target {
        let over = u256(u - max_target) * u256(FACTOR_PRECISION) / u256(WAD - max_target);
        let scale = over
            .checked_mul(over)
            .and_then(|v| v.checked_mul(U256::from(elapsed)))
            .and_then(|v| v.checked_add(elasticity))
            .ok_or(CogError::Overflow)?;
        let rate = mul_div_u256(U256::from(current), scale, elasticity)?;
        let capped = rate.min(U256::from(params.maximum_interest_per_second));
        Ok(narrow(capped)? as u64)
    } else {
        Ok(current)
    }
}

/// `debt / (held + debt)`, 0 when the pool holds nothing
pub fn utilization(elastic: Amount, held_assets: Amount) -> CogResult<Wad> {
    let full = safe_add(held_assets, elastic)?;
    if full == 0 {
        return Ok(Wad::ZERO);
    }
    Wad::from_fraction(elastic, full)
}

// ============================================================================
// Controller
// ============================================================================

/// What an accrual tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualOutcome {
    pub elapsed: u64,
    pub interest: Amount,
    pub protocol_fee: Amount,
    pub utilization: Wad,
    pub interest_per_second: u64,
    pub transition: Option<SurgeTransition>,
}

/// Interest parameters plus the mutable accrual state of one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestController {
    pub params: InterestParams,
    pub surge_params: SurgeParams,
    pub accrue_info: AccrueInfo,
    pub surge: SurgeState,
}

impl InterestController {
    pub fn new(params: InterestParams, surge_params: SurgeParams, now: Timestamp) -> Self {
        Self {
            params,
            surge_params,
            accrue_info: AccrueInfo {
                interest_per_second: params.starting_interest_per_second,
                last_accrued: now,
                fees_earned_fraction: 0,
            },
            surge: SurgeState::default(),
        }
    }

    pub fn is_surging(&self) -> bool {
        self.surge.is_surging()
    }

    /// Charge interest for the time since the last accrual.
    ///
    /// `protocol_fee` is the fee share in force over the elapsed interval and
    /// `held_assets` the asset balance the pair holds. Returns `None` when no
    /// time has passed.
    pub fn accrue(
        &mut self,
        total_borrow: &mut Rebase,
        held_assets: Amount,
        protocol_fee: ProtocolFeeRate,
        now: Timestamp,
    ) -> CogResult<Option<AccrualOutcome>> {
        let from = self.accrue_info.last_accrued;
        let elapsed = now.saturating_sub(from);
        if elapsed == 0 {
            return Ok(None);
        }

        let mut next = *self;
        let mut ledger = *total_borrow;
        next.accrue_info.last_accrued = now;

        let (interest, fee, util) = if ledger.base == 0 {
            // Idle pools keep decaying toward the floor
            next.accrue_info.interest_per_second =
                next_interest_rate(&next.params, next.accrue_info.interest_per_second, Wad::ZERO, elapsed)?;
            (0, 0, Wad::ZERO)
        } else {
            let interest = ledger.accrue(elapsed, next.accrue_info.interest_per_second)?;
            let fee = protocol_fee.apply_down(interest)?;
            next.accrue_info.fees_earned_fraction = safe_add(next.accrue_info.fees_earned_fraction, fee)?;

            let util = utilization(ledger.elastic, held_assets)?;
            next.accrue_info.interest_per_second =
                next_interest_rate(&next.params, next.accrue_info.interest_per_second, util, elapsed)?;
            (interest, fee, util)
        };

        let transition = next.surge.observe(&next.surge_params, util, from, now);
        match transition {
            Some(SurgeTransition::Started) => info!(utilization = util.raw(), "surge started"),
            Some(SurgeTransition::Ended) => info!(utilization = util.raw(), "surge ended"),
            None => {}
        }
        debug!(
            elapsed,
            interest,
            protocol_fee = fee,
            utilization = util.raw(),
            interest_per_second = next.accrue_info.interest_per_second,
            "accrued"
        );

        *self = next;
        *total_borrow = ledger;
        Ok(Some(AccrualOutcome {
            elapsed,
            interest,
            protocol_fee: fee,
            utilization: util,
            interest_per_second: self.accrue_info.interest_per_second,
            transition,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::fees::{DEFAULT_PROTOCOL_FEE, SURGE_PROTOCOL_FEE};
    use crate::constants::interest::ONE_PERCENT_PER_SECOND;
    use crate::constants::surge::DAY;

    const ONE: u128 = WAD;

    fn controller() -> InterestController {
        let params = InterestParams::MEDIUM;
        InterestController::new(params, SurgeParams::for_band(params.maximum_target_utilization), 0)
    }

    fn fee() -> ProtocolFeeRate {
        ProtocolFeeRate::new(DEFAULT_PROTOCOL_FEE)
    }

    #[test]
    fn test_tier_params_valid() {
        for p in [InterestParams::HIGH, InterestParams::MEDIUM, InterestParams::LOW, InterestParams::STABLE] {
            assert!(p.validate().is_ok());
            assert!(SurgeParams::for_band(p.maximum_target_utilization).validate(&p).is_ok());
        }
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut p = InterestParams::MEDIUM;
        p.minimum_target_utilization = Wad::new(9 * ONE / 10);
        assert!(p.validate().is_err());

        let mut p = InterestParams::MEDIUM;
        p.starting_interest_per_second = p.maximum_interest_per_second + 1;
        assert!(p.validate().is_err());

        let mut p = InterestParams::MEDIUM;
        p.maximum_target_utilization = Wad::ONE;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_surge_threshold_midpoint() {
        let s = SurgeParams::for_band(Wad::new(8 * ONE / 10));
        assert_eq!(s.threshold.raw(), 9 * ONE / 10);
    }

    #[test]
    fn test_rate_inside_band_unchanged() {
        let p = InterestParams::MEDIUM;
        let rate = next_interest_rate(&p, ONE_PERCENT_PER_SECOND, Wad::new(7 * ONE / 10), DAY).unwrap();
        assert_eq!(rate, ONE_PERCENT_PER_SECOND);
    }

    #[test]
    fn test_rate_grows_above_band_and_caps() {
        let p = InterestParams::MEDIUM;
        let full = Wad::ONE;
        let r1 = next_interest_rate(&p, p.starting_interest_per_second, full, DAY).unwrap();
        assert!(r1 > p.starting_interest_per_second);

        let capped = next_interest_rate(&p, p.maximum_interest_per_second, full, 365 * DAY).unwrap();
        assert_eq!(capped, p.maximum_interest_per_second);
    }

    #[test]
    fn test_rate_decays_below_band_and_floors() {
        let p = InterestParams::MEDIUM;
        let r1 = next_interest_rate(&p, p.starting_interest_per_second, Wad::ZERO, DAY).unwrap();
        assert!(r1 < p.starting_interest_per_second);

        let floored = next_interest_rate(&p, p.starting_interest_per_second, Wad::ZERO, 365 * DAY).unwrap();
        assert_eq!(floored, p.minimum_interest_per_second);
    }

    #[test]
    fn test_eight_hours_full_deviation_doubles() {
        // over = 1e18 when utilization is 100%; 28800s doubles the rate
        let p = InterestParams::HIGH;
        let rate = next_interest_rate(&p, ONE_PERCENT_PER_SECOND, Wad::ONE, 28_800).unwrap();
        assert_eq!(rate, 2 * ONE_PERCENT_PER_SECOND);
    }

    #[test]
    fn test_utilization() {
        assert_eq!(utilization(0, 0).unwrap(), Wad::ZERO);
        assert_eq!(utilization(25, 75).unwrap().raw(), ONE / 4);
        assert_eq!(utilization(10, 0).unwrap(), Wad::ONE);
    }

    #[test]
    fn test_zero_elapsed_is_idempotent() {
        let mut c = controller();
        let mut total = Rebase { elastic: 50 * ONE, base: 50 * ONE };
        c.accrue(&mut total, 50 * ONE, fee(), 100).unwrap();

        let snapshot = (c.clone(), total);
        assert!(c.accrue(&mut total, 50 * ONE, fee(), 100).unwrap().is_none());
        assert_eq!((c, total), snapshot);
    }

    #[test]
    fn test_empty_ledger_decays_rate() {
        let mut c = controller();
        c.accrue_info.interest_per_second = c.params.maximum_interest_per_second;
        let mut total = Rebase::default();
        let outcome = c.accrue(&mut total, 100 * ONE, fee(), DAY).unwrap().unwrap();
        assert_eq!(outcome.interest, 0);
        let decayed = c.accrue_info.interest_per_second;
        assert!(decayed < c.params.maximum_interest_per_second);
        assert!(decayed >= c.params.minimum_interest_per_second);
    }

    #[test]
    fn test_empty_ledger_never_raises_floored_rate() {
        let mut c = controller();
        c.accrue_info.interest_per_second = c.params.minimum_interest_per_second;
        let mut total = Rebase::default();
        c.accrue(&mut total, 100 * ONE, fee(), DAY).unwrap();
        assert_eq!(c.accrue_info.interest_per_second, c.params.minimum_interest_per_second);
    }

    #[test]
    fn test_protocol_fee_share_accumulates() {
        let mut c = controller();
        let mut total = Rebase { elastic: 50 * ONE, base: 50 * ONE };
        let outcome = c.accrue(&mut total, 50 * ONE, fee(), 365 * DAY).unwrap().unwrap();
        assert!(outcome.interest > 0);
        assert_eq!(outcome.protocol_fee, outcome.interest * DEFAULT_PROTOCOL_FEE / 1_000_000);
        assert_eq!(c.accrue_info.fees_earned_fraction, outcome.protocol_fee);
        assert_eq!(total.base, 50 * ONE);
    }

    #[test]
    fn test_surge_needs_sustained_pressure() {
        let params = SurgeParams::for_band(Wad::new(8 * ONE / 10));
        let mut s = SurgeState::default();
        let pinned = Wad::new(99 * ONE / 100);

        assert_eq!(s.observe(&params, pinned, 0, DAY), None);
        assert_eq!(s.observe(&params, pinned, DAY, 2 * DAY), None);
        assert_eq!(s.observe(&params, pinned, 2 * DAY, 3 * DAY), Some(SurgeTransition::Started));
        assert!(s.is_surging());
    }

    #[test]
    fn test_surge_streak_broken_by_dip() {
        let params = SurgeParams::for_band(Wad::new(8 * ONE / 10));
        let mut s = SurgeState::default();
        let pinned = Wad::new(99 * ONE / 100);

        s.observe(&params, pinned, 0, 2 * DAY);
        s.observe(&params, Wad::new(ONE / 2), 2 * DAY, 2 * DAY + 1);
        assert_eq!(s.observe(&params, pinned, 2 * DAY + 1, 4 * DAY), None);
        assert!(!s.is_surging());
    }

    #[test]
    fn test_surge_cooldown() {
        let params = SurgeParams::for_band(Wad::new(8 * ONE / 10));
        let mut s = SurgeState::Surging { calm_since: None };
        let calm = Wad::new(ONE / 10);

        assert_eq!(s.observe(&params, calm, 0, DAY), None);
        assert!(s.is_surging());
        assert_eq!(s.observe(&params, calm, DAY, 5 * DAY), Some(SurgeTransition::Ended));
        assert!(!s.is_surging());
    }

    #[test]
    fn test_controller_enters_and_leaves_surge() {
        let mut c = controller();
        let mut total = Rebase { elastic: 10 * ONE, base: 10 * ONE };

        // Everything lent out for 25 days
        let outcome = c.accrue(&mut total, 0, fee(), 25 * DAY).unwrap().unwrap();
        assert_eq!(outcome.transition, Some(SurgeTransition::Started));
        assert!(c.is_surging());

        // Still pinned
        let surge_fee = ProtocolFeeRate::new(SURGE_PROTOCOL_FEE);
        let outcome = c.accrue(&mut total, 0, surge_fee, 28 * DAY).unwrap().unwrap();
        assert_eq!(outcome.transition, None);
        assert_eq!(outcome.protocol_fee, outcome.interest);

        // Borrower repays nearly everything, pool refills
        total = Rebase { elastic: ONE / 100, base: ONE / 1000 };
        let outcome = c.accrue(&mut total, 20 * ONE, surge_fee, 33 * DAY).unwrap().unwrap();
        assert_eq!(outcome.transition, Some(SurgeTransition::Ended));
        assert!(!c.is_surging());
    }
}

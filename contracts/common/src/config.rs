//! Pool Configuration
//!
//! Risk tiers and the full parameter set a pair is deployed with.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{collateral, fees};
use crate::errors::{CogError, CogResult};
use crate::interest::{InterestParams, SurgeParams};
use crate::math::{BorrowFeeRate, CollateralizationRate, ProtocolFeeRate};

/// Risk tier a pair is deployed under
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum RiskTier {
    High = 0,
    Medium = 1,
    Low = 2,
    Stable = 3,
    Custom = 4,
}

impl RiskTier {
    /// Preset interest parameters; `None` for `Custom`
    pub fn interest_params(self) -> Option<InterestParams> {
        match self {
            RiskTier::High => Some(InterestParams::HIGH),
            RiskTier::Medium => Some(InterestParams::MEDIUM),
            RiskTier::Low => Some(InterestParams::LOW),
            RiskTier::Stable => Some(InterestParams::STABLE),
            RiskTier::Custom => None,
        }
    }
}

/// Everything a pair needs to know at deploy time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub tier: RiskTier,
    pub interest: InterestParams,
    pub surge: SurgeParams,
    pub collateralization_rate: CollateralizationRate,
    pub borrow_opening_fee: BorrowFeeRate,
    pub default_protocol_fee: ProtocolFeeRate,
    pub surge_protocol_fee: ProtocolFeeRate,
}

impl PoolConfig {
    /// Preset configuration of a standard tier
    pub fn from_tier(tier: RiskTier) -> CogResult<Self> {
        let interest = tier.interest_params().ok_or(CogError::InvalidInput {
            param: "tier",
            reason: "custom tier has no preset",
        })?;
        Ok(Self::with_defaults(tier, interest))
    }

    /// Configuration with explicit interest parameters and default fees
    pub fn custom(interest: InterestParams) -> CogResult<Self> {
        let config = Self::with_defaults(RiskTier::Custom, interest);
        config.validate()?;
        Ok(config)
    }

    fn with_defaults(tier: RiskTier, interest: InterestParams) -> Self {
        Self {
            tier,
            interest,
            surge: SurgeParams::for_band(interest.maximum_target_utilization),
            collateralization_rate: CollateralizationRate::new(collateral::COLLATERIZATION_RATE),
            borrow_opening_fee: BorrowFeeRate::new(fees::BORROW_OPENING_FEE),
            default_protocol_fee: ProtocolFeeRate::new(fees::DEFAULT_PROTOCOL_FEE),
            surge_protocol_fee: ProtocolFeeRate::new(fees::SURGE_PROTOCOL_FEE),
        }
    }

    pub fn validate(&self) -> CogResult<()> {
        self.interest.validate()?;
        self.surge.validate(&self.interest)?;

        if self.collateralization_rate == CollateralizationRate::ZERO || !self.collateralization_rate.is_fraction() {
            return Err(CogError::InvalidInput {
                param: "collateralization_rate",
                reason: "must lie in (0, 100%]",
            });
        }
        if self.borrow_opening_fee.raw() > fees::MAX_BORROW_OPENING_FEE {
            return Err(CogError::InvalidInput {
                param: "borrow_opening_fee",
                reason: "above cap",
            });
        }
        if self.default_protocol_fee.raw() > fees::MAX_PROTOCOL_FEE
            || self.surge_protocol_fee.raw() > fees::MAX_PROTOCOL_FEE
        {
            return Err(CogError::InvalidInput {
                param: "protocol_fee",
                reason: "above cap",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Wad;

    #[test]
    fn test_presets_validate() {
        for tier in [RiskTier::High, RiskTier::Medium, RiskTier::Low, RiskTier::Stable] {
            let config = PoolConfig::from_tier(tier).unwrap();
            assert!(config.validate().is_ok());
            assert_eq!(config.tier, tier);
        }
    }

    #[test]
    fn test_custom_tier_has_no_preset() {
        assert!(matches!(
            PoolConfig::from_tier(RiskTier::Custom),
            Err(CogError::InvalidInput { param: "tier", .. })
        ));
    }

    #[test]
    fn test_custom_config() {
        let mut params = InterestParams::LOW;
        params.maximum_target_utilization = Wad::new(700_000_000_000_000_000);
        let config = PoolConfig::custom(params).unwrap();
        assert_eq!(config.tier, RiskTier::Custom);
        assert_eq!(config.surge.threshold.raw(), 850_000_000_000_000_000);
    }

    #[test]
    fn test_custom_config_rejects_bad_band() {
        let mut params = InterestParams::LOW;
        params.minimum_target_utilization = Wad::new(900_000_000_000_000_000);
        assert!(PoolConfig::custom(params).is_err());
    }

    #[test]
    fn test_validate_fee_caps() {
        let mut config = PoolConfig::from_tier(RiskTier::Medium).unwrap();
        config.borrow_opening_fee = BorrowFeeRate::new(fees::MAX_BORROW_OPENING_FEE + 1);
        assert!(config.validate().is_err());

        let mut config = PoolConfig::from_tier(RiskTier::Medium).unwrap();
        config.collateralization_rate = CollateralizationRate::new(100_001);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_cbor_round_trip() {
        let config = PoolConfig::from_tier(RiskTier::Stable).unwrap();
        let mut bytes = Vec::new();
        ciborium::into_writer(&config, &mut bytes).unwrap();
        let back: PoolConfig = ciborium::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(back, config);
    }
}

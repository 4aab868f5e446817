//! Protocol Constants
//!
//! All magic numbers for Cog lending pairs, grouped by the fixed-point scale
//! they live on. Mixing scales always goes through an explicit rescale in
//! [`crate::math`].

/// Fixed-point precisions
pub mod precision {
    /// 1e18 scale: exchange rates, utilization, interest per second
    pub const WAD: u128 = 1_000_000_000_000_000_000;

    /// Exchange rate precision (collateral units per asset unit, 1e18)
    pub const EXCHANGE_RATE_PRECISION: u128 = WAD;

    /// Utilization precision (1e18 = 100%)
    pub const UTILIZATION_PRECISION: u128 = WAD;

    /// Precision of the over/under-utilization factor used by the rate controller
    pub const FACTOR_PRECISION: u128 = WAD;

    /// Collateralization rate precision (1e5 = 100%)
    pub const COLLATERIZATION_RATE_PRECISION: u128 = 100_000;

    /// Borrow opening fee precision (1e5 = 100%)
    pub const BORROW_OPENING_FEE_PRECISION: u128 = 100_000;

    /// Protocol fee divisor (1e6 = 100%)
    pub const PROTOCOL_FEE_DIVISOR: u128 = 1_000_000;
}

/// Collateral requirements
pub mod collateral {
    /// Borrowers may draw up to 75% of their collateral's value
    pub const COLLATERIZATION_RATE: u128 = 75_000;
}

/// Fee configuration
pub mod fees {
    /// Borrow opening fee (0.05%), charged on top of every borrow
    pub const BORROW_OPENING_FEE: u128 = 50;

    /// Hard cap for the borrow opening fee (50%)
    pub const MAX_BORROW_OPENING_FEE: u128 = 50_000;

    /// Protocol share of interest outside surge (10%)
    pub const DEFAULT_PROTOCOL_FEE: u128 = 100_000;

    /// Protocol share of interest while surging (100%)
    pub const SURGE_PROTOCOL_FEE: u128 = 1_000_000;

    /// Hard cap for the default protocol fee (100%)
    pub const MAX_PROTOCOL_FEE: u128 = 1_000_000;
}

/// Interest rate controller parameters
pub mod interest {
    /// Approximately 1% APR expressed per second on the 1e18 scale
    pub const ONE_PERCENT_PER_SECOND: u64 = 317_097_920;

    /// How quickly the rate reacts to off-target utilization, in units of 1e36.
    /// The full elasticity (28800e36) halves or doubles the rate in 8 hours at
    /// 100% deviation and does not fit in a u128; see `math::interest_elasticity`.
    pub const INTEREST_ELASTICITY_E36: u128 = 28_800;
}

/// Surge mode timing
pub mod surge {
    /// One day in seconds
    pub const DAY: u64 = 86_400;

    /// Utilization must stay above the surge threshold this long to surge
    pub const ACTIVATION_WINDOW: u64 = 3 * DAY;

    /// Utilization must stay below the surge threshold this long to stop surging
    pub const COOLDOWN_WINDOW: u64 = 3 * DAY;
}

/// Risk tier presets used by the factory
pub mod risk_tiers {
    /// 60%
    pub const SIXTY_PERCENT: u128 = 600_000_000_000_000_000;
    /// 80%
    pub const EIGHTY_PERCENT: u128 = 800_000_000_000_000_000;

    pub mod high {
        pub const MINIMUM_TARGET_UTILIZATION: u128 = super::SIXTY_PERCENT;
        pub const MAXIMUM_TARGET_UTILIZATION: u128 = super::EIGHTY_PERCENT;
        /// ~5% APR
        pub const STARTING_INTEREST_PER_SECOND: u64 = 1_585_489_600;
        /// ~2% APR
        pub const MINIMUM_INTEREST_PER_SECOND: u64 = 634_195_840;
        /// ~1000% APR
        pub const MAXIMUM_INTEREST_PER_SECOND: u64 = 317_097_920_000;
    }

    pub mod medium {
        pub const MINIMUM_TARGET_UTILIZATION: u128 = super::SIXTY_PERCENT;
        pub const MAXIMUM_TARGET_UTILIZATION: u128 = super::EIGHTY_PERCENT;
        /// ~1% APR
        pub const STARTING_INTEREST_PER_SECOND: u64 = 317_097_920;
        /// ~0.25% APR
        pub const MINIMUM_INTEREST_PER_SECOND: u64 = 79_274_480;
        /// ~100% APR
        pub const MAXIMUM_INTEREST_PER_SECOND: u64 = 31_709_792_000;
    }

    pub mod low {
        pub const MINIMUM_TARGET_UTILIZATION: u128 = 400_000_000_000_000_000;
        pub const MAXIMUM_TARGET_UTILIZATION: u128 = super::EIGHTY_PERCENT;
        /// ~2% APR
        pub const STARTING_INTEREST_PER_SECOND: u64 = 634_195_840;
        /// ~0.25% APR
        pub const MINIMUM_INTEREST_PER_SECOND: u64 = 79_274_480;
        /// ~50% APR
        pub const MAXIMUM_INTEREST_PER_SECOND: u64 = 15_854_896_000;
    }

    pub mod stable {
        pub const MINIMUM_TARGET_UTILIZATION: u128 = 100_000_000_000_000_000;
        pub const MAXIMUM_TARGET_UTILIZATION: u128 = 650_000_000_000_000_000;
        /// ~0.5% APR
        pub const STARTING_INTEREST_PER_SECOND: u64 = 158_548_960;
        /// ~0.25% APR
        pub const MINIMUM_INTEREST_PER_SECOND: u64 = 79_274_480;
        /// ~25% APR
        pub const MAXIMUM_INTEREST_PER_SECOND: u64 = 7_927_448_000;
    }
}

/// Fuse Box limits
pub mod oracle {
    /// Maximum number of price sources a fuse box aggregates
    pub const MAX_SOURCES: usize = 4;
}

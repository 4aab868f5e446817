//! Fuse Box Price Aggregator
//!
//! Combines up to four price sources into one exchange rate for Cog pairs.
//! Each source sits behind a fuse: the owner can defuse a misbehaving source
//! and the aggregate keeps answering from the rest.
//!
//! ## Aggregation
//!
//! - Inactive sources are ignored entirely
//! - The price is the mean of the active sources reporting fresh data
//! - If every active source is stale the mean of the active sources is
//!   returned with `updated = false`
//! - With no active source at all the answer is [`PriceReading::UNAVAILABLE`]
//!
//! The fuse box itself implements [`PriceFeed`], so a pair consumes it like
//! any other oracle.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cog_common::{
    access_control::Authority,
    constants::oracle::MAX_SOURCES,
    context::CallContext,
    errors::{CogError, CogResult},
    events::CogEvent,
    math::{narrow, u256},
    oracle::{PriceFeed, PriceReading},
    types::Address,
};

// ============ Fuse Box State ============

/// One fused price source
pub struct FuseSource {
    /// Whether the source takes part in the average
    pub active: bool,
    feed: Box<dyn PriceFeed>,
}

impl FuseSource {
    pub fn feed_id(&self) -> Address {
        self.feed.feed_id()
    }
}

/// Summary of one source for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub feed: Address,
    pub active: bool,
}

/// Multi-source price aggregator with two-step ownership
pub struct FuseBox {
    id: Address,
    authority: Authority,
    sources: Vec<FuseSource>,
}

impl FuseBox {
    /// Create a fuse box with every source active.
    ///
    /// Between one and four sources are accepted.
    pub fn new(id: Address, owner: Address, feeds: Vec<Box<dyn PriceFeed>>) -> CogResult<Self> {
        if feeds.is_empty() || feeds.len() > MAX_SOURCES {
            return Err(CogError::InvalidInput {
                param: "sources",
                reason: "expected between one and four price sources",
            });
        }
        let sources = feeds
            .into_iter()
            .map(|feed| FuseSource { active: true, feed })
            .collect();
        Ok(Self {
            id,
            authority: Authority::new(owner),
            sources,
        })
    }

    // ============ Queries ============

    pub fn owner(&self) -> Address {
        self.authority.owner()
    }

    pub fn pending_owner(&self) -> Address {
        self.authority.pending_owner()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn sources(&self) -> Vec<SourceStatus> {
        self.sources
            .iter()
            .map(|s| SourceStatus { feed: s.feed_id(), active: s.active })
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.sources.iter().filter(|s| s.active).count()
    }

    /// Aggregate price of the active sources
    pub fn get(&self) -> PriceReading {
        let mut fresh_sum = U256::ZERO;
        let mut fresh_count = 0u64;
        let mut active_sum = U256::ZERO;
        let mut active_count = 0u64;

        for source in self.sources.iter().filter(|s| s.active) {
            let reading = source.feed.get();
            active_sum += u256(reading.price);
            active_count += 1;
            if reading.updated {
                fresh_sum += u256(reading.price);
                fresh_count += 1;
            }
        }

        if fresh_count > 0 {
            return mean(fresh_sum, fresh_count)
                .map(PriceReading::fresh)
                .unwrap_or(PriceReading::UNAVAILABLE);
        }
        if active_count > 0 {
            warn!(active_count, "every active price source is stale");
            return mean(active_sum, active_count)
                .map(PriceReading::stale)
                .unwrap_or(PriceReading::UNAVAILABLE);
        }
        warn!("no active price source");
        PriceReading::UNAVAILABLE
    }

    // ============ Fuses ============

    /// Put source `index` back into the average (owner only)
    pub fn activate_source(&mut self, ctx: &mut CallContext, index: usize) -> CogResult<()> {
        self.set_active(ctx, index, true)
    }

    /// Drop source `index` from the average (owner only)
    pub fn defuse_source(&mut self, ctx: &mut CallContext, index: usize) -> CogResult<()> {
        self.set_active(ctx, index, false)
    }

    fn set_active(&mut self, ctx: &mut CallContext, index: usize, active: bool) -> CogResult<()> {
        self.authority.require_owner(&ctx.signer)?;
        let source = self.sources.get_mut(index).ok_or(CogError::InvalidInput {
            param: "index",
            reason: "no price source at this index",
        })?;
        source.active = active;

        // index < MAX_SOURCES, so it fits in a u8
        let index = index as u8;
        if active {
            info!(index, "price source activated");
            ctx.events.emit(CogEvent::SourceActivated { index, by: ctx.signer, timestamp: ctx.timestamp });
        } else {
            info!(index, "price source defused");
            ctx.events.emit(CogEvent::SourceDefused { index, by: ctx.signer, timestamp: ctx.timestamp });
        }
        Ok(())
    }

    // ============ Ownership ============

    pub fn transfer_ownership(&mut self, ctx: &mut CallContext, new_owner: Address) -> CogResult<()> {
        self.authority.transfer_ownership(&ctx.signer, new_owner)?;
        info!("fuse box ownership transfer started");
        ctx.events.emit(CogEvent::OwnershipTransferStarted {
            owner: ctx.signer,
            pending_owner: new_owner,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn accept_ownership(&mut self, ctx: &mut CallContext) -> CogResult<()> {
        let old_owner = self.authority.accept_ownership(&ctx.signer)?;
        info!("fuse box ownership transferred");
        ctx.events.emit(CogEvent::OwnershipTransferred {
            old_owner,
            new_owner: ctx.signer,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn renounce_ownership(&mut self, ctx: &mut CallContext) -> CogResult<()> {
        let old_owner = self.authority.renounce_ownership(&ctx.signer)?;
        info!("fuse box ownership renounced");
        ctx.events.emit(CogEvent::OwnershipTransferred {
            old_owner,
            new_owner: self.authority.owner(),
            timestamp: ctx.timestamp,
        });
        Ok(())
    }
}

impl PriceFeed for FuseBox {
    fn feed_id(&self) -> Address {
        self.id
    }

    fn get(&self) -> PriceReading {
        FuseBox::get(self)
    }
}

// ============ Helper Functions ============

/// `sum / count`; the mean of u128 prices always fits in a u128
fn mean(sum: U256, count: u64) -> Option<u128> {
    narrow(sum / U256::from(count)).ok()
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use cog_common::events::EventType;
    use cog_common::oracle::MockPriceFeed;
    use cog_common::types::ZERO_ADDRESS;
    use proptest::prelude::*;
    use std::rc::Rc;

    const ONE: u128 = 1_000_000_000_000_000_000;

    fn owner() -> Address {
        [1u8; 32]
    }

    fn stranger() -> Address {
        [9u8; 32]
    }

    fn feeds(prices: &[u128]) -> Vec<Rc<MockPriceFeed>> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| Rc::new(MockPriceFeed::new([10 + i as u8; 32], *p)))
            .collect()
    }

    fn fuse_box(feeds: &[Rc<MockPriceFeed>]) -> FuseBox {
        let boxed = feeds
            .iter()
            .map(|f| Box::new(Rc::clone(f)) as Box<dyn PriceFeed>)
            .collect();
        FuseBox::new([50u8; 32], owner(), boxed).unwrap()
    }

    fn ctx(signer: Address) -> CallContext {
        CallContext::new(signer, 1_000)
    }

    #[test]
    fn test_source_count_bounds() {
        assert!(FuseBox::new([50u8; 32], owner(), Vec::new()).is_err());

        let five = feeds(&[ONE; 5]);
        let boxed = five.iter().map(|f| Box::new(Rc::clone(f)) as Box<dyn PriceFeed>).collect();
        assert!(matches!(
            FuseBox::new([50u8; 32], owner(), boxed),
            Err(CogError::InvalidInput { param: "sources", .. })
        ));
    }

    #[test]
    fn test_average_of_all_sources() {
        let f = feeds(&[ONE, 2 * ONE, 3 * ONE, 6 * ONE]);
        let fb = fuse_box(&f);
        assert_eq!(fb.get(), PriceReading::fresh(3 * ONE));
        assert_eq!(fb.active_count(), 4);
    }

    #[test]
    fn test_defused_source_excluded() {
        let f = feeds(&[ONE, 2 * ONE, 3 * ONE, 6 * ONE]);
        let mut fb = fuse_box(&f);
        let mut c = ctx(owner());

        fb.defuse_source(&mut c, 3).unwrap();
        assert_eq!(fb.get(), PriceReading::fresh(2 * ONE));
        assert_eq!(c.events.filter_by_type(EventType::SourceDefused).len(), 1);

        fb.activate_source(&mut c, 3).unwrap();
        assert_eq!(fb.get(), PriceReading::fresh(3 * ONE));
    }

    #[test]
    fn test_stale_source_left_out_of_average() {
        let f = feeds(&[ONE, 3 * ONE]);
        let fb = fuse_box(&f);
        f[1].set_updated(false);
        assert_eq!(fb.get(), PriceReading::fresh(ONE));
    }

    #[test]
    fn test_all_stale_reports_not_updated() {
        let f = feeds(&[ONE, 3 * ONE]);
        let fb = fuse_box(&f);
        f[0].set_updated(false);
        f[1].set_updated(false);
        assert_eq!(fb.get(), PriceReading::stale(2 * ONE));
    }

    #[test]
    fn test_all_defused_is_unavailable() {
        let f = feeds(&[ONE, 3 * ONE]);
        let mut fb = fuse_box(&f);
        let mut c = ctx(owner());
        fb.defuse_source(&mut c, 0).unwrap();
        fb.defuse_source(&mut c, 1).unwrap();

        assert_eq!(fb.get(), PriceReading::UNAVAILABLE);
        assert_eq!(fb.active_count(), 0);
    }

    #[test]
    fn test_index_out_of_range() {
        let f = feeds(&[ONE]);
        let mut fb = fuse_box(&f);
        let result = fb.defuse_source(&mut ctx(owner()), 1);
        assert!(matches!(result, Err(CogError::InvalidInput { param: "index", .. })));
    }

    #[test]
    fn test_fuses_owner_only() {
        let f = feeds(&[ONE, 2 * ONE]);
        let mut fb = fuse_box(&f);
        let mut c = ctx(stranger());
        assert!(matches!(fb.defuse_source(&mut c, 0), Err(CogError::Unauthorized { .. })));
        assert!(matches!(fb.activate_source(&mut c, 0), Err(CogError::Unauthorized { .. })));
        assert!(!c.events.has_events());
    }

    #[test]
    fn test_admin_controls() {
        let f = feeds(&[ONE]);
        let mut fb = fuse_box(&f);
        let successor = [2u8; 32];

        assert!(fb.transfer_ownership(&mut ctx(stranger()), [5u8; 32]).is_err());

        fb.transfer_ownership(&mut ctx(owner()), successor).unwrap();
        assert_eq!(fb.pending_owner(), successor);

        assert!(fb.accept_ownership(&mut ctx([7u8; 32])).is_err());
        fb.accept_ownership(&mut ctx(successor)).unwrap();
        assert_eq!(fb.owner(), successor);

        assert!(fb.renounce_ownership(&mut ctx(owner())).is_err());
        let mut c = ctx(successor);
        fb.renounce_ownership(&mut c).unwrap();
        assert_eq!(fb.owner(), ZERO_ADDRESS);
        assert_eq!(c.events.filter_by_type(EventType::OwnershipTransferred).len(), 1);

        // Nobody can defuse anything once renounced
        assert!(fb.defuse_source(&mut ctx(successor), 0).is_err());
    }

    #[test]
    fn test_usable_as_price_feed() {
        let f = feeds(&[4 * ONE, 6 * ONE]);
        let fb = fuse_box(&f);
        let feed: &dyn PriceFeed = &fb;
        assert_eq!(feed.get(), PriceReading::fresh(5 * ONE));
        assert_eq!(feed.feed_id(), [50u8; 32]);
    }

    proptest! {
        #[test]
        fn prop_mean_of_active_subset(
            prices in proptest::array::uniform4(100_000u128..u128::MAX),
            mask in 1u8..16,
        ) {
            let f = feeds(&prices);
            let mut fb = fuse_box(&f);
            let mut c = ctx(owner());

            let mut sum = U256::ZERO;
            let mut count = 0u64;
            for (i, price) in prices.iter().enumerate() {
                if mask & (1 << i) == 0 {
                    fb.defuse_source(&mut c, i).unwrap();
                } else {
                    sum += u256(*price);
                    count += 1;
                }
            }

            let reading = fb.get();
            prop_assert!(reading.updated);
            prop_assert_eq!(u256(reading.price), sum / U256::from(count));
        }
    }
}

//! Oracle Module
//!
//! The price capability consumed by pairs and by the fuse box.
//!
//! ## Key Features
//!
//! - **Freshness flag**: every reading says whether it is fresh
//! - **1e18 fixed point**: prices are collateral units per asset unit
//! - **Shared handles**: feeds can be shared through `Rc`/`&`/`Box`
//! - **Mock feed**: settable price and freshness for tests and simulations

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::types::Address;

// ============================================================================
// Types
// ============================================================================

/// A single price query result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceReading {
    /// True if the source reports fresh data
    pub updated: bool,
    /// Price, 1e18 fixed point
    pub price: u128,
}

impl PriceReading {
    /// A fresh reading
    pub fn fresh(price: u128) -> Self {
        Self { updated: true, price }
    }

    /// A stale reading
    pub fn stale(price: u128) -> Self {
        Self { updated: false, price }
    }

    /// Reading returned when no source can answer
    pub const UNAVAILABLE: PriceReading = PriceReading { updated: false, price: 0 };
}

/// Price source
pub trait PriceFeed {
    /// Address identifying this feed
    fn feed_id(&self) -> Address;

    /// Latest price and its freshness
    fn get(&self) -> PriceReading;
}

impl<T: PriceFeed + ?Sized> PriceFeed for &T {
    fn feed_id(&self) -> Address {
        (**self).feed_id()
    }

    fn get(&self) -> PriceReading {
        (**self).get()
    }
}

impl<T: PriceFeed + ?Sized> PriceFeed for Rc<T> {
    fn feed_id(&self) -> Address {
        (**self).feed_id()
    }

    fn get(&self) -> PriceReading {
        (**self).get()
    }
}

impl<T: PriceFeed + ?Sized> PriceFeed for Box<T> {
    fn feed_id(&self) -> Address {
        (**self).feed_id()
    }

    fn get(&self) -> PriceReading {
        (**self).get()
    }
}

// ============================================================================
// Mock Feed
// ============================================================================

/// Price feed whose answer is set by hand
#[derive(Debug)]
pub struct MockPriceFeed {
    id: Address,
    price: Cell<u128>,
    updated: Cell<bool>,
}

impl MockPriceFeed {
    /// Create a feed reporting `price` as fresh
    pub fn new(id: Address, price: u128) -> Self {
        Self {
            id,
            price: Cell::new(price),
            updated: Cell::new(true),
        }
    }

    /// Change the reported price
    pub fn set_price(&self, price: u128) {
        self.price.set(price);
    }

    /// Change the reported freshness
    pub fn set_updated(&self, updated: bool) {
        self.updated.set(updated);
    }
}

impl PriceFeed for MockPriceFeed {
    fn feed_id(&self) -> Address {
        self.id
    }

    fn get(&self) -> PriceReading {
        PriceReading {
            updated: self.updated.get(),
            price: self.price.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_mock_feed() {
        let feed = MockPriceFeed::new([3u8; 32], ONE);
        assert_eq!(feed.get(), PriceReading::fresh(ONE));

        feed.set_price(5 * ONE);
        feed.set_updated(false);
        assert_eq!(feed.get(), PriceReading::stale(5 * ONE));
        assert_eq!(feed.feed_id(), [3u8; 32]);
    }

    #[test]
    fn test_shared_handle_sees_updates() {
        let feed = Rc::new(MockPriceFeed::new([3u8; 32], ONE));
        let boxed: Box<dyn PriceFeed> = Box::new(Rc::clone(&feed));

        feed.set_price(2 * ONE);
        assert_eq!(boxed.get().price, 2 * ONE);
        assert_eq!(boxed.feed_id(), [3u8; 32]);
    }
}

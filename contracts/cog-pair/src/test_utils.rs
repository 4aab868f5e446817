//! Shared fixtures for pair tests

use cog_common::{
    clock::ManualClock,
    config::{PoolConfig, RiskTier},
    context::CallContext,
    errors::CogResult,
    events::EventLog,
    oracle::MockPriceFeed,
    token_ops::TokenLedger,
    types::{Address, Amount},
};
use cog_token::Erc20Ledger;

use crate::{CogPair, PairBinding, PairEnv};

pub const ONE: u128 = 1_000_000_000_000_000_000;
pub const DAY: u64 = 86_400;
pub const START: u64 = 1_700_000_000;

/// Lender
pub fn alice() -> Address {
    [1u8; 32]
}

/// Borrower
pub fn bob() -> Address {
    [2u8; 32]
}

/// Liquidator
pub fn carol() -> Address {
    [3u8; 32]
}

pub fn factory() -> Address {
    [90u8; 32]
}

pub fn fee_to() -> Address {
    [91u8; 32]
}

pub fn pair_address() -> Address {
    [100u8; 32]
}

pub fn binding() -> PairBinding {
    PairBinding {
        pair: pair_address(),
        asset: [10u8; 32],
        collateral: [11u8; 32],
        oracle: [12u8; 32],
    }
}

/// A pair wired to in-memory collaborators
pub struct Harness {
    pub pair: CogPair,
    pub asset: Erc20Ledger,
    pub collateral: Erc20Ledger,
    pub oracle: MockPriceFeed,
    pub clock: ManualClock,
    pub events: EventLog,
}

impl Harness {
    /// Medium-risk pair with the exchange rate cached at 1:1
    pub fn new() -> Self {
        Self::with_tier(RiskTier::Medium)
    }

    pub fn with_tier(tier: RiskTier) -> Self {
        let b = binding();
        let config = PoolConfig::from_tier(tier).unwrap();
        let mut h = Self {
            pair: CogPair::new(b, factory(), fee_to(), config, START).unwrap(),
            asset: Erc20Ledger::with_id(b.asset),
            collateral: Erc20Ledger::with_id(b.collateral),
            oracle: MockPriceFeed::new(b.oracle, ONE),
            clock: ManualClock::new(START),
            events: EventLog::new(),
        };
        h.refresh_rate(ONE);
        h
    }

    /// Fresh pair where alice has deposited `amount`
    pub fn with_liquidity(amount: Amount) -> Self {
        let mut h = Self::new();
        h.deposit(alice(), amount);
        h
    }

    /// Run one pair operation as `signer`, collecting its events
    pub fn call<R>(
        &mut self,
        signer: Address,
        f: impl FnOnce(&mut CogPair, &mut PairEnv) -> CogResult<R>,
    ) -> CogResult<R> {
        let mut env = PairEnv::new(signer, &self.clock, &mut self.asset, &mut self.collateral, &self.oracle);
        let result = f(&mut self.pair, &mut env);
        for event in env.events.into_events() {
            self.events.emit(event);
        }
        result
    }

    pub fn admin(&self) -> CallContext {
        CallContext::at(factory(), &self.clock)
    }

    pub fn refresh_rate(&mut self, price: u128) {
        self.oracle.set_price(price);
        self.oracle.set_updated(true);
        self.call(alice(), |p, e| p.get_exchange_rate(e)).unwrap();
    }

    /// Mint asset tokens to `who` and give the pair an unlimited allowance
    pub fn fund_asset(&mut self, who: Address, amount: Amount) {
        self.asset.mint(&who, amount).unwrap();
        self.asset.approve(&who, &pair_address(), Amount::MAX);
    }

    pub fn fund_collateral(&mut self, who: Address, amount: Amount) {
        self.collateral.mint(&who, amount).unwrap();
        self.collateral.approve(&who, &pair_address(), Amount::MAX);
    }

    pub fn deposit(&mut self, who: Address, amount: Amount) -> Amount {
        self.fund_asset(who, amount);
        self.call(who, |p, e| p.deposit(e, amount, who)).unwrap()
    }

    /// Post `collateral` for `who` and borrow `borrow` to them
    pub fn open_position(&mut self, who: Address, collateral: Amount, borrow: Amount) {
        self.fund_collateral(who, collateral);
        self.call(who, |p, e| p.add_collateral(e, who, collateral)).unwrap();
        if borrow > 0 {
            self.call(who, |p, e| p.borrow(e, who, who, borrow)).unwrap();
        }
    }

    pub fn asset_balance(&self, who: &Address) -> Amount {
        self.asset.balance_of(who)
    }

    pub fn collateral_balance(&self, who: &Address) -> Amount {
        self.collateral.balance_of(who)
    }
}

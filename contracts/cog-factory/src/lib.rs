//! Cog Factory
//!
//! Deploys lending pairs under a fixed set of risk tiers and administers
//! them afterwards.
//!
//! ## Key Features
//!
//! - **Tiered deployment**: anyone may deploy a High, Medium, Low or Stable
//!   risk pair; custom parameters are reserved to the owner
//! - **Registry**: one pair per (asset, collateral, oracle, tier), keyed by
//!   a SHA-256 [`PairId`]
//! - **Privileged pausers**: the owner grants pause rights, privileged users
//!   pause and unpause pairs
//! - **Fee administration**: the owner tunes each pair's borrow opening fee
//!   and default protocol fee and chooses where protocol fees go
//!
//! Deployed pairs record the factory's address as their administrator, so
//! every admin call the factory forwards is signed with that address.

use std::collections::{BTreeMap, BTreeSet};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use cog_common::{
    access_control::Authority,
    config::{PoolConfig, RiskTier},
    context::CallContext,
    errors::{CogError, CogResult},
    events::CogEvent,
    interest::InterestParams,
    math::{BorrowFeeRate, ProtocolFeeRate},
    types::{Address, PairId},
};
use cog_pair::{CogPair, PairBinding};

// ============ Registry Key ============

/// What makes a pair unique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PairKey {
    pub asset: Address,
    pub collateral: Address,
    pub oracle: Address,
    pub tier: RiskTier,
}

impl PairKey {
    /// SHA-256 over the three addresses and the tier byte
    pub fn pair_id(&self) -> PairId {
        let mut hasher = Sha256::new();
        hasher.update(self.asset);
        hasher.update(self.collateral);
        hasher.update(self.oracle);
        hasher.update([self.tier as u8]);
        let result = hasher.finalize();
        let mut id = [0u8; 32];
        id.copy_from_slice(&result);
        id
    }
}

// ============ Factory ============

/// Pair deployer and administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CogFactory {
    /// Factory address; deployed pairs accept admin calls signed by it
    id: Address,
    authority: Authority,
    /// Recipient of rolled-over protocol fees for newly deployed pairs
    fee_to: Address,
    privileged: BTreeSet<Address>,
    pairs: BTreeMap<PairId, CogPair>,
    keys: BTreeMap<PairId, PairKey>,
}

impl CogFactory {
    pub fn new(id: Address, owner: Address, fee_to: Address) -> Self {
        Self {
            id,
            authority: Authority::new(owner),
            fee_to,
            privileged: BTreeSet::new(),
            pairs: BTreeMap::new(),
            keys: BTreeMap::new(),
        }
    }

    // ============ Queries ============

    pub fn address(&self) -> Address {
        self.id
    }

    pub fn owner(&self) -> Address {
        self.authority.owner()
    }

    pub fn pending_owner(&self) -> Address {
        self.authority.pending_owner()
    }

    pub fn fee_to(&self) -> Address {
        self.fee_to
    }

    pub fn is_privileged(&self, user: &Address) -> bool {
        self.privileged.contains(user)
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn pair_ids(&self) -> impl Iterator<Item = &PairId> {
        self.pairs.keys()
    }

    pub fn pair_key(&self, pair_id: &PairId) -> Option<&PairKey> {
        self.keys.get(pair_id)
    }

    pub fn pair(&self, pair_id: &PairId) -> Option<&CogPair> {
        self.pairs.get(pair_id)
    }

    /// Mutable handle for running pair operations
    pub fn pair_mut(&mut self, pair_id: &PairId) -> Option<&mut CogPair> {
        self.pairs.get_mut(pair_id)
    }

    /// Id the pair for this binding and tier has or would have
    pub fn find_pair(&self, asset: Address, collateral: Address, oracle: Address, tier: RiskTier) -> Option<PairId> {
        let pair_id = PairKey { asset, collateral, oracle, tier }.pair_id();
        self.pairs.contains_key(&pair_id).then_some(pair_id)
    }

    // ============ Deployment ============

    pub fn deploy_high_risk_pair(
        &mut self,
        ctx: &mut CallContext,
        asset: Address,
        collateral: Address,
        oracle: Address,
    ) -> CogResult<PairId> {
        self.deploy_tier(ctx, asset, collateral, oracle, RiskTier::High)
    }

    pub fn deploy_medium_risk_pair(
        &mut self,
        ctx: &mut CallContext,
        asset: Address,
        collateral: Address,
        oracle: Address,
    ) -> CogResult<PairId> {
        self.deploy_tier(ctx, asset, collateral, oracle, RiskTier::Medium)
    }

    pub fn deploy_low_risk_pair(
        &mut self,
        ctx: &mut CallContext,
        asset: Address,
        collateral: Address,
        oracle: Address,
    ) -> CogResult<PairId> {
        self.deploy_tier(ctx, asset, collateral, oracle, RiskTier::Low)
    }

    pub fn deploy_stable_risk_pair(
        &mut self,
        ctx: &mut CallContext,
        asset: Address,
        collateral: Address,
        oracle: Address,
    ) -> CogResult<PairId> {
        self.deploy_tier(ctx, asset, collateral, oracle, RiskTier::Stable)
    }

    /// Deploy a pair with explicit interest parameters (owner only)
    pub fn deploy_custom_risk_pair(
        &mut self,
        ctx: &mut CallContext,
        asset: Address,
        collateral: Address,
        oracle: Address,
        interest: InterestParams,
    ) -> CogResult<PairId> {
        self.authority.require_owner(&ctx.signer)?;
        let config = PoolConfig::custom(interest)?;
        self.deploy(ctx, asset, collateral, oracle, config)
    }

    fn deploy_tier(
        &mut self,
        ctx: &mut CallContext,
        asset: Address,
        collateral: Address,
        oracle: Address,
        tier: RiskTier,
    ) -> CogResult<PairId> {
        let config = PoolConfig::from_tier(tier)?;
        self.deploy(ctx, asset, collateral, oracle, config)
    }

    fn deploy(
        &mut self,
        ctx: &mut CallContext,
        asset: Address,
        collateral: Address,
        oracle: Address,
        config: PoolConfig,
    ) -> CogResult<PairId> {
        let key = PairKey { asset, collateral, oracle, tier: config.tier };
        let pair_id = key.pair_id();
        if self.pairs.contains_key(&pair_id) {
            return Err(CogError::PairAlreadyExists { pair_id });
        }

        let binding = PairBinding { pair: pair_id, asset, collateral, oracle };
        let pair = CogPair::new(binding, self.id, self.fee_to, config, ctx.timestamp)?;
        self.pairs.insert(pair_id, pair);
        self.keys.insert(pair_id, key);

        info!(tier = ?config.tier, "pair deployed");
        ctx.events.emit(CogEvent::PairDeployed {
            pair_id,
            asset,
            collateral,
            oracle,
            tier: config.tier as u8,
            timestamp: ctx.timestamp,
        });
        Ok(pair_id)
    }

    // ============ Pair Administration ============

    /// Pause a pair (privileged users only)
    pub fn pause(&mut self, ctx: &mut CallContext, pair_id: &PairId) -> CogResult<()> {
        self.require_privileged(&ctx.signer)?;
        self.forward(ctx, pair_id, |pair, admin| pair.pause(admin))
    }

    /// Unpause a pair (privileged users only)
    pub fn unpause(&mut self, ctx: &mut CallContext, pair_id: &PairId) -> CogResult<()> {
        self.require_privileged(&ctx.signer)?;
        self.forward(ctx, pair_id, |pair, admin| pair.unpause(admin))
    }

    /// Set a pair's protocol fee outside surge (owner only, at most 1e6)
    pub fn update_default_protocol_fee(
        &mut self,
        ctx: &mut CallContext,
        pair_id: &PairId,
        fee: ProtocolFeeRate,
    ) -> CogResult<()> {
        self.authority.require_owner(&ctx.signer)?;
        self.forward(ctx, pair_id, |pair, admin| pair.set_default_protocol_fee(admin, fee))
    }

    /// Set a pair's borrow opening fee (owner only, at most 50_000)
    pub fn update_borrow_fee(&mut self, ctx: &mut CallContext, pair_id: &PairId, fee: BorrowFeeRate) -> CogResult<()> {
        self.authority.require_owner(&ctx.signer)?;
        self.forward(ctx, pair_id, |pair, admin| pair.set_borrow_fee(admin, fee))
    }

    /// Push the factory's fee recipient into an existing pair
    pub fn sync_fee_to(&mut self, ctx: &mut CallContext, pair_id: &PairId) -> CogResult<()> {
        let fee_to = self.fee_to;
        self.forward(ctx, pair_id, |pair, admin| pair.set_fee_to(admin, fee_to))
    }

    // ============ Factory Settings ============

    /// Change the fee recipient handed to new pairs (owner only)
    pub fn change_fee_to(&mut self, ctx: &mut CallContext, new_fee_to: Address) -> CogResult<()> {
        self.authority.require_owner(&ctx.signer)?;
        let old_fee_to = self.fee_to;
        self.fee_to = new_fee_to;
        ctx.events.emit(CogEvent::FeeToChanged {
            old_fee_to,
            new_fee_to,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    /// Grant or revoke pause rights (owner only)
    pub fn set_priv_user_status(&mut self, ctx: &mut CallContext, user: Address, status: bool) -> CogResult<()> {
        self.authority.require_owner(&ctx.signer)?;
        if status {
            self.privileged.insert(user);
        } else {
            self.privileged.remove(&user);
        }
        info!(status, "privileged user updated");
        ctx.events.emit(CogEvent::PrivilegedUserUpdated {
            user,
            status,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ Ownership ============

    pub fn transfer_ownership(&mut self, ctx: &mut CallContext, new_owner: Address) -> CogResult<()> {
        self.authority.transfer_ownership(&ctx.signer, new_owner)?;
        ctx.events.emit(CogEvent::OwnershipTransferStarted {
            owner: ctx.signer,
            pending_owner: new_owner,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn accept_ownership(&mut self, ctx: &mut CallContext) -> CogResult<()> {
        let old_owner = self.authority.accept_ownership(&ctx.signer)?;
        info!("factory ownership transferred");
        ctx.events.emit(CogEvent::OwnershipTransferred {
            old_owner,
            new_owner: ctx.signer,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn renounce_ownership(&mut self, ctx: &mut CallContext) -> CogResult<()> {
        let old_owner = self.authority.renounce_ownership(&ctx.signer)?;
        info!("factory ownership renounced");
        ctx.events.emit(CogEvent::OwnershipTransferred {
            old_owner,
            new_owner: [0u8; 32],
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ Internal ============

    fn require_privileged(&self, caller: &Address) -> CogResult<()> {
        if !self.is_privileged(caller) {
            return Err(CogError::Unauthorized {
                expected: self.owner(),
                actual: *caller,
            });
        }
        Ok(())
    }

    /// Run a pair admin call signed by the factory, relaying its events
    fn forward(
        &mut self,
        ctx: &mut CallContext,
        pair_id: &PairId,
        call: impl FnOnce(&mut CogPair, &mut CallContext) -> CogResult<()>,
    ) -> CogResult<()> {
        let pair = self.pairs.get_mut(pair_id).ok_or(CogError::InvalidInput {
            param: "pair",
            reason: "no pair with this id",
        })?;
        let mut admin = CallContext::new(self.id, ctx.timestamp);
        call(pair, &mut admin)?;
        for event in admin.events.into_events() {
            ctx.events.emit(event);
        }
        Ok(())
    }
}

// ============ Tests ============

//! Vault Share Accounting
//!
//! ERC-4626 style lender shares over `held assets + outstanding debt`.
//! Conversions round toward the pool: deposits and redemptions round down,
//! mints and withdrawals round up.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cog_common::{
    errors::{CogError, CogResult},
    events::CogEvent,
    math::{mul_div_down, mul_div_up, safe_add, safe_sub},
    types::{Address, Amount},
};

use crate::{CogPair, PairEnv};

// ============ Share Ledger ============

/// ERC-20 bookkeeping of lender shares
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLedger {
    pub total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<(Address, Address), Amount>,
}

impl ShareLedger {
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Sum of all balances; equals `total_supply`
    pub fn sum_of_balances(&self) -> Amount {
        self.balances.values().sum()
    }

    pub fn mint(&mut self, to: &Address, shares: Amount) -> CogResult<()> {
        let supply = safe_add(self.total_supply, shares)?;
        let balance = safe_add(self.balance_of(to), shares)?;
        self.total_supply = supply;
        self.balances.insert(*to, balance);
        Ok(())
    }

    pub fn burn(&mut self, from: &Address, shares: Amount) -> CogResult<()> {
        let available = self.balance_of(from);
        if available < shares {
            return Err(CogError::InsufficientBalance {
                available,
                requested: shares,
            });
        }
        self.total_supply = safe_sub(self.total_supply, shares)?;
        self.balances.insert(*from, available - shares);
        Ok(())
    }

    pub fn transfer(&mut self, from: &Address, to: &Address, shares: Amount) -> CogResult<()> {
        self.burn(from, shares)?;
        self.mint(to, shares)
    }

    pub fn approve(&mut self, owner: &Address, spender: &Address, shares: Amount) {
        self.allowances.insert((*owner, *spender), shares);
    }

    /// Consume `shares` of `spender`'s allowance over `owner`'s shares
    pub fn spend_allowance(&mut self, owner: &Address, spender: &Address, shares: Amount) -> CogResult<()> {
        if owner == spender {
            return Ok(());
        }
        let available = self.allowance(owner, spender);
        if available < shares {
            return Err(CogError::InsufficientShareAllowance {
                available,
                requested: shares,
            });
        }
        if available != Amount::MAX {
            self.allowances.insert((*owner, *spender), available - shares);
        }
        Ok(())
    }
}

// ============ ERC-4626 ============

impl CogPair {
    /// Held assets plus debt owed to the pool
    pub fn total_assets(&self) -> CogResult<Amount> {
        safe_add(self.state.held_assets, self.state.total_borrow.elastic)
    }

    pub fn total_supply(&self) -> Amount {
        self.state.shares.total_supply
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.state.shares.balance_of(account)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state.shares.allowance(owner, spender)
    }

    pub fn convert_to_shares(&self, assets: Amount) -> CogResult<Amount> {
        let supply = self.total_supply();
        let total = self.total_assets()?;
        if supply == 0 || total == 0 {
            return Ok(assets);
        }
        mul_div_down(assets, supply, total)
    }

    pub fn convert_to_assets(&self, shares: Amount) -> CogResult<Amount> {
        let supply = self.total_supply();
        if supply == 0 {
            return Ok(shares);
        }
        mul_div_down(shares, self.total_assets()?, supply)
    }

    pub fn preview_deposit(&self, assets: Amount) -> CogResult<Amount> {
        self.convert_to_shares(assets)
    }

    /// Assets needed to mint `shares`, rounded up
    pub fn preview_mint(&self, shares: Amount) -> CogResult<Amount> {
        let supply = self.total_supply();
        if supply == 0 {
            return Ok(shares);
        }
        mul_div_up(shares, self.total_assets()?, supply)
    }

    /// Shares burned to withdraw `assets`, rounded up
    pub fn preview_withdraw(&self, assets: Amount) -> CogResult<Amount> {
        let supply = self.total_supply();
        let total = self.total_assets()?;
        if supply == 0 || total == 0 {
            return Ok(assets);
        }
        mul_div_up(assets, supply, total)
    }

    pub fn preview_redeem(&self, shares: Amount) -> CogResult<Amount> {
        self.convert_to_assets(shares)
    }

    pub fn max_deposit(&self, _receiver: &Address) -> Amount {
        if self.state.paused { 0 } else { Amount::MAX }
    }

    pub fn max_mint(&self, _receiver: &Address) -> Amount {
        if self.state.paused { 0 } else { Amount::MAX }
    }

    /// Assets `owner` can take out now; lent-out assets are not withdrawable
    pub fn max_withdraw(&self, owner: &Address) -> CogResult<Amount> {
        if self.state.paused {
            return Ok(0);
        }
        let entitled = self.convert_to_assets(self.balance_of(owner))?;
        Ok(entitled.min(self.state.held_assets))
    }

    pub fn max_redeem(&self, owner: &Address) -> CogResult<Amount> {
        if self.state.paused {
            return Ok(0);
        }
        let redeemable = self.convert_to_shares(self.state.held_assets)?;
        Ok(self.balance_of(owner).min(redeemable))
    }

    /// Deposit `assets` from the caller, minting shares to `receiver`
    pub fn deposit(&mut self, env: &mut PairEnv, assets: Amount, receiver: Address) -> CogResult<Amount> {
        self.atomically(env, |pair, env| {
            pair.begin(env)?;
            if assets == 0 {
                return Err(CogError::ZeroAmount);
            }
            let shares = pair.preview_deposit(assets)?;
            if shares == 0 {
                return Err(CogError::ZeroAmount);
            }
            pair.enter(env, assets, shares, receiver)?;
            Ok(shares)
        })
    }

    /// Mint exactly `shares` to `receiver`, pulling the assets from the caller
    pub fn mint(&mut self, env: &mut PairEnv, shares: Amount, receiver: Address) -> CogResult<Amount> {
        self.atomically(env, |pair, env| {
            pair.begin(env)?;
            if shares == 0 {
                return Err(CogError::ZeroAmount);
            }
            let assets = pair.preview_mint(shares)?;
            pair.enter(env, assets, shares, receiver)?;
            Ok(assets)
        })
    }

    /// Burn `owner`'s shares for exactly `assets`, sent to `receiver`
    pub fn withdraw(
        &mut self,
        env: &mut PairEnv,
        assets: Amount,
        receiver: Address,
        owner: Address,
    ) -> CogResult<Amount> {
        self.atomically(env, |pair, env| {
            pair.begin(env)?;
            if assets == 0 {
                return Err(CogError::ZeroAmount);
            }
            let shares = pair.preview_withdraw(assets)?;
            pair.exit(env, assets, shares, receiver, owner)?;
            Ok(shares)
        })
    }

    /// Burn exactly `shares` of `owner`'s, sending the assets to `receiver`
    pub fn redeem(
        &mut self,
        env: &mut PairEnv,
        shares: Amount,
        receiver: Address,
        owner: Address,
    ) -> CogResult<Amount> {
        self.atomically(env, |pair, env| {
            pair.begin(env)?;
            let assets = pair.preview_redeem(shares)?;
            if assets == 0 {
                return Err(CogError::ZeroAmount);
            }
            pair.exit(env, assets, shares, receiver, owner)?;
            Ok(assets)
        })
    }

    /// Mint accrued protocol fees as shares to the fee recipient.
    ///
    /// Returns the shares minted.
    pub fn roll_over_pol(&mut self, env: &mut PairEnv) -> CogResult<Amount> {
        self.atomically(env, |pair, env| {
            pair.begin(env)?;
            let fees = pair.state.interest.accrue_info.fees_earned_fraction;
            if fees == 0 {
                return Ok(0);
            }
            let shares = pair.convert_to_shares(fees)?;
            let fee_to = pair.state.fee_to;
            pair.state.shares.mint(&fee_to, shares)?;
            pair.state.interest.accrue_info.fees_earned_fraction = 0;

            env.events.emit(CogEvent::FeesRolledOver {
                fee_to,
                assets: fees,
                shares,
                timestamp: env.timestamp,
            });
            Ok(shares)
        })
    }

    // ============ Share Transfers ============

    pub fn transfer(&mut self, env: &mut PairEnv, to: Address, shares: Amount) -> CogResult<()> {
        self.atomically(env, |pair, env| {
            pair.require_not_paused()?;
            let from = env.signer;
            pair.state.shares.transfer(&from, &to, shares)?;
            env.events.emit(CogEvent::ShareTransfer { from, to, shares, timestamp: env.timestamp });
            Ok(())
        })
    }

    pub fn transfer_from(
        &mut self,
        env: &mut PairEnv,
        owner: Address,
        to: Address,
        shares: Amount,
    ) -> CogResult<()> {
        self.atomically(env, |pair, env| {
            pair.require_not_paused()?;
            pair.state.shares.spend_allowance(&owner, &env.signer, shares)?;
            pair.state.shares.transfer(&owner, &to, shares)?;
            env.events.emit(CogEvent::ShareTransfer { from: owner, to, shares, timestamp: env.timestamp });
            Ok(())
        })
    }

    pub fn approve(&mut self, env: &mut PairEnv, spender: Address, shares: Amount) -> CogResult<()> {
        self.require_not_paused()?;
        self.state.shares.approve(&env.signer, &spender, shares);
        env.events.emit(CogEvent::ShareApproval {
            owner: env.signer,
            spender,
            shares,
            timestamp: env.timestamp,
        });
        Ok(())
    }

    // ============ Internal ============

    fn enter(&mut self, env: &mut PairEnv, assets: Amount, shares: Amount, receiver: Address) -> CogResult<()> {
        let pair = self.binding.pair;
        self.state.shares.mint(&receiver, shares)?;
        self.state.held_assets = safe_add(self.state.held_assets, assets)?;
        env.asset.transfer_from(&pair, &env.signer, &pair, assets)?;

        env.events.emit(CogEvent::Deposit {
            caller: env.signer,
            owner: receiver,
            assets,
            shares,
            timestamp: env.timestamp,
        });
        Ok(())
    }

    fn exit(
        &mut self,
        env: &mut PairEnv,
        assets: Amount,
        shares: Amount,
        receiver: Address,
        owner: Address,
    ) -> CogResult<()> {
        if assets > self.state.held_assets {
            return Err(CogError::InsufficientLiquidity {
                available: self.state.held_assets,
                requested: assets,
            });
        }
        self.state.shares.spend_allowance(&owner, &env.signer, shares)?;
        self.state.shares.burn(&owner, shares)?;
        self.state.held_assets -= assets;

        let pair = self.binding.pair;
        env.asset.transfer(&pair, &receiver, assets)?;

        env.events.emit(CogEvent::Withdraw {
            caller: env.signer,
            receiver,
            owner,
            assets,
            shares,
            timestamp: env.timestamp,
        });
        Ok(())
    }
}

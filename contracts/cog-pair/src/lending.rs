//! Collateral and Borrowing
//!
//! Collateral is credited 1:1 with the tokens transferred in. Debt is held
//! as shares of the pair's rebasing ledger, so interest accrues onto every
//! position without touching it.

use cog_common::{
    errors::{CogError, CogResult},
    events::CogEvent,
    math::{safe_add, safe_sub},
    token_ops::require_balance,
    types::{Address, Amount},
};

use crate::{CogPair, PairEnv};

impl CogPair {
    // ============ Collateral ============

    /// Credit `amount` collateral, pulled from the caller, to `to`'s position
    pub fn add_collateral(&mut self, env: &mut PairEnv, to: Address, amount: Amount) -> CogResult<()> {
        self.atomically(env, |pair, env| {
            pair.begin(env)?;
            if amount == 0 {
                return Err(CogError::ZeroAmount);
            }
            let position = pair.position_mut(&to);
            position.collateral_share = safe_add(position.collateral_share, amount)?;
            pair.state.total_collateral_share = safe_add(pair.state.total_collateral_share, amount)?;

            let this = pair.binding.pair;
            env.collateral.transfer_from(&this, &env.signer, &this, amount)?;

            env.events.emit(CogEvent::AddCollateral {
                from: env.signer,
                to,
                amount,
                timestamp: env.timestamp,
            });
            Ok(())
        })
    }

    /// Release `amount` of the caller's collateral to `to`.
    ///
    /// The caller's position must stay solvent afterwards.
    pub fn remove_collateral(&mut self, env: &mut PairEnv, to: Address, amount: Amount) -> CogResult<()> {
        self.atomically(env, |pair, env| {
            pair.begin(env)?;
            if amount == 0 {
                return Err(CogError::ZeroAmount);
            }
            pair.update_exchange_rate(env)?;

            let user = env.signer;
            let position = pair.position_mut(&user);
            if amount > position.collateral_share {
                return Err(CogError::InsufficientBalance {
                    available: position.collateral_share,
                    requested: amount,
                });
            }
            position.collateral_share -= amount;
            pair.state.total_collateral_share = safe_sub(pair.state.total_collateral_share, amount)?;
            pair.require_solvent(&user)?;

            let this = pair.binding.pair;
            env.collateral.transfer(&this, &to, amount)?;

            env.events.emit(CogEvent::RemoveCollateral {
                from: user,
                to,
                amount,
                timestamp: env.timestamp,
            });
            Ok(())
        })
    }

    // ============ Borrowing ============

    /// Let `spender` borrow up to `amount` against the caller's position
    pub fn approve_borrow(&mut self, env: &mut PairEnv, spender: Address, amount: Amount) -> CogResult<()> {
        self.require_not_paused()?;
        self.state.borrow_allowances.insert((env.signer, spender), amount);
        env.events.emit(CogEvent::BorrowApproval {
            owner: env.signer,
            spender,
            amount,
            timestamp: env.timestamp,
        });
        Ok(())
    }

    /// Borrow `amount` assets against `owner`'s collateral, sent to `receiver`.
    ///
    /// The opening fee is added to the debt on top of `amount`. A caller
    /// other than `owner` spends `owner`'s borrow allowance. Returns the
    /// debt shares added to `owner`.
    pub fn borrow(
        &mut self,
        env: &mut PairEnv,
        owner: Address,
        receiver: Address,
        amount: Amount,
    ) -> CogResult<Amount> {
        self.atomically(env, |pair, env| {
            pair.begin(env)?;
            if amount == 0 {
                return Err(CogError::ZeroAmount);
            }
            pair.update_exchange_rate(env)?;
            if pair.state.exchange_rate == 0 {
                return Err(CogError::ExchangeRateUnavailable);
            }
            if env.signer != owner {
                pair.spend_borrow_allowance(&owner, &env.signer, amount)?;
            }
            if amount > pair.state.held_assets {
                return Err(CogError::InsufficientLiquidity {
                    available: pair.state.held_assets,
                    requested: amount,
                });
            }

            let fee = pair.state.borrow_opening_fee.apply_down(amount)?;
            let debt = safe_add(amount, fee)?;
            let mut position = pair.position(&owner);
            let part = pair.state.total_borrow.add_debt(&mut position, debt, true)?;
            pair.state.positions.insert(owner, position);
            pair.require_solvent(&owner)?;

            pair.state.held_assets -= amount;
            let this = pair.binding.pair;
            env.asset.transfer(&this, &receiver, amount)?;

            env.events.emit(CogEvent::Borrow {
                owner,
                receiver,
                amount,
                fee,
                part,
                timestamp: env.timestamp,
            });
            Ok(part)
        })
    }

    /// Burn `part` of `to`'s debt shares, pulling what they are worth from
    /// the caller. Returns the assets paid.
    pub fn repay(&mut self, env: &mut PairEnv, to: Address, part: Amount) -> CogResult<Amount> {
        self.atomically(env, |pair, env| {
            pair.begin(env)?;
            if part == 0 {
                return Err(CogError::ZeroAmount);
            }
            let mut position = pair.position(&to);
            if part > position.borrow_part {
                return Err(CogError::Overpayment {
                    outstanding: position.borrow_part,
                    requested: part,
                });
            }
            let amount = pair.state.total_borrow.sub_debt(&mut position, part)?;
            pair.state.positions.insert(to, position);
            pair.state.held_assets = safe_add(pair.state.held_assets, amount)?;

            let this = pair.binding.pair;
            require_balance(&*env.asset, &env.signer, amount)?;
            env.asset.transfer_from(&this, &env.signer, &this, amount)?;

            env.events.emit(CogEvent::Repay {
                payer: env.signer,
                to,
                amount,
                part,
                timestamp: env.timestamp,
            });
            Ok(amount)
        })
    }

    fn spend_borrow_allowance(&mut self, owner: &Address, spender: &Address, amount: Amount) -> CogResult<()> {
        let available = self.borrow_allowance(owner, spender);
        if available < amount {
            return Err(CogError::InsufficientBorrowAllowance {
                available,
                requested: amount,
            });
        }
        if available != Amount::MAX {
            self.state.borrow_allowances.insert((*owner, *spender), available - amount);
        }
        Ok(())
    }
}

// crates/tidefarm-ledger/src/engine.rs
//
// The accounting engine: pool updates, deposit/withdraw/harvest
// transitions, virtual-liquidity recomputation, and reward-debt
// bookkeeping.
//
// The `Ledger` aggregate is the single shared mutable resource. Every
// public operation runs to completion under `&mut self`, which gives the
// one-at-a-time transaction model for free: callers serialize access with
// a mutex or a single-writer task.
//
// Operation shape, everywhere: checks -> fallible fixed-point computation
// -> external bank call -> infallible commit. A failed bank call aborts
// the operation with no user-visible state change. The one exception is
// the pool accumulator refresh, which commits independently because it is
// valid at any block (it is exactly `mass_update_pools`, callable by
// anyone at any time).

use serde::{Deserialize, Serialize};

use tidefarm_core::{
    AccountId, Authorizer, Bank, Clock, LedgerError, Migrator, PoolId, Role, TokenId,
};

use crate::deposit::{Deposit, DepositBook, UserAccount};
use crate::emitter::pending_emission;
use crate::events::LedgerEvent;
use crate::multiplier::MultiplierTable;
use crate::pool::{Pool, PoolRegistry};
use crate::units::{mul_div, to_signed, ACC_PRECISION, MULTIPLIER_SCALE};

/// Injected collaborators for one ledger operation.
pub struct TxContext<'a> {
    /// The account invoking the operation.
    pub caller: AccountId,
    /// Block-height source.
    pub clock: &'a dyn Clock,
    /// Capability check for privileged operations.
    pub auth: &'a dyn Authorizer,
    /// Token custody and reward payout.
    pub bank: &'a mut dyn Bank,
}

/// The reward ledger: pools, deposits, user accounts, and the global
/// emission schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    registry: PoolRegistry,
    book: DepositBook,
    /// Current emission rate, reward-token units per block.
    reward_per_block: u128,
    /// Gates all state-mutating entry points; read-only queries stay open.
    paused: bool,
    /// Custody-relocation target armed by the governor. Migration is
    /// refused until this is set.
    migrator: Option<AccountId>,
    #[serde(skip)]
    events: Vec<LedgerEvent>,
}

impl Ledger {
    /// Create a ledger with the given per-block emission rate and no pools.
    pub fn new(reward_per_block: u128) -> Self {
        Self {
            reward_per_block,
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------
    // Pool accumulator updates
    // -----------------------------------------------------------------

    /// Bring one pool's `acc_reward_per_share` current for `current_block`.
    ///
    /// No-op when the pool was already updated this block. When the pool
    /// has zero virtual supply the interval's reward is burned and only
    /// `last_reward_block` advances.
    pub fn update_pool(&mut self, pool_id: PoolId, current_block: u64) -> Result<(), LedgerError> {
        let reward_per_block = self.reward_per_block;
        let total_alloc = self.registry.total_alloc_point();
        let pool = self.registry.get_mut(pool_id)?;
        if pool.last_reward_block == current_block {
            return Ok(());
        }

        let reward = pending_emission(
            reward_per_block,
            pool.alloc_point,
            total_alloc,
            pool.virtual_total_supply,
            pool.last_reward_block,
            current_block,
        )?;
        if reward > 0 {
            let delta = mul_div(reward, ACC_PRECISION, pool.virtual_total_supply)?;
            pool.acc_reward_per_share = pool
                .acc_reward_per_share
                .checked_add(delta)
                .ok_or(LedgerError::ArithmeticOverflow)?;
        }
        pool.last_reward_block = current_block;
        Ok(())
    }

    /// Apply `update_pool` to each listed pool. Pools are independent, so
    /// there is no ordering requirement between them.
    pub fn mass_update_pools(
        &mut self,
        pool_ids: &[PoolId],
        current_block: u64,
    ) -> Result<(), LedgerError> {
        for &pool_id in pool_ids {
            self.update_pool(pool_id, current_block)?;
        }
        Ok(())
    }

    /// Bring every pool current. Required before any weight or rate change
    /// so historical accrual is settled at the old parameters.
    fn update_all_pools(&mut self, current_block: u64) -> Result<(), LedgerError> {
        for pool_id in 0..self.registry.len() {
            self.update_pool(pool_id, current_block)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // User-facing operations
    // -----------------------------------------------------------------

    /// Stake `amount` of the pool's token for `lock_length` blocks.
    ///
    /// Returns the new deposit's slot index in the caller's per-pool list.
    ///
    /// # Errors
    /// `Paused`, `UnknownPool`, `InvalidLockLength`, `Transfer` (custody
    /// pull rejected), or `ArithmeticOverflow`.
    pub fn deposit(
        &mut self,
        ctx: &mut TxContext<'_>,
        pool_id: PoolId,
        amount: u128,
        lock_length: u64,
    ) -> Result<usize, LedgerError> {
        self.ensure_not_paused()?;
        let current_block = ctx.clock.current_block();

        let (stake_token, multiplier) = {
            let pool = self.registry.get(pool_id)?;
            (pool.stake_token, pool.multipliers.multiplier_for(lock_length)?)
        };
        let unlock_block = current_block
            .checked_add(lock_length)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let virtual_delta = mul_div(amount, multiplier, MULTIPLIER_SCALE)?;

        self.update_pool(pool_id, current_block)?;

        // Compute every new value before touching custody, so a rejected
        // transfer leaves the ledger untouched.
        let pool = self.registry.get(pool_id)?;
        let acc = pool.acc_reward_per_share;
        let new_supply = pool
            .virtual_total_supply
            .checked_add(virtual_delta)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let new_staked = pool
            .total_staked
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let debt_delta = to_signed(mul_div(virtual_delta, acc, ACC_PRECISION)?)?;
        let account = self.user_info(pool_id, &ctx.caller);
        let new_virtual = account
            .virtual_amount
            .checked_add(virtual_delta)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let new_debt = account
            .reward_debt
            .checked_add(debt_delta)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        ctx.bank.transfer_in(stake_token, &ctx.caller, amount)?;

        let pool = self.registry.get_mut(pool_id)?;
        pool.virtual_total_supply = new_supply;
        pool.total_staked = new_staked;
        let user = self.book.get_or_create(pool_id, &ctx.caller);
        let deposit_index = user.push(Deposit {
            amount,
            unlock_block,
            multiplier,
        });
        user.account.virtual_amount = new_virtual;
        user.account.reward_debt = new_debt;

        self.events.push(LedgerEvent::Deposit {
            user: ctx.caller,
            pool_id,
            amount,
            deposit_index,
        });
        Ok(deposit_index)
    }

    /// Settle all accrued reward for the caller in a pool, paying to `to`.
    ///
    /// Returns the amount paid. A zero payout is a success, not an error,
    /// and two harvests in the same block pay zero the second time.
    pub fn harvest(
        &mut self,
        ctx: &mut TxContext<'_>,
        pool_id: PoolId,
        to: AccountId,
    ) -> Result<u128, LedgerError> {
        self.ensure_not_paused()?;
        let current_block = ctx.clock.current_block();
        self.update_pool(pool_id, current_block)?;

        let acc = self.registry.get(pool_id)?.acc_reward_per_share;
        let account = self.user_info(pool_id, &ctx.caller);
        let accrued = to_signed(mul_div(account.virtual_amount, acc, ACC_PRECISION)?)?;
        // Debt tracks the share price exactly at every virtual-amount
        // change, so this difference is never negative.
        let owed = accrued
            .checked_sub(account.reward_debt)
            .map(|v| u128::try_from(v).unwrap_or(0))
            .ok_or(LedgerError::ArithmeticOverflow)?;

        if owed > 0 {
            ctx.bank.mint_reward(&to, owed)?;
        }

        let user = self.book.get_or_create(pool_id, &ctx.caller);
        user.account.reward_debt = accrued;

        tracing::debug!(
            "Harvest: pool {} paid {} reward units",
            pool_id,
            owed
        );
        self.events.push(LedgerEvent::Harvest {
            user: ctx.caller,
            pool_id,
            amount: owed,
            to,
        });
        Ok(owed)
    }

    /// Withdraw `amount` of principal from one specific deposit slot,
    /// without harvesting.
    ///
    /// The slot is decremented in place and never removed, so other slot
    /// indices stay valid. Removing principal drives `reward_debt`
    /// negative when unharvested reward exists; the next harvest settles
    /// the difference, so nothing accrued is ever forfeited here.
    pub fn withdraw_from_deposit(
        &mut self,
        ctx: &mut TxContext<'_>,
        pool_id: PoolId,
        amount: u128,
        deposit_index: usize,
    ) -> Result<(), LedgerError> {
        self.ensure_not_paused()?;
        let current_block = ctx.clock.current_block();

        let (stake_token, pool_unlocked) = {
            let pool = self.registry.get(pool_id)?;
            (pool.stake_token, pool.unlocked)
        };
        let (slot_amount, unlock_block, multiplier) = {
            let user = self
                .book
                .get(pool_id, &ctx.caller)
                .ok_or(LedgerError::UnknownDeposit(deposit_index))?;
            let slot = user.deposit(deposit_index)?;
            (slot.amount, slot.unlock_block, slot.multiplier)
        };

        if !pool_unlocked && unlock_block > current_block {
            return Err(LedgerError::TokensLocked {
                unlock_block,
                current_block,
            });
        }
        if amount > slot_amount {
            return Err(LedgerError::InsufficientDeposit {
                requested: amount,
                available: slot_amount,
            });
        }

        self.update_pool(pool_id, current_block)?;

        let pool = self.registry.get(pool_id)?;
        let acc = pool.acc_reward_per_share;
        let virtual_delta = mul_div(amount, multiplier, MULTIPLIER_SCALE)?;
        let debt_delta = to_signed(mul_div(virtual_delta, acc, ACC_PRECISION)?)?;
        let new_supply = pool
            .virtual_total_supply
            .checked_sub(virtual_delta)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let new_staked = pool
            .total_staked
            .checked_sub(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let account = self.user_info(pool_id, &ctx.caller);
        let new_virtual = account
            .virtual_amount
            .checked_sub(virtual_delta)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let new_debt = account
            .reward_debt
            .checked_sub(debt_delta)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        ctx.bank.transfer_out(stake_token, &ctx.caller, amount)?;

        let pool = self.registry.get_mut(pool_id)?;
        pool.virtual_total_supply = new_supply;
        pool.total_staked = new_staked;
        let user = self.book.get_mut(pool_id, &ctx.caller)?;
        user.deposit_mut(deposit_index)?.amount = slot_amount - amount;
        user.account.virtual_amount = new_virtual;
        user.account.reward_debt = new_debt;

        self.events.push(LedgerEvent::Withdraw {
            user: ctx.caller,
            pool_id,
            amount,
            to: ctx.caller,
        });
        Ok(())
    }

    /// Retire every deposit slot, harvest all owed reward, and transfer
    /// the summed principal to `to`.
    ///
    /// Requires every slot still holding principal to be unlocked (the
    /// pool-level `unlocked` flag bypasses this). The only path that
    /// compacts the slot arena to length zero and fully resets the
    /// account. Calling again with nothing staked is a zero-transfer
    /// success.
    ///
    /// Returns `(principal, harvested)`.
    pub fn withdraw_all_and_harvest(
        &mut self,
        ctx: &mut TxContext<'_>,
        pool_id: PoolId,
        to: AccountId,
    ) -> Result<(u128, u128), LedgerError> {
        self.ensure_not_paused()?;
        let current_block = ctx.clock.current_block();

        let (stake_token, pool_unlocked) = {
            let pool = self.registry.get(pool_id)?;
            (pool.stake_token, pool.unlocked)
        };
        if let Some(user) = self.book.get(pool_id, &ctx.caller) {
            for slot in &user.deposits {
                if slot.amount > 0 && !pool_unlocked && slot.unlock_block > current_block {
                    return Err(LedgerError::TokensLocked {
                        unlock_block: slot.unlock_block,
                        current_block,
                    });
                }
            }
        }

        self.update_pool(pool_id, current_block)?;

        let acc = self.registry.get(pool_id)?.acc_reward_per_share;
        let account = self.user_info(pool_id, &ctx.caller);
        let accrued = to_signed(mul_div(account.virtual_amount, acc, ACC_PRECISION)?)?;
        let owed = accrued
            .checked_sub(account.reward_debt)
            .map(|v| u128::try_from(v).unwrap_or(0))
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let principal = self
            .book
            .get(pool_id, &ctx.caller)
            .map(|u| u.total_principal())
            .unwrap_or(0);
        let pool = self.registry.get(pool_id)?;
        let new_supply = pool
            .virtual_total_supply
            .checked_sub(account.virtual_amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let new_staked = pool
            .total_staked
            .checked_sub(principal)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        if owed > 0 {
            ctx.bank.mint_reward(&to, owed)?;
        }
        if principal > 0 {
            ctx.bank.transfer_out(stake_token, &to, principal)?;
        }

        let pool = self.registry.get_mut(pool_id)?;
        pool.virtual_total_supply = new_supply;
        pool.total_staked = new_staked;
        if let Ok(user) = self.book.get_mut(pool_id, &ctx.caller) {
            user.retire_all();
        }

        self.events.push(LedgerEvent::Harvest {
            user: ctx.caller,
            pool_id,
            amount: owed,
            to,
        });
        self.events.push(LedgerEvent::Withdraw {
            user: ctx.caller,
            pool_id,
            amount: principal,
            to,
        });
        Ok((principal, owed))
    }

    /// Retire every deposit slot and return principal, forfeiting all
    /// pending reward. Fail-safe for when reward computation itself might
    /// be broken; same lock check as the other withdrawal paths.
    pub fn emergency_withdraw(
        &mut self,
        ctx: &mut TxContext<'_>,
        pool_id: PoolId,
    ) -> Result<u128, LedgerError> {
        self.ensure_not_paused()?;
        let current_block = ctx.clock.current_block();

        let (stake_token, pool_unlocked) = {
            let pool = self.registry.get(pool_id)?;
            (pool.stake_token, pool.unlocked)
        };
        if let Some(user) = self.book.get(pool_id, &ctx.caller) {
            for slot in &user.deposits {
                if slot.amount > 0 && !pool_unlocked && slot.unlock_block > current_block {
                    return Err(LedgerError::TokensLocked {
                        unlock_block: slot.unlock_block,
                        current_block,
                    });
                }
            }
        }

        // Refresh the accumulator before supply shrinks, so the forfeited
        // share stays stranded instead of leaking to remaining stakers.
        self.update_pool(pool_id, current_block)?;

        let account = self.user_info(pool_id, &ctx.caller);
        let principal = self
            .book
            .get(pool_id, &ctx.caller)
            .map(|u| u.total_principal())
            .unwrap_or(0);
        let pool = self.registry.get(pool_id)?;
        let new_supply = pool
            .virtual_total_supply
            .checked_sub(account.virtual_amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let new_staked = pool
            .total_staked
            .checked_sub(principal)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        if principal > 0 {
            ctx.bank.transfer_out(stake_token, &ctx.caller, principal)?;
        }

        let pool = self.registry.get_mut(pool_id)?;
        pool.virtual_total_supply = new_supply;
        pool.total_staked = new_staked;
        if let Ok(user) = self.book.get_mut(pool_id, &ctx.caller) {
            user.retire_all();
        }

        tracing::warn!(
            "Emergency withdraw: pool {} returned {} principal, rewards forfeited",
            pool_id,
            principal
        );
        self.events.push(LedgerEvent::EmergencyWithdraw {
            user: ctx.caller,
            pool_id,
            amount: principal,
        });
        Ok(principal)
    }

    /// Relocate a pool's custodied stake balance through the configured
    /// migrator and adopt the token reference it returns. Callable by
    /// anyone once a migrator is armed; per-user bookkeeping is untouched.
    pub fn migrate(
        &mut self,
        pool_id: PoolId,
        migrator: &mut dyn Migrator,
    ) -> Result<(), LedgerError> {
        if self.migrator.is_none() {
            return Err(LedgerError::MigratorUnset);
        }
        let (stake_token, total_staked) = {
            let pool = self.registry.get(pool_id)?;
            (pool.stake_token, pool.total_staked)
        };
        let new_token = migrator.migrate(stake_token, total_staked)?;
        self.registry.get_mut(pool_id)?.stake_token = new_token;

        tracing::info!(
            "Migrated pool {}: moved {} staked units to new custody",
            pool_id,
            total_staked
        );
        self.events.push(LedgerEvent::Migrated {
            pool_id,
            amount: total_staked,
        });
        Ok(())
    }

    // -----------------------------------------------------------------
    // Pool administration (privileged)
    // -----------------------------------------------------------------

    /// Append a new pool. Governor only.
    ///
    /// The multiplier list must be non-empty, must include a zero-lock
    /// entry, and every multiplier must be at least 1.0x. A `Some`
    /// migrator hint arms the migrator target, same as `set_migrator`.
    pub fn add_pool(
        &mut self,
        ctx: &mut TxContext<'_>,
        alloc_point: u128,
        stake_token: TokenId,
        migrator_hint: Option<AccountId>,
        multipliers: &[(u64, u128)],
    ) -> Result<PoolId, LedgerError> {
        self.require_role(ctx, Role::Governor)?;
        let table = MultiplierTable::from_entries(multipliers)?;
        let current_block = ctx.clock.current_block();

        // Settle every existing pool at the old weight ratio before the
        // global weight sum changes.
        self.update_all_pools(current_block)?;

        let pool_id = self
            .registry
            .add(Pool::new(stake_token, alloc_point, current_block, table))?;
        if migrator_hint.is_some() {
            self.migrator = migrator_hint;
        }

        tracing::info!(
            "Added pool {} with {} allocation points",
            pool_id,
            alloc_point
        );
        self.events.push(LedgerEvent::PoolAdded {
            pool_id,
            alloc_point,
        });
        Ok(pool_id)
    }

    /// Change a pool's weight and optionally overwrite its stake-token
    /// reference. Governor only. Rejects a change that would zero the
    /// global weight sum.
    pub fn set_pool(
        &mut self,
        ctx: &mut TxContext<'_>,
        pool_id: PoolId,
        new_alloc_point: u128,
        stake_token: Option<TokenId>,
    ) -> Result<(), LedgerError> {
        self.require_role(ctx, Role::Governor)?;
        let current_block = ctx.clock.current_block();
        self.update_all_pools(current_block)?;

        self.registry.set_alloc_point(pool_id, new_alloc_point)?;
        if let Some(token) = stake_token {
            self.registry.get_mut(pool_id)?.stake_token = token;
        }

        self.events.push(LedgerEvent::PoolAllocChanged {
            pool_id,
            alloc_point: new_alloc_point,
        });
        Ok(())
    }

    /// Insert or overwrite one multiplier entry for an existing pool.
    /// Governor only.
    ///
    /// Any decrease to an existing multiplier value force-unlocks the
    /// pool: stepping down the incentive must not trap users who locked
    /// under the old, richer terms. Stepping a multiplier up (or adding a
    /// brand-new lock length) does not unlock.
    pub fn governor_add_pool_multiplier(
        &mut self,
        ctx: &mut TxContext<'_>,
        pool_id: PoolId,
        lock_length: u64,
        multiplier: u128,
    ) -> Result<(), LedgerError> {
        self.require_role(ctx, Role::Governor)?;
        let pool = self.registry.get_mut(pool_id)?;
        let previous = pool.multipliers.get(lock_length);
        pool.multipliers.insert(lock_length, multiplier)?;

        if previous.is_some_and(|old| multiplier < old) && !pool.unlocked {
            pool.unlocked = true;
            tracing::info!(
                "Pool {} force-unlocked: multiplier for lock {} stepped down",
                pool_id,
                lock_length
            );
            self.events.push(LedgerEvent::PoolLocked {
                pool_id,
                unlocked: true,
            });
        }
        Ok(())
    }

    /// Re-enable lock enforcement for a pool. Governor only.
    pub fn lock_pool(&mut self, ctx: &mut TxContext<'_>, pool_id: PoolId) -> Result<(), LedgerError> {
        self.require_role(ctx, Role::Governor)?;
        self.registry.get_mut(pool_id)?.unlocked = false;
        self.events.push(LedgerEvent::PoolLocked {
            pool_id,
            unlocked: false,
        });
        Ok(())
    }

    /// Bypass all lock enforcement for a pool. Governor only.
    pub fn unlock_pool(
        &mut self,
        ctx: &mut TxContext<'_>,
        pool_id: PoolId,
    ) -> Result<(), LedgerError> {
        self.require_role(ctx, Role::Governor)?;
        self.registry.get_mut(pool_id)?.unlocked = true;
        self.events.push(LedgerEvent::PoolLocked {
            pool_id,
            unlocked: true,
        });
        Ok(())
    }

    /// Kill-switch: freeze a pool's future emission and force-unlock it.
    /// Governor or guardian.
    ///
    /// Already-accrued `acc_reward_per_share` is preserved, so unharvested
    /// rewards remain claimable.
    pub fn reset_rewards(
        &mut self,
        ctx: &mut TxContext<'_>,
        pool_id: PoolId,
    ) -> Result<(), LedgerError> {
        self.require_governor_or_guardian(ctx)?;
        let current_block = ctx.clock.current_block();
        self.update_all_pools(current_block)?;

        self.registry.zero_alloc_point(pool_id)?;
        self.registry.get_mut(pool_id)?.unlocked = true;

        tracing::info!("Reset rewards for pool {}: emission frozen, pool unlocked", pool_id);
        self.events.push(LedgerEvent::PoolAllocChanged {
            pool_id,
            alloc_point: 0,
        });
        self.events.push(LedgerEvent::PoolLocked {
            pool_id,
            unlocked: true,
        });
        Ok(())
    }

    /// Change the global per-block emission rate. Governor only.
    ///
    /// Every pool is brought current first, so historical accrual keeps
    /// the old rate and only future blocks reflect the new one.
    pub fn update_block_reward(
        &mut self,
        ctx: &mut TxContext<'_>,
        new_rate: u128,
    ) -> Result<(), LedgerError> {
        self.require_role(ctx, Role::Governor)?;
        let current_block = ctx.clock.current_block();
        self.update_all_pools(current_block)?;
        self.reward_per_block = new_rate;

        tracing::info!("Reward per block set to {}", new_rate);
        self.events.push(LedgerEvent::NewRewardPerBlock { rate: new_rate });
        Ok(())
    }

    /// Arm the custody-relocation target. Governor only.
    pub fn set_migrator(
        &mut self,
        ctx: &mut TxContext<'_>,
        target: AccountId,
    ) -> Result<(), LedgerError> {
        self.require_role(ctx, Role::Governor)?;
        self.migrator = Some(target);
        Ok(())
    }

    /// Halt all mutating entry points. Governor or guardian.
    pub fn pause(&mut self, ctx: &mut TxContext<'_>) -> Result<(), LedgerError> {
        self.require_governor_or_guardian(ctx)?;
        self.paused = true;
        tracing::info!("Ledger paused");
        self.events.push(LedgerEvent::Paused);
        Ok(())
    }

    /// Resume mutating entry points. Governor only.
    pub fn unpause(&mut self, ctx: &mut TxContext<'_>) -> Result<(), LedgerError> {
        self.require_role(ctx, Role::Governor)?;
        self.paused = false;
        tracing::info!("Ledger unpaused");
        self.events.push(LedgerEvent::Unpaused);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Read-only surface
    // -----------------------------------------------------------------

    /// Reward the caller would receive from a harvest in this block, as a
    /// pure simulation of `update_pool`. Exact to the unit: a harvest at
    /// the same block and virtual amount pays precisely this.
    pub fn pending_rewards(
        &self,
        pool_id: PoolId,
        user: &AccountId,
        current_block: u64,
    ) -> Result<u128, LedgerError> {
        let pool = self.registry.get(pool_id)?;
        let mut acc = pool.acc_reward_per_share;
        if current_block > pool.last_reward_block && pool.virtual_total_supply > 0 {
            let reward = pending_emission(
                self.reward_per_block,
                pool.alloc_point,
                self.registry.total_alloc_point(),
                pool.virtual_total_supply,
                pool.last_reward_block,
                current_block,
            )?;
            acc = acc
                .checked_add(mul_div(reward, ACC_PRECISION, pool.virtual_total_supply)?)
                .ok_or(LedgerError::ArithmeticOverflow)?;
        }

        let account = self.user_info(pool_id, user);
        let accrued = to_signed(mul_div(account.virtual_amount, acc, ACC_PRECISION)?)?;
        Ok(accrued
            .checked_sub(account.reward_debt)
            .map(|v| u128::try_from(v).unwrap_or(0))
            .ok_or(LedgerError::ArithmeticOverflow)?)
    }

    /// Per-(pool, user) account summary; zeroed when no state exists.
    pub fn user_info(&self, pool_id: PoolId, user: &AccountId) -> UserAccount {
        self.book
            .get(pool_id, user)
            .map(|u| u.account)
            .unwrap_or_default()
    }

    /// One deposit slot.
    pub fn deposit_info(
        &self,
        pool_id: PoolId,
        user: &AccountId,
        deposit_index: usize,
    ) -> Result<Deposit, LedgerError> {
        self.book
            .get(pool_id, user)
            .ok_or(LedgerError::UnknownDeposit(deposit_index))?
            .deposit(deposit_index)
            .cloned()
    }

    /// Number of the user's open deposit slots in a pool, zeroed slots
    /// included.
    pub fn open_user_deposits(&self, pool_id: PoolId, user: &AccountId) -> usize {
        self.book
            .get(pool_id, user)
            .map(|u| u.open_deposits())
            .unwrap_or(0)
    }

    /// Raw staked amount custodied for a pool.
    pub fn get_total_staked_in_pool(&self, pool_id: PoolId) -> Result<u128, LedgerError> {
        Ok(self.registry.get(pool_id)?.total_staked)
    }

    /// Pool state by id.
    pub fn pool_info(&self, pool_id: PoolId) -> Result<&Pool, LedgerError> {
        self.registry.get(pool_id)
    }

    /// Number of pools ever created.
    pub fn num_pools(&self) -> usize {
        self.registry.len()
    }

    /// The multiplier a deposit at `lock_length` would receive in a pool.
    pub fn reward_multipliers(
        &self,
        pool_id: PoolId,
        lock_length: u64,
    ) -> Result<u128, LedgerError> {
        self.registry.get(pool_id)?.multipliers.multiplier_for(lock_length)
    }

    /// Current emission rate in reward-token units per block.
    pub fn reward_per_block(&self) -> u128 {
        self.reward_per_block
    }

    /// Sum of allocation points across all pools.
    pub fn total_alloc_point(&self) -> u128 {
        self.registry.total_alloc_point()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Drain the buffered events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    /// All deposit state, for invariant checks and diagnostics.
    pub fn deposit_book(&self) -> &DepositBook {
        &self.book
    }

    // -----------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------

    fn ensure_not_paused(&self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        Ok(())
    }

    fn require_role(&self, ctx: &TxContext<'_>, role: Role) -> Result<(), LedgerError> {
        if ctx.auth.has_role(&ctx.caller, role) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized { role })
        }
    }

    fn require_governor_or_guardian(&self, ctx: &TxContext<'_>) -> Result<(), LedgerError> {
        if ctx.auth.has_role(&ctx.caller, Role::Governor)
            || ctx.auth.has_role(&ctx.caller, Role::Guardian)
        {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                role: Role::Guardian,
            })
        }
    }
}

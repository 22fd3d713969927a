// crates/tidefarm-ledger/src/pool.rs
//
// Pool state and the ordered pool registry.
//
// A pool is an independent reward stream tied to one stake token and one
// allocation weight. The registry keeps the pools in creation order (a
// pool's id is its index, stable forever) and maintains the global
// allocation-weight sum.

use serde::{Deserialize, Serialize};

use tidefarm_core::{LedgerError, PoolId, TokenId};

use crate::multiplier::MultiplierTable;

/// One reward pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    /// The external stake asset custodied for this pool.
    pub stake_token: TokenId,
    /// Allocation weight; this pool's share of global emission is
    /// `alloc_point / total_alloc_point`.
    pub alloc_point: u128,
    /// Block height at which `acc_reward_per_share` was last brought current.
    pub last_reward_block: u64,
    /// Cumulative reward per unit of virtual liquidity since pool creation,
    /// fixed point at `ACC_PRECISION`.
    pub acc_reward_per_share: u128,
    /// Sum of all active deposits' `amount * multiplier / MULTIPLIER_SCALE`.
    pub virtual_total_supply: u128,
    /// Sum of all active deposits' raw staked amounts (custody balance).
    pub total_staked: u128,
    /// When true, all lock-length enforcement in this pool is bypassed.
    pub unlocked: bool,
    /// Lock-length -> multiplier table fixed per deposit at creation time.
    pub multipliers: MultiplierTable,
}

impl Pool {
    /// Create a pool at the given starting block.
    pub fn new(
        stake_token: TokenId,
        alloc_point: u128,
        start_block: u64,
        multipliers: MultiplierTable,
    ) -> Self {
        Self {
            stake_token,
            alloc_point,
            last_reward_block: start_block,
            acc_reward_per_share: 0,
            virtual_total_supply: 0,
            total_staked: 0,
            unlocked: false,
            multipliers,
        }
    }
}

/// Ordered list of pools plus the global allocation-weight sum.
///
/// Invariant after every call: `total_alloc_point == Σ pool.alloc_point`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolRegistry {
    pools: Vec<Pool>,
    total_alloc_point: u128,
}

impl PoolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new pool and return its id.
    ///
    /// # Errors
    /// Returns `LedgerError::InvalidConfig` if `alloc_point` is zero.
    pub fn add(&mut self, pool: Pool) -> Result<PoolId, LedgerError> {
        if pool.alloc_point == 0 {
            return Err(LedgerError::InvalidConfig(
                "pool allocation points must be nonzero".to_string(),
            ));
        }
        self.total_alloc_point += pool.alloc_point;
        self.pools.push(pool);
        Ok(self.pools.len() - 1)
    }

    /// Change a pool's allocation weight, keeping the sum current.
    ///
    /// # Errors
    /// Returns `LedgerError::UnknownPool` for an out-of-range id, and
    /// `LedgerError::InvalidConfig` if the change would drive the global
    /// weight sum to zero while pools exist.
    pub fn set_alloc_point(&mut self, pool_id: PoolId, new: u128) -> Result<(), LedgerError> {
        let old = self.get(pool_id)?.alloc_point;
        let new_total = self.total_alloc_point - old + new;
        if new_total == 0 {
            return Err(LedgerError::InvalidConfig(
                "total allocation points must not be driven to zero".to_string(),
            ));
        }
        self.pools[pool_id].alloc_point = new;
        self.total_alloc_point = new_total;
        Ok(())
    }

    /// Zero one pool's weight without the global-zero guard. Used only by
    /// the reward kill-switch, where freezing a sole pool is the point.
    pub fn zero_alloc_point(&mut self, pool_id: PoolId) -> Result<(), LedgerError> {
        let old = self.get(pool_id)?.alloc_point;
        self.total_alloc_point -= old;
        self.pools[pool_id].alloc_point = 0;
        Ok(())
    }

    pub fn get(&self, pool_id: PoolId) -> Result<&Pool, LedgerError> {
        self.pools.get(pool_id).ok_or(LedgerError::UnknownPool(pool_id))
    }

    pub fn get_mut(&mut self, pool_id: PoolId) -> Result<&mut Pool, LedgerError> {
        self.pools
            .get_mut(pool_id)
            .ok_or(LedgerError::UnknownPool(pool_id))
    }

    /// Number of pools ever created.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Sum of `alloc_point` across all pools.
    pub fn total_alloc_point(&self) -> u128 {
        self.total_alloc_point
    }

    /// Iterate pools in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Pool> {
        self.pools.iter()
    }
}

// crates/tidefarm-ledger/src/events.rs

use serde::{Deserialize, Serialize};

use tidefarm_core::{AccountId, PoolId};

/// Observable ledger events, buffered per operation and drained with
/// `Ledger::take_events`. Mirrors the event surface the surrounding
/// protocol's tooling listens on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Deposit {
        user: AccountId,
        pool_id: PoolId,
        amount: u128,
        /// The new deposit's slot index in the user's per-pool list.
        deposit_index: usize,
    },
    Withdraw {
        user: AccountId,
        pool_id: PoolId,
        amount: u128,
        to: AccountId,
    },
    Harvest {
        user: AccountId,
        pool_id: PoolId,
        amount: u128,
        to: AccountId,
    },
    EmergencyWithdraw {
        user: AccountId,
        pool_id: PoolId,
        amount: u128,
    },
    PoolAdded {
        pool_id: PoolId,
        alloc_point: u128,
    },
    PoolAllocChanged {
        pool_id: PoolId,
        alloc_point: u128,
    },
    PoolLocked {
        pool_id: PoolId,
        unlocked: bool,
    },
    NewRewardPerBlock {
        rate: u128,
    },
    Paused,
    Unpaused,
    Migrated {
        pool_id: PoolId,
        amount: u128,
    },
}

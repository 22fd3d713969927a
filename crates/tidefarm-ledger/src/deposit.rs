// crates/tidefarm-ledger/src/deposit.rs
//
// Per-(pool, user) deposit records and reward-debt accounts.
//
// Deposit slots behave as an arena: partial withdrawal zeroes a slot's
// amount in place and leaves its index stable, so other stored indices
// remain valid. Only the withdraw-all and emergency paths reset the slot
// vector to length zero. Index stability is a correctness requirement,
// not an implementation detail.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tidefarm_core::{AccountId, LedgerError, PoolId};

/// One locked (or unlocked) deposit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    /// Staked quantity of the pool's stake token.
    pub amount: u128,
    /// Block height at or after which principal may be withdrawn.
    pub unlock_block: u64,
    /// Reward multiplier fixed at creation time, `MULTIPLIER_SCALE` fixed
    /// point. Never changes for the life of the deposit.
    pub multiplier: u128,
}

/// Reward-debt account for one (pool, user) pair.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UserAccount {
    /// Reward-per-share-weighted value already charged against the user,
    /// fixed point at `ACC_PRECISION`. Signed: it goes negative when a
    /// user removes stake without harvesting, and the next harvest then
    /// settles the owed difference.
    pub reward_debt: i128,
    /// Sum of this user's active deposits' weighted amounts in the pool.
    pub virtual_amount: u128,
}

/// All of one user's state inside one pool: deposit slots plus account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserLedger {
    pub deposits: Vec<Deposit>,
    pub account: UserAccount,
}

impl UserLedger {
    /// Append a deposit slot and return its index.
    pub fn push(&mut self, deposit: Deposit) -> usize {
        self.deposits.push(deposit);
        self.deposits.len() - 1
    }

    /// Get a deposit slot by index.
    pub fn deposit(&self, index: usize) -> Result<&Deposit, LedgerError> {
        self.deposits.get(index).ok_or(LedgerError::UnknownDeposit(index))
    }

    pub fn deposit_mut(&mut self, index: usize) -> Result<&mut Deposit, LedgerError> {
        self.deposits
            .get_mut(index)
            .ok_or(LedgerError::UnknownDeposit(index))
    }

    /// Number of open deposit slots, zeroed slots included. This matches
    /// what a caller holding slot indices needs to iterate safely.
    pub fn open_deposits(&self) -> usize {
        self.deposits.len()
    }

    /// Total remaining principal across all slots.
    pub fn total_principal(&self) -> u128 {
        self.deposits.iter().map(|d| d.amount).sum()
    }

    /// Retire every slot at once: resets the vector to length zero and
    /// zeroes the account. Returns the principal that was outstanding.
    /// The only path that truly compacts the slot arena.
    pub fn retire_all(&mut self) -> u128 {
        let principal = self.total_principal();
        self.deposits.clear();
        self.account = UserAccount::default();
        principal
    }
}

/// All deposit state across every pool and user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepositBook {
    entries: HashMap<(PoolId, AccountId), UserLedger>,
}

impl DepositBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user's ledger for a pool, if any state exists.
    pub fn get(&self, pool_id: PoolId, user: &AccountId) -> Option<&UserLedger> {
        self.entries.get(&(pool_id, *user))
    }

    /// The user's ledger for a pool, created empty on first touch.
    pub fn get_or_create(&mut self, pool_id: PoolId, user: &AccountId) -> &mut UserLedger {
        self.entries.entry((pool_id, *user)).or_default()
    }

    /// The user's ledger for a pool, erroring on absence. Used by paths
    /// that must not materialize empty state.
    pub fn get_mut(
        &mut self,
        pool_id: PoolId,
        user: &AccountId,
    ) -> Result<&mut UserLedger, LedgerError> {
        self.entries
            .get_mut(&(pool_id, *user))
            .ok_or(LedgerError::UnknownDeposit(0))
    }

    /// Iterate every (pool, user) ledger. For invariant checks and tests.
    pub fn iter(&self) -> impl Iterator<Item = (&(PoolId, AccountId), &UserLedger)> {
        self.entries.iter()
    }
}

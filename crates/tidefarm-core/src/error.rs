// crates/tidefarm-core/src/error.rs

use thiserror::Error;

use crate::ids::{PoolId, Role};

/// Protocol-wide error types for the Tidefarm ledger.
///
/// Every error aborts the operation that raised it with no partial
/// user-visible state change; there is no retry inside the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Caller lacks the required capability.
    #[error("Unauthorized: caller lacks the {role} role")]
    Unauthorized {
        /// The role the operation required.
        role: Role,
    },

    /// A mutating entry point was called while the ledger is paused.
    #[error("Ledger is paused")]
    Paused,

    /// Pool index out of range.
    #[error("Unknown pool: {0}")]
    UnknownPool(PoolId),

    /// Invalid pool or multiplier configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested lock length has no multiplier entry in this pool.
    #[error("Invalid lock length: {0} blocks has no multiplier entry")]
    InvalidLockLength(u64),

    /// Withdrawal attempted before the deposit's unlock block.
    #[error("Tokens locked until block {unlock_block} (current block {current_block})")]
    TokensLocked {
        unlock_block: u64,
        current_block: u64,
    },

    /// Withdrawal amount exceeds the deposit slot's remaining amount.
    #[error("Insufficient deposit: requested {requested} but only {available} available")]
    InsufficientDeposit { requested: u128, available: u128 },

    /// Deposit index out of range for this (pool, user) pair.
    #[error("Unknown deposit index: {0}")]
    UnknownDeposit(usize),

    /// Token transfer rejected by the custody collaborator.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// `migrate` called before a migrator was configured.
    #[error("No migrator configured")]
    MigratorUnset,

    /// Fixed-point intermediate product overflowed 128 bits.
    #[error("Arithmetic overflow in fixed-point computation")]
    ArithmeticOverflow,

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

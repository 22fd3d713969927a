// crates/tidefarm-core/src/ids.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque account identifier (a 32-byte public key in the host environment).
pub type AccountId = [u8; 32];

/// Opaque stake-token identifier (a 32-byte asset reference).
pub type TokenId = [u8; 32];

/// Index of a pool in the ordered pool registry.
pub type PoolId = usize;

/// Capability roles the ledger checks before privileged operations.
///
/// Role storage and assignment live in the surrounding protocol; the
/// ledger only consults an injected `Authorizer` with one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Full administrative control: pool creation, weight changes,
    /// multiplier changes, emission rate, migration, unpausing.
    Governor,
    /// Emergency-response capability: pausing and reward kill-switches.
    Guardian,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Governor => write!(f, "governor"),
            Role::Guardian => write!(f, "guardian"),
        }
    }
}

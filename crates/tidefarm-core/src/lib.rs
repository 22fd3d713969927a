// crates/tidefarm-core/src/lib.rs
//
// tidefarm-core: Core types, errors, and collaborator traits for the
// Tidefarm reward ledger.
//
// This is the leaf crate the ledger crate depends on. It defines the
// identifier types, the protocol-wide error type, and the trait seams
// through which the ledger talks to its external collaborators (block
// source, capability checks, token custody, pool migration).

pub mod error;
pub mod ids;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
pub use error::LedgerError;
pub use ids::{AccountId, PoolId, Role, TokenId};
pub use traits::{Authorizer, Bank, Clock, Migrator};

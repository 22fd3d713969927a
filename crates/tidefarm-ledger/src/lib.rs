// crates/tidefarm-ledger/src/lib.rs
//
// tidefarm-ledger: multi-pool, block-driven reward accounting and
// locked-deposit engine for the Tidefarm Protocol.
//
// The ledger distributes the reward token to depositors of stake tokens,
// proportionally to stake size, time, and an optional time-lock multiplier.
// All monetary values are integer fixed point; there is no floating point
// anywhere in the accounting path.

pub mod deposit;
pub mod emitter;
pub mod engine;
pub mod events;
pub mod multiplier;
pub mod pool;
pub mod units;

// Re-export key types for ergonomic access from downstream crates.
pub use deposit::{Deposit, DepositBook, UserAccount, UserLedger};
pub use emitter::pending_emission;
pub use engine::{Ledger, TxContext};
pub use events::LedgerEvent;
pub use multiplier::MultiplierTable;
pub use pool::{Pool, PoolRegistry};
pub use units::{mul_div, ACC_PRECISION, MULTIPLIER_SCALE};

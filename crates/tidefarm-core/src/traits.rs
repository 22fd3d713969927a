// crates/tidefarm-core/src/traits.rs
//
// Collaborator trait seams for the Tidefarm ledger.
//
// The ledger is deterministic and self-contained: block height, capability
// checks, token custody, and pool migration are all injected through these
// traits. All calls are synchronous and either fully succeed or abort the
// whole ledger operation.

use crate::error::LedgerError;
use crate::ids::{AccountId, Role, TokenId};

/// Block-height source.
///
/// Injected instead of read from ambient chain state so the ledger is
/// deterministic and testable without a real chain.
pub trait Clock {
    /// The current block height.
    fn current_block(&self) -> u64;
}

/// External capability check.
///
/// The ledger stores no roles itself; the surrounding protocol decides
/// who holds `Governor` and `Guardian`.
pub trait Authorizer {
    /// Returns `true` if `caller` holds `role`.
    fn has_role(&self, caller: &AccountId, role: Role) -> bool;
}

/// Token custody and reward payout.
///
/// Implemented by the surrounding protocol's token contracts. A returned
/// error must leave the bank unchanged; the ledger likewise rolls back the
/// operation that made the call.
pub trait Bank {
    /// Pull `amount` of `token` from `from` into ledger custody.
    fn transfer_in(
        &mut self,
        token: TokenId,
        from: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError>;

    /// Release `amount` of `token` from ledger custody to `to`.
    fn transfer_out(
        &mut self,
        token: TokenId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError>;

    /// Mint `amount` of the reward token to `to`.
    fn mint_reward(&mut self, to: &AccountId, amount: u128) -> Result<(), LedgerError>;
}

/// Relocates a pool's custodied stake-token balance to a new contract.
///
/// Returns the token reference the pool should use afterwards. Reward
/// bookkeeping (amounts, multipliers, virtual supply) is never touched
/// by migration; only the custody destination changes.
pub trait Migrator {
    fn migrate(&mut self, token: TokenId, amount: u128) -> Result<TokenId, LedgerError>;
}

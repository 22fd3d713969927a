// crates/tidefarm-ledger/src/multiplier.rs
//
// Per-pool lock-length multiplier table.
//
// Each pool maps a lock length (in blocks) to a reward multiplier, fixed
// point at MULTIPLIER_SCALE. A deposit's multiplier is fixed at creation
// time from this table and never changes for the life of the deposit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tidefarm_core::LedgerError;

use crate::units::MULTIPLIER_SCALE;

/// Lock-length -> reward multiplier mapping for one pool.
///
/// Every table must offer a `lock_length == 0` entry (the no-lock option)
/// and every multiplier must be at least 1.0x; a multiplier below scale
/// would make locking strictly punitive, which is disallowed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiplierTable {
    entries: BTreeMap<u64, u128>,
}

impl MultiplierTable {
    /// Build a table from `(lock_length, multiplier)` pairs, validating
    /// the pool-creation rules.
    ///
    /// # Errors
    /// Returns `LedgerError::InvalidConfig` if the list is empty, lacks a
    /// zero-lock entry, or contains a multiplier below `MULTIPLIER_SCALE`.
    pub fn from_entries(entries: &[(u64, u128)]) -> Result<Self, LedgerError> {
        if entries.is_empty() {
            return Err(LedgerError::InvalidConfig(
                "multiplier list must not be empty".to_string(),
            ));
        }

        let mut table = BTreeMap::new();
        for &(lock_length, multiplier) in entries {
            if multiplier < MULTIPLIER_SCALE {
                return Err(LedgerError::InvalidConfig(format!(
                    "multiplier {} for lock length {} is below scale {}",
                    multiplier, lock_length, MULTIPLIER_SCALE
                )));
            }
            table.insert(lock_length, multiplier);
        }

        if !table.contains_key(&0) {
            return Err(LedgerError::InvalidConfig(
                "multiplier list must include a lock length of 0".to_string(),
            ));
        }

        Ok(Self { entries: table })
    }

    /// Look up the multiplier for a lock length.
    ///
    /// # Errors
    /// Returns `LedgerError::InvalidLockLength` if no entry exists.
    pub fn multiplier_for(&self, lock_length: u64) -> Result<u128, LedgerError> {
        self.entries
            .get(&lock_length)
            .copied()
            .ok_or(LedgerError::InvalidLockLength(lock_length))
    }

    /// The existing multiplier for a lock length, if any.
    pub fn get(&self, lock_length: u64) -> Option<u128> {
        self.entries.get(&lock_length).copied()
    }

    /// Insert or overwrite one entry. Returns the previous value if the
    /// lock length already had one.
    ///
    /// # Errors
    /// Returns `LedgerError::InvalidConfig` if the multiplier is below scale.
    pub fn insert(&mut self, lock_length: u64, multiplier: u128) -> Result<Option<u128>, LedgerError> {
        if multiplier < MULTIPLIER_SCALE {
            return Err(LedgerError::InvalidConfig(format!(
                "multiplier {} for lock length {} is below scale {}",
                multiplier, lock_length, MULTIPLIER_SCALE
            )));
        }
        Ok(self.entries.insert(lock_length, multiplier))
    }

    /// All entries in ascending lock-length order.
    pub fn entries(&self) -> impl Iterator<Item = (u64, u128)> + '_ {
        self.entries.iter().map(|(&k, &v)| (k, v))
    }
}

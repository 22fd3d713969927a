// crates/tidefarm-ledger/src/units.rs
//
// Fixed-point scale constants and checked arithmetic helpers.
//
// Two scales run through the whole ledger:
//   - MULTIPLIER_SCALE: lock multipliers, 1.0x = 10^9.
//   - ACC_PRECISION: reward-per-share accumulators, 10^12.
//
// All intermediate products are computed in u128 with division last, so
// a deposit amount up to ~10^30 base units stays in range. Overflow is a
// checked error, never a wrap or a panic.

use tidefarm_core::LedgerError;

/// Fixed-point scale for lock multipliers. A multiplier of
/// `MULTIPLIER_SCALE` means 1.0x (no boost).
pub const MULTIPLIER_SCALE: u128 = 1_000_000_000;

/// Fixed-point scale for `acc_reward_per_share` accumulators.
pub const ACC_PRECISION: u128 = 1_000_000_000_000;

/// Compute `a * b / div` with a 128-bit intermediate, division last.
///
/// # Errors
/// Returns `LedgerError::ArithmeticOverflow` if the product overflows
/// `u128` or `div` is zero.
pub fn mul_div(a: u128, b: u128, div: u128) -> Result<u128, LedgerError> {
    a.checked_mul(b)
        .and_then(|p| p.checked_div(div))
        .ok_or(LedgerError::ArithmeticOverflow)
}

/// Convert an unsigned share value to the signed domain used by
/// `reward_debt` bookkeeping.
pub fn to_signed(v: u128) -> Result<i128, LedgerError> {
    i128::try_from(v).map_err(|_| LedgerError::ArithmeticOverflow)
}

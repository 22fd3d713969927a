// crates/tidefarm-ledger/src/emitter.rs
//
// Reward emission between two block heights.
//
// Emission is flat per block and split across pools by allocation weight.
// An interval during which a pool had zero virtual supply accrues nothing:
// the reward for that stretch is effectively burned, never banked.

use tidefarm_core::LedgerError;

use crate::units::mul_div;

/// Reward owed to a pool for the half-open block interval
/// `(from_block, to_block]`.
///
/// Pure function of the global schedule and two block heights:
/// `(to - from) * reward_per_block * alloc_point / total_alloc_point`,
/// computed in u128 with division last. Returns 0 when the interval is
/// empty, the pool is empty, or the pool carries no weight.
pub fn pending_emission(
    reward_per_block: u128,
    alloc_point: u128,
    total_alloc_point: u128,
    virtual_total_supply: u128,
    from_block: u64,
    to_block: u64,
) -> Result<u128, LedgerError> {
    if to_block <= from_block || virtual_total_supply == 0 {
        return Ok(0);
    }
    if alloc_point == 0 || total_alloc_point == 0 {
        return Ok(0);
    }
    let blocks = u128::from(to_block - from_block);
    let gross = blocks
        .checked_mul(reward_per_block)
        .ok_or(LedgerError::ArithmeticOverflow)?;
    mul_div(gross, alloc_point, total_alloc_point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_interval_emits_nothing() {
        assert_eq!(pending_emission(100, 1, 1, 1_000, 50, 50).unwrap(), 0);
        assert_eq!(pending_emission(100, 1, 1, 1_000, 50, 40).unwrap(), 0);
    }

    #[test]
    fn test_empty_pool_emits_nothing() {
        // Nothing staked: reward for the interval is burned, not banked.
        assert_eq!(pending_emission(100, 1, 1, 0, 0, 10).unwrap(), 0);
    }

    #[test]
    fn test_sole_pool_gets_full_emission() {
        assert_eq!(pending_emission(100, 5, 5, 1_000, 0, 10).unwrap(), 1_000);
    }

    #[test]
    fn test_weight_split() {
        // Pool holds 1/4 of the global weight.
        assert_eq!(pending_emission(100, 25, 100, 1_000, 0, 8).unwrap(), 200);
    }

    #[test]
    fn test_zero_weight_pool_emits_nothing() {
        assert_eq!(pending_emission(100, 0, 100, 1_000, 0, 10).unwrap(), 0);
    }

    #[test]
    fn test_division_last() {
        // 3 blocks * 1 reward * 1 / 2 = 1, not 3 * (1/2) = 0.
        assert_eq!(pending_emission(1, 1, 2, 1_000, 0, 3).unwrap(), 1);
    }
}

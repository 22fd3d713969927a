// crates/tidefarm-ledger/tests/scenarios.rs
//
// End-to-end scenarios for the Tidefarm reward ledger.
//
// These tests drive the public API of the ledger crate through multi-user,
// multi-pool sequences of deposits, partial withdrawals, weight changes,
// and harvests, checking the conservation invariants after every step.

use std::cell::Cell;
use std::collections::HashMap;

use tidefarm_core::{AccountId, Authorizer, Bank, Clock, LedgerError, Role, TokenId};
use tidefarm_ledger::{mul_div, Ledger, TxContext, MULTIPLIER_SCALE};

const UNIT: u128 = 1_000_000_000;

const ALICE: AccountId = [1u8; 32];
const BOB: AccountId = [2u8; 32];
const CAROL: AccountId = [3u8; 32];
const GOVERNOR: AccountId = [9u8; 32];
const FISH: TokenId = [10u8; 32];
const KELP: TokenId = [11u8; 32];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct TestClock {
    block: Cell<u64>,
}

impl TestClock {
    fn at(block: u64) -> Self {
        Self {
            block: Cell::new(block),
        }
    }

    fn advance(&self, blocks: u64) {
        self.block.set(self.block.get() + blocks);
    }
}

impl Clock for TestClock {
    fn current_block(&self) -> u64 {
        self.block.get()
    }
}

struct GovernorOnly;

impl Authorizer for GovernorOnly {
    fn has_role(&self, caller: &AccountId, role: Role) -> bool {
        role == Role::Governor && *caller == GOVERNOR
    }
}

#[derive(Default)]
struct TestBank {
    wallets: HashMap<(TokenId, AccountId), u128>,
    custody: HashMap<TokenId, u128>,
    rewards: HashMap<AccountId, u128>,
}

impl TestBank {
    fn fund(&mut self, token: TokenId, owner: AccountId, amount: u128) {
        *self.wallets.entry((token, owner)).or_default() += amount;
    }

    fn rewards_of(&self, owner: AccountId) -> u128 {
        self.rewards.get(&owner).copied().unwrap_or(0)
    }

    fn custody_of(&self, token: TokenId) -> u128 {
        self.custody.get(&token).copied().unwrap_or(0)
    }
}

impl Bank for TestBank {
    fn transfer_in(
        &mut self,
        token: TokenId,
        from: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let balance = self.wallets.entry((token, *from)).or_default();
        if *balance < amount {
            return Err(LedgerError::Transfer("insufficient balance".to_string()));
        }
        *balance -= amount;
        *self.custody.entry(token).or_default() += amount;
        Ok(())
    }

    fn transfer_out(
        &mut self,
        token: TokenId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let held = self.custody.entry(token).or_default();
        if *held < amount {
            return Err(LedgerError::Transfer("insufficient custody".to_string()));
        }
        *held -= amount;
        *self.wallets.entry((token, *to)).or_default() += amount;
        Ok(())
    }

    fn mint_reward(&mut self, to: &AccountId, amount: u128) -> Result<(), LedgerError> {
        *self.rewards.entry(*to).or_default() += amount;
        Ok(())
    }
}

fn tx<'a>(caller: AccountId, clock: &'a TestClock, bank: &'a mut TestBank) -> TxContext<'a> {
    TxContext {
        caller,
        clock,
        auth: &GovernorOnly,
        bank,
    }
}

/// Two pools: FISH (weight 100, 1x/5x/10x multipliers) and KELP (weight 300,
/// 1x only). 100 reward units per block, clock at block 1000, three funded
/// users.
fn setup() -> (Ledger, TestBank, TestClock) {
    let clock = TestClock::at(1_000);
    let mut bank = TestBank::default();
    for user in [ALICE, BOB, CAROL] {
        bank.fund(FISH, user, 1_000_000 * UNIT);
        bank.fund(KELP, user, 1_000_000 * UNIT);
    }

    let mut ledger = Ledger::new(100 * UNIT);
    ledger
        .add_pool(
            &mut tx(GOVERNOR, &clock, &mut bank),
            100,
            FISH,
            None,
            &[
                (0, MULTIPLIER_SCALE),
                (100, 5 * MULTIPLIER_SCALE),
                (1_000, 10 * MULTIPLIER_SCALE),
            ],
        )
        .unwrap();
    ledger
        .add_pool(
            &mut tx(GOVERNOR, &clock, &mut bank),
            300,
            KELP,
            None,
            &[(0, MULTIPLIER_SCALE)],
        )
        .unwrap();
    (ledger, bank, clock)
}

/// Check the cross-cutting invariants: weight conservation and, for each
/// pool, virtual-supply conservation against both user accounts and the
/// active deposit slots.
fn assert_invariants(ledger: &Ledger) {
    let weight_sum: u128 = (0..ledger.num_pools())
        .map(|id| ledger.pool_info(id).unwrap().alloc_point)
        .sum();
    assert_eq!(weight_sum, ledger.total_alloc_point());

    for pool_id in 0..ledger.num_pools() {
        let supply = ledger.pool_info(pool_id).unwrap().virtual_total_supply;
        let mut account_sum: u128 = 0;
        let mut deposit_sum: u128 = 0;
        for (&(pid, _), user) in ledger.deposit_book().iter() {
            if pid != pool_id {
                continue;
            }
            account_sum += user.account.virtual_amount;
            for slot in &user.deposits {
                deposit_sum += mul_div(slot.amount, slot.multiplier, MULTIPLIER_SCALE).unwrap();
            }
        }
        assert_eq!(supply, account_sum, "pool {} account sum drifted", pool_id);
        assert_eq!(supply, deposit_sum, "pool {} deposit sum drifted", pool_id);
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_two_pool_weight_split() {
    let (mut ledger, mut bank, clock) = setup();
    ledger
        .deposit(&mut tx(ALICE, &clock, &mut bank), 0, 1_000 * UNIT, 0)
        .unwrap();
    ledger
        .deposit(&mut tx(BOB, &clock, &mut bank), 1, 1_000 * UNIT, 0)
        .unwrap();
    assert_invariants(&ledger);

    clock.advance(4);
    // FISH holds 100 of 400 weight points, KELP the other 300.
    assert_eq!(
        ledger.pending_rewards(0, &ALICE, clock.current_block()).unwrap(),
        100 * UNIT
    );
    assert_eq!(
        ledger.pending_rewards(1, &BOB, clock.current_block()).unwrap(),
        300 * UNIT
    );
}

#[test]
fn test_mixed_lock_lengths_share_by_virtual_weight() {
    let (mut ledger, mut bank, clock) = setup();
    // Alice 1000 at 1x, Bob 1000 at 5x, Carol 500 at 10x:
    // virtual supply = 1000 + 5000 + 5000 = 11000.
    ledger
        .deposit(&mut tx(ALICE, &clock, &mut bank), 0, 1_000 * UNIT, 0)
        .unwrap();
    ledger
        .deposit(&mut tx(BOB, &clock, &mut bank), 0, 1_000 * UNIT, 100)
        .unwrap();
    ledger
        .deposit(&mut tx(CAROL, &clock, &mut bank), 0, 500 * UNIT, 1_000)
        .unwrap();
    assert_invariants(&ledger);

    clock.advance(11);
    let alice = ledger.pending_rewards(0, &ALICE, clock.current_block()).unwrap();
    let bob = ledger.pending_rewards(0, &BOB, clock.current_block()).unwrap();
    let carol = ledger.pending_rewards(0, &CAROL, clock.current_block()).unwrap();

    assert_eq!(bob, 5 * alice);
    assert_eq!(carol, 5 * alice);
    // 11 blocks at the pool's 25-unit share.
    assert_eq!(alice + bob + carol, 11 * 25 * UNIT);
}

#[test]
fn test_harvest_oracle_through_mixed_sequence() {
    let (mut ledger, mut bank, clock) = setup();
    ledger
        .deposit(&mut tx(ALICE, &clock, &mut bank), 0, 800 * UNIT, 0)
        .unwrap();
    clock.advance(7);
    ledger
        .deposit(&mut tx(BOB, &clock, &mut bank), 0, 200 * UNIT, 100)
        .unwrap();
    clock.advance(3);
    ledger
        .deposit(&mut tx(ALICE, &clock, &mut bank), 0, 500 * UNIT, 0)
        .unwrap();
    clock.advance(5);
    assert_invariants(&ledger);

    // The read-only oracle must match the settled payout to the unit,
    // for every user, at every point it is sampled.
    for user in [ALICE, BOB] {
        let pending = ledger.pending_rewards(0, &user, clock.current_block()).unwrap();
        let paid = ledger
            .harvest(&mut tx(user, &clock, &mut bank), 0, user)
            .unwrap();
        assert_eq!(paid, pending);
        assert_eq!(bank.rewards_of(user), pending);
    }
    assert_invariants(&ledger);
}

#[test]
fn test_unharvested_withdrawal_then_late_harvest() {
    let (mut ledger, mut bank, clock) = setup();
    ledger
        .deposit(&mut tx(ALICE, &clock, &mut bank), 0, 1_000 * UNIT, 0)
        .unwrap();
    ledger
        .deposit(&mut tx(BOB, &clock, &mut bank), 0, 1_000 * UNIT, 0)
        .unwrap();
    clock.advance(20);

    let owed_at_withdraw = ledger.pending_rewards(0, &ALICE, clock.current_block()).unwrap();
    ledger
        .withdraw_from_deposit(&mut tx(ALICE, &clock, &mut bank), 0, 1_000 * UNIT, 0)
        .unwrap();
    assert!(ledger.user_info(0, &ALICE).reward_debt < 0);
    assert_invariants(&ledger);

    // Bob now accrues alone; Alice's claim is frozen at the withdrawal.
    clock.advance(20);
    let paid = ledger
        .harvest(&mut tx(ALICE, &clock, &mut bank), 0, ALICE)
        .unwrap();
    assert_eq!(paid, owed_at_withdraw);

    let bob_pending = ledger.pending_rewards(0, &BOB, clock.current_block()).unwrap();
    // Bob: 20 blocks at half the pool share, 20 blocks at the full share.
    assert_eq!(bob_pending, 20 * 25 * UNIT / 2 + 20 * 25 * UNIT);
}

#[test]
fn test_withdraw_all_leaves_other_users_intact() {
    let (mut ledger, mut bank, clock) = setup();
    ledger
        .deposit(&mut tx(ALICE, &clock, &mut bank), 0, 600 * UNIT, 0)
        .unwrap();
    ledger
        .deposit(&mut tx(BOB, &clock, &mut bank), 0, 400 * UNIT, 0)
        .unwrap();
    clock.advance(10);

    let bob_pending_before = ledger.pending_rewards(0, &BOB, clock.current_block()).unwrap();
    let (principal, _) = ledger
        .withdraw_all_and_harvest(&mut tx(ALICE, &clock, &mut bank), 0, ALICE)
        .unwrap();
    assert_eq!(principal, 600 * UNIT);
    assert_eq!(ledger.open_user_deposits(0, &ALICE), 0);
    assert_invariants(&ledger);

    // Bob's accrued share is untouched by Alice's exit.
    assert_eq!(
        ledger.pending_rewards(0, &BOB, clock.current_block()).unwrap(),
        bob_pending_before
    );
    assert_eq!(bank.custody_of(FISH), 400 * UNIT);
}

#[test]
fn test_total_payout_never_exceeds_emission() {
    let (mut ledger, mut bank, clock) = setup();
    ledger
        .deposit(&mut tx(ALICE, &clock, &mut bank), 0, 333 * UNIT, 0)
        .unwrap();
    ledger
        .deposit(&mut tx(BOB, &clock, &mut bank), 0, 777 * UNIT, 100)
        .unwrap();
    ledger
        .deposit(&mut tx(CAROL, &clock, &mut bank), 0, 123 * UNIT, 1_000)
        .unwrap();

    let start = clock.current_block();
    clock.advance(97);
    ledger
        .unlock_pool(&mut tx(GOVERNOR, &clock, &mut bank), 0)
        .unwrap();
    for user in [ALICE, BOB, CAROL] {
        ledger
            .withdraw_all_and_harvest(&mut tx(user, &clock, &mut bank), 0, user)
            .unwrap();
    }
    assert_invariants(&ledger);

    // Integer truncation may strand dust in the pool, but the sum paid out
    // can never exceed the pool's share of emission for the elapsed blocks.
    let elapsed = u128::from(clock.current_block() - start);
    let pool_emission = elapsed * 100 * UNIT * 100 / 400;
    let total_paid: u128 = [ALICE, BOB, CAROL]
        .iter()
        .map(|u| bank.rewards_of(*u))
        .sum();
    assert!(total_paid <= pool_emission);
    assert!(pool_emission - total_paid < UNIT);
}

#[test]
fn test_kill_switch_reroutes_weight_to_surviving_pool() {
    let (mut ledger, mut bank, clock) = setup();
    ledger
        .deposit(&mut tx(ALICE, &clock, &mut bank), 0, 1_000 * UNIT, 0)
        .unwrap();
    ledger
        .deposit(&mut tx(BOB, &clock, &mut bank), 1, 1_000 * UNIT, 0)
        .unwrap();
    clock.advance(10);

    ledger
        .reset_rewards(&mut tx(GOVERNOR, &clock, &mut bank), 0)
        .unwrap();
    assert_invariants(&ledger);
    clock.advance(10);

    // Pool 0 froze at 10 blocks of its 25% share; pool 1 now takes the
    // whole emission.
    assert_eq!(
        ledger.pending_rewards(0, &ALICE, clock.current_block()).unwrap(),
        10 * 25 * UNIT
    );
    assert_eq!(
        ledger.pending_rewards(1, &BOB, clock.current_block()).unwrap(),
        10 * 75 * UNIT + 10 * 100 * UNIT
    );

    // The frozen pool's rewards stay claimable, and it is force-unlocked.
    assert!(ledger.pool_info(0).unwrap().unlocked);
    let paid = ledger
        .harvest(&mut tx(ALICE, &clock, &mut bank), 0, ALICE)
        .unwrap();
    assert_eq!(paid, 10 * 25 * UNIT);
}

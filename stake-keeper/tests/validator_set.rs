//! End-to-end block flows against an in-memory store.

use stake_core::init::{Address, Params, Tokens};
use stake_core::msg::{MsgBeginUnbonding, MsgCreateValidator, MsgDelegate};
use stake_core::rational::Rat;
use stake_core::state::tendermint::{ConsensusPubKey, VotePower};
use stake_core::state::{Description, Pool};
use stake_keeper::{Context, Keeper};
use stake_storage::{flush_buffer, BufferStore, KVBuffer, MemStore};

fn addr(seed: u8) -> Address {
    Address::new([seed; 20])
}

fn pub_key(seed: u8) -> ConsensusPubKey {
    ConsensusPubKey::Ed25519([seed; 32])
}

fn create_msg(seed: u8, amount: u64) -> MsgCreateValidator {
    MsgCreateValidator {
        validator_addr: addr(seed),
        pub_key: pub_key(seed),
        description: Description::default(),
        amount: Tokens::new(amount).unwrap(),
    }
}

fn block_ctx(height: i64) -> Context {
    Context {
        block_height: height,
        block_time: 0,
    }
}

#[test]
fn check_block_flow() {
    let mut store = MemStore::new();
    let mut keeper = Keeper::new(&mut store);
    keeper.init_genesis(&Params::default(), &Pool::initial());

    // block 1: two validators appear
    let ctx = block_ctx(1);
    keeper.begin_block(&ctx);
    keeper.create_validator(&ctx, &create_msg(1, 100)).unwrap();
    keeper.create_validator(&ctx, &create_msg(2, 200)).unwrap();
    let updates = keeper.end_block();
    assert_eq!(updates.len(), 2);
    #[cfg(debug_assertions)]
    keeper.check_invariants();

    // block 2: a delegation shifts power, an untouched validator stays
    // out of the diff
    let ctx = block_ctx(2);
    keeper.begin_block(&ctx);
    keeper
        .delegate(
            &ctx,
            &MsgDelegate {
                delegator_addr: addr(0x77),
                validator_addr: addr(1),
                amount: Tokens::new(50).unwrap(),
            },
        )
        .unwrap();
    let updates = keeper.end_block();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].pub_key, pub_key(1));
    assert_eq!(updates[0].power, VotePower::new(150).unwrap());

    // block 3: the delegation unbonds again; the net diff of the two
    // blocks cancels out at the consensus layer, one block at a time
    let ctx = block_ctx(3);
    keeper.begin_block(&ctx);
    keeper
        .begin_unbonding(
            &ctx,
            &MsgBeginUnbonding {
                delegator_addr: addr(0x77),
                validator_addr: addr(1),
                shares: Rat::from_int(50),
            },
        )
        .unwrap();
    let updates = keeper.end_block();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].power, VotePower::new(100).unwrap());
    #[cfg(debug_assertions)]
    keeper.check_invariants();

    // the held-back balance matures after the unbonding period
    let completion = 3 + Params::default().unbonding_period;
    assert!(keeper.begin_block(&block_ctx(completion - 1)).is_empty());
    let released = keeper.begin_block(&block_ctx(completion));
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].balance, Tokens::new(50).unwrap());
    assert_eq!(released[0].delegator_addr, addr(0x77));
}

// a block runs against a buffered write-set; dropping the buffer is a
// rejected block, flushing it is a commit
#[test]
fn check_rejected_block_leaves_no_trace() {
    let mut store = MemStore::new();
    {
        let mut keeper = Keeper::new(&mut store);
        keeper.init_genesis(&Params::default(), &Pool::initial());
        let ctx = block_ctx(1);
        keeper.create_validator(&ctx, &create_msg(1, 100)).unwrap();
        keeper.end_block();
    }

    let delegate = MsgDelegate {
        delegator_addr: addr(0x77),
        validator_addr: addr(1),
        amount: Tokens::new(50).unwrap(),
    };

    // the block is rejected: its write-set is dropped
    {
        let mut buffer = KVBuffer::new();
        let mut buffered = BufferStore::new(&store, &mut buffer);
        let mut keeper = Keeper::new(&mut buffered);
        let ctx = block_ctx(2);
        keeper.begin_block(&ctx);
        keeper.delegate(&ctx, &delegate).unwrap();
        let validator = keeper.get_validator(&addr(1)).unwrap();
        assert_eq!(i64::from(validator.power(&keeper.get_pool())), 150);
    }
    {
        let keeper = Keeper::new(&mut store);
        let validator = keeper.get_validator(&addr(1)).unwrap();
        assert_eq!(i64::from(validator.power(&keeper.get_pool())), 100);
        assert_eq!(keeper.get_pool().intra_tx_counter, 1);
        #[cfg(debug_assertions)]
        keeper.check_invariants();
    }

    // the same block again, committed this time
    let mut buffer = KVBuffer::new();
    {
        let mut buffered = BufferStore::new(&store, &mut buffer);
        let mut keeper = Keeper::new(&mut buffered);
        let ctx = block_ctx(2);
        keeper.begin_block(&ctx);
        keeper.delegate(&ctx, &delegate).unwrap();
        keeper.end_block();
    }
    flush_buffer(&mut store, buffer);
    let keeper = Keeper::new(&mut store);
    let validator = keeper.get_validator(&addr(1)).unwrap();
    assert_eq!(i64::from(validator.power(&keeper.get_pool())), 150);
    #[cfg(debug_assertions)]
    keeper.check_invariants();
}

// a year of hourly provisions: the bonded side compounds, the
// unbonded side never moves
#[test]
fn check_provisions_over_a_year() {
    let mut store = MemStore::new();
    let mut keeper = Keeper::new(&mut store);
    let params = Params {
        max_validators: 1,
        ..Params::default()
    };
    keeper.init_genesis(&params, &Pool::initial());

    let ctx = block_ctx(1);
    keeper.create_validator(&ctx, &create_msg(0, 150_000_000)).unwrap();
    // below the cliff: these stay unbonded
    for i in 1..5u8 {
        keeper
            .create_validator(&ctx, &create_msg(i, 100_000_000))
            .unwrap();
    }
    keeper.end_block();

    let pool = keeper.get_pool();
    assert_eq!(u64::from(pool.token_supply()), 550_000_000);
    assert_eq!(u64::from(pool.bonded_tokens), 150_000_000);
    assert_eq!(u64::from(pool.loose_unbonded_tokens), 400_000_000);
    // initial bonded ratio ~27%
    let initial_ratio = pool.bonded_ratio();
    assert_eq!(initial_ratio, Rat::new(150_000_000, 550_000_000));
    assert_eq!(pool.bonded_share_ex_rate(), Rat::one());

    let initial_supply = pool.token_supply();
    let hours_per_year = Rat::from_int(stake_core::init::HOURS_PER_YEAR);
    for hour in 0..stake_core::init::HOURS_PER_YEAR {
        let pool = keeper.get_pool();
        let start_bonded = i64::from(pool.bonded_tokens);
        let start_supply = i64::from(pool.token_supply());
        let expected_inflation = keeper.next_inflation();
        let expected_provisions =
            (expected_inflation * Rat::from(pool.token_supply()) / hours_per_year).floor();

        keeper.process_provisions(&Context {
            block_height: hour + 1,
            block_time: (hour as u64 + 1) * 3600,
        });

        let pool = keeper.get_pool();
        assert_eq!(
            i64::from(pool.bonded_tokens),
            start_bonded + expected_provisions,
            "hour {}",
            hour
        );
        assert_eq!(
            i64::from(pool.token_supply()),
            start_supply + expected_provisions
        );
    }

    let pool = keeper.get_pool();
    // the unbonded side is untouched after a year
    assert_eq!(u64::from(pool.loose_unbonded_tokens), 400_000_000);
    assert!(pool.token_supply() > initial_supply);
    // bonded holders' ownership drifted toward the goal without
    // reaching it
    let final_ratio = pool.bonded_ratio();
    assert!(final_ratio > initial_ratio);
    assert!(final_ratio < params.goal_bonded);
    // the share total never moved; the value of a share did
    assert_eq!(pool.bonded_shares, Rat::from_int(150_000_000));
    assert_eq!(
        pool.bonded_share_ex_rate() * pool.bonded_shares,
        Rat::from(pool.bonded_tokens)
    );
    #[cfg(debug_assertions)]
    keeper.check_invariants();
}

// the bonded set never exceeds its cap, and membership follows power
#[test]
fn check_bonded_set_tracks_power() {
    let mut store = MemStore::new();
    let mut keeper = Keeper::new(&mut store);
    let params = Params {
        max_validators: 3,
        ..Params::default()
    };
    keeper.init_genesis(&params, &Pool::initial());

    let ctx = block_ctx(1);
    for (i, amount) in [50u64, 40, 30, 20, 10].iter().enumerate() {
        keeper
            .create_validator(&ctx, &create_msg(i as u8 + 1, *amount))
            .unwrap();
    }
    keeper.end_block();

    let bonded = keeper.get_validators_bonded();
    assert_eq!(bonded.len(), 3);
    let mut owners: Vec<_> = bonded.iter().map(|v| v.owner).collect();
    owners.sort();
    assert_eq!(owners, vec![addr(1), addr(2), addr(3)]);

    // the weakest candidate overtakes the cliff
    let ctx = block_ctx(2);
    keeper.begin_block(&ctx);
    keeper
        .delegate(
            &ctx,
            &MsgDelegate {
                delegator_addr: addr(5),
                validator_addr: addr(5),
                amount: Tokens::new(25).unwrap(),
            },
        )
        .unwrap();
    let updates = keeper.end_block();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].pub_key, pub_key(3));
    assert!(updates[0].power.is_zero());
    assert_eq!(updates[1].pub_key, pub_key(5));
    assert_eq!(updates[1].power, VotePower::new(35).unwrap());

    let bonded = keeper.get_validators_bonded();
    let mut owners: Vec<_> = bonded.iter().map(|v| v.owner).collect();
    owners.sort();
    assert_eq!(owners, vec![addr(1), addr(2), addr(5)]);
    #[cfg(debug_assertions)]
    keeper.check_invariants();
}

mod delegation;
mod inflation;
mod validator;

pub use inflation::SECS_PER_HOUR;

use parity_scale_codec::{Decode, Encode};
use stake_core::common::Timespec;
use stake_core::init::{Address, Params};
use stake_core::state::tendermint::{BlockHeight, ConsensusPubKey};
use stake_core::state::{Pool, Validator};
use stake_storage::StoreKV;

use crate::keys;

/// Per-block facts handed down from the consensus engine.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub block_height: BlockHeight,
    pub block_time: Timespec,
}

/// The staking keeper. All state lives in the ordered store; the
/// keeper itself is only a view over it, so dropping the store's
/// write-set discards everything a rejected block did.
pub struct Keeper<'a, S: StoreKV> {
    store: &'a mut S,
}

impl<'a, S: StoreKV> Keeper<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Keeper { store }
    }

    /// Seed the two singletons. Must run before any other operation.
    pub fn init_genesis(&mut self, params: &Params, pool: &Pool) {
        self.set_params(params);
        self.set_pool(pool);
    }

    pub fn get_pool(&self) -> Pool {
        let bytes = self.store.get(&keys::pool_key()).expect("pool record not initialized");
        Pool::decode(&mut bytes.as_slice()).expect("corrupt pool record")
    }

    pub fn set_pool(&mut self, pool: &Pool) {
        self.store.set(keys::pool_key(), pool.encode());
    }

    pub fn get_params(&self) -> Params {
        let bytes = self
            .store
            .get(&keys::params_key())
            .expect("params record not initialized");
        Params::decode(&mut bytes.as_slice()).expect("corrupt params record")
    }

    pub fn set_params(&mut self, params: &Params) {
        self.store.set(keys::params_key(), params.encode());
    }

    pub fn get_validator(&self, owner: &Address) -> Option<Validator> {
        self.store.get(&keys::validator_key(owner)).map(|bytes| {
            Validator::decode(&mut bytes.as_slice()).expect("corrupt validator record")
        })
    }

    pub(crate) fn owner_by_pubkey(&self, pub_key: &ConsensusPubKey) -> Option<Address> {
        self.store
            .get(&keys::validator_pubkey_key(pub_key))
            .map(|bytes| Address::decode(&mut bytes.as_slice()).expect("corrupt owner reference"))
    }

    pub(crate) fn set_validator_record(&mut self, validator: &Validator) {
        self.store
            .set(keys::validator_key(&validator.owner), validator.encode());
    }

    // every validator record; the pool shares its prefix under a
    // shorter key, hence the length filter
    pub(crate) fn all_validators(&self) -> Vec<Validator> {
        self.store
            .iter_prefix(&[keys::VALIDATOR_PREFIX])
            .filter(|(key, _)| key.len() == 21)
            .map(|(_, value)| {
                Validator::decode(&mut value.as_slice()).expect("corrupt validator record")
            })
            .collect()
    }

    /// Walk the whole state and assert the structural invariants: the
    /// pool share totals match the validator records, the bonded set
    /// matches the statuses, the power index is one-to-one. A failure
    /// here means replicas would diverge, so it is never recoverable.
    #[cfg(debug_assertions)]
    pub fn check_invariants(&self) {
        use stake_core::rational::Rat;
        use stake_core::state::PoolShareKind;

        let pool = self.get_pool();
        let params = self.get_params();
        let validators = self.all_validators();

        let mut bonded_shares = Rat::zero();
        let mut unbonded_shares = Rat::zero();
        let mut bonded_count = 0usize;
        let mut indexed_count = 0usize;
        for validator in validators.iter() {
            validator.check_invariants();
            match validator.pool_shares.kind() {
                PoolShareKind::Bonded => {
                    bonded_shares = bonded_shares + validator.pool_shares.amount()
                }
                PoolShareKind::Unbonded => {
                    unbonded_shares = unbonded_shares + validator.pool_shares.amount()
                }
            }
            if validator.is_bonded() {
                bonded_count += 1;
            }
            if let Some(power) = validator.index_power {
                indexed_count += 1;
                let key = keys::validator_power_key(
                    power.into(),
                    validator.bond_height,
                    validator.bond_intra_tx_counter,
                    &validator.owner,
                );
                let entry = self.store.get(&key).expect("power index entry missing");
                assert_eq!(
                    Address::decode(&mut entry.as_slice()).expect("corrupt power index entry"),
                    validator.owner
                );
            } else {
                assert!(validator.is_revoked(), "only revoked validators are unindexed");
            }
        }
        assert_eq!(bonded_shares, pool.bonded_shares, "bonded share total mismatch");
        assert_eq!(
            unbonded_shares, pool.unbonded_shares,
            "unbonded share total mismatch"
        );
        assert!(bonded_count <= params.max_validators as usize);

        // bonded-set membership is exactly the bonded statuses
        let bonded_set: Vec<_> = self
            .store
            .iter_prefix(&[keys::BONDED_SET_PREFIX])
            .map(|(key, _)| {
                use std::convert::TryFrom;
                Address::try_from(&key[1..]).expect("corrupt bonded-set key")
            })
            .collect();
        assert_eq!(bonded_set.len(), bonded_count);
        for owner in bonded_set.iter() {
            let validator = self.get_validator(owner).expect("bonded-set entry dangling");
            assert!(validator.is_bonded());
        }

        // the power index carries no stale entries
        let index_entries = self
            .store
            .iter_prefix(&[keys::VALIDATOR_POWER_PREFIX])
            .count();
        assert_eq!(index_entries, indexed_count, "stale power index entries");
    }
}

//! The power-index engine.
//!
//! Every validator mutation funnels through `update_validator`, which
//! keeps four structures consistent in one call: the by-owner records,
//! the by-power index, the bonded set, and the pending consensus diff.
//! The bonded boundary is reconciled on the spot, so an eviction and
//! the promotion that caused it always land in the same diff.

use parity_scale_codec::{Decode, Encode};
use stake_core::init::Address;
use stake_core::state::tendermint::{ConsensusPubKey, ValidatorUpdate, VotePower};
use stake_core::state::{Pool, PoolShareKind, Validator};
use stake_storage::StoreKV;

use crate::keeper::{Context, Keeper};
use crate::keys;

/// Stored form of a pending consensus update. `prev_power` is the
/// power the consensus engine saw at the start of the block; an entry
/// whose net effect is no change is elided at read time.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
struct PendingUpdate {
    pub_key: ConsensusPubKey,
    prev_power: VotePower,
    power: VotePower,
}

impl<'a, S: StoreKV> Keeper<'a, S> {
    /// Insert or modify a validator and reconcile the bonded set.
    ///
    /// Returns the stored form, which may differ from the argument:
    /// tie-breakers are engine-owned, and the reconciliation may have
    /// bonded or unbonded the validator in the same call.
    pub fn update_validator(&mut self, ctx: &Context, mut validator: Validator) -> Validator {
        let mut pool = self.get_pool();
        let old = self.get_validator(&validator.owner);

        match &old {
            None => {
                validator.bond_intra_tx_counter = pool.next_intra_tx_counter();
            }
            Some(old) => {
                // callers cannot move themselves up the sort order
                validator.bond_height = old.bond_height;
                validator.bond_intra_tx_counter = old.bond_intra_tx_counter;
            }
        }

        // a revoked validator leaves the bonded pool immediately and
        // holds no power-index entry until unrevoked
        if validator.is_revoked() && validator.pool_shares.kind() == PoolShareKind::Bonded {
            validator.unbond_shares(&mut pool);
            validator.revoke();
            log::warn!("bonded validator {} revoked", validator.owner);
            self.queue_update(
                &validator.owner,
                &validator.pub_key,
                VotePower::zero(),
                committed_power(&old),
            );
        }

        if let Some(old) = &old {
            self.delete_power_entry(old);
            if old.pub_key != validator.pub_key {
                self.store
                    .delete(&keys::validator_pubkey_key(&old.pub_key));
            }
        }

        // an in-place power change of a bonded validator is consensus
        // visible on its own, without any membership transition
        let new_power = validator.power(&pool);
        let stayed_bonded =
            old.as_ref().map(|old| old.is_bonded()).unwrap_or(false) && validator.is_bonded();
        if stayed_bonded && old.as_ref().and_then(|old| old.index_power) != Some(new_power) {
            self.queue_update(
                &validator.owner,
                &validator.pub_key,
                new_power,
                committed_power(&old),
            );
        }

        self.insert_power_entry(&mut validator, &pool);
        self.store.set(
            keys::validator_pubkey_key(&validator.pub_key),
            validator.owner.encode(),
        );
        if validator.is_bonded() {
            self.store.set(keys::bonded_key(&validator.owner), Vec::new());
        } else {
            self.store.delete(&keys::bonded_key(&validator.owner));
        }
        self.set_validator_record(&validator);
        self.set_pool(&pool);

        self.reconcile_bonded(ctx);

        #[cfg(debug_assertions)]
        self.check_invariants();
        self.get_validator(&validator.owner)
            .expect("validator record written")
    }

    /// Delete every trace of a validator. Outstanding shares are
    /// burned from their pool; a bonded validator is reported to the
    /// consensus engine with power zero.
    pub fn remove_validator(&mut self, owner: &Address) {
        let validator = match self.get_validator(owner) {
            Some(validator) => validator,
            None => return,
        };
        let mut pool = self.get_pool();
        if !validator.pool_shares.amount().is_zero() {
            log::warn!("removing validator {} with outstanding shares", owner);
            match validator.pool_shares.kind() {
                PoolShareKind::Bonded => pool.remove_shares_bonded(validator.pool_shares.amount()),
                PoolShareKind::Unbonded => {
                    pool.remove_shares_unbonded(validator.pool_shares.amount())
                }
            };
        }
        if validator.is_bonded() {
            self.queue_update(
                owner,
                &validator.pub_key,
                VotePower::zero(),
                validator.index_power.unwrap_or_else(VotePower::zero),
            );
        }
        self.delete_power_entry(&validator);
        self.store.delete(&keys::bonded_key(owner));
        self.store
            .delete(&keys::validator_pubkey_key(&validator.pub_key));
        self.store.delete(&keys::validator_key(owner));
        self.set_pool(&pool);
        #[cfg(debug_assertions)]
        self.check_invariants();
    }

    /// Currently bonded validators, by owner.
    pub fn get_validators_bonded(&self) -> Vec<Validator> {
        self.bonded_owners()
            .iter()
            .map(|owner| self.get_validator(owner).expect("bonded-set entry dangling"))
            .collect()
    }

    /// Validators in power order, strongest first, up to `limit`.
    pub fn get_validators_by_power(&self, limit: usize) -> Vec<Validator> {
        self.store
            .iter_prefix(&[keys::VALIDATOR_POWER_PREFIX])
            .take(limit)
            .map(|(_, value)| {
                let owner =
                    Address::decode(&mut value.as_slice()).expect("corrupt power index entry");
                self.get_validator(&owner).expect("power index entry dangling")
            })
            .collect()
    }

    /// The accumulated validator-set diff for this block, ordered by
    /// owner. Entries whose net effect against the previous block is
    /// no change are elided.
    pub fn tendermint_updates(&self) -> Vec<ValidatorUpdate> {
        self.store
            .iter_prefix(&[keys::PENDING_UPDATE_PREFIX])
            .map(|(_, value)| {
                PendingUpdate::decode(&mut value.as_slice()).expect("corrupt pending update")
            })
            .filter(|update| update.prev_power != update.power)
            .map(|update| ValidatorUpdate {
                pub_key: update.pub_key,
                power: update.power,
            })
            .collect()
    }

    /// Drop the pending diff, once the consensus adapter consumed it.
    pub fn clear_tendermint_updates(&mut self) {
        let stale: Vec<_> = self
            .store
            .iter_prefix(&[keys::PENDING_UPDATE_PREFIX])
            .map(|(key, _)| key)
            .collect();
        for key in stale {
            self.store.delete(&key);
        }
    }

    // Bring the bonded set back to its defining shape: it holds
    // min(max_validators, candidates) members, and no unbonded
    // candidate strictly out-powers a bonded one. An incumbent is
    // never displaced at equal power, so the strict comparison is the
    // whole tie rule. Each swap raises the cliff power, so this
    // terminates.
    pub(crate) fn reconcile_bonded(&mut self, ctx: &Context) {
        let max_validators = self.get_params().max_validators as usize;
        loop {
            let bonded_count = self.bonded_owners().len();
            if bonded_count > max_validators {
                let cliff = self.cliff_validator().expect("bonded set is not empty");
                self.unbond_validator(&cliff);
                continue;
            }
            let candidate = self.best_unbonded_candidate();
            if bonded_count < max_validators {
                match candidate {
                    Some(owner) => {
                        self.bond_validator(ctx, &owner);
                        continue;
                    }
                    None => break,
                }
            }
            match (candidate, self.cliff_validator()) {
                (Some(candidate), Some(cliff)) => {
                    let pool = self.get_pool();
                    let candidate_power = self
                        .get_validator(&candidate)
                        .expect("power index entry dangling")
                        .power(&pool);
                    let cliff_power = self
                        .get_validator(&cliff)
                        .expect("bonded-set entry dangling")
                        .power(&pool);
                    if candidate_power > cliff_power {
                        self.unbond_validator(&cliff);
                        self.bond_validator(ctx, &candidate);
                        continue;
                    }
                    break;
                }
                _ => break,
            }
        }
    }

    // move a validator into the bonded set, shares and all
    fn bond_validator(&mut self, ctx: &Context, owner: &Address) {
        let mut pool = self.get_pool();
        let mut validator = self.get_validator(owner).expect("bonding unknown validator");
        self.delete_power_entry(&validator);
        validator.bond_shares(&mut pool);
        validator.bond_height = ctx.block_height;
        self.insert_power_entry(&mut validator, &pool);
        self.store.set(keys::bonded_key(owner), Vec::new());
        let power = validator.power(&pool);
        self.queue_update(owner, &validator.pub_key, power, VotePower::zero());
        self.set_validator_record(&validator);
        self.set_pool(&pool);
    }

    // move a validator out of the bonded set; the bond height stays,
    // so it keeps no claim to its old slot at equal power
    fn unbond_validator(&mut self, owner: &Address) {
        let mut pool = self.get_pool();
        let mut validator = self
            .get_validator(owner)
            .expect("unbonding unknown validator");
        let prev = validator.index_power.unwrap_or_else(VotePower::zero);
        self.delete_power_entry(&validator);
        validator.unbond_shares(&mut pool);
        self.insert_power_entry(&mut validator, &pool);
        self.store.delete(&keys::bonded_key(owner));
        self.queue_update(owner, &validator.pub_key, VotePower::zero(), prev);
        self.set_validator_record(&validator);
        self.set_pool(&pool);
    }

    // merge a consensus update into the pending set; the first write
    // in a block pins the power the consensus engine currently sees
    fn queue_update(
        &mut self,
        owner: &Address,
        pub_key: &ConsensusPubKey,
        power: VotePower,
        committed_prev: VotePower,
    ) {
        let key = keys::pending_update_key(owner);
        let record = match self.store.get(&key) {
            Some(bytes) => {
                let mut record = PendingUpdate::decode(&mut bytes.as_slice())
                    .expect("corrupt pending update");
                record.pub_key = pub_key.clone();
                record.power = power;
                record
            }
            None => PendingUpdate {
                pub_key: pub_key.clone(),
                prev_power: committed_prev,
                power,
            },
        };
        self.store.set(key, record.encode());
    }

    fn delete_power_entry(&mut self, validator: &Validator) {
        if let Some(power) = validator.index_power {
            self.store.delete(&keys::validator_power_key(
                power.into(),
                validator.bond_height,
                validator.bond_intra_tx_counter,
                &validator.owner,
            ));
        }
    }

    // revoked validators hold no entry; everyone else is indexed under
    // their current power so the entry can be deleted by pre-image
    fn insert_power_entry(&mut self, validator: &mut Validator, pool: &Pool) {
        if validator.is_revoked() {
            validator.index_power = None;
            return;
        }
        let power = validator.power(pool);
        self.store.set(
            keys::validator_power_key(
                power.into(),
                validator.bond_height,
                validator.bond_intra_tx_counter,
                &validator.owner,
            ),
            validator.owner.encode(),
        );
        validator.index_power = Some(power);
    }

    pub(crate) fn bonded_owners(&self) -> Vec<Address> {
        self.store
            .iter_prefix(&[keys::BONDED_SET_PREFIX])
            .map(|(key, _)| {
                use std::convert::TryFrom;
                Address::try_from(&key[1..]).expect("corrupt bonded-set key")
            })
            .collect()
    }

    // weakest bonded validator, by the full sort order
    fn cliff_validator(&self) -> Option<Address> {
        for (_, value) in self.store.iter_prefix_rev(&[keys::VALIDATOR_POWER_PREFIX]) {
            let owner = Address::decode(&mut value.as_slice()).expect("corrupt power index entry");
            let validator = self.get_validator(&owner).expect("power index entry dangling");
            if validator.is_bonded() {
                return Some(owner);
            }
        }
        None
    }

    // strongest unbonded validator, by the full sort order
    fn best_unbonded_candidate(&self) -> Option<Address> {
        for (_, value) in self.store.iter_prefix(&[keys::VALIDATOR_POWER_PREFIX]) {
            let owner = Address::decode(&mut value.as_slice()).expect("corrupt power index entry");
            let validator = self.get_validator(&owner).expect("power index entry dangling");
            if !validator.is_bonded() && !validator.is_revoked() {
                return Some(owner);
            }
        }
        None
    }
}

fn committed_power(old: &Option<Validator>) -> VotePower {
    match old {
        Some(old) if old.is_bonded() => old.index_power.unwrap_or_else(VotePower::zero),
        _ => VotePower::zero(),
    }
}

//! Delegation records and the unbonding queue.

use parity_scale_codec::{Decode, Encode};
use stake_core::init::Address;
use stake_core::state::tendermint::BlockHeight;
use stake_core::state::{Delegation, UnbondingDelegation};
use stake_storage::StoreKV;

use crate::keeper::Keeper;
use crate::keys;

impl<'a, S: StoreKV> Keeper<'a, S> {
    pub fn get_delegation(&self, delegator: &Address, validator: &Address) -> Option<Delegation> {
        self.store
            .get(&keys::delegation_key(delegator, validator))
            .map(|bytes| {
                Delegation::decode(&mut bytes.as_slice()).expect("corrupt delegation record")
            })
    }

    pub fn set_delegation(&mut self, delegation: &Delegation) {
        self.store.set(
            keys::delegation_key(&delegation.delegator_addr, &delegation.validator_addr),
            delegation.encode(),
        );
    }

    pub fn remove_delegation(&mut self, delegator: &Address, validator: &Address) {
        self.store.delete(&keys::delegation_key(delegator, validator));
    }

    /// All delegations of one delegator, in validator-address order.
    pub fn get_delegations(&self, delegator: &Address) -> Vec<Delegation> {
        let mut prefix = vec![keys::DELEGATION_PREFIX];
        prefix.extend_from_slice(delegator.as_ref());
        self.store
            .iter_prefix(&prefix)
            .map(|(_, bytes)| {
                Delegation::decode(&mut bytes.as_slice()).expect("corrupt delegation record")
            })
            .collect()
    }

    pub fn get_unbonding(
        &self,
        completion_height: BlockHeight,
        delegator: &Address,
        validator: &Address,
    ) -> Option<UnbondingDelegation> {
        self.store
            .get(&keys::unbonding_key(completion_height, delegator, validator))
            .map(|bytes| {
                UnbondingDelegation::decode(&mut bytes.as_slice()).expect("corrupt unbonding entry")
            })
    }

    pub fn set_unbonding(&mut self, unbonding: &UnbondingDelegation) {
        self.store.set(
            keys::unbonding_key(
                unbonding.completion_height,
                &unbonding.delegator_addr,
                &unbonding.validator_addr,
            ),
            unbonding.encode(),
        );
    }

    /// Release every unbonding entry whose completion height has
    /// passed. The returned balances are the outer layer's to credit;
    /// this module only holds them back.
    pub fn complete_unbondings(&mut self, block_height: BlockHeight) -> Vec<UnbondingDelegation> {
        let mut matured = Vec::new();
        for (key, bytes) in self.store.iter_prefix(&[keys::UNBONDING_PREFIX]) {
            let entry = UnbondingDelegation::decode(&mut bytes.as_slice())
                .expect("corrupt unbonding entry");
            if entry.completion_height > block_height {
                // completion order is key order
                break;
            }
            matured.push((key, entry));
        }
        let mut released = Vec::with_capacity(matured.len());
        for (key, entry) in matured {
            log::info!(
                "unbonding of {} for {} matured at height {}",
                entry.balance,
                entry.delegator_addr,
                block_height
            );
            self.store.delete(&key);
            released.push(entry);
        }
        released
    }
}

//! Persisted key layout. Prefixes are one byte each; every index
//! encodes its sort order directly into the key bytes so that forward
//! iteration in byte order is iteration in semantic order.

use stake_core::init::Address;
use stake_core::state::tendermint::{BlockHeight, ConsensusPubKey};

/// `0x01 || owner` -> validator record (also `0x01 || "pool"` -> pool)
pub const VALIDATOR_PREFIX: u8 = 0x01;
/// `0x02 || pubkey` -> owner (reverse lookup)
pub const VALIDATOR_PUBKEY_PREFIX: u8 = 0x02;
/// `0x03 || "params"` -> params record
pub const PARAMS_PREFIX: u8 = 0x03;
/// `0x04 || owner` -> pending consensus update, merged per owner
pub const PENDING_UPDATE_PREFIX: u8 = 0x04;
/// `0x05 || power || bond height || counter || owner` -> owner
pub const VALIDATOR_POWER_PREFIX: u8 = 0x05;
/// `0x21 || owner` -> empty (bonded-set membership)
pub const BONDED_SET_PREFIX: u8 = 0x21;
/// `0x31 || delegator || owner` -> delegation record
pub const DELEGATION_PREFIX: u8 = 0x31;
/// `0x32 || completion height || delegator || owner` -> unbonding entry
pub const UNBONDING_PREFIX: u8 = 0x32;

pub fn validator_key(owner: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(21);
    key.push(VALIDATOR_PREFIX);
    key.extend_from_slice(owner.as_ref());
    key
}

pub fn validator_pubkey_key(pub_key: &ConsensusPubKey) -> Vec<u8> {
    let mut key = vec![VALIDATOR_PUBKEY_PREFIX];
    key.extend_from_slice(pub_key.as_bytes());
    key
}

pub fn pool_key() -> Vec<u8> {
    let mut key = vec![VALIDATOR_PREFIX];
    key.extend_from_slice(b"pool");
    key
}

pub fn params_key() -> Vec<u8> {
    let mut key = vec![PARAMS_PREFIX];
    key.extend_from_slice(b"params");
    key
}

pub fn pending_update_key(owner: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(21);
    key.push(PENDING_UPDATE_PREFIX);
    key.extend_from_slice(owner.as_ref());
    key
}

pub fn bonded_key(owner: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(21);
    key.push(BONDED_SET_PREFIX);
    key.extend_from_slice(owner.as_ref());
    key
}

/// Power-index key: power sorts first (descending, via bit-inverted
/// big-endian two's complement), then bond height ascending (an older
/// bond wins ties), then the intra-block counter ascending (within a
/// block the earlier transaction wins), then owner bytes.
pub fn validator_power_key(
    power: i64,
    bond_height: BlockHeight,
    counter: u16,
    owner: &Address,
) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 16 + 8 + 2 + 20);
    key.push(VALIDATOR_POWER_PREFIX);
    for byte in &(i128::from(power)).to_be_bytes() {
        key.push(!byte);
    }
    key.extend_from_slice(&(bond_height as u64).to_be_bytes());
    key.extend_from_slice(&counter.to_be_bytes());
    key.extend_from_slice(owner.as_ref());
    key
}

pub fn delegation_key(delegator: &Address, validator: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(41);
    key.push(DELEGATION_PREFIX);
    key.extend_from_slice(delegator.as_ref());
    key.extend_from_slice(validator.as_ref());
    key
}

/// Completion height leads, so forward iteration over the prefix
/// drains the queue in maturity order.
pub fn unbonding_key(
    completion_height: BlockHeight,
    delegator: &Address,
    validator: &Address,
) -> Vec<u8> {
    let mut key = Vec::with_capacity(49);
    key.push(UNBONDING_PREFIX);
    key.extend_from_slice(&(completion_height as u64).to_be_bytes());
    key.extend_from_slice(delegator.as_ref());
    key.extend_from_slice(validator.as_ref());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(seed: u8) -> Address {
        Address::new([seed; 20])
    }

    #[test]
    fn check_power_key_orders_by_power_descending() {
        let high = validator_power_key(400, 0, 0, &addr(1));
        let low = validator_power_key(200, 0, 0, &addr(2));
        let zero = validator_power_key(0, 0, 0, &addr(3));
        assert!(high < low);
        assert!(low < zero);
    }

    #[test]
    fn check_power_key_tie_breaks() {
        // same power: the older bond height sorts first
        let older = validator_power_key(100, 5, 9, &addr(1));
        let newer = validator_power_key(100, 6, 0, &addr(2));
        assert!(older < newer);

        // same power and height: the earlier transaction sorts first
        let first = validator_power_key(100, 5, 1, &addr(9));
        let second = validator_power_key(100, 5, 2, &addr(0));
        assert!(first < second);

        // finally the owner bytes decide
        let a = validator_power_key(100, 5, 1, &addr(1));
        let b = validator_power_key(100, 5, 1, &addr(2));
        assert!(a < b);
    }

    #[test]
    fn check_pool_key_does_not_collide_with_validators() {
        assert_ne!(pool_key().len(), validator_key(&addr(1)).len());
        assert_eq!(pool_key()[0], validator_key(&addr(1))[0]);
    }

    #[test]
    fn check_unbonding_key_orders_by_completion() {
        let early = unbonding_key(10, &addr(9), &addr(9));
        let late = unbonding_key(11, &addr(0), &addr(0));
        assert!(early < late);
    }
}

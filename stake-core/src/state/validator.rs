use crate::init::{Address, Tokens};
use crate::rational::Rat;
use crate::state::pool::Pool;
use crate::state::tendermint::{BlockHeight, ConsensusPubKey, ValidatorUpdate, VotePower};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_MONIKER_LEN: usize = 70;
pub const MAX_IDENTITY_LEN: usize = 3000;
pub const MAX_WEBSITE_LEN: usize = 140;
pub const MAX_DETAILS_LEN: usize = 280;

/// Which pool a validator's shares are denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum PoolShareKind {
    Bonded,
    Unbonded,
}

/// A validator's stake in one of the two pools. The amount is pool
/// shares, NOT tokens; the token value follows the pool's ex-rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct PoolShares {
    kind: PoolShareKind,
    amount: Rat,
}

impl PoolShares {
    pub fn bonded(amount: Rat) -> Self {
        PoolShares {
            kind: PoolShareKind::Bonded,
            amount,
        }
    }

    pub fn unbonded(amount: Rat) -> Self {
        PoolShares {
            kind: PoolShareKind::Unbonded,
            amount,
        }
    }

    pub fn kind(&self) -> PoolShareKind {
        self.kind
    }

    pub fn amount(&self) -> Rat {
        self.amount
    }
}

/// Validator lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum ValidatorStatus {
    Bonded,
    Unbonded,
    Revoked,
}

/// Free-form operator metadata, opaque to the state machine apart from
/// length limits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize)]
pub struct Description {
    pub moniker: String,
    pub identity: String,
    pub website: String,
    pub details: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DescriptionError {
    pub field: &'static str,
    pub len: usize,
}

impl fmt::Display for DescriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "description field {} has length {}", self.field, self.len)
    }
}

impl ::std::error::Error for DescriptionError {}

impl Description {
    pub fn ensure_length(&self) -> Result<(), DescriptionError> {
        let checks = [
            ("moniker", self.moniker.len(), MAX_MONIKER_LEN),
            ("identity", self.identity.len(), MAX_IDENTITY_LEN),
            ("website", self.website.len(), MAX_WEBSITE_LEN),
            ("details", self.details.len(), MAX_DETAILS_LEN),
        ];
        for &(field, len, max) in checks.iter() {
            if len > max {
                return Err(DescriptionError { field, len });
            }
        }
        Ok(())
    }
}

/// Per-validator state.
///
/// Invariant V1: `status == Bonded` iff `pool_shares.kind() == Bonded`.
///
/// Invariant V2: the validator's token-equivalent is
/// `pool_shares.amount() * pool ex-rate` of the matching pool.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Validator {
    /// unique owner address, the primary key
    pub owner: Address,
    /// consensus pubkey reported in validator-set updates
    pub pub_key: ConsensusPubKey,
    pub status: ValidatorStatus,
    pub pool_shares: PoolShares,
    /// total shares issued to this validator's delegators
    pub delegator_shares: Rat,
    /// height at which the validator last entered the bonded set;
    /// zero if never bonded. First tie-break of the power order.
    pub bond_height: BlockHeight,
    /// ordinal of the creating transaction within its block; second
    /// tie-break of the power order
    pub bond_intra_tx_counter: u16,
    /// power under which the current power-index entry was written;
    /// kept so the entry can be deleted by pre-image even after the
    /// pool ex-rate has moved
    pub index_power: Option<VotePower>,
    pub description: Description,
}

impl Validator {
    /// A fresh validator starts unbonded with no shares.
    pub fn new(owner: Address, pub_key: ConsensusPubKey, description: Description) -> Self {
        Validator {
            owner,
            pub_key,
            status: ValidatorStatus::Unbonded,
            pool_shares: PoolShares::unbonded(Rat::zero()),
            delegator_shares: Rat::zero(),
            bond_height: 0,
            bond_intra_tx_counter: 0,
            index_power: None,
            description,
        }
    }

    pub fn is_bonded(&self) -> bool {
        self.status == ValidatorStatus::Bonded
    }

    pub fn is_revoked(&self) -> bool {
        self.status == ValidatorStatus::Revoked
    }

    /// Tokens per delegator share; one when no shares are outstanding.
    pub fn delegator_share_ex_rate(&self, pool: &Pool) -> Rat {
        if self.delegator_shares.is_zero() {
            return Rat::one();
        }
        self.equivalent_tokens(pool) / self.delegator_shares
    }

    /// Token value of the validator's pool shares at current ex-rates.
    pub fn equivalent_tokens(&self, pool: &Pool) -> Rat {
        let ex_rate = match self.pool_shares.kind() {
            PoolShareKind::Bonded => pool.bonded_share_ex_rate(),
            PoolShareKind::Unbonded => pool.unbonded_share_ex_rate(),
        };
        self.pool_shares.amount() * ex_rate
    }

    /// Consensus power: floor of the token-equivalent.
    pub fn power(&self, pool: &Pool) -> VotePower {
        VotePower::new(self.equivalent_tokens(pool).floor()).expect("validator power out of bound")
    }

    /// The `(pubkey, power)` pair the consensus engine sees.
    pub fn abci_validator(&self, pool: &Pool) -> ValidatorUpdate {
        ValidatorUpdate {
            pub_key: self.pub_key.clone(),
            power: self.power(pool),
        }
    }

    /// Add `amount` tokens delegated to this validator: the matching
    /// pool grows and mints pool shares, the delegator is issued
    /// shares at the current delegator ex-rate. Returns the issued
    /// delegator shares.
    pub fn add_tokens_from_del(&mut self, pool: &mut Pool, amount: Tokens) -> Rat {
        let del_ex_rate = self.delegator_share_ex_rate(pool);
        let issued_pool_shares = match self.pool_shares.kind() {
            PoolShareKind::Bonded => pool.add_tokens_bonded(amount),
            PoolShareKind::Unbonded => pool.add_tokens_unbonded(amount),
        };
        self.pool_shares = PoolShares {
            kind: self.pool_shares.kind(),
            amount: self.pool_shares.amount() + issued_pool_shares,
        };
        let issued_del_shares = Rat::from(amount) / del_ex_rate;
        self.delegator_shares = self.delegator_shares + issued_del_shares;
        issued_del_shares
    }

    /// Burn `del_shares` delegator shares, removing the matching pool
    /// shares and tokens. Returns the token value released.
    ///
    /// The caller must have checked the delegation balance; burning
    /// more shares than outstanding is a fatal accounting fault.
    pub fn remove_del_shares(&mut self, pool: &mut Pool, del_shares: Rat) -> Tokens {
        let remaining = self.delegator_shares - del_shares;
        if remaining.is_negative() {
            panic!("delegator share underflow");
        }
        let value = del_shares * self.delegator_share_ex_rate(pool);
        let (pool_shares_removed, tokens) = match self.pool_shares.kind() {
            PoolShareKind::Bonded => {
                let shares = value / pool.bonded_share_ex_rate();
                (shares, pool.remove_shares_bonded(shares))
            }
            PoolShareKind::Unbonded => {
                let shares = value / pool.unbonded_share_ex_rate();
                (shares, pool.remove_shares_unbonded(shares))
            }
        };
        self.pool_shares = PoolShares {
            kind: self.pool_shares.kind(),
            amount: self.pool_shares.amount() - pool_shares_removed,
        };
        self.delegator_shares = remaining;
        tokens
    }

    /// Move the validator's shares from the unbonded to the bonded
    /// pool at current ex-rates and mark it bonded.
    pub fn bond_shares(&mut self, pool: &mut Pool) {
        assert_eq!(
            self.pool_shares.kind(),
            PoolShareKind::Unbonded,
            "bonding a validator whose shares are already bonded"
        );
        let tokens = pool.remove_shares_unbonded(self.pool_shares.amount());
        let bonded = pool.add_tokens_bonded(tokens);
        self.pool_shares = PoolShares::bonded(bonded);
        self.status = ValidatorStatus::Bonded;
    }

    /// Move the validator's shares from the bonded to the unbonded
    /// pool at current ex-rates and mark it unbonded. The bond height
    /// is left in place: while the validator keeps nonzero shares it
    /// keeps its seniority for future ties.
    pub fn unbond_shares(&mut self, pool: &mut Pool) {
        assert_eq!(
            self.pool_shares.kind(),
            PoolShareKind::Bonded,
            "unbonding a validator whose shares are already unbonded"
        );
        let tokens = pool.remove_shares_bonded(self.pool_shares.amount());
        let unbonded = pool.add_tokens_unbonded(tokens);
        self.pool_shares = PoolShares::unbonded(unbonded);
        self.status = ValidatorStatus::Unbonded;
    }

    /// Bar the validator from the bonded set. Shares stay where they
    /// are; the power-index engine moves them out on the next update.
    pub fn revoke(&mut self) {
        self.status = ValidatorStatus::Revoked;
    }

    #[cfg(debug_assertions)]
    pub fn check_invariants(&self) {
        // check: Invariant V1
        assert_eq!(
            self.status == ValidatorStatus::Bonded,
            self.pool_shares.kind() == PoolShareKind::Bonded
        );
        assert!(!self.pool_shares.amount().is_negative());
        assert!(!self.delegator_shares.is_negative());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_scale_codec::{Decode, Encode};
    use quickcheck::{quickcheck, Arbitrary, Gen};

    fn new_validator(seed: u8) -> Validator {
        Validator::new(
            Address::new([seed; 20]),
            ConsensusPubKey::Ed25519([seed; 32]),
            Description::default(),
        )
    }

    #[test]
    fn check_add_tokens_from_del() {
        let mut pool = Pool::initial();
        let mut validator = new_validator(0xcc);
        let issued = validator.add_tokens_from_del(&mut pool, Tokens::new(10).unwrap());
        assert_eq!(issued, Rat::from_int(10));
        assert_eq!(validator.status, ValidatorStatus::Unbonded);
        assert_eq!(validator.pool_shares.amount(), Rat::from_int(10));
        assert_eq!(validator.delegator_shares, Rat::from_int(10));
        assert_eq!(pool.loose_unbonded_tokens, Tokens::new(10).unwrap());
    }

    #[test]
    fn check_bond_unbond_round_trip() {
        let mut pool = Pool::initial();
        let mut validator = new_validator(0xcc);
        validator.add_tokens_from_del(&mut pool, Tokens::new(100).unwrap());

        validator.bond_shares(&mut pool);
        assert!(validator.is_bonded());
        assert_eq!(pool.bonded_tokens, Tokens::new(100).unwrap());
        assert_eq!(pool.loose_unbonded_tokens, Tokens::zero());
        assert_eq!(i64::from(validator.power(&pool)), 100);

        validator.unbond_shares(&mut pool);
        assert!(!validator.is_bonded());
        assert_eq!(pool.bonded_tokens, Tokens::zero());
        assert_eq!(pool.loose_unbonded_tokens, Tokens::new(100).unwrap());
        #[cfg(debug_assertions)]
        validator.check_invariants();
    }

    #[test]
    fn check_delegator_ex_rate_follows_inflation() {
        let mut pool = Pool::initial();
        let mut validator = new_validator(0xcc);
        validator.add_tokens_from_del(&mut pool, Tokens::new(100).unwrap());
        validator.bond_shares(&mut pool);

        // provisions: tokens grow, shares do not
        pool.bonded_tokens = Tokens::new(200).unwrap();
        assert_eq!(validator.delegator_share_ex_rate(&pool), Rat::from_int(2));

        // a new delegation of 50 tokens only buys 25 shares now
        let issued = validator.add_tokens_from_del(&mut pool, Tokens::new(50).unwrap());
        assert_eq!(issued, Rat::from_int(25));
        assert_eq!(i64::from(validator.power(&pool)), 250);
    }

    #[test]
    fn check_remove_del_shares() {
        let mut pool = Pool::initial();
        let mut validator = new_validator(0xcc);
        validator.add_tokens_from_del(&mut pool, Tokens::new(100).unwrap());

        let released = validator.remove_del_shares(&mut pool, Rat::from_int(40));
        assert_eq!(released, Tokens::new(40).unwrap());
        assert_eq!(validator.delegator_shares, Rat::from_int(60));
        assert_eq!(validator.pool_shares.amount(), Rat::from_int(60));
        assert_eq!(pool.loose_unbonded_tokens, Tokens::new(60).unwrap());
    }

    #[test]
    fn check_description_length() {
        let mut desc = Description::default();
        desc.moniker = "a".repeat(MAX_MONIKER_LEN);
        assert!(desc.ensure_length().is_ok());
        desc.moniker.push('b');
        assert!(desc.ensure_length().is_err());
    }

    impl Arbitrary for Description {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            Description {
                moniker: String::arbitrary(g),
                identity: String::arbitrary(g),
                website: String::arbitrary(g),
                details: String::arbitrary(g),
            }
        }
    }

    quickcheck! {
        // tests if decode(encode(x)) == x
        fn prop_encode_decode_validator(seed: u8, shares: i32, description: Description) -> bool {
            let mut validator = new_validator(seed);
            validator.description = description;
            validator.delegator_shares = Rat::from_int(i64::from(shares).abs());
            let encoded = validator.encode();
            Validator::decode(&mut encoded.as_ref()).expect("decode validator") == validator
        }
    }
}

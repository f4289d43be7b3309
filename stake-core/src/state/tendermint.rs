use parity_scale_codec::{Decode, Encode, Error as ScaleError, Input, Output};
use serde::{Deserialize, Serialize};
use std::{fmt, ops};

/// Block height as reported by the consensus engine
pub type BlockHeight = i64;

/// The consensus engine currently accepts a single key type for
/// validator updates, so the internal representation stays restricted
/// and compact.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize, Encode, Decode)]
pub enum ConsensusPubKey {
    Ed25519([u8; 32]),
}

impl ConsensusPubKey {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ConsensusPubKey::Ed25519(key) => &key[..],
        }
    }
}

impl fmt::Display for ConsensusPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsensusPubKey::Ed25519(key) => write!(f, "ed25519:{}", hex::encode(&key[..])),
        }
    }
}

/// "Note that the maximum total power of the validator set is bounded by MaxTotalVotingPower = MaxInt64 / 8.
/// Applications are responsible for ensuring they do not make changes to the validator set that cause it to exceed this limit."
pub const MAX_VOTE_POWER: i64 = std::i64::MAX / 8;

/// Consensus voting power of a single validator
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize)]
pub struct VotePower(i64);

/// error type relating to `VotePower` operations
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum VotePowerError {
    /// means that the given value was out of bound
    ///
    /// Min bound being: 0, Max bound being: `MAX_VOTE_POWER`.
    OutOfBound(i64),
}

impl fmt::Display for VotePowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            VotePowerError::OutOfBound(ref v) => write!(
                f,
                "Voting power of value {} is out of bound. Min voting power: 0, Max voting power value: {}.",
                v, MAX_VOTE_POWER
            ),
        }
    }
}

impl ::std::error::Error for VotePowerError {}

impl VotePower {
    /// create a voting power of the given value
    pub fn new(v: i64) -> Result<Self, VotePowerError> {
        if 0 <= v && v <= MAX_VOTE_POWER {
            Ok(VotePower(v))
        } else {
            Err(VotePowerError::OutOfBound(v))
        }
    }

    pub fn zero() -> Self {
        VotePower(0)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<VotePower> for i64 {
    fn from(p: VotePower) -> i64 {
        p.0
    }
}

impl ops::Add for VotePower {
    type Output = Result<VotePower, VotePowerError>;
    fn add(self, other: VotePower) -> Self::Output {
        VotePower::new(self.0 + other.0)
    }
}

impl Encode for VotePower {
    fn encode_to<W: Output>(&self, dest: &mut W) {
        self.0.encode_to(dest);
    }

    fn size_hint(&self) -> usize {
        8
    }
}

impl Decode for VotePower {
    fn decode<I: Input>(input: &mut I) -> Result<Self, ScaleError> {
        let v = i64::decode(input)?;
        VotePower::new(v).map_err(|_| ScaleError::from("voting power out of bound"))
    }
}

/// A single entry of the validator-set diff handed to the consensus
/// engine at the end of a block. Power zero removes the validator.
#[derive(Debug, PartialEq, Eq, Clone, Encode, Decode, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pub_key: ConsensusPubKey,
    pub power: VotePower,
}

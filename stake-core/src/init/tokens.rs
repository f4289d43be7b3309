//! # Bounded token amounts
//! The unit of account for both pools. Amounts are bounded by
//! `MAX_TOKENS` so that the total supply always fits the consensus
//! engine's cap on total voting power, and all arithmetic is checked.

use crate::rational::Rat;
use crate::state::tendermint::MAX_VOTE_POWER;
use parity_scale_codec::{Decode, Encode, Error as ScaleError, Input, Output};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use static_assertions::const_assert;
use std::convert::TryFrom;
use std::{fmt, ops, result};

/// Maximum representable amount of tokens.
pub const MAX_TOKENS: u64 = MAX_VOTE_POWER as u64;
// voting power is an i64 on the consensus side
const_assert!(MAX_TOKENS <= i64::max_value() as u64);

/// represents a token amount bounded by the maximum supply
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Tokens(u64);

/// error type relating to `Tokens` operations
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum TokensError {
    /// means that the given value was out of bound
    ///
    /// Max bound being: `MAX_TOKENS`.
    OutOfBound(u64),

    /// failed to parse the integer
    ParseIntError,

    /// token amounts can't be negative
    Negative,

    /// integer overflow
    Overflow,
}

impl fmt::Display for TokensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TokensError::OutOfBound(ref v) => write!(
                f,
                "Token amount {} is out of bound. Max amount: {}.",
                v, MAX_TOKENS
            ),
            TokensError::ParseIntError => write!(f, "Cannot parse a valid integer"),
            TokensError::Negative => write!(f, "Token amount cannot hold a negative value"),
            TokensError::Overflow => write!(f, "Token amount overflow"),
        }
    }
}

impl ::std::error::Error for TokensError {}

/// result type relating to `Tokens` operations
pub type TokensResult = Result<Tokens, TokensError>;

impl Tokens {
    /// create an amount of value `0`.
    pub fn zero() -> Self {
        Tokens(0)
    }

    /// create the maximum amount
    pub fn max() -> Self {
        Tokens(MAX_TOKENS)
    }

    /// create an amount of the given value
    pub fn new(v: u64) -> TokensResult {
        if v <= MAX_TOKENS {
            Ok(Tokens(v))
        } else {
            Err(TokensError::OutOfBound(v))
        }
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ::std::str::FromStr for Tokens {
    type Err = TokensError;
    fn from_str(s: &str) -> result::Result<Self, Self::Err> {
        let v: u64 = match s.parse() {
            Err(_) => return Err(TokensError::ParseIntError),
            Ok(v) => v,
        };
        Tokens::new(v)
    }
}

impl From<Tokens> for u64 {
    fn from(t: Tokens) -> u64 {
        t.0
    }
}

// safe because of the `MAX_TOKENS` bound
impl From<Tokens> for i64 {
    fn from(t: Tokens) -> i64 {
        t.0 as i64
    }
}

impl From<Tokens> for Rat {
    fn from(t: Tokens) -> Rat {
        Rat::from_int(t.0 as i64)
    }
}

impl TryFrom<i64> for Tokens {
    type Error = TokensError;

    fn try_from(v: i64) -> TokensResult {
        if v < 0 {
            return Err(TokensError::Negative);
        }
        Tokens::new(v as u64)
    }
}

impl ops::Add for Tokens {
    type Output = TokensResult;
    fn add(self, other: Tokens) -> Self::Output {
        let sum = self.0.checked_add(other.0);
        match sum {
            None => Err(TokensError::Overflow),
            Some(v) => Tokens::new(v),
        }
    }
}

impl ops::Sub for Tokens {
    type Output = TokensResult;
    fn sub(self, other: Tokens) -> Self::Output {
        let sub = self.0.checked_sub(other.0);
        match sub {
            None => Err(TokensError::Negative),
            Some(v) => Tokens::new(v),
        }
    }
}

// this instance is necessary to chain the substraction operations
//
// i.e. `t1 - t2 - t3`
impl ops::Sub<Tokens> for TokensResult {
    type Output = TokensResult;
    fn sub(self, other: Tokens) -> Self::Output {
        if other.0 > self?.0 {
            Err(TokensError::Negative)
        } else {
            Ok(Tokens(self?.0 - other.0))
        }
    }
}

impl Encode for Tokens {
    fn encode_to<W: Output>(&self, dest: &mut W) {
        self.0.encode_to(dest);
    }

    fn size_hint(&self) -> usize {
        8
    }
}

impl Decode for Tokens {
    fn decode<I: Input>(input: &mut I) -> Result<Self, ScaleError> {
        let v = u64::decode(input)?;
        Tokens::new(v).map_err(|_| ScaleError::from("token amount out of bound"))
    }
}

impl Serialize for Tokens {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Tokens {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StrVisitor;

        impl<'de> de::Visitor<'de> for StrVisitor {
            type Value = Tokens;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("token amount in a range (0..max supply]")
            }

            #[inline]
            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let amount = value
                    .parse::<u64>()
                    .map_err(|e| E::custom(format!("{}", e)))?;
                Tokens::new(amount).map_err(|e| E::custom(format!("{}", e)))
            }
        }

        deserializer.deserialize_str(StrVisitor)
    }
}

/// Sum a stream of amounts, erroring out on overflow.
pub fn sum_tokens<I: Iterator<Item = Tokens>>(iter: I) -> TokensResult {
    iter.fold(Ok(Tokens::zero()), |acc, t| acc.and_then(|a| a + t))
}

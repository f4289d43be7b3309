//! Exact rational arithmetic.
//!
//! Every share balance, exchange rate and power computation in the
//! staking module goes through `Rat`, so repeated pool movements and
//! provision cycles introduce no drift. Values are always stored
//! reduced with a positive denominator; equality and ordering compare
//! the reduced form.
//!
//! Faults in this module are not recoverable by a message sender:
//! division by zero and component overflow abort processing, because a
//! replica that continued with an approximated value would diverge.

use std::fmt;
use std::ops;
use std::str::FromStr;

use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, Signed, Zero};
use parity_scale_codec::{Decode, Encode, Error as ScaleError, Input, Output};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Exact fraction `p/q` with `q > 0`, stored reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rat(Ratio<i128>);

impl Rat {
    /// Create `numer/denom`. Panics if `denom` is zero.
    pub fn new(numer: i64, denom: i64) -> Self {
        if denom == 0 {
            panic!("rational denominator is zero");
        }
        Rat(Ratio::new(i128::from(numer), i128::from(denom)))
    }

    pub fn from_int(n: i64) -> Self {
        Rat(Ratio::from_integer(i128::from(n)))
    }

    pub fn zero() -> Self {
        Rat(Ratio::zero())
    }

    pub fn one() -> Self {
        Rat(Ratio::from_integer(1))
    }

    pub fn numer(&self) -> i128 {
        *self.0.numer()
    }

    pub fn denom(&self) -> i128 {
        *self.0.denom()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Round to the nearest multiple of `1/precision`, ties to even.
    pub fn round(self, precision: i64) -> Self {
        if precision <= 0 {
            panic!("rounding precision must be positive");
        }
        let scaled = self
            .0
            .checked_mul(&Ratio::from_integer(i128::from(precision)))
            .expect("rational overflow in round");
        Rat(Ratio::new(
            round_half_even(&scaled),
            i128::from(precision),
        ))
    }

    /// Round to the nearest integer, ties to even.
    pub fn evaluate(self) -> i64 {
        let n = round_half_even(&self.0);
        if n < i128::from(i64::min_value()) || n > i128::from(i64::max_value()) {
            panic!("rational out of i64 range in evaluate");
        }
        n as i64
    }

    /// Largest integer not greater than the value.
    pub fn floor(self) -> i64 {
        let n = self.0.floor().to_integer();
        if n < i128::from(i64::min_value()) || n > i128::from(i64::max_value()) {
            panic!("rational out of i64 range in floor");
        }
        n as i64
    }
}

// in [floor, floor + 1); the tie sits exactly at one half
fn round_half_even(r: &Ratio<i128>) -> i128 {
    let floor = r.floor().to_integer();
    let frac = r
        .checked_sub(&Ratio::from_integer(floor))
        .expect("rational overflow in rounding");
    let twice = frac
        .checked_mul(&Ratio::from_integer(2))
        .expect("rational overflow in rounding");
    match twice.cmp(&Ratio::from_integer(1)) {
        std::cmp::Ordering::Less => floor,
        std::cmp::Ordering::Greater => floor + 1,
        std::cmp::Ordering::Equal => {
            if floor % 2 == 0 {
                floor
            } else {
                floor + 1
            }
        }
    }
}

impl ops::Add for Rat {
    type Output = Rat;
    fn add(self, other: Rat) -> Rat {
        Rat(self.0.checked_add(&other.0).expect("rational overflow"))
    }
}

impl ops::Sub for Rat {
    type Output = Rat;
    fn sub(self, other: Rat) -> Rat {
        Rat(self.0.checked_sub(&other.0).expect("rational overflow"))
    }
}

impl ops::Mul for Rat {
    type Output = Rat;
    fn mul(self, other: Rat) -> Rat {
        Rat(self.0.checked_mul(&other.0).expect("rational overflow"))
    }
}

impl ops::Div for Rat {
    type Output = Rat;
    fn div(self, other: Rat) -> Rat {
        if other.is_zero() {
            panic!("rational division by zero");
        }
        Rat(self.0.checked_div(&other.0).expect("rational overflow"))
    }
}

impl Encode for Rat {
    fn encode_to<W: Output>(&self, dest: &mut W) {
        self.numer().encode_to(dest);
        self.denom().encode_to(dest);
    }

    fn size_hint(&self) -> usize {
        32
    }
}

impl Decode for Rat {
    fn decode<I: Input>(input: &mut I) -> Result<Self, ScaleError> {
        let numer = i128::decode(input)?;
        let denom = i128::decode(input)?;
        if denom <= 0 {
            return Err(ScaleError::from("rational denominator not positive"));
        }
        Ok(Rat(Ratio::new(numer, denom)))
    }
}

impl fmt::Display for Rat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom() == 1 {
            write!(f, "{}", self.numer())
        } else {
            write!(f, "{}/{}", self.numer(), self.denom())
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RatError {
    ParseIntError,
    ZeroDenominator,
}

impl fmt::Display for RatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatError::ParseIntError => write!(f, "cannot parse a valid integer"),
            RatError::ZeroDenominator => write!(f, "rational denominator is zero"),
        }
    }
}

impl ::std::error::Error for RatError {}

impl FromStr for Rat {
    type Err = RatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, '/');
        let numer: i64 = parts
            .next()
            .unwrap_or_default()
            .parse()
            .map_err(|_| RatError::ParseIntError)?;
        let denom: i64 = match parts.next() {
            Some(d) => d.parse().map_err(|_| RatError::ParseIntError)?,
            None => 1,
        };
        if denom == 0 {
            return Err(RatError::ZeroDenominator);
        }
        Ok(Rat::new(numer, denom))
    }
}

impl Serialize for Rat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StrVisitor;

        impl<'de> de::Visitor<'de> for StrVisitor {
            type Value = Rat;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a rational as \"p/q\" or \"p\"")
            }

            #[inline]
            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Rat::from_str(value).map_err(|err| E::custom(err.to_string()))
            }
        }

        deserializer.deserialize_str(StrVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    #[test]
    fn check_reduction_and_equality() {
        assert_eq!(Rat::new(2, 4), Rat::new(1, 2));
        assert_eq!(Rat::new(-2, 4), Rat::new(1, -2));
        assert_eq!(Rat::new(1, -2).denom(), 2);
        assert!(Rat::new(1, 3) < Rat::new(1, 2));
        assert!(Rat::new(-1, 2) < Rat::zero());
    }

    #[test]
    fn check_arithmetic() {
        let a = Rat::new(1, 3);
        let b = Rat::new(1, 6);
        assert_eq!(a + b, Rat::new(1, 2));
        assert_eq!(a - b, Rat::new(1, 6));
        assert_eq!(a * b, Rat::new(1, 18));
        assert_eq!(a / b, Rat::from_int(2));
    }

    #[test]
    #[should_panic(expected = "rational division by zero")]
    fn check_division_by_zero_is_fatal() {
        let _ = Rat::one() / Rat::zero();
    }

    #[test]
    fn check_round_half_even() {
        // exact multiples are untouched
        assert_eq!(Rat::new(3, 10).round(10), Rat::new(3, 10));
        // ties go to the even multiple
        assert_eq!(Rat::new(1, 2).round(1), Rat::zero());
        assert_eq!(Rat::new(3, 2).round(1), Rat::from_int(2));
        assert_eq!(Rat::new(-1, 2).round(1), Rat::zero());
        // plain nearest otherwise
        assert_eq!(Rat::new(7, 10).round(1), Rat::from_int(1));
        assert_eq!(Rat::new(2, 3).round(1000), Rat::new(667, 1000));
    }

    #[test]
    fn check_evaluate_and_floor() {
        assert_eq!(Rat::new(5, 2).evaluate(), 2);
        assert_eq!(Rat::new(7, 2).evaluate(), 4);
        assert_eq!(Rat::new(5, 3).evaluate(), 2);
        assert_eq!(Rat::new(5, 2).floor(), 2);
        assert_eq!(Rat::new(-5, 2).floor(), -3);
        assert_eq!(Rat::new(-5, 2).evaluate(), -2);
    }

    #[test]
    fn check_display_parse() {
        assert_eq!(Rat::new(67, 100).to_string(), "67/100");
        assert_eq!(Rat::from_int(3).to_string(), "3");
        assert_eq!("67/100".parse::<Rat>().unwrap(), Rat::new(67, 100));
        assert_eq!("3".parse::<Rat>().unwrap(), Rat::from_int(3));
        assert!("1/0".parse::<Rat>().is_err());
    }

    quickcheck! {
        // tests if decode(encode(x)) == x
        fn prop_encode_decode_rat(numer: i64, denom: i64) -> bool {
            if denom == 0 {
                return true;
            }
            let r = Rat::new(numer, denom);
            let encoded = r.encode();
            Rat::decode(&mut encoded.as_ref()).expect("decode rational") == r
        }

        fn prop_round_idempotent(numer: i64, denom: i64) -> bool {
            if denom == 0 {
                return true;
            }
            let r = Rat::new(numer, denom).round(1_000_000_000);
            r.round(1_000_000_000) == r
        }
    }
}

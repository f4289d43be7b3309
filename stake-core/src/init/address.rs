use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use parity_scale_codec::{Decode, Encode, Error as ScaleError, Input, Output};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Account address: 20 bytes identifying a validator owner or a
/// delegator. Displayed as 0x-prefixed hex.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

/// error type relating to `Address` parsing
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AddressError {
    InvalidLength(usize),
    InvalidHex,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::InvalidLength(len) => {
                write!(f, "address has {} bytes, expected 20", len)
            }
            AddressError::InvalidHex => write!(f, "address is not valid hex"),
        }
    }
}

impl ::std::error::Error for AddressError {}

impl Address {
    pub fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// The all-zero address, rejected by message handlers.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = AddressError;

    fn try_from(c: &[u8]) -> Result<Self, Self::Error> {
        if c.len() != 20 {
            return Err(AddressError::InvalidLength(c.len()));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(c);
        Ok(Address(bytes))
    }
}

impl Encode for Address {
    fn encode_to<W: Output>(&self, dest: &mut W) {
        dest.write(&self.0);
    }

    fn size_hint(&self) -> usize {
        20
    }
}

impl Decode for Address {
    fn decode<I: Input>(input: &mut I) -> Result<Self, ScaleError> {
        let mut bytes = [0u8; 20];
        input.read(&mut bytes)?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start_matches("0x");
        let decoded = hex::decode(s).map_err(|_| AddressError::InvalidHex)?;
        Address::try_from(decoded.as_slice())
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StrVisitor;

        impl<'de> de::Visitor<'de> for StrVisitor {
            type Value = Address;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("account address in hex")
            }

            #[inline]
            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Address::from_str(value).map_err(|err| E::custom(err.to_string()))
            }
        }

        deserializer.deserialize_str(StrVisitor)
    }
}

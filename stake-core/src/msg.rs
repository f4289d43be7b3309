//! Messages applied by the staking state machine. Validation lives
//! with the handlers; these are plain data carried over the wire.

use crate::init::{Address, Tokens};
use crate::rational::Rat;
use crate::state::tendermint::ConsensusPubKey;
use crate::state::Description;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Declare a new validator, with an initial self-delegation.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct MsgCreateValidator {
    pub validator_addr: Address,
    pub pub_key: ConsensusPubKey,
    pub description: Description,
    pub amount: Tokens,
}

/// Replace a validator's description.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct MsgEditValidator {
    pub validator_addr: Address,
    pub description: Description,
}

/// Delegate `amount` tokens to a validator.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct MsgDelegate {
    pub delegator_addr: Address,
    pub validator_addr: Address,
    pub amount: Tokens,
}

/// Start unbonding `shares` from a delegation; the token value is
/// released after the unbonding period.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct MsgBeginUnbonding {
    pub delegator_addr: Address,
    pub validator_addr: Address,
    pub shares: Rat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_encode_decode() {
        let msg = MsgDelegate {
            delegator_addr: Address::new([1; 20]),
            validator_addr: Address::new([2; 20]),
            amount: Tokens::new(10).unwrap(),
        };
        let encoded = msg.encode();
        assert_eq!(MsgDelegate::decode(&mut encoded.as_ref()).unwrap(), msg);
    }
}

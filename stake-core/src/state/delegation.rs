use crate::init::{Address, Tokens};
use crate::rational::Rat;
use crate::state::tendermint::BlockHeight;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A delegator's share balance with one validator. Created on first
/// delegation, removed when the shares reach zero.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator_addr: Address,
    pub validator_addr: Address,
    pub shares: Rat,
    /// height of the most recent change, for queries
    pub height: BlockHeight,
}

/// Tokens withdrawn from a validator, held back until the completion
/// height passes.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct UnbondingDelegation {
    pub delegator_addr: Address,
    pub validator_addr: Address,
    pub balance: Tokens,
    pub completion_height: BlockHeight,
}

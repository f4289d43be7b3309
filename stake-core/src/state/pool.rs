use crate::common::Timespec;
use crate::init::Tokens;
use crate::rational::Rat;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Aggregate token and share accounting for the bonded and unbonded
/// pools, plus the inflation state.
///
/// Invariant P1:
///   `bonded_tokens` backs exactly the bonded validators'
///   token-equivalents; `loose_unbonded_tokens` backs the unbonded
///   validators' token-equivalents plus free supply.
///
/// Invariant P2:
///   For each pool, `tokens == shares * share_ex_rate` where the
///   ex-rate is derived, so the identity is exact by construction.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Pool {
    /// tokens locked in the bonded pool
    pub bonded_tokens: Tokens,
    /// tokens in the unbonded pool plus free supply
    pub loose_unbonded_tokens: Tokens,
    /// total delegator shares outstanding in the bonded pool
    pub bonded_shares: Rat,
    /// total delegator shares outstanding in the unbonded pool
    pub unbonded_shares: Rat,
    /// current annualized inflation rate
    pub inflation: Rat,
    /// block time of the last provisions cycle
    pub inflation_last_time: Timespec,
    /// transaction ordinal within the current block, reset at block
    /// start; rollback of a rejected block discards it with the record
    pub intra_tx_counter: u16,
}

impl Pool {
    /// The pool at genesis: empty, inflation starting at 7%.
    pub fn initial() -> Self {
        Pool {
            bonded_tokens: Tokens::zero(),
            loose_unbonded_tokens: Tokens::zero(),
            bonded_shares: Rat::zero(),
            unbonded_shares: Rat::zero(),
            inflation: Rat::new(7, 100),
            inflation_last_time: 0,
            intra_tx_counter: 0,
        }
    }

    pub fn token_supply(&self) -> Tokens {
        (self.bonded_tokens + self.loose_unbonded_tokens).expect("token supply out of bound")
    }

    /// Fraction of the supply that is bonded; zero for an empty supply.
    pub fn bonded_ratio(&self) -> Rat {
        let supply = self.token_supply();
        if supply.is_zero() {
            return Rat::zero();
        }
        Rat::from(self.bonded_tokens) / Rat::from(supply)
    }

    /// Tokens per bonded share; one when no shares are outstanding.
    pub fn bonded_share_ex_rate(&self) -> Rat {
        if self.bonded_shares.is_zero() {
            return Rat::one();
        }
        Rat::from(self.bonded_tokens) / self.bonded_shares
    }

    /// Tokens per unbonded share; one when no shares are outstanding.
    pub fn unbonded_share_ex_rate(&self) -> Rat {
        if self.unbonded_shares.is_zero() {
            return Rat::one();
        }
        Rat::from(self.loose_unbonded_tokens) / self.unbonded_shares
    }

    pub fn next_intra_tx_counter(&mut self) -> u16 {
        let counter = self.intra_tx_counter;
        self.intra_tx_counter = self.intra_tx_counter.wrapping_add(1);
        counter
    }

    /// Grow the bonded pool by `amount`, minting shares at the current
    /// ex-rate. Returns the newly issued pool shares.
    pub fn add_tokens_bonded(&mut self, amount: Tokens) -> Rat {
        let issued = Rat::from(amount) / self.bonded_share_ex_rate();
        self.bonded_tokens = (self.bonded_tokens + amount).expect("bonded pool out of bound");
        self.bonded_shares = self.bonded_shares + issued;
        issued
    }

    /// Burn `shares` from the bonded pool at the current ex-rate.
    /// Returns the token value removed.
    pub fn remove_shares_bonded(&mut self, shares: Rat) -> Tokens {
        let value = shares * self.bonded_share_ex_rate();
        let tokens = Tokens::try_from(value.evaluate()).expect("bonded pool imbalance");
        let remaining = self.bonded_shares - shares;
        if remaining.is_negative() {
            panic!("bonded share underflow");
        }
        self.bonded_tokens = (self.bonded_tokens - tokens).expect("bonded pool imbalance");
        self.bonded_shares = remaining;
        tokens
    }

    /// Grow the unbonded pool by `amount`, minting shares at the
    /// current ex-rate. Returns the newly issued pool shares.
    pub fn add_tokens_unbonded(&mut self, amount: Tokens) -> Rat {
        let issued = Rat::from(amount) / self.unbonded_share_ex_rate();
        self.loose_unbonded_tokens =
            (self.loose_unbonded_tokens + amount).expect("unbonded pool out of bound");
        self.unbonded_shares = self.unbonded_shares + issued;
        issued
    }

    /// Burn `shares` from the unbonded pool at the current ex-rate.
    /// Returns the token value removed.
    pub fn remove_shares_unbonded(&mut self, shares: Rat) -> Tokens {
        let value = shares * self.unbonded_share_ex_rate();
        let tokens = Tokens::try_from(value.evaluate()).expect("unbonded pool imbalance");
        let remaining = self.unbonded_shares - shares;
        if remaining.is_negative() {
            panic!("unbonded share underflow");
        }
        self.loose_unbonded_tokens =
            (self.loose_unbonded_tokens - tokens).expect("unbonded pool imbalance");
        self.unbonded_shares = remaining;
        tokens
    }
}

use crate::rational::Rat;
use crate::state::tendermint::BlockHeight;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Number of hours in a Julian year; the inflation feedback loop runs
/// once per hour, so annual rates are divided by this.
pub const HOURS_PER_YEAR: i64 = 8766;

/// Fixed rounding denominator for inflation deltas.
pub const PRECISION: i64 = 1_000_000_000;

/// staking parameters specified at genesis
#[derive(Debug, PartialEq, Eq, Clone, Encode, Decode, Serialize, Deserialize)]
pub struct Params {
    /// maximum annual change in inflation rate
    pub inflation_rate_change: Rat,
    /// ceiling on the annual inflation rate
    pub inflation_max: Rat,
    /// floor on the annual inflation rate
    pub inflation_min: Rat,
    /// target fraction of the token supply that is bonded
    pub goal_bonded: Rat,
    /// number of blocks an unbonding delegation is held back
    pub unbonding_period: BlockHeight,
    /// maximum number of bonded validators at a time (may be reshuffled)
    pub max_validators: u16,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            inflation_rate_change: Rat::new(13, 100),
            inflation_max: Rat::new(20, 100),
            inflation_min: Rat::new(7, 100),
            goal_bonded: Rat::new(67, 100),
            unbonding_period: 100,
            max_validators: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_default_bounds() {
        let params = Params::default();
        assert!(params.inflation_min < params.inflation_max);
        assert!(!params.goal_bonded.is_zero());
        assert!(params.max_validators > 0);
    }
}

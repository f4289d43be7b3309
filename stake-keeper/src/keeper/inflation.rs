//! The inflation controller.
//!
//! Once an hour the annual inflation rate is nudged toward the bonded
//! target and the resulting provisions are added to the bonded pool as
//! tokens without shares, so the bonded ex-rate rises and the reward
//! accrues to bonded holders.

use std::convert::TryFrom;

use stake_core::common::Timespec;
use stake_core::init::{Tokens, HOURS_PER_YEAR, PRECISION};
use stake_core::rational::Rat;
use stake_storage::StoreKV;

use crate::keeper::{Context, Keeper};

pub const SECS_PER_HOUR: Timespec = 3600;

impl<'a, S: StoreKV> Keeper<'a, S> {
    /// The annual inflation rate for the next provisions cycle.
    ///
    /// `change = (1 - bonded_ratio / goal_bonded) * rate_change / hours_per_year`,
    /// rounded to the fixed precision; the result is clamped to
    /// `[inflation_min, inflation_max]`.
    pub fn next_inflation(&self) -> Rat {
        let pool = self.get_pool();
        let params = self.get_params();

        let change_per_year = (Rat::one() - pool.bonded_ratio() / params.goal_bonded)
            * params.inflation_rate_change;
        let change = (change_per_year / Rat::from_int(HOURS_PER_YEAR)).round(PRECISION);

        let mut inflation = pool.inflation + change;
        if inflation > params.inflation_max {
            inflation = params.inflation_max;
        }
        if inflation < params.inflation_min {
            inflation = params.inflation_min;
        }
        inflation
    }

    /// Mint one hour of provisions into the bonded pool.
    pub fn process_provisions(&mut self, ctx: &Context) {
        let mut pool = self.get_pool();
        let inflation = self.next_inflation();
        let provisions = (inflation * Rat::from(pool.token_supply())
            / Rat::from_int(HOURS_PER_YEAR))
        .floor();
        let provisions = Tokens::try_from(provisions).expect("negative provisions");

        pool.inflation = inflation;
        pool.bonded_tokens = (pool.bonded_tokens + provisions).expect("provisions overflow supply");
        pool.inflation_last_time = ctx.block_time;
        log::info!("minted {} provisions at inflation {}", provisions, inflation);
        self.set_pool(&pool);
    }
}

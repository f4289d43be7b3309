//! The staking state machine.
//!
//! `Keeper` maintains the validator records, the delegations weighting
//! them and the pool accounting behind both, all inside an ordered
//! key-value store. Message handlers mutate that state, the power
//! index keeps the bonded set consistent on every mutation, and at
//! block end the accumulated `(pubkey, power)` diff is handed to the
//! consensus engine.

mod error;
mod handler;
pub mod keeper;
pub mod keys;

pub use error::StakingError;
pub use keeper::{Context, Keeper};

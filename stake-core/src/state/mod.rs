mod delegation;
mod pool;
/// Types shared with the consensus engine
pub mod tendermint;
mod validator;

pub use delegation::{Delegation, UnbondingDelegation};
pub use pool::Pool;
pub use validator::{
    Description, DescriptionError, PoolShareKind, PoolShares, Validator, ValidatorStatus,
    MAX_DETAILS_LEN, MAX_IDENTITY_LEN, MAX_MONIKER_LEN, MAX_WEBSITE_LEN,
};

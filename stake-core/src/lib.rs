/// Miscellaneous shared definitions (time)
pub mod common;
/// Genesis-time values: addresses, token amounts, network parameters
pub mod init;
/// Messages applied by the staking state machine
pub mod msg;
/// Exact rational arithmetic used for all share and power math
pub mod rational;
/// Stateful records: pool, validators, delegations, consensus types
pub mod state;

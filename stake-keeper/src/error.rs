use thiserror::Error;

/// Domain errors returned by the message handlers. The outer state
/// machine turns these into failing-transaction results; a failed
/// message leaves no state behind.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakingError {
    #[error("no validator found for that address")]
    NoValidator,
    #[error("no delegation for that (delegator, validator) pair")]
    NoDelegation,
    #[error("delegator address is invalid")]
    BadDelegatorAddr,
    #[error("validator address is invalid")]
    BadValidatorAddr,
    #[error("validator already exists for that owner or consensus key")]
    ValidatorAlreadyExists,
    #[error("validator is revoked")]
    ValidatorRevoked,
    #[error("not enough shares in the delegation")]
    NotEnoughShares,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("shares amount is invalid")]
    BadShares,
    #[error("token amount is invalid")]
    BadAmount,
    #[error("description field over the length limit")]
    DescriptionLength,
}

mod address;
mod params;
mod tokens;

pub use address::{Address, AddressError};
pub use params::{Params, HOURS_PER_YEAR, PRECISION};
pub use tokens::{sum_tokens, Tokens, TokensError, TokensResult, MAX_TOKENS};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("branching factor {0} out of bounds: needs to be in [2, 255]")]
    InvalidBranchingFactor(usize),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    /// The bucket for `hash` already holds the configured maximum of distinct
    /// values, so the hash cannot tell one more value apart.
    #[error("hash {hash} exhausted: {len} distinct values already share it")]
    KeySpaceExhausted { hash: i64, len: usize },
}

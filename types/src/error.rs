//! Errors raised while constructing the fundamental types.

use thiserror::Error;

/// Why an identifier failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    #[error("{kind} is {len} characters long, maximum is {max}")]
    TooLong {
        kind: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{kind} contains invalid character {ch:?}")]
    InvalidChar { kind: &'static str, ch: char },
}

/// Common error type for the credence types crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error(transparent)]
    Id(#[from] IdError),

    #[error("unknown domain: {0} (expected \"education\" or \"experience\")")]
    UnknownDomain(String),

    #[error("key is empty after normalization: {0:?}")]
    EmptyKey(String),
}

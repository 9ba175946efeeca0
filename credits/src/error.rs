//! Credit-specific errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreditError {
    #[error("no {0:?} bucket exists")]
    BucketNotFound(String),

    #[error("arithmetic overflow in bucket {0:?}")]
    Overflow(String),
}

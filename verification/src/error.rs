//! Verification outcomes that reach the caller.

use credence_store::StoreError;
use credence_types::{BucketKey, IdError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    #[error("users cannot verify their own records")]
    SelfVerification,

    #[error("record not found")]
    RecordNotFound,

    #[error("record has no institution or company name to group by")]
    UngroupedRecord,

    #[error("verifier has no {key:?} record of their own")]
    NotEligible { key: BucketKey },

    #[error("verifier has no {key:?} credits available")]
    NoCreditsAvailable { key: BucketKey },

    #[error("verifier has already verified this record")]
    AlreadyVerified,

    #[error("record changed during verification; the credit was refunded, retry")]
    ConcurrentModification,

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("record verified, but the credit summary could not be read: {0}")]
    SummaryUnavailable(#[source] StoreError),
}

/// Named error kinds, stable for callers that switch on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidId,
    SelfVerification,
    RecordNotFound,
    UngroupedRecord,
    NotEligible,
    NoCreditsAvailable,
    AlreadyVerified,
    ConcurrentModification,
    Infrastructure,
    SummaryUnavailable,
}

/// How an error should be handled by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Malformed or invalid input. Nothing changed.
    Validation,
    /// A business rule said no. Nothing changed.
    BusinessDenial,
    /// Duplicate or racing call, detected after compensation.
    Conflict,
    /// Storage failed. Any spent credit was refunded where possible.
    Infrastructure,
    /// The attestation is committed; only the report is missing.
    Degraded,
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::InvalidId
            | ErrorKind::SelfVerification
            | ErrorKind::RecordNotFound
            | ErrorKind::UngroupedRecord => ErrorCategory::Validation,
            ErrorKind::NotEligible | ErrorKind::NoCreditsAvailable => {
                ErrorCategory::BusinessDenial
            }
            ErrorKind::AlreadyVerified | ErrorKind::ConcurrentModification => {
                ErrorCategory::Conflict
            }
            ErrorKind::Infrastructure => ErrorCategory::Infrastructure,
            ErrorKind::SummaryUnavailable => ErrorCategory::Degraded,
        }
    }
}

impl VerifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VerifyError::InvalidId(_) => ErrorKind::InvalidId,
            VerifyError::SelfVerification => ErrorKind::SelfVerification,
            VerifyError::RecordNotFound => ErrorKind::RecordNotFound,
            VerifyError::UngroupedRecord => ErrorKind::UngroupedRecord,
            VerifyError::NotEligible { .. } => ErrorKind::NotEligible,
            VerifyError::NoCreditsAvailable { .. } => ErrorKind::NoCreditsAvailable,
            VerifyError::AlreadyVerified => ErrorKind::AlreadyVerified,
            VerifyError::ConcurrentModification => ErrorKind::ConcurrentModification,
            VerifyError::Store(_) => ErrorKind::Infrastructure,
            VerifyError::SummaryUnavailable(_) => ErrorKind::SummaryUnavailable,
        }
    }

    /// Whether repeating the identical call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ConcurrentModification | ErrorKind::Infrastructure
        )
    }

    /// Whether the attestation was durably recorded despite the error.
    pub fn is_committed(&self) -> bool {
        matches!(self, VerifyError::SummaryUnavailable(_))
    }
}

//! Fundamental types for the credence attestation ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! user, record and intent identifiers, the education/experience domain selector, the
//! normalized bucket key, credit buckets, attestable records and timestamps.

pub mod bucket;
pub mod domain;
pub mod error;
pub mod ids;
pub mod key;
pub mod record;
pub mod time;

pub use bucket::CreditBucket;
pub use domain::Domain;
pub use error::{IdError, TypesError};
pub use ids::{IntentId, RecordId, UserId};
pub use key::{normalize, BucketKey};
pub use record::{AttestableRecord, RecordSnapshot};
pub use time::{Clock, SystemClock, Timestamp};

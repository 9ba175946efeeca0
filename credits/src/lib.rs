//! Verification credits: the spendable side of the attestation ledger.
//!
//! A user holds one list of [`CreditBucket`](credence_types::CreditBucket)s per
//! domain. Attesting someone spends one credit from the matching bucket;
//! being attested rewards one credit into the target's own matching bucket.
//!
//! This crate holds the pure arithmetic. Storage backends load a bucket list,
//! apply exactly one engine operation and write it back inside a single atomic
//! section, so the checks here (`available > 0`, no overflow) are evaluated
//! against the same state that gets written.

pub mod engine;
pub mod error;
pub mod summary;

pub use engine::{CreditEngine, RefundOutcome, RewardOutcome};
pub use error::CreditError;
pub use summary::{BucketView, CreditSummary, CreditTotals};

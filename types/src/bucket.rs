//! Per-user, per-domain credit buckets.

use crate::key::BucketKey;
use serde::{Deserialize, Serialize};

/// One `(available, used)` counter pair for a single institution or company.
///
/// Unsigned counters make a negative balance unrepresentable; every mutation
/// goes through checked arithmetic in `credence-credits`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBucket {
    pub key: BucketKey,
    /// Human-readable institution/company name from the record that created
    /// the bucket.
    pub display_name: String,
    pub available: u32,
    pub used: u32,
}

impl CreditBucket {
    /// A freshly rewarded bucket: one available credit, none used.
    pub fn rewarded(key: BucketKey, display_name: impl Into<String>) -> Self {
        Self {
            key,
            display_name: display_name.into(),
            available: 1,
            used: 0,
        }
    }

    pub fn total(&self) -> u64 {
        u64::from(self.available) + u64::from(self.used)
    }

    pub fn can_spend(&self) -> bool {
        self.available > 0
    }
}

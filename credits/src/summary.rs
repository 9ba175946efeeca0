//! Read-side views of a user's buckets, as reported to callers.

use credence_types::CreditBucket;
use serde::{Deserialize, Serialize};

/// One bucket with its computed total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketView {
    pub key: String,
    pub display_name: String,
    pub available: u32,
    pub used: u32,
    pub total: u64,
}

impl From<&CreditBucket> for BucketView {
    fn from(b: &CreditBucket) -> Self {
        Self {
            key: b.key.to_string(),
            display_name: b.display_name.clone(),
            available: b.available,
            used: b.used,
            total: b.total(),
        }
    }
}

/// Sums across every bucket in one domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditTotals {
    pub available: u64,
    pub used: u64,
    pub total: u64,
}

/// All buckets of one user in one domain, plus totals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditSummary {
    pub buckets: Vec<BucketView>,
    pub totals: CreditTotals,
}

impl CreditSummary {
    pub fn from_buckets(buckets: &[CreditBucket]) -> Self {
        let views: Vec<BucketView> = buckets.iter().map(BucketView::from).collect();
        let totals = views.iter().fold(CreditTotals::default(), |acc, v| CreditTotals {
            available: acc.available + u64::from(v.available),
            used: acc.used + u64::from(v.used),
            total: acc.total + v.total,
        });
        Self {
            buckets: views,
            totals,
        }
    }

    /// The view for `key`, if the user holds such a bucket.
    pub fn bucket(&self, key: &str) -> Option<&BucketView> {
        self.buckets.iter().find(|b| b.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credence_types::BucketKey;

    #[test]
    fn totals_sum_all_buckets() {
        let buckets = vec![
            CreditBucket {
                key: BucketKey::new("Acme").unwrap(),
                display_name: "Acme".into(),
                available: 2,
                used: 3,
            },
            CreditBucket {
                key: BucketKey::new("Globex").unwrap(),
                display_name: "Globex".into(),
                available: 1,
                used: 0,
            },
        ];
        let summary = CreditSummary::from_buckets(&buckets);
        assert_eq!(
            summary.totals,
            CreditTotals {
                available: 3,
                used: 3,
                total: 6
            }
        );
        assert_eq!(summary.bucket("acme").unwrap().total, 5);
        assert!(summary.bucket("initech").is_none());
    }

    #[test]
    fn empty_summary() {
        let summary = CreditSummary::from_buckets(&[]);
        assert!(summary.buckets.is_empty());
        assert_eq!(summary.totals, CreditTotals::default());
    }
}

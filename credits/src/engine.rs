//! Core bucket operations.

use crate::error::CreditError;
use credence_types::{BucketKey, CreditBucket};

/// Result of a refund.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefundOutcome {
    /// `available += 1`, `used -= 1`: the exact inverse of a spend.
    Balanced,
    /// `used` was already zero. `available` was still incremented and `used`
    /// left at zero; the caller must report this as a bug.
    UsedUnderflow,
}

/// Result of a reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardOutcome {
    /// An existing bucket gained one available credit.
    Incremented,
    /// No bucket existed; one was created with `available = 1, used = 0`.
    Created,
}

/// The credit engine: applies spend/refund/reward to a bucket list.
///
/// All operations address the first bucket whose key equals `key`. Each one
/// either succeeds completely or leaves the list untouched.
pub struct CreditEngine;

impl CreditEngine {
    pub fn find<'a>(&self, buckets: &'a [CreditBucket], key: &BucketKey) -> Option<&'a CreditBucket> {
        buckets.iter().find(|b| &b.key == key)
    }

    fn find_mut<'a>(
        &self,
        buckets: &'a mut [CreditBucket],
        key: &BucketKey,
    ) -> Option<&'a mut CreditBucket> {
        buckets.iter_mut().find(|b| &b.key == key)
    }

    /// Spend one credit: `available -= 1`, `used += 1`.
    ///
    /// Returns `Ok(false)` with no mutation if no matching bucket exists or
    /// its `available` is zero.
    pub fn try_spend(
        &self,
        buckets: &mut [CreditBucket],
        key: &BucketKey,
    ) -> Result<bool, CreditError> {
        let Some(bucket) = self.find_mut(buckets, key) else {
            return Ok(false);
        };
        if !bucket.can_spend() {
            return Ok(false);
        }
        let used = bucket
            .used
            .checked_add(1)
            .ok_or_else(|| CreditError::Overflow(key.to_string()))?;
        bucket.available -= 1;
        bucket.used = used;
        Ok(true)
    }

    /// Undo one spend against the same bucket.
    ///
    /// Unconditional: a refund with `used == 0` still restores the available
    /// credit and reports [`RefundOutcome::UsedUnderflow`].
    pub fn refund(
        &self,
        buckets: &mut [CreditBucket],
        key: &BucketKey,
    ) -> Result<RefundOutcome, CreditError> {
        let bucket = self
            .find_mut(buckets, key)
            .ok_or_else(|| CreditError::BucketNotFound(key.to_string()))?;
        bucket.available = bucket
            .available
            .checked_add(1)
            .ok_or_else(|| CreditError::Overflow(key.to_string()))?;
        match bucket.used.checked_sub(1) {
            Some(used) => {
                bucket.used = used;
                Ok(RefundOutcome::Balanced)
            }
            None => Ok(RefundOutcome::UsedUnderflow),
        }
    }

    /// Conditional half of a reward: `available += 1` on an existing bucket.
    ///
    /// Returns `Ok(false)` if no bucket matches, which tells the caller to
    /// fall through to [`CreditEngine::insert_or_increment`].
    pub fn increment(
        &self,
        buckets: &mut [CreditBucket],
        key: &BucketKey,
    ) -> Result<bool, CreditError> {
        let Some(bucket) = self.find_mut(buckets, key) else {
            return Ok(false);
        };
        bucket.available = bucket
            .available
            .checked_add(1)
            .ok_or_else(|| CreditError::Overflow(key.to_string()))?;
        Ok(true)
    }

    /// Insert half of a reward.
    ///
    /// Re-checks for a matching bucket first so that two rewards racing past
    /// a failed [`CreditEngine::increment`] cannot create duplicate buckets.
    pub fn insert_or_increment(
        &self,
        buckets: &mut Vec<CreditBucket>,
        key: &BucketKey,
        display_name: &str,
    ) -> Result<RewardOutcome, CreditError> {
        if self.increment(buckets, key)? {
            return Ok(RewardOutcome::Incremented);
        }
        buckets.push(CreditBucket::rewarded(key.clone(), display_name));
        Ok(RewardOutcome::Created)
    }
}

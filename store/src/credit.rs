//! Credit bucket storage trait.

use crate::StoreError;
use credence_credits::{RefundOutcome, RewardOutcome};
use credence_types::{BucketKey, CreditBucket, Domain, UserId};

/// Per-user, per-domain credit bucket lists.
///
/// Implementations apply the [`credence_credits::CreditEngine`] operations
/// inside one atomic section per call.
pub trait CreditStore {
    /// All buckets of `user` in `domain`, in creation order.
    fn buckets(&self, user: &UserId, domain: Domain) -> Result<Vec<CreditBucket>, StoreError>;

    /// The first bucket matching `key`, if any.
    fn find_bucket(
        &self,
        user: &UserId,
        domain: Domain,
        key: &BucketKey,
    ) -> Result<Option<CreditBucket>, StoreError> {
        Ok(self.buckets(user, domain)?.into_iter().find(|b| &b.key == key))
    }

    /// Atomically spend one credit if the matching bucket has `available > 0`.
    ///
    /// Returns `Ok(false)` with zero mutation otherwise. Concurrent callers on
    /// the same bucket are serialized: at most `available` of them succeed.
    fn try_spend(&self, user: &UserId, domain: Domain, key: &BucketKey)
        -> Result<bool, StoreError>;

    /// Unconditional inverse of [`CreditStore::try_spend`] against the same bucket.
    fn refund(
        &self,
        user: &UserId,
        domain: Domain,
        key: &BucketKey,
    ) -> Result<RefundOutcome, StoreError>;

    /// Atomically add one available credit to an existing bucket.
    ///
    /// Returns `Ok(false)` if no bucket matches.
    fn increment(&self, user: &UserId, domain: Domain, key: &BucketKey)
        -> Result<bool, StoreError>;

    /// Atomically create the bucket with one credit, or increment it if it
    /// appeared since the caller's [`CreditStore::increment`] missed.
    fn insert_bucket(
        &self,
        user: &UserId,
        domain: Domain,
        key: &BucketKey,
        display_name: &str,
    ) -> Result<RewardOutcome, StoreError>;

    /// Reward one credit: conditional update first, insert only on a miss.
    fn reward(
        &self,
        user: &UserId,
        domain: Domain,
        key: &BucketKey,
        display_name: &str,
    ) -> Result<RewardOutcome, StoreError> {
        if self.increment(user, domain, key)? {
            return Ok(RewardOutcome::Incremented);
        }
        self.insert_bucket(user, domain, key, display_name)
    }
}

//! LMDB implementation of CreditStore.
//!
//! One LMDB value per `(user, domain)` holds that user's whole bucket list,
//! so every bucket primitive is a read-modify-write of one value inside one
//! write transaction.

use credence_credits::{CreditEngine, RefundOutcome, RewardOutcome};
use credence_store::{CreditStore, StoreError};
use credence_types::{BucketKey, CreditBucket, Domain, UserId};

use crate::codec::{decode, encode};
use crate::environment::LmdbStore;
use crate::keys::bucket_key;
use crate::LmdbError;

impl LmdbStore {
    /// Run `op` against the bucket list of `(user, domain)` in one write
    /// transaction. The list is written back only if `op` changed it; an
    /// error from `op` aborts the transaction.
    fn update_buckets<R>(
        &self,
        user: &UserId,
        domain: Domain,
        op: impl FnOnce(&mut Vec<CreditBucket>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let key = bucket_key(user, domain);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let before: Vec<CreditBucket> = match self
            .buckets_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => decode(bytes)?,
            None => Vec::new(),
        };
        let mut list = before.clone();
        let result = op(&mut list)?;
        if list != before {
            self.buckets_db
                .put(&mut wtxn, &key, &encode(&list)?)
                .map_err(LmdbError::from)?;
            wtxn.commit().map_err(LmdbError::from)?;
        } else {
            wtxn.abort();
        }
        Ok(result)
    }
}

impl CreditStore for LmdbStore {
    fn buckets(&self, user: &UserId, domain: Domain) -> Result<Vec<CreditBucket>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .buckets_db
            .get(&rtxn, &bucket_key(user, domain))
            .map_err(LmdbError::from)?;
        match bytes {
            Some(bytes) => Ok(decode(bytes)?),
            None => Ok(Vec::new()),
        }
    }

    fn try_spend(
        &self,
        user: &UserId,
        domain: Domain,
        key: &BucketKey,
    ) -> Result<bool, StoreError> {
        self.update_buckets(user, domain, |list| Ok(CreditEngine.try_spend(list, key)?))
    }

    fn refund(
        &self,
        user: &UserId,
        domain: Domain,
        key: &BucketKey,
    ) -> Result<RefundOutcome, StoreError> {
        self.update_buckets(user, domain, |list| Ok(CreditEngine.refund(list, key)?))
    }

    fn increment(
        &self,
        user: &UserId,
        domain: Domain,
        key: &BucketKey,
    ) -> Result<bool, StoreError> {
        self.update_buckets(user, domain, |list| Ok(CreditEngine.increment(list, key)?))
    }

    fn insert_bucket(
        &self,
        user: &UserId,
        domain: Domain,
        key: &BucketKey,
        display_name: &str,
    ) -> Result<RewardOutcome, StoreError> {
        self.update_buckets(user, domain, |list| {
            Ok(CreditEngine.insert_or_increment(list, key, display_name)?)
        })
    }
}

//! Nullable store: thread-safe in-memory storage for testing.
//!
//! Each map sits behind its own mutex and every trait method holds exactly one
//! lock for its whole read-check-write, which gives the same single-aggregate
//! atomicity the LMDB backend gets from its write transactions.
//!
//! Failures can be injected per operation with [`NullStore::fail_next`], and
//! one-shot hooks registered with [`NullStore::before`] run just before an
//! operation executes (e.g. to delete a record mid-verification).

use credence_credits::{CreditEngine, RefundOutcome, RewardOutcome};
use credence_store::{
    CreditStore, Intent, IntentId, IntentStage, IntentStore, ProfileStore, RecordStore,
    StoreError,
};
use credence_types::{AttestableRecord, BucketKey, CreditBucket, Domain, RecordId, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Store operations that can be failed or hooked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Buckets,
    TrySpend,
    Refund,
    Increment,
    InsertBucket,
    GetRecord,
    TryAddAttestation,
    ListRecords,
    InsertRecord,
    PutIntent,
    DeleteIntent,
    ListIntents,
}

type Hook = Box<dyn FnOnce(&NullStore) + Send>;

type RecordKey = (UserId, Domain, RecordId);

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An in-memory implementation of every credence store trait.
pub struct NullStore {
    buckets: Mutex<HashMap<(UserId, Domain), Vec<CreditBucket>>>,
    records: Mutex<BTreeMap<RecordKey, AttestableRecord>>,
    intents: Mutex<HashMap<IntentId, Intent>>,
    failures: Mutex<HashMap<StoreOp, u32>>,
    hooks: Mutex<HashMap<StoreOp, Vec<Hook>>>,
    engine: CreditEngine,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            records: Mutex::new(BTreeMap::new()),
            intents: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            hooks: Mutex::new(HashMap::new()),
            engine: CreditEngine,
        }
    }

    /// Make the next `times` calls of `op` fail with a backend error.
    pub fn fail_next(&self, op: StoreOp, times: u32) {
        *lock(&self.failures).entry(op).or_insert(0) += times;
    }

    /// Run `hook` once, immediately before the next call of `op`.
    pub fn before(&self, op: StoreOp, hook: impl FnOnce(&NullStore) + Send + 'static) {
        lock(&self.hooks).entry(op).or_default().push(Box::new(hook));
    }

    /// Overwrite a user's bucket list (test setup).
    pub fn set_buckets(&self, user: &UserId, domain: Domain, buckets: Vec<CreditBucket>) {
        lock(&self.buckets).insert((user.clone(), domain), buckets);
    }

    /// Raw read of a record without going through fault injection.
    pub fn peek_record(
        &self,
        owner: &UserId,
        domain: Domain,
        id: &RecordId,
    ) -> Option<AttestableRecord> {
        lock(&self.records)
            .get(&(owner.clone(), domain, id.clone()))
            .cloned()
    }

    /// Raw read of a bucket list without going through fault injection.
    pub fn peek_buckets(&self, user: &UserId, domain: Domain) -> Vec<CreditBucket> {
        lock(&self.buckets)
            .get(&(user.clone(), domain))
            .cloned()
            .unwrap_or_default()
    }

    pub fn intent_count(&self) -> usize {
        lock(&self.intents).len()
    }

    fn enter(&self, op: StoreOp) -> Result<(), StoreError> {
        let hooks = lock(&self.hooks).remove(&op).unwrap_or_default();
        for hook in hooks {
            hook(self);
        }
        let mut failures = lock(&self.failures);
        if let Some(remaining) = failures.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::Backend(format!("injected failure: {op:?}")));
            }
        }
        Ok(())
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CreditStore for NullStore {
    fn buckets(&self, user: &UserId, domain: Domain) -> Result<Vec<CreditBucket>, StoreError> {
        self.enter(StoreOp::Buckets)?;
        Ok(self.peek_buckets(user, domain))
    }

    fn try_spend(
        &self,
        user: &UserId,
        domain: Domain,
        key: &BucketKey,
    ) -> Result<bool, StoreError> {
        self.enter(StoreOp::TrySpend)?;
        let mut buckets = lock(&self.buckets);
        match buckets.get_mut(&(user.clone(), domain)) {
            Some(list) => Ok(self.engine.try_spend(list, key)?),
            None => Ok(false),
        }
    }

    fn refund(
        &self,
        user: &UserId,
        domain: Domain,
        key: &BucketKey,
    ) -> Result<RefundOutcome, StoreError> {
        self.enter(StoreOp::Refund)?;
        let mut buckets = lock(&self.buckets);
        let list = buckets
            .get_mut(&(user.clone(), domain))
            .ok_or_else(|| StoreError::NotFound(format!("{user}/{domain}/{key}")))?;
        Ok(self.engine.refund(list, key)?)
    }

    fn increment(
        &self,
        user: &UserId,
        domain: Domain,
        key: &BucketKey,
    ) -> Result<bool, StoreError> {
        self.enter(StoreOp::Increment)?;
        let mut buckets = lock(&self.buckets);
        match buckets.get_mut(&(user.clone(), domain)) {
            Some(list) => Ok(self.engine.increment(list, key)?),
            None => Ok(false),
        }
    }

    fn insert_bucket(
        &self,
        user: &UserId,
        domain: Domain,
        key: &BucketKey,
        display_name: &str,
    ) -> Result<RewardOutcome, StoreError> {
        self.enter(StoreOp::InsertBucket)?;
        let mut buckets = lock(&self.buckets);
        let list = buckets.entry((user.clone(), domain)).or_default();
        Ok(self.engine.insert_or_increment(list, key, display_name)?)
    }
}

impl RecordStore for NullStore {
    fn get_record(
        &self,
        owner: &UserId,
        domain: Domain,
        id: &RecordId,
    ) -> Result<Option<AttestableRecord>, StoreError> {
        self.enter(StoreOp::GetRecord)?;
        Ok(self.peek_record(owner, domain, id))
    }

    fn try_add_attestation(
        &self,
        owner: &UserId,
        domain: Domain,
        id: &RecordId,
        verifier: &UserId,
        intent: Option<&IntentId>,
    ) -> Result<bool, StoreError> {
        self.enter(StoreOp::TryAddAttestation)?;
        let mut records = lock(&self.records);
        match records.get_mut(&(owner.clone(), domain, id.clone())) {
            Some(record) => Ok(record.add_attestation(verifier, intent.copied())),
            None => Ok(false),
        }
    }
}

impl ProfileStore for NullStore {
    fn list_records(
        &self,
        owner: &UserId,
        domain: Domain,
    ) -> Result<Vec<AttestableRecord>, StoreError> {
        self.enter(StoreOp::ListRecords)?;
        Ok(lock(&self.records)
            .values()
            .filter(|r| &r.owner == owner && r.domain == domain)
            .cloned()
            .collect())
    }

    fn insert_record(&self, record: &AttestableRecord) -> Result<(), StoreError> {
        self.enter(StoreOp::InsertRecord)?;
        let key = (record.owner.clone(), record.domain, record.id.clone());
        let mut records = lock(&self.records);
        if records.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "{}/{}/{}",
                record.owner, record.domain, record.id
            )));
        }
        records.insert(key, record.clone());
        Ok(())
    }

    fn remove_record(
        &self,
        owner: &UserId,
        domain: Domain,
        id: &RecordId,
    ) -> Result<bool, StoreError> {
        Ok(lock(&self.records)
            .remove(&(owner.clone(), domain, id.clone()))
            .is_some())
    }
}

impl IntentStore for NullStore {
    fn put_intent(&self, intent: &Intent) -> Result<(), StoreError> {
        self.enter(StoreOp::PutIntent)?;
        lock(&self.intents).insert(intent.id, intent.clone());
        Ok(())
    }

    fn get_intent(&self, id: &IntentId) -> Result<Option<Intent>, StoreError> {
        Ok(lock(&self.intents).get(id).cloned())
    }

    fn delete_intent(&self, id: &IntentId) -> Result<bool, StoreError> {
        self.enter(StoreOp::DeleteIntent)?;
        Ok(lock(&self.intents).remove(id).is_some())
    }

    fn list_intents(&self) -> Result<Vec<Intent>, StoreError> {
        self.enter(StoreOp::ListIntents)?;
        let mut intents: Vec<Intent> = lock(&self.intents).values().cloned().collect();
        intents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(intents)
    }

    fn set_intent_stage(&self, id: &IntentId, stage: IntentStage) -> Result<bool, StoreError> {
        self.enter(StoreOp::PutIntent)?;
        match lock(&self.intents).get_mut(id) {
            Some(intent) => {
                intent.stage = stage;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn user(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    fn key(s: &str) -> BucketKey {
        BucketKey::new(s).unwrap()
    }

    fn seed(store: &NullStore, who: &str, available: u32) {
        store.set_buckets(
            &user(who),
            Domain::Experience,
            vec![CreditBucket {
                key: key("acme"),
                display_name: "Acme".into(),
                available,
                used: 0,
            }],
        );
    }

    #[test]
    fn spend_without_bucket_is_false() {
        let store = NullStore::new();
        assert!(!store
            .try_spend(&user("alice"), Domain::Experience, &key("acme"))
            .unwrap());
    }

    #[test]
    fn concurrent_spends_never_overdraw() {
        let store = NullStore::new();
        seed(&store, "alice", 5);
        let wins = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for _ in 0..32 {
                s.spawn(|| {
                    if store
                        .try_spend(&user("alice"), Domain::Experience, &key("acme"))
                        .unwrap()
                    {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });
        assert_eq!(wins.load(Ordering::SeqCst), 5);
        let b = &store.peek_buckets(&user("alice"), Domain::Experience)[0];
        assert_eq!((b.available, b.used), (0, 5));
    }

    #[test]
    fn concurrent_attestations_by_same_verifier_commit_once() {
        let store = NullStore::new();
        let record = AttestableRecord::new(
            RecordId::parse("r1").unwrap(),
            user("bob"),
            Domain::Experience,
            "Acme",
        );
        store.insert_record(&record).unwrap();
        let wins = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    if store
                        .try_add_attestation(&record.owner, record.domain, &record.id, &user("alice"), None)
                        .unwrap()
                    {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });
        assert_eq!(wins.load(Ordering::SeqCst), 1);
        let stored = store
            .peek_record(&record.owner, record.domain, &record.id)
            .unwrap();
        assert_eq!(stored.verify_count, 1);
        assert_eq!(stored.verified_by, vec![user("alice")]);
    }

    #[test]
    fn reward_creates_then_increments() {
        let store = NullStore::new();
        let bob = user("bob");
        assert_eq!(
            store
                .reward(&bob, Domain::Education, &key("MIT"), "MIT")
                .unwrap(),
            RewardOutcome::Created
        );
        assert_eq!(
            store
                .reward(&bob, Domain::Education, &key("mit"), "mit")
                .unwrap(),
            RewardOutcome::Incremented
        );
        let buckets = store.peek_buckets(&bob, Domain::Education);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].available, 2);
        assert!(store.peek_buckets(&bob, Domain::Experience).is_empty());
    }

    #[test]
    fn injected_failure_fires_once() {
        let store = NullStore::new();
        store.fail_next(StoreOp::Buckets, 1);
        assert!(store.buckets(&user("alice"), Domain::Education).is_err());
        assert!(store.buckets(&user("alice"), Domain::Education).is_ok());
    }

    #[test]
    fn hooks_run_once_before_the_operation() {
        let store = NullStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        store.before(StoreOp::TrySpend, move |s| {
            seen.fetch_add(1, Ordering::SeqCst);
            s.set_buckets(
                &user("alice"),
                Domain::Experience,
                vec![CreditBucket::rewarded(BucketKey::new("acme").unwrap(), "Acme")],
            );
        });
        assert!(store
            .try_spend(&user("alice"), Domain::Experience, &key("acme"))
            .unwrap());
        assert!(!store
            .try_spend(&user("alice"), Domain::Experience, &key("acme"))
            .unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_record_rejected() {
        let store = NullStore::new();
        let record = AttestableRecord::new(
            RecordId::parse("r1").unwrap(),
            user("bob"),
            Domain::Education,
            "MIT",
        );
        store.insert_record(&record).unwrap();
        assert!(matches!(
            store.insert_record(&record),
            Err(StoreError::Duplicate(_))
        ));
    }
}

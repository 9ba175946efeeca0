use std::sync::atomic::{AtomicUsize, Ordering};

use credence_credits::{RefundOutcome, RewardOutcome};
use credence_store::{
    CreditStore, Intent, IntentId, IntentStage, IntentStore, ProfileStore, RecordStore,
    StoreError,
};
use credence_store_lmdb::{check_integrity, LmdbStore, CURRENT_SCHEMA_VERSION};
use credence_types::{AttestableRecord, BucketKey, Domain, RecordId, Timestamp, UserId};
use tempfile::TempDir;

const MAP_SIZE: usize = 16 * 1024 * 1024;

fn open() -> (TempDir, LmdbStore) {
    let dir = TempDir::new().unwrap();
    let store = LmdbStore::open(dir.path(), MAP_SIZE).unwrap();
    (dir, store)
}

fn user(s: &str) -> UserId {
    UserId::parse(s).unwrap()
}

fn key(s: &str) -> BucketKey {
    BucketKey::new(s).unwrap()
}

fn record(id: &str, owner: &str, domain: Domain, name: &str) -> AttestableRecord {
    AttestableRecord::new(RecordId::parse(id).unwrap(), user(owner), domain, name)
}

#[test]
fn fresh_environment_is_stamped_with_schema_version() {
    let (_dir, store) = open();
    assert_eq!(store.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn reward_then_spend_then_refund() {
    let (_dir, store) = open();
    let alice = user("alice");

    assert_eq!(
        store
            .reward(&alice, Domain::Experience, &key("Acme"), "Acme")
            .unwrap(),
        RewardOutcome::Created
    );
    assert!(store
        .try_spend(&alice, Domain::Experience, &key("acme"))
        .unwrap());
    assert!(!store
        .try_spend(&alice, Domain::Experience, &key("acme"))
        .unwrap());

    let bucket = store
        .find_bucket(&alice, Domain::Experience, &key("acme"))
        .unwrap()
        .unwrap();
    assert_eq!((bucket.available, bucket.used), (0, 1));

    assert_eq!(
        store
            .refund(&alice, Domain::Experience, &key("acme"))
            .unwrap(),
        RefundOutcome::Balanced
    );
    let bucket = store
        .find_bucket(&alice, Domain::Experience, &key("acme"))
        .unwrap()
        .unwrap();
    assert_eq!((bucket.available, bucket.used), (1, 0));
}

#[test]
fn domains_are_independent() {
    let (_dir, store) = open();
    let alice = user("alice");
    store
        .reward(&alice, Domain::Education, &key("MIT"), "MIT")
        .unwrap();
    assert!(store.buckets(&alice, Domain::Experience).unwrap().is_empty());
    assert!(!store
        .try_spend(&alice, Domain::Experience, &key("mit"))
        .unwrap());
    assert!(store
        .try_spend(&alice, Domain::Education, &key("mit"))
        .unwrap());
}

#[test]
fn concurrent_spends_succeed_exactly_available_times() {
    let (_dir, store) = open();
    let alice = user("alice");
    for _ in 0..3 {
        store
            .reward(&alice, Domain::Experience, &key("acme"), "Acme")
            .unwrap();
    }

    let wins = AtomicUsize::new(0);
    std::thread::scope(|s| {
        for _ in 0..12 {
            s.spawn(|| {
                if store
                    .try_spend(&alice, Domain::Experience, &key("acme"))
                    .unwrap()
                {
                    wins.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    });

    assert_eq!(wins.load(Ordering::SeqCst), 3);
    let bucket = store
        .find_bucket(&alice, Domain::Experience, &key("acme"))
        .unwrap()
        .unwrap();
    assert_eq!((bucket.available, bucket.used), (0, 3));
}

#[test]
fn concurrent_first_rewards_create_one_bucket() {
    let (_dir, store) = open();
    let bob = user("bob");
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                store
                    .reward(&bob, Domain::Experience, &key("Acme"), "Acme")
                    .unwrap();
            });
        }
    });
    let buckets = store.buckets(&bob, Domain::Experience).unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].available, 8);
}

#[test]
fn attestation_is_added_once() {
    let (_dir, store) = open();
    let r = record("r1", "bob", Domain::Experience, "Acme");
    store.insert_record(&r).unwrap();

    let alice = user("alice");
    assert!(store
        .try_add_attestation(&r.owner, r.domain, &r.id, &alice, None)
        .unwrap());
    assert!(!store
        .try_add_attestation(&r.owner, r.domain, &r.id, &alice, None)
        .unwrap());
    assert!(store
        .try_add_attestation(&r.owner, r.domain, &r.id, &user("carol"), None)
        .unwrap());

    let stored = store.get_record(&r.owner, r.domain, &r.id).unwrap().unwrap();
    assert_eq!(stored.verify_count, 2);
    assert_eq!(stored.verified_by, vec![alice, user("carol")]);
}

#[test]
fn attestation_on_missing_record_is_false() {
    let (_dir, store) = open();
    assert!(!store
        .try_add_attestation(
            &user("bob"),
            Domain::Education,
            &RecordId::parse("nope").unwrap(),
            &user("alice"),
            None,
        )
        .unwrap());
}

#[test]
fn list_records_scopes_owner_and_domain() {
    let (_dir, store) = open();
    store
        .insert_record(&record("r1", "bob", Domain::Experience, "Acme"))
        .unwrap();
    store
        .insert_record(&record("r2", "bob", Domain::Experience, "Globex"))
        .unwrap();
    store
        .insert_record(&record("r3", "bob", Domain::Education, "MIT"))
        .unwrap();
    store
        .insert_record(&record("r4", "bobby", Domain::Experience, "Acme"))
        .unwrap();

    let listed = store.list_records(&user("bob"), Domain::Experience).unwrap();
    let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2"]);

    assert!(matches!(
        store.insert_record(&record("r1", "bob", Domain::Experience, "Acme")),
        Err(StoreError::Duplicate(_))
    ));

    assert!(store
        .remove_record(&user("bob"), Domain::Experience, &RecordId::parse("r1").unwrap())
        .unwrap());
    assert_eq!(
        store
            .list_records(&user("bob"), Domain::Experience)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn intents_round_trip_and_order_by_age() {
    let (_dir, store) = open();
    let make = |secs: u64| Intent {
        id: IntentId::new_random(),
        domain: Domain::Experience,
        verifier: user("alice"),
        target: user("bob"),
        record_id: RecordId::parse("r1").unwrap(),
        key: key("acme"),
        display_name: "Acme".into(),
        stage: IntentStage::Reserved,
        created_at: Timestamp::new(secs),
    };
    let newer = make(200);
    let older = make(100);
    store.put_intent(&newer).unwrap();
    store.put_intent(&older).unwrap();

    let listed = store.list_intents().unwrap();
    assert_eq!(listed, vec![older.clone(), newer.clone()]);

    assert!(store
        .set_intent_stage(&older.id, IntentStage::Attested)
        .unwrap());
    assert_eq!(
        store.get_intent(&older.id).unwrap().unwrap().stage,
        IntentStage::Attested
    );

    assert!(store.delete_intent(&older.id).unwrap());
    assert!(!store.delete_intent(&older.id).unwrap());
    assert!(!store
        .set_intent_stage(&older.id, IntentStage::Aborted)
        .unwrap());
    assert_eq!(store.list_intents().unwrap(), vec![newer]);
}

#[test]
fn data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = LmdbStore::open(dir.path(), MAP_SIZE).unwrap();
        store
            .reward(&user("alice"), Domain::Education, &key("MIT"), "MIT")
            .unwrap();
        store
            .insert_record(&record("r1", "alice", Domain::Education, "MIT"))
            .unwrap();
    }
    let store = LmdbStore::open(dir.path(), MAP_SIZE).unwrap();
    assert_eq!(
        store
            .buckets(&user("alice"), Domain::Education)
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        store
            .list_records(&user("alice"), Domain::Education)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn integrity_check_passes_on_consistent_data() {
    let (_dir, store) = open();
    let r = record("r1", "bob", Domain::Experience, "Acme");
    store.insert_record(&r).unwrap();
    store
        .try_add_attestation(&r.owner, r.domain, &r.id, &user("alice"), None)
        .unwrap();
    store
        .reward(&user("bob"), Domain::Experience, &key("acme"), "Acme")
        .unwrap();

    let report = check_integrity(&store).unwrap();
    assert!(report.is_healthy(), "{:?}", report.errors);
    assert_eq!(report.records, 1);
    assert_eq!(report.bucket_lists, 1);
    assert_eq!(report.intents, 0);
}

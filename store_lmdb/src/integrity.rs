//! LMDB database integrity checks.
//!
//! Walks every stored aggregate and verifies the invariants the atomic
//! primitives are supposed to maintain. Read-only; problems are collected in
//! the report rather than causing a hard error.

use std::collections::HashSet;
use std::path::Path;

use credence_store::Intent;
use credence_types::{AttestableRecord, CreditBucket};
use serde::Serialize;

use crate::codec::decode;
use crate::environment::{LmdbStore, DB_BUCKETS, DB_INTENTS, DB_RECORDS};
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug, Default, Serialize)]
pub struct IntegrityReport {
    pub bucket_lists: u64,
    pub records: u64,
    pub intents: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

fn check_bucket_list(buckets: &[CreditBucket], errors: &mut Vec<String>, label: &str) {
    let mut seen = HashSet::new();
    for bucket in buckets {
        if !seen.insert(bucket.key.as_str()) {
            errors.push(format!("{label}: duplicate bucket {:?}", bucket.key.as_str()));
        }
    }
}

fn check_record(record: &AttestableRecord, errors: &mut Vec<String>) {
    let label = format!("{}/{}/{}", record.owner, record.domain, record.id);
    if record.verify_count as usize != record.verified_by.len() {
        errors.push(format!(
            "{label}: verify_count {} but {} verifiers listed",
            record.verify_count,
            record.verified_by.len()
        ));
    }
    let unique: HashSet<_> = record.verified_by.iter().collect();
    if unique.len() != record.verified_by.len() {
        errors.push(format!("{label}: duplicate verifier in verified_by"));
    }
    if record.is_verified_by(&record.owner) {
        errors.push(format!("{label}: owner attested their own record"));
    }
    for (verifier, intent) in &record.attesting_intents {
        if !record.is_verified_by(verifier) {
            errors.push(format!(
                "{label}: intent {intent} credited to {verifier}, who is not a verifier"
            ));
        }
    }
}

/// Check every aggregate in `store`.
pub fn check_integrity(store: &LmdbStore) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = store.env.read_txn()?;

    for entry in store.buckets_db.iter(&rtxn)? {
        let (key, bytes) = entry?;
        report.bucket_lists += 1;
        let label = format!("{DB_BUCKETS}/{}", String::from_utf8_lossy(key));
        match decode::<Vec<CreditBucket>>(bytes) {
            Ok(buckets) => check_bucket_list(&buckets, &mut report.errors, &label),
            Err(e) => report.errors.push(format!("{label}: {e}")),
        }
    }

    for entry in store.records_db.iter(&rtxn)? {
        let (key, bytes) = entry?;
        report.records += 1;
        match decode::<AttestableRecord>(bytes) {
            Ok(record) => check_record(&record, &mut report.errors),
            Err(e) => report.errors.push(format!(
                "{DB_RECORDS}/{}: {e}",
                String::from_utf8_lossy(key)
            )),
        }
    }

    for entry in store.intents_db.iter(&rtxn)? {
        let (_key, bytes) = entry?;
        report.intents += 1;
        if let Err(e) = decode::<Intent>(bytes) {
            report.errors.push(format!("{DB_INTENTS}: {e}"));
        }
    }

    Ok(report)
}

/// Refuse to open `path` as a ledger unless it is missing, empty, or
/// already holds an LMDB environment.
///
/// Catches a mistyped `--data-dir` pointing at some unrelated directory
/// before LMDB writes its files into it.
pub fn check_data_dir(path: &Path) -> Result<(), LmdbError> {
    let invalid = |reason: &'static str| LmdbError::DataDir {
        path: path.to_path_buf(),
        reason,
    };
    if !path.exists() {
        return Ok(());
    }
    if !path.is_dir() {
        return Err(invalid("not a directory"));
    }
    if path.join("data.mdb").is_file() {
        return Ok(());
    }
    let mut entries = std::fs::read_dir(path).map_err(|_| invalid("unreadable"))?;
    if entries.next().is_some() {
        return Err(invalid("not empty and holds no data.mdb"));
    }
    Ok(())
}

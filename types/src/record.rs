//! Attestable education and experience records.

use crate::domain::Domain;
use crate::ids::{IntentId, RecordId, UserId};
use crate::key::{normalize, BucketKey};
use serde::{Deserialize, Serialize};

/// One education or experience entry in a user's profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestableRecord {
    pub id: RecordId,
    /// The profile owner. A record belongs to exactly one user.
    pub owner: UserId,
    pub domain: Domain,
    /// Institution or company name as the owner typed it.
    pub display_name: String,
    /// Normalized form of `display_name`. Empty for ungrouped records.
    pub key: String,
    /// Verifiers who attested this record, in attestation order. Unique.
    pub verified_by: Vec<UserId>,
    /// Always equal to `verified_by.len()`; co-updated in one atomic write.
    pub verify_count: u32,
    /// The journalled verification that added each verifier. Verifiers
    /// attested without a journal have no entry.
    pub attesting_intents: Vec<(UserId, IntentId)>,
}

impl AttestableRecord {
    pub fn new(
        id: RecordId,
        owner: UserId,
        domain: Domain,
        display_name: impl Into<String>,
    ) -> Self {
        let display_name = display_name.into();
        let key = normalize(&display_name);
        Self {
            id,
            owner,
            domain,
            display_name,
            key,
            verified_by: Vec::new(),
            verify_count: 0,
            attesting_intents: Vec::new(),
        }
    }

    /// The bucket key this record groups under, if it has one.
    pub fn bucket_key(&self) -> Option<BucketKey> {
        BucketKey::from_text(&self.key)
    }

    pub fn is_verified_by(&self, verifier: &UserId) -> bool {
        self.verified_by.iter().any(|v| v == verifier)
    }

    /// Whether `verifier`'s attestation was added by the verification `intent`.
    pub fn attested_via(&self, verifier: &UserId, intent: &IntentId) -> bool {
        self.attesting_intents
            .iter()
            .any(|(v, i)| v == verifier && i == intent)
    }

    /// Add `verifier` to the attestor set and bump the counter, remembering
    /// the verification that did it.
    ///
    /// Returns `false` without mutating if the verifier is already present.
    /// Storage backends call this inside their per-record atomic section.
    pub fn add_attestation(&mut self, verifier: &UserId, intent: Option<IntentId>) -> bool {
        if self.is_verified_by(verifier) {
            return false;
        }
        let Some(count) = self.verify_count.checked_add(1) else {
            return false;
        };
        self.verified_by.push(verifier.clone());
        self.verify_count = count;
        if let Some(intent) = intent {
            self.attesting_intents.push((verifier.clone(), intent));
        }
        true
    }

    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            id: self.id.clone(),
            key: self.key.clone(),
            verify_count: self.verify_count,
        }
    }
}

/// The slice of a record reported back to callers after verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub id: RecordId,
    pub key: String,
    pub verify_count: u32,
}

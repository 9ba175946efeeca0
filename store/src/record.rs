//! Attestation record storage trait.

use crate::StoreError;
use credence_types::{AttestableRecord, Domain, IntentId, RecordId, UserId};

/// Attestor sets of individual records.
pub trait RecordStore {
    /// Look up one record of `owner` in `domain`.
    fn get_record(
        &self,
        owner: &UserId,
        domain: Domain,
        id: &RecordId,
    ) -> Result<Option<AttestableRecord>, StoreError>;

    /// Atomically add `verifier` to the record's `verified_by` set and bump
    /// `verify_count`, only if the record exists and does not list the
    /// verifier yet. `intent` is stored alongside the verifier so a later
    /// reconciliation can tell which verification produced the attestation.
    ///
    /// Returns `Ok(false)` with no mutation otherwise. Concurrent calls for
    /// the same `(record, verifier)` pair: exactly one returns `true`.
    fn try_add_attestation(
        &self,
        owner: &UserId,
        domain: Domain,
        id: &RecordId,
        verifier: &UserId,
        intent: Option<&IntentId>,
    ) -> Result<bool, StoreError>;
}

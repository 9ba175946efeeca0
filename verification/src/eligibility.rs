//! Eligibility: who may attest what.

use credence_store::{ProfileStore, StoreError};
use credence_types::{normalize, BucketKey, Domain, UserId};

/// Decides whether a verifier shares a record's institution or company.
///
/// Evaluated fresh from the verifier's profile on every call, never cached,
/// so a verifier who removes their own matching record loses eligibility
/// immediately.
pub struct EligibilityChecker;

impl EligibilityChecker {
    /// True iff `verifier` has at least one `domain` record whose normalized
    /// name equals `key`.
    pub fn is_eligible(
        &self,
        profiles: &impl ProfileStore,
        verifier: &UserId,
        key: &BucketKey,
        domain: Domain,
    ) -> Result<bool, StoreError> {
        let records = profiles.list_records(verifier, domain)?;
        Ok(records
            .iter()
            .any(|r| normalize(&r.key) == key.as_str()))
    }
}

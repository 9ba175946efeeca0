//! Profile record listing.
//!
//! Profiles themselves are maintained by the (external) profile service; the
//! ledger only needs to enumerate a user's records and, for seeding, insert
//! new ones.

use crate::StoreError;
use credence_types::{AttestableRecord, Domain, RecordId, UserId};

pub trait ProfileStore {
    /// Every record of `owner` in `domain`.
    fn list_records(
        &self,
        owner: &UserId,
        domain: Domain,
    ) -> Result<Vec<AttestableRecord>, StoreError>;

    /// Add a new record to its owner's profile.
    ///
    /// Fails with [`StoreError::Duplicate`] if the id is already taken.
    fn insert_record(&self, record: &AttestableRecord) -> Result<(), StoreError>;

    /// Remove a record from its owner's profile. Returns whether it existed.
    fn remove_record(
        &self,
        owner: &UserId,
        domain: Domain,
        id: &RecordId,
    ) -> Result<bool, StoreError>;
}

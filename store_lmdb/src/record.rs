//! LMDB implementation of RecordStore and ProfileStore.
//!
//! Records use composite keys `owner ++ 0 ++ domain ++ 0 ++ record_id`, so
//! listing a profile's records in one domain is a prefix range-scan.

use std::ops::Bound;

use credence_store::{ProfileStore, RecordStore, StoreError};
use credence_types::{AttestableRecord, Domain, IntentId, RecordId, UserId};

use crate::codec::{decode, encode};
use crate::environment::LmdbStore;
use crate::keys::{increment_prefix, record_key, record_prefix};
use crate::LmdbError;

impl RecordStore for LmdbStore {
    fn get_record(
        &self,
        owner: &UserId,
        domain: Domain,
        id: &RecordId,
    ) -> Result<Option<AttestableRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .records_db
            .get(&rtxn, &record_key(owner, domain, id))
            .map_err(LmdbError::from)?;
        match bytes {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn try_add_attestation(
        &self,
        owner: &UserId,
        domain: Domain,
        id: &RecordId,
        verifier: &UserId,
        intent: Option<&IntentId>,
    ) -> Result<bool, StoreError> {
        let key = record_key(owner, domain, id);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut record: AttestableRecord =
            match self.records_db.get(&wtxn, &key).map_err(LmdbError::from)? {
                Some(bytes) => decode(bytes)?,
                None => return Ok(false),
            };
        if &record.owner != owner || !record.add_attestation(verifier, intent.copied()) {
            return Ok(false);
        }
        self.records_db
            .put(&mut wtxn, &key, &encode(&record)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }
}

impl ProfileStore for LmdbStore {
    fn list_records(
        &self,
        owner: &UserId,
        domain: Domain,
    ) -> Result<Vec<AttestableRecord>, StoreError> {
        let prefix = record_prefix(owner, domain);
        let mut upper = prefix.clone();
        increment_prefix(&mut upper);
        let bounds = (
            Bound::Included(prefix.as_slice()),
            Bound::Excluded(upper.as_slice()),
        );

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .records_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut records = Vec::new();
        for entry in iter {
            let (_key, bytes) = entry.map_err(LmdbError::from)?;
            records.push(decode(bytes)?);
        }
        Ok(records)
    }

    fn insert_record(&self, record: &AttestableRecord) -> Result<(), StoreError> {
        let key = record_key(&record.owner, record.domain, &record.id);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .records_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!(
                "{}/{}/{}",
                record.owner, record.domain, record.id
            )));
        }
        self.records_db
            .put(&mut wtxn, &key, &encode(record)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn remove_record(
        &self,
        owner: &UserId,
        domain: Domain,
        id: &RecordId,
    ) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existed = self
            .records_db
            .delete(&mut wtxn, &record_key(owner, domain, id))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(existed)
    }
}

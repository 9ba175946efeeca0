//! LMDB implementation of IntentStore, keyed by the 16 raw uuid bytes.

use credence_store::{Intent, IntentId, IntentStage, IntentStore, StoreError};

use crate::codec::{decode, encode};
use crate::environment::LmdbStore;
use crate::LmdbError;

impl IntentStore for LmdbStore {
    fn put_intent(&self, intent: &Intent) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.intents_db
            .put(&mut wtxn, intent.id.as_bytes(), &encode(intent)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_intent(&self, id: &IntentId) -> Result<Option<Intent>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .intents_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn delete_intent(&self, id: &IntentId) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existed = self
            .intents_db
            .delete(&mut wtxn, id.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(existed)
    }

    fn list_intents(&self) -> Result<Vec<Intent>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut intents: Vec<Intent> = Vec::new();
        for entry in self.intents_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, bytes) = entry.map_err(LmdbError::from)?;
            intents.push(decode(bytes)?);
        }
        intents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(intents)
    }

    fn set_intent_stage(&self, id: &IntentId, stage: IntentStage) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut intent: Intent = match self
            .intents_db
            .get(&wtxn, id.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => decode(bytes)?,
            None => return Ok(false),
        };
        intent.stage = stage;
        self.intents_db
            .put(&mut wtxn, id.as_bytes(), &encode(&intent)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }
}

//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::LmdbError;

/// The schema version that the current code writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

pub(crate) const DB_BUCKETS: &str = "buckets";
pub(crate) const DB_RECORDS: &str = "records";
pub(crate) const DB_INTENTS: &str = "intents";
pub(crate) const DB_META: &str = "meta";

/// Wraps the LMDB environment and all database handles.
///
/// Cheap to clone; clones share the environment.
#[derive(Clone)]
pub struct LmdbStore {
    pub(crate) env: Arc<Env>,
    pub(crate) buckets_db: Database<Bytes, Bytes>,
    pub(crate) records_db: Database<Bytes, Bytes>,
    pub(crate) intents_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Open or create an LMDB environment at `path`.
    ///
    /// Creates the directory if needed, creates missing databases and stamps
    /// a fresh environment with [`CURRENT_SCHEMA_VERSION`]. Refuses to open
    /// an environment written by a newer schema.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Heed(e.to_string()))?;

        // SAFETY: the environment is opened once per process per path and
        // the memory map is never accessed outside heed's transaction API.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(4)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let buckets_db = env.create_database(&mut wtxn, Some(DB_BUCKETS))?;
        let records_db = env.create_database(&mut wtxn, Some(DB_RECORDS))?;
        let intents_db = env.create_database(&mut wtxn, Some(DB_INTENTS))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(DB_META))?;

        let stored = match meta_db.get(&wtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization(format!(
                        "schema version has {} bytes, expected 4",
                        bytes.len()
                    ))
                })?;
                Some(u32::from_le_bytes(arr))
            }
            None => None,
        };
        match stored {
            Some(found) if found > CURRENT_SCHEMA_VERSION => {
                return Err(LmdbError::SchemaTooNew {
                    found,
                    supported: CURRENT_SCHEMA_VERSION,
                });
            }
            Some(found) => {
                tracing::debug!(version = found, "database schema is up to date");
            }
            None => {
                meta_db.put(
                    &mut wtxn,
                    SCHEMA_VERSION_KEY,
                    &CURRENT_SCHEMA_VERSION.to_le_bytes(),
                )?;
                tracing::info!(
                    path = %path.display(),
                    version = CURRENT_SCHEMA_VERSION,
                    "initialised new ledger environment"
                );
            }
        }
        wtxn.commit()?;

        Ok(Self {
            env: Arc::new(env),
            buckets_db,
            records_db,
            intents_db,
            meta_db,
        })
    }

    /// The stored schema version.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let bytes = self
            .meta_db
            .get(&rtxn, SCHEMA_VERSION_KEY)?
            .ok_or_else(|| LmdbError::NotFound("schema_version".into()))?;
        let arr: [u8; 4] = bytes
            .try_into()
            .map_err(|_| LmdbError::Serialization("schema version is not 4 bytes".into()))?;
        Ok(u32::from_le_bytes(arr))
    }
}

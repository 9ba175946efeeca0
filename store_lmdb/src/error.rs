use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    #[error("refusing data directory {}: {reason}", path.display())]
    DataDir { path: PathBuf, reason: &'static str },
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<LmdbError> for credence_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(key) => credence_store::StoreError::NotFound(key),
            LmdbError::Serialization(msg) => credence_store::StoreError::Serialization(msg),
            other => credence_store::StoreError::Backend(other.to_string()),
        }
    }
}

//! LMDB storage backend for the credence attestation ledger.
//!
//! Implements every storage trait from `credence-store` using the `heed` LMDB
//! bindings. Each atomic primitive (spend, refund, reward halves, add
//! attestation) runs as one LMDB write transaction that reads, checks and
//! rewrites a single aggregate. LMDB admits one writer at a time, so two
//! primitives touching the same aggregate can never interleave.

pub mod codec;
pub mod credit;
pub mod environment;
pub mod error;
pub mod integrity;
pub mod intent;
pub mod keys;
pub mod record;

pub use environment::{LmdbStore, CURRENT_SCHEMA_VERSION};
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};

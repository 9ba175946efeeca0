//! Abstract storage traits for the credence attestation ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.
//!
//! The contract that matters: each mutating method is **one atomic operation
//! scoped to exactly one aggregate** (one user's bucket list in one domain, or
//! one record). No method ever spans two aggregates, so callers coordinating
//! several of them must compensate on failure rather than roll back.

pub mod credit;
pub mod error;
pub mod intent;
pub mod profile;
pub mod record;

pub use credit::CreditStore;
pub use error::StoreError;
pub use intent::{Intent, IntentId, IntentStage, IntentStore};
pub use profile::ProfileStore;
pub use record::RecordStore;

/// Everything the verification protocol needs from a backend.
pub trait LedgerStore: CreditStore + RecordStore + ProfileStore + IntentStore {}

impl<T: CreditStore + RecordStore + ProfileStore + IntentStore> LedgerStore for T {}

//! Verification intent journal.
//!
//! An intent is written before a verifier's credit is spent, advanced as each
//! step lands, and removed once the whole spend/attest/reward sequence has
//! settled. Intents that outlive
//! their TTL mark a verification that was interrupted part-way; the
//! reconciler in `credence-verification` settles them.

use crate::StoreError;
use credence_types::{BucketKey, Domain, RecordId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

pub use credence_types::IntentId;

/// How far a verification got before it stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentStage {
    /// Recorded before the spend; nothing has been mutated yet.
    Pending,
    /// The credit has been spent; the attestation outcome is unknown.
    Reserved,
    /// The attestation is committed; the target's reward is still owed.
    Attested,
    /// The attestation failed; the verifier's refund is still owed.
    Aborted,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub id: IntentId,
    pub domain: Domain,
    pub verifier: UserId,
    pub target: UserId,
    pub record_id: RecordId,
    pub key: BucketKey,
    /// Display name used if the target's reward bucket has to be created.
    pub display_name: String,
    pub stage: IntentStage,
    pub created_at: Timestamp,
}

/// Storage for in-flight intents.
pub trait IntentStore {
    /// Insert or overwrite an intent.
    fn put_intent(&self, intent: &Intent) -> Result<(), StoreError>;

    fn get_intent(&self, id: &IntentId) -> Result<Option<Intent>, StoreError>;

    /// Remove an intent. Returns whether it existed.
    fn delete_intent(&self, id: &IntentId) -> Result<bool, StoreError>;

    /// All intents, oldest first.
    fn list_intents(&self) -> Result<Vec<Intent>, StoreError>;

    /// Atomically move an existing intent to `stage`. Returns `false` if it
    /// is gone.
    fn set_intent_stage(&self, id: &IntentId, stage: IntentStage) -> Result<bool, StoreError>;
}

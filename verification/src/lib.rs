//! Peer verification of education and experience records.
//!
//! A verifier affiliated with the same institution or company as a target
//! record spends one credit from their matching bucket to attest the record.
//! A successful attestation records the verifier against the record and
//! rewards the record's owner with one credit in their own matching bucket.
//!
//! The verifier's buckets and the target's record are separate aggregates and
//! no backend offers a transaction spanning both, so [`VerificationOrchestrator`]
//! runs the protocol as a saga:
//!
//! 1. **Spend**: reserve the verifier's credit (atomic conditional update).
//! 2. **Attest**: add the verifier to the record (atomic add-if-absent). On
//!    failure the credit is refunded.
//! 3. **Reward**: credit the target. Best effort; never rolls back step 2.
//! 4. **Summarize**: report both users' buckets and the record's new count.
//!
//! An optional intent journal lets the [`Reconciler`] settle verifications
//! that were interrupted between steps.

pub mod config;
pub mod eligibility;
pub mod error;
pub mod orchestrator;
pub mod receipt;
pub mod reconcile;

pub use config::{ConfigError, LedgerConfig};
pub use eligibility::EligibilityChecker;
pub use error::{ErrorCategory, ErrorKind, VerifyError};
pub use orchestrator::{VerificationOrchestrator, VerifyCounter};
pub use receipt::VerificationReceipt;
pub use reconcile::{ReconcileReport, Reconciler};

//! Ledger tuning knobs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for the verification orchestrator and reconciler.
///
/// Embedded as the `[ledger]` table of the operator config file; every field
/// has a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Whether to journal each verification as an intent for reconciliation.
    #[serde(default = "default_true")]
    pub journal_enabled: bool,

    /// Age in seconds after which an unsettled intent is reconciled. Must be
    /// longer than any verification call can take, or the reconciler may
    /// refund a credit whose attestation is still in flight.
    #[serde(default = "default_intent_ttl_secs")]
    pub intent_ttl_secs: u64,

    /// Maximum number of intents settled per reconciler run.
    #[serde(default = "default_reconcile_batch_limit")]
    pub reconcile_batch_limit: usize,
}

fn default_true() -> bool {
    true
}

fn default_intent_ttl_secs() -> u64 {
    300
}

fn default_reconcile_batch_limit() -> usize {
    256
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.intent_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "ledger.intent_ttl_secs must be greater than zero".into(),
            ));
        }
        if self.reconcile_batch_limit == 0 {
            return Err(ConfigError::Invalid(
                "ledger.reconcile_batch_limit must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            journal_enabled: default_true(),
            intent_ttl_secs: default_intent_ttl_secs(),
            reconcile_batch_limit: default_reconcile_batch_limit(),
        }
    }
}

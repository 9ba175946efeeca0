//! Settles verifications that stopped part-way.
//!
//! Every journalled verification leaves an intent until it has fully
//! settled. An intent older than `intent_ttl_secs` belongs to a call that
//! crashed, was cancelled or hit a failed reward or refund. The reconciler
//! finishes the work its stage says is owed and deletes the intent only once
//! that work has landed, so a failed run is simply retried on the next one.

use std::sync::Arc;

use credence_store::{Intent, IntentStage, LedgerStore, StoreError};
use credence_types::Clock;
use serde::Serialize;

use crate::config::LedgerConfig;
use crate::orchestrator::refund_credit;

/// Counts from one reconciler pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Expired intents looked at.
    pub examined: usize,
    pub refunded: usize,
    pub rewarded: usize,
    /// Pending intents dropped without any credit movement.
    pub discarded: usize,
    /// Intents whose settlement failed; they are retried next run.
    pub failed: usize,
}

enum Settlement {
    Discarded,
    Refunded,
    Rewarded,
}

pub struct Reconciler<S> {
    store: Arc<S>,
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
}

impl<S: LedgerStore> Reconciler<S> {
    pub fn new(store: Arc<S>, config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    /// Settle up to `reconcile_batch_limit` expired intents, oldest first.
    pub fn run(&self) -> Result<ReconcileReport, StoreError> {
        let now = self.clock.now();
        let expired: Vec<Intent> = self
            .store
            .list_intents()?
            .into_iter()
            .filter(|i| i.created_at.has_expired(self.config.intent_ttl_secs, now))
            .take(self.config.reconcile_batch_limit)
            .collect();

        let mut report = ReconcileReport::default();
        for intent in &expired {
            report.examined += 1;
            match self.settle(intent) {
                Ok(Settlement::Discarded) => report.discarded += 1,
                Ok(Settlement::Refunded) => report.refunded += 1,
                Ok(Settlement::Rewarded) => report.rewarded += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        intent = %intent.id,
                        stage = ?intent.stage,
                        error = %e,
                        "could not settle intent"
                    );
                }
            }
        }

        if report.examined > 0 {
            tracing::info!(
                examined = report.examined,
                refunded = report.refunded,
                rewarded = report.rewarded,
                discarded = report.discarded,
                failed = report.failed,
                "reconciliation pass finished"
            );
        }
        Ok(report)
    }

    fn settle(&self, intent: &Intent) -> Result<Settlement, StoreError> {
        let settlement = match intent.stage {
            IntentStage::Pending => Settlement::Discarded,
            IntentStage::Attested => self.reward(intent)?,
            IntentStage::Aborted => self.refund(intent)?,
            IntentStage::Reserved => {
                // The attestation outcome was never recorded. The record says
                // whether this intent won it; a later retry that attested
                // instead leaves this intent's credit owed back.
                let attested = self
                    .store
                    .get_record(&intent.target, intent.domain, &intent.record_id)?
                    .is_some_and(|r| r.attested_via(&intent.verifier, &intent.id));
                if attested {
                    self.reward(intent)?
                } else {
                    self.refund(intent)?
                }
            }
        };
        self.store.delete_intent(&intent.id)?;
        Ok(settlement)
    }

    fn reward(&self, intent: &Intent) -> Result<Settlement, StoreError> {
        self.store.reward(
            &intent.target,
            intent.domain,
            &intent.key,
            &intent.display_name,
        )?;
        tracing::debug!(intent = %intent.id, target = %intent.target, "owed reward paid");
        Ok(Settlement::Rewarded)
    }

    fn refund(&self, intent: &Intent) -> Result<Settlement, StoreError> {
        refund_credit(self.store.as_ref(), &intent.verifier, intent.domain, &intent.key)?;
        tracing::debug!(intent = %intent.id, verifier = %intent.verifier, "owed refund paid");
        Ok(Settlement::Refunded)
    }
}

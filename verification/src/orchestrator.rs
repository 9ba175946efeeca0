//! Verification orchestrator: runs spend → attest → reward → summarize for
//! one verifier and one target record.
//!
//! Each call is independent: there is no in-process lock or queue. All
//! cross-call safety comes from the store's single-aggregate atomic
//! primitives, and steps within one call run strictly in order.

use std::sync::Arc;

use credence_credits::{CreditSummary, RefundOutcome, RewardOutcome};
use credence_store::{Intent, IntentId, IntentStage, LedgerStore, StoreError};
use credence_types::{
    BucketKey, Clock, Domain, RecordId, RecordSnapshot, SystemClock, UserId,
};
use credence_utils::StatsCounter;

use crate::config::LedgerConfig;
use crate::eligibility::EligibilityChecker;
use crate::error::VerifyError;
use crate::receipt::VerificationReceipt;
use crate::reconcile::Reconciler;

/// Outcome counters kept by the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyCounter {
    Verified,
    Denied,
    Conflicts,
    Refunds,
    RewardFailures,
    CompensationFailures,
}

impl VerifyCounter {
    pub const ALL: [VerifyCounter; 6] = [
        VerifyCounter::Verified,
        VerifyCounter::Denied,
        VerifyCounter::Conflicts,
        VerifyCounter::Refunds,
        VerifyCounter::RewardFailures,
        VerifyCounter::CompensationFailures,
    ];
}

/// Refund one credit and report an underflowing `used` counter as a bug.
pub(crate) fn refund_credit<S: LedgerStore>(
    store: &S,
    user: &UserId,
    domain: Domain,
    key: &BucketKey,
) -> Result<(), StoreError> {
    if store.refund(user, domain, key)? == RefundOutcome::UsedUnderflow {
        tracing::error!(
            user = %user,
            %domain,
            %key,
            "BUG: refund found used = 0; available restored, used left at 0"
        );
    }
    Ok(())
}

/// Ties the eligibility check, credit store and record store together.
pub struct VerificationOrchestrator<S> {
    store: Arc<S>,
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
    eligibility: EligibilityChecker,
    stats: StatsCounter<VerifyCounter>,
}

impl<S: LedgerStore> VerificationOrchestrator<S> {
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
            eligibility: EligibilityChecker,
            stats: StatsCounter::new(&VerifyCounter::ALL),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn stats(&self) -> &StatsCounter<VerifyCounter> {
        &self.stats
    }

    /// A reconciler sharing this orchestrator's store, clock and config.
    pub fn reconciler(&self) -> Reconciler<S> {
        Reconciler::new(
            Arc::clone(&self.store),
            self.config.clone(),
            Arc::clone(&self.clock),
        )
    }

    /// [`VerificationOrchestrator::verify`] for unparsed identifiers, as they
    /// arrive from a request. Malformed ids fail with `InvalidId`.
    pub fn verify_raw(
        &self,
        domain: Domain,
        verifier: &str,
        target: &str,
        record_id: &str,
    ) -> Result<VerificationReceipt, VerifyError> {
        let verifier = UserId::parse(verifier)?;
        let target = UserId::parse(target)?;
        let record_id = RecordId::parse(record_id)?;
        self.verify(domain, &verifier, &target, &record_id)
    }

    /// Let `verifier` attest `target`'s record `record_id` in `domain`.
    pub fn verify(
        &self,
        domain: Domain,
        verifier: &UserId,
        target: &UserId,
        record_id: &RecordId,
    ) -> Result<VerificationReceipt, VerifyError> {
        let span = tracing::info_span!(
            "verify",
            %domain,
            verifier = %verifier,
            target = %target,
            record = %record_id
        );
        let _enter = span.enter();

        let result = self.run(domain, verifier, target, record_id);
        if let Err(ref e) = result {
            use crate::error::ErrorCategory::*;
            match e.kind().category() {
                Validation | BusinessDenial => self.stats.increment(VerifyCounter::Denied),
                Conflict => self.stats.increment(VerifyCounter::Conflicts),
                Infrastructure | Degraded => {}
            }
            tracing::debug!(kind = ?e.kind(), error = %e, "verification refused");
        }
        result
    }

    fn run(
        &self,
        domain: Domain,
        verifier: &UserId,
        target: &UserId,
        record_id: &RecordId,
    ) -> Result<VerificationReceipt, VerifyError> {
        // ── Pre-checks: no side effects ────────────────────────────────
        if verifier == target {
            return Err(VerifyError::SelfVerification);
        }
        let record = self
            .store
            .get_record(target, domain, record_id)?
            .ok_or(VerifyError::RecordNotFound)?;
        let key = record.bucket_key().ok_or(VerifyError::UngroupedRecord)?;
        if record.is_verified_by(verifier) {
            return Err(VerifyError::AlreadyVerified);
        }
        if !self
            .eligibility
            .is_eligible(self.store.as_ref(), verifier, &key, domain)?
        {
            return Err(VerifyError::NotEligible { key });
        }

        let intent = self.open_intent(domain, verifier, target, record_id, &key, &record.display_name)?;

        // ── Step 1: spend ──────────────────────────────────────────────
        match self.store.try_spend(verifier, domain, &key) {
            Ok(true) => self.advance_intent(intent.as_ref(), IntentStage::Reserved),
            Ok(false) => {
                self.close_intent(intent.as_ref());
                return Err(VerifyError::NoCreditsAvailable { key });
            }
            Err(e) => {
                self.close_intent(intent.as_ref());
                return Err(e.into());
            }
        }

        // ── Step 2: attest ─────────────────────────────────────────────
        match self
            .store
            .try_add_attestation(
                target,
                domain,
                record_id,
                verifier,
                intent.as_ref().map(|i| &i.id),
            ) {
            Ok(true) => self.advance_intent(intent.as_ref(), IntentStage::Attested),
            Ok(false) => {
                self.compensate(intent.as_ref(), verifier, domain, &key);
                return Err(self.classify_conflict(domain, verifier, target, record_id));
            }
            Err(e) => {
                self.compensate(intent.as_ref(), verifier, domain, &key);
                return Err(e.into());
            }
        }

        // The attestation is committed. Nothing below may undo it.

        // ── Step 3: reward ─────────────────────────────────────────────
        match self
            .store
            .reward(target, domain, &key, record.display_name.trim())
        {
            Ok(outcome) => {
                if outcome == RewardOutcome::Created {
                    tracing::debug!(%key, "created reward bucket for target");
                }
                self.close_intent(intent.as_ref());
            }
            Err(e) => {
                self.stats.increment(VerifyCounter::RewardFailures);
                tracing::warn!(
                    error = %e,
                    %key,
                    "reward failed after attestation; left for reconciliation"
                );
            }
        }

        self.stats.increment(VerifyCounter::Verified);
        tracing::info!(%key, "record attested");

        // ── Step 4: summarize ──────────────────────────────────────────
        self.summarize(domain, verifier, target, record_id)
            .map_err(VerifyError::SummaryUnavailable)
    }

    /// After a failed add-if-absent: already there, or something else moved?
    fn classify_conflict(
        &self,
        domain: Domain,
        verifier: &UserId,
        target: &UserId,
        record_id: &RecordId,
    ) -> VerifyError {
        match self.store.get_record(target, domain, record_id) {
            Ok(Some(record)) if record.is_verified_by(verifier) => VerifyError::AlreadyVerified,
            Ok(_) => VerifyError::ConcurrentModification,
            Err(e) => {
                tracing::warn!(error = %e, "could not re-read record after failed attestation");
                VerifyError::ConcurrentModification
            }
        }
    }

    /// Refund the verifier's spent credit after step 2 failed.
    fn compensate(&self, intent: Option<&Intent>, verifier: &UserId, domain: Domain, key: &BucketKey) {
        match refund_credit(self.store.as_ref(), verifier, domain, key) {
            Ok(()) => {
                self.stats.increment(VerifyCounter::Refunds);
                self.close_intent(intent);
            }
            Err(e) => {
                self.stats.increment(VerifyCounter::CompensationFailures);
                tracing::error!(
                    error = %e,
                    %key,
                    "refund failed; credit stays spent until reconciled"
                );
                self.advance_intent(intent, IntentStage::Aborted);
            }
        }
    }

    fn summarize(
        &self,
        domain: Domain,
        verifier: &UserId,
        target: &UserId,
        record_id: &RecordId,
    ) -> Result<VerificationReceipt, StoreError> {
        let verifier_credits = CreditSummary::from_buckets(&self.store.buckets(verifier, domain)?);
        let target_credits = CreditSummary::from_buckets(&self.store.buckets(target, domain)?);
        let target_record = self
            .store
            .get_record(target, domain, record_id)?
            .ok_or_else(|| StoreError::NotFound(format!("{target}/{domain}/{record_id}")))?
            .snapshot();
        Ok(VerificationReceipt {
            verifier_credits,
            target_credits,
            target_record,
        })
    }

    // ── Intent journal ─────────────────────────────────────────────────

    fn open_intent(
        &self,
        domain: Domain,
        verifier: &UserId,
        target: &UserId,
        record_id: &RecordId,
        key: &BucketKey,
        display_name: &str,
    ) -> Result<Option<Intent>, VerifyError> {
        if !self.config.journal_enabled {
            return Ok(None);
        }
        let intent = Intent {
            id: IntentId::new_random(),
            domain,
            verifier: verifier.clone(),
            target: target.clone(),
            record_id: record_id.clone(),
            key: key.clone(),
            display_name: display_name.trim().to_string(),
            stage: IntentStage::Pending,
            created_at: self.clock.now(),
        };
        self.store.put_intent(&intent)?;
        Ok(Some(intent))
    }

    fn advance_intent(&self, intent: Option<&Intent>, stage: IntentStage) {
        let Some(intent) = intent else { return };
        if let Err(e) = self.store.set_intent_stage(&intent.id, stage) {
            tracing::warn!(intent = %intent.id, ?stage, error = %e, "failed to advance intent");
        }
    }

    fn close_intent(&self, intent: Option<&Intent>) {
        let Some(intent) = intent else { return };
        if let Err(e) = self.store.delete_intent(&intent.id) {
            tracing::warn!(intent = %intent.id, error = %e, "failed to delete settled intent");
        }
    }

    // ── Read surface ───────────────────────────────────────────────────

    /// All of `user`'s buckets in `domain`, with totals.
    pub fn credit_summary(&self, user: &UserId, domain: Domain) -> Result<CreditSummary, VerifyError> {
        Ok(CreditSummary::from_buckets(&self.store.buckets(user, domain)?))
    }

    pub fn record_snapshot(
        &self,
        owner: &UserId,
        domain: Domain,
        record_id: &RecordId,
    ) -> Result<RecordSnapshot, VerifyError> {
        self.store
            .get_record(owner, domain, record_id)?
            .map(|r| r.snapshot())
            .ok_or(VerifyError::RecordNotFound)
    }

    /// Seed one credit into `user`'s `key` bucket through the reward path.
    pub fn grant(
        &self,
        user: &UserId,
        domain: Domain,
        key: &BucketKey,
        display_name: &str,
    ) -> Result<CreditSummary, VerifyError> {
        self.store.reward(user, domain, key, display_name.trim())?;
        tracing::info!(user = %user, %domain, %key, "granted credit");
        self.credit_summary(user, domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credence_nullables::{NullStore, StoreOp};
    use credence_store::{IntentStore, ProfileStore};
    use credence_types::{AttestableRecord, CreditBucket};

    fn user(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    fn rid(s: &str) -> RecordId {
        RecordId::parse(s).unwrap()
    }

    fn key(s: &str) -> BucketKey {
        BucketKey::new(s).unwrap()
    }

    /// alice works at Acme with `credits` Acme credits; bob has an Acme record.
    fn setup(credits: u32) -> (Arc<NullStore>, VerificationOrchestrator<NullStore>) {
        let store = Arc::new(NullStore::new());
        store
            .insert_record(&AttestableRecord::new(rid("a1"), user("alice"), Domain::Experience, "Acme"))
            .unwrap();
        store
            .insert_record(&AttestableRecord::new(rid("b1"), user("bob"), Domain::Experience, "ACME "))
            .unwrap();
        store.set_buckets(
            &user("alice"),
            Domain::Experience,
            vec![CreditBucket {
                key: key("acme"),
                display_name: "Acme".into(),
                available: credits,
                used: 0,
            }],
        );
        let orch = VerificationOrchestrator::new(Arc::clone(&store), LedgerConfig::default());
        (store, orch)
    }

    #[test]
    fn success_updates_all_three_aggregates() {
        let (store, orch) = setup(1);
        let receipt = orch
            .verify(Domain::Experience, &user("alice"), &user("bob"), &rid("b1"))
            .unwrap();

        assert_eq!(receipt.target_record.verify_count, 1);
        let v = receipt.verifier_credits.bucket("acme").unwrap();
        assert_eq!((v.available, v.used, v.total), (0, 1, 1));
        let t = receipt.target_credits.bucket("acme").unwrap();
        assert_eq!((t.available, t.used), (1, 0));
        assert_eq!(t.display_name, "ACME");

        let stored = store.peek_record(&user("bob"), Domain::Experience, &rid("b1")).unwrap();
        assert_eq!(stored.verified_by, vec![user("alice")]);
        assert_eq!(store.intent_count(), 0);
        assert_eq!(orch.stats().get(VerifyCounter::Verified), 1);
    }

    #[test]
    fn self_verification_rejected_before_any_read() {
        let (store, orch) = setup(1);
        store.fail_next(StoreOp::GetRecord, 1);
        let err = orch
            .verify(Domain::Experience, &user("alice"), &user("alice"), &rid("a1"))
            .unwrap_err();
        assert!(matches!(err, VerifyError::SelfVerification));
        assert_eq!(store.peek_buckets(&user("alice"), Domain::Experience)[0].available, 1);
    }

    #[test]
    fn malformed_ids_are_invalid() {
        let (_store, orch) = setup(1);
        let err = orch
            .verify_raw(Domain::Experience, "alice", "bob smith", "b1")
            .unwrap_err();
        assert!(matches!(err, VerifyError::InvalidId(_)));
        let err = orch.verify_raw(Domain::Experience, "", "bob", "b1").unwrap_err();
        assert!(matches!(err, VerifyError::InvalidId(_)));
    }

    #[test]
    fn missing_record() {
        let (_store, orch) = setup(1);
        let err = orch
            .verify(Domain::Experience, &user("alice"), &user("bob"), &rid("nope"))
            .unwrap_err();
        assert!(matches!(err, VerifyError::RecordNotFound));
    }

    #[test]
    fn ungrouped_record() {
        let (store, orch) = setup(1);
        store
            .insert_record(&AttestableRecord::new(rid("b2"), user("bob"), Domain::Experience, "   "))
            .unwrap();
        let err = orch
            .verify(Domain::Experience, &user("alice"), &user("bob"), &rid("b2"))
            .unwrap_err();
        assert!(matches!(err, VerifyError::UngroupedRecord));
    }

    #[test]
    fn journal_failure_before_spend_has_no_side_effects() {
        let (store, orch) = setup(1);
        store.fail_next(StoreOp::PutIntent, 1);
        let err = orch
            .verify(Domain::Experience, &user("alice"), &user("bob"), &rid("b1"))
            .unwrap_err();
        assert!(matches!(err, VerifyError::Store(_)));
        assert!(err.is_retryable());
        assert_eq!(store.peek_buckets(&user("alice"), Domain::Experience)[0].available, 1);
        assert_eq!(
            store
                .peek_record(&user("bob"), Domain::Experience, &rid("b1"))
                .unwrap()
                .verify_count,
            0
        );
    }

    #[test]
    fn spend_failure_is_terminal_without_side_effects() {
        let (store, orch) = setup(1);
        store.fail_next(StoreOp::TrySpend, 1);
        let err = orch
            .verify(Domain::Experience, &user("alice"), &user("bob"), &rid("b1"))
            .unwrap_err();
        assert!(matches!(err, VerifyError::Store(_)));
        assert_eq!(store.peek_buckets(&user("alice"), Domain::Experience)[0].available, 1);
        assert_eq!(store.intent_count(), 0);
    }

    #[test]
    fn attestation_store_error_refunds() {
        let (store, orch) = setup(1);
        store.fail_next(StoreOp::TryAddAttestation, 1);
        let err = orch
            .verify(Domain::Experience, &user("alice"), &user("bob"), &rid("b1"))
            .unwrap_err();
        assert!(matches!(err, VerifyError::Store(_)));
        let b = &store.peek_buckets(&user("alice"), Domain::Experience)[0];
        assert_eq!((b.available, b.used), (1, 0));
        assert_eq!(store.intent_count(), 0);
        assert_eq!(orch.stats().get(VerifyCounter::Refunds), 1);
    }

    #[test]
    fn failed_refund_leaves_aborted_intent() {
        let (store, orch) = setup(1);
        store.fail_next(StoreOp::TryAddAttestation, 1);
        store.fail_next(StoreOp::Refund, 1);
        orch.verify(Domain::Experience, &user("alice"), &user("bob"), &rid("b1"))
            .unwrap_err();
        let intents = store.list_intents().unwrap();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].stage, IntentStage::Aborted);
        assert_eq!(orch.stats().get(VerifyCounter::CompensationFailures), 1);
        let b = &store.peek_buckets(&user("alice"), Domain::Experience)[0];
        assert_eq!((b.available, b.used), (0, 1));
    }

    #[test]
    fn reward_failure_still_succeeds_and_keeps_attested_intent() {
        let (store, orch) = setup(1);
        store.fail_next(StoreOp::Increment, 1);
        let receipt = orch
            .verify(Domain::Experience, &user("alice"), &user("bob"), &rid("b1"))
            .unwrap();
        assert_eq!(receipt.target_record.verify_count, 1);
        assert!(receipt.target_credits.buckets.is_empty());
        assert_eq!(orch.stats().get(VerifyCounter::RewardFailures), 1);

        let intents = store.list_intents().unwrap();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].stage, IntentStage::Attested);
        assert_eq!(intents[0].display_name, "ACME");
    }

    #[test]
    fn summary_read_failure_reports_committed() {
        let (store, orch) = setup(1);
        store.fail_next(StoreOp::Buckets, 1);
        let err = orch
            .verify(Domain::Experience, &user("alice"), &user("bob"), &rid("b1"))
            .unwrap_err();
        assert!(err.is_committed());
        assert_eq!(
            store
                .peek_record(&user("bob"), Domain::Experience, &rid("b1"))
                .unwrap()
                .verify_count,
            1
        );
    }

    #[test]
    fn journal_disabled_writes_no_intents() {
        let store = Arc::new(NullStore::new());
        store
            .insert_record(&AttestableRecord::new(rid("a1"), user("alice"), Domain::Education, "MIT"))
            .unwrap();
        store
            .insert_record(&AttestableRecord::new(rid("b1"), user("bob"), Domain::Education, "mit"))
            .unwrap();
        let config = LedgerConfig {
            journal_enabled: false,
            ..LedgerConfig::default()
        };
        let orch = VerificationOrchestrator::new(Arc::clone(&store), config);
        orch.grant(&user("alice"), Domain::Education, &key("mit"), "MIT").unwrap();
        store.fail_next(StoreOp::PutIntent, 1);
        orch.verify(Domain::Education, &user("alice"), &user("bob"), &rid("b1"))
            .unwrap();
        assert_eq!(store.intent_count(), 0);
    }

    #[test]
    fn grant_and_read_surface() {
        let (_store, orch) = setup(0);
        let summary = orch
            .grant(&user("alice"), Domain::Experience, &key("acme"), "Acme")
            .unwrap();
        assert_eq!(summary.bucket("acme").unwrap().available, 1);
        assert_eq!(summary.totals.total, 1);

        let snap = orch
            .record_snapshot(&user("bob"), Domain::Experience, &rid("b1"))
            .unwrap();
        assert_eq!(snap.key, "acme");
        assert!(matches!(
            orch.record_snapshot(&user("bob"), Domain::Education, &rid("b1")),
            Err(VerifyError::RecordNotFound)
        ));
    }
}

//! What a successful verification reports back.

use credence_credits::CreditSummary;
use credence_types::RecordSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReceipt {
    /// The verifier's buckets in the verified domain, after the spend.
    pub verifier_credits: CreditSummary,
    /// The target's buckets in the verified domain, after the reward.
    pub target_credits: CreditSummary,
    pub target_record: RecordSnapshot,
}

use proptest::prelude::*;

use credence_credits::{CreditEngine, RefundOutcome};
use credence_types::{BucketKey, CreditBucket};

#[derive(Clone, Debug)]
enum Op {
    Spend(usize),
    Refund(usize),
    Reward(usize),
}

const NAMES: [&str; 3] = ["Acme", "Globex", "Initech"];

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3).prop_map(Op::Spend),
        (0usize..3).prop_map(Op::Refund),
        (0usize..3).prop_map(Op::Reward),
    ]
}

proptest! {
    /// Spends never succeed more often than credits were ever made available,
    /// and a spend/refund pair leaves `available + used` unchanged.
    #[test]
    fn spend_refund_reward_bookkeeping(ops in prop::collection::vec(op(), 0..64)) {
        let engine = CreditEngine;
        let mut buckets: Vec<CreditBucket> = Vec::new();
        let mut rewarded = [0u64; 3];
        let mut spent = [0u64; 3];
        let mut underflows = [0u64; 3];

        for op in ops {
            match op {
                Op::Spend(i) => {
                    let key = BucketKey::new(NAMES[i]).unwrap();
                    let total_before = engine.find(&buckets, &key).map(|b| b.total());
                    if engine.try_spend(&mut buckets, &key).unwrap() {
                        spent[i] += 1;
                        let total_after = engine.find(&buckets, &key).map(|b| b.total());
                        prop_assert_eq!(total_before, total_after);
                    }
                }
                Op::Refund(i) => {
                    let key = BucketKey::new(NAMES[i]).unwrap();
                    if let Ok(outcome) = engine.refund(&mut buckets, &key) {
                        match outcome {
                            RefundOutcome::Balanced => spent[i] -= 1,
                            RefundOutcome::UsedUnderflow => underflows[i] += 1,
                        }
                    }
                }
                Op::Reward(i) => {
                    let key = BucketKey::new(NAMES[i]).unwrap();
                    engine.insert_or_increment(&mut buckets, &key, NAMES[i]).unwrap();
                    rewarded[i] += 1;
                }
            }
        }

        for (i, name) in NAMES.iter().enumerate() {
            let key = BucketKey::new(name).unwrap();
            let matching = buckets.iter().filter(|b| b.key == key).count();
            prop_assert!(matching <= 1, "duplicate bucket for {}", name);
            if let Some(b) = engine.find(&buckets, &key) {
                prop_assert_eq!(u64::from(b.used), spent[i]);
                prop_assert_eq!(u64::from(b.available) + spent[i], rewarded[i] + underflows[i]);
            } else {
                prop_assert_eq!(rewarded[i], 0);
            }
        }
    }
}

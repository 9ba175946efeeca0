//! Lock-free event counters keyed by a caller-defined enum.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// A fixed set of counters, one per variant of `K`.
///
/// The set of keys is decided at construction; increments of unknown keys are
/// ignored.
pub struct StatsCounter<K> {
    counters: Vec<(K, AtomicU64)>,
}

impl<K: Copy + Eq + Debug> StatsCounter<K> {
    pub fn new(keys: &[K]) -> Self {
        Self {
            counters: keys.iter().map(|&k| (k, AtomicU64::new(0))).collect(),
        }
    }

    fn slot(&self, key: K) -> Option<&AtomicU64> {
        self.counters.iter().find(|(k, _)| *k == key).map(|(_, c)| c)
    }

    pub fn increment(&self, key: K) {
        self.add(key, 1);
    }

    pub fn add(&self, key: K, value: u64) {
        if let Some(counter) = self.slot(key) {
            counter.fetch_add(value, Ordering::Relaxed);
        }
    }

    pub fn get(&self, key: K) -> u64 {
        self.slot(key)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Current values keyed by the `Debug` name of each key.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counters
            .iter()
            .map(|(k, v)| (format!("{k:?}"), v.load(Ordering::Relaxed)))
            .collect()
    }
}

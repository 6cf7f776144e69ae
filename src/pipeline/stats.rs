//! Per-outcome request counters.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::resolver::Outcome;

#[derive(Debug, Default)]
pub struct PipelineStats {
    counts: [AtomicU64; Outcome::ALL.len()],
}

impl PipelineStats {
    pub fn record(&self, outcome: Outcome) {
        self.counts[outcome as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, outcome: Outcome) -> u64 {
        self.counts[outcome as usize].load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// Counts keyed by outcome label.
    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        Outcome::ALL
            .iter()
            .map(|o| (o.as_str(), self.get(*o)))
            .collect()
    }
}

//! Process-wide record of which base combinations have seen new data
//! since the last pipeline run. Ingestion producers record
//! changes; a single orchestrator consumer drains them at trigger time.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Tracks pending base-combination keys awaiting a pipeline run.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    pending: Mutex<HashSet<String>>,
}

impl ChangeTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record that new data has arrived affecting `base_combination_key`.
    /// Safe to call concurrently from any number of ingestion producers.
    pub fn record_change(&self, base_combination_key: impl Into<String>) {
        self.pending.lock().insert(base_combination_key.into());
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Atomically take the full set of pending keys and clear it. Called
    /// once per pipeline run, before Phase 1 starts, so that changes
    /// arriving mid-run are captured by the *next* run rather than lost.
    pub fn snapshot_and_clear(&self) -> HashSet<String> {
        std::mem::take(&mut *self.pending.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_drains_changes() {
        let tracker = ChangeTracker::new();
        assert!(!tracker.has_pending_changes());
        tracker.record_change("Urban_Gold_Premium_STANDARD");
        tracker.record_change("Rural_Silver_Economy_CUSTOM");
        assert_eq!(tracker.pending_count(), 2);
        let snapshot = tracker.snapshot_and_clear();
        assert_eq!(snapshot.len(), 2);
        assert!(!tracker.has_pending_changes());
    }

    #[test]
    fn duplicate_changes_collapse() {
        let tracker = ChangeTracker::new();
        tracker.record_change("same_key");
        tracker.record_change("same_key");
        assert_eq!(tracker.pending_count(), 1);
    }
}


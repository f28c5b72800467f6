use std::collections::HashMap;

use crate::domain::WindowId;

/// How far a (instrument, window) pair got through the trigger gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMark {
    /// Scoring was dispatched and has not settled yet.
    InFlight,
    /// The pair has been triggered. Never cleared except by eviction or reset.
    Processed,
}

/// Per-instrument record of which windows already triggered analysis.
///
/// Owned by the scheduler and written only by its trigger gate.
#[derive(Debug, Default, Clone)]
pub struct DedupLedger {
    marks: HashMap<String, HashMap<WindowId, LedgerMark>>,
    last_trigger_ms: HashMap<String, i64>,
    generation: u64,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the pair is in flight or processed.
    pub fn has_processed(&self, instrument: &str, window: &WindowId) -> bool {
        self.mark(instrument, window).is_some()
    }

    pub fn mark(&self, instrument: &str, window: &WindowId) -> Option<LedgerMark> {
        self.marks
            .get(instrument)
            .and_then(|windows| windows.get(window))
            .copied()
    }

    /// Idempotent. Also settles an in-flight marker.
    pub fn mark_processed(&mut self, instrument: &str, window: WindowId) {
        self.marks
            .entry(instrument.to_string())
            .or_default()
            .insert(window, LedgerMark::Processed);
    }

    /// Claim the pair before dispatching asynchronous scoring.
    /// Returns `false` if the pair is already in flight or processed.
    pub fn mark_in_flight(&mut self, instrument: &str, window: WindowId) -> bool {
        let windows = self.marks.entry(instrument.to_string()).or_default();
        if windows.contains_key(&window) {
            return false;
        }
        windows.insert(window, LedgerMark::InFlight);
        true
    }

    /// Settle an in-flight claim, whatever the scoring outcome was.
    pub fn commit(&mut self, instrument: &str, window: WindowId) {
        self.mark_processed(instrument, window);
    }

    pub fn record_trigger(&mut self, instrument: &str, at_ms: i64) {
        self.last_trigger_ms.insert(instrument.to_string(), at_ms);
    }

    pub fn last_trigger_ms(&self, instrument: &str) -> Option<i64> {
        self.last_trigger_ms.get(instrument).copied()
    }

    /// Drop settled entries whose window started before `cutoff_ms`.
    /// A window in the past can never become eligible again.
    /// In-flight claims are kept until they settle. Returns how many entries went.
    pub fn evict_older_than(&mut self, cutoff_ms: i64) -> usize {
        let mut evicted = 0;
        for windows in self.marks.values_mut() {
            let before = windows.len();
            windows.retain(|id, mark| id.start_ms >= cutoff_ms || *mark == LedgerMark::InFlight);
            evicted += before - windows.len();
        }
        self.marks.retain(|_, windows| !windows.is_empty());
        evicted
    }

    /// Forget everything. Ids computed under an old width are not comparable to new ones.
    pub fn reset(&mut self) {
        self.marks.clear();
        self.last_trigger_ms.clear();
        self.generation += 1;
    }

    /// Bumped by every [`reset`](Self::reset); lets late async results detect they are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn processed_count(&self, instrument: &str) -> usize {
        self.marks.get(instrument).map(|w| w.len()).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.marks.values().map(|w| w.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WindowWidth;

    fn id(start_ms: i64) -> WindowId {
        WindowId::new(start_ms, WindowWidth::OneMinute)
    }

    #[test]
    fn mark_processed_is_idempotent() {
        let mut ledger = DedupLedger::new();
        assert!(!ledger.has_processed("A", &id(0)));

        ledger.mark_processed("A", id(0));
        ledger.mark_processed("A", id(0));

        assert!(ledger.has_processed("A", &id(0)));
        assert_eq!(ledger.processed_count("A"), 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn entries_are_scoped_per_instrument() {
        let mut ledger = DedupLedger::new();
        ledger.mark_processed("A", id(0));
        assert!(!ledger.has_processed("B", &id(0)));
        assert!(!ledger.has_processed("A", &id(60_000)));
    }

    #[test]
    fn in_flight_claim_blocks_until_committed() {
        let mut ledger = DedupLedger::new();
        assert!(ledger.mark_in_flight("A", id(0)));
        assert!(!ledger.mark_in_flight("A", id(0)));
        assert!(ledger.has_processed("A", &id(0)));
        assert_eq!(ledger.mark("A", &id(0)), Some(LedgerMark::InFlight));

        ledger.commit("A", id(0));
        assert_eq!(ledger.mark("A", &id(0)), Some(LedgerMark::Processed));
        assert!(!ledger.mark_in_flight("A", id(0)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn eviction_drops_only_old_settled_windows() {
        let mut ledger = DedupLedger::new();
        ledger.mark_processed("A", id(0));
        ledger.mark_processed("A", id(60_000));
        ledger.mark_processed("B", id(120_000));
        assert!(ledger.mark_in_flight("B", id(0)));

        let evicted = ledger.evict_older_than(60_000);

        assert_eq!(evicted, 1);
        assert!(!ledger.has_processed("A", &id(0)));
        assert!(ledger.has_processed("A", &id(60_000)));
        assert!(ledger.has_processed("B", &id(0)), "in-flight claim kept");
    }

    #[test]
    fn reset_clears_and_bumps_generation() {
        let mut ledger = DedupLedger::new();
        ledger.mark_processed("A", id(0));
        ledger.record_trigger("A", 55_000);
        let before = ledger.generation();

        ledger.reset();

        assert!(ledger.is_empty());
        assert_eq!(ledger.last_trigger_ms("A"), None);
        assert_eq!(ledger.generation(), before + 1);
    }
}

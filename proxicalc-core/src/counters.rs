//! Run-wide counters
//!
//! Updated from concurrent extraction tasks and bulk-ack paths, read by the
//! orchestrator for progress reports. All fields are atomics so no lock is
//! held on the hot paths.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared across the whole run.
#[derive(Debug, Default)]
pub struct RunCounters {
    /// Expected document count, taken from the initial search response.
    total_docs: AtomicU64,
    /// Documents processed since the last flush cycle.
    cycle_docs: AtomicU64,
    /// Documents processed since the run started.
    overall_docs: AtomicU64,
    /// Records acknowledged by the backend.
    succeeded: AtomicU64,
    /// Records rejected by the backend or lost to transport failures.
    failed: AtomicU64,
    /// Completed flush cycles.
    cycles: AtomicU64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the expected total, known once the scroll is opened.
    pub fn set_total_docs(&self, total: u64) {
        self.total_docs.store(total, Ordering::Relaxed);
    }

    pub fn total_docs(&self) -> u64 {
        self.total_docs.load(Ordering::Relaxed)
    }

    /// Count one processed document, in both the cycle and overall tallies.
    pub fn record_document(&self) {
        self.cycle_docs.fetch_add(1, Ordering::Relaxed);
        self.overall_docs.fetch_add(1, Ordering::Relaxed);
    }

    /// Read and reset the per-cycle document count.
    pub fn take_cycle_docs(&self) -> u64 {
        self.cycle_docs.swap(0, Ordering::Relaxed)
    }

    pub fn overall_docs(&self) -> u64 {
        self.overall_docs.load(Ordering::Relaxed)
    }

    /// Percentage of the expected total processed so far.
    pub fn percent_complete(&self) -> f64 {
        let total = self.total_docs();
        if total == 0 {
            return 0.0;
        }
        (self.overall_docs() as f64 / total as f64 * 100.0).floor()
    }

    pub fn add_succeeded(&self, n: u64) {
        self.succeeded.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_failed(&self, n: u64) {
        self.failed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Advance the cycle counter, returning the number of the cycle that
    /// just completed (first cycle is 1).
    pub fn next_cycle(&self) -> u64 {
        self.cycles.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_docs_reset() {
        let counters = RunCounters::new();
        counters.record_document();
        counters.record_document();

        assert_eq!(counters.take_cycle_docs(), 2);
        assert_eq!(counters.take_cycle_docs(), 0);
        assert_eq!(counters.overall_docs(), 2);
    }

    #[test]
    fn test_percent_complete() {
        let counters = RunCounters::new();
        assert_eq!(counters.percent_complete(), 0.0);

        counters.set_total_docs(200);
        for _ in 0..50 {
            counters.record_document();
        }
        assert_eq!(counters.percent_complete(), 25.0);
    }

    #[test]
    fn test_cycle_numbering() {
        let counters = RunCounters::new();
        assert_eq!(counters.next_cycle(), 1);
        assert_eq!(counters.next_cycle(), 2);
        assert_eq!(counters.cycles(), 2);
    }
}

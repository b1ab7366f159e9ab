//! Dispatcher counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time view of dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStats {
    /// Jobs placed on the queue.
    pub accepted: u64,
    /// Jobs discarded at submission, for any reason.
    pub dropped: u64,
    /// Jobs whose delivery succeeded.
    pub delivered: u64,
    /// Jobs whose delivery returned an error or panicked.
    pub failed: u64,
}

impl DispatchStats {
    /// Accepted jobs that have not finished processing yet.
    pub fn outstanding(&self) -> u64 {
        self.accepted
            .saturating_sub(self.delivered)
            .saturating_sub(self.failed)
    }
}

#[derive(Debug, Default)]
pub(super) struct StatsCounters {
    accepted: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl StatsCounters {
    pub(super) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn outstanding_excludes_finished_jobs() {
        let counters = StatsCounters::default();
        for _ in 0..5 {
            counters.record_accepted();
        }
        counters.record_delivered();
        counters.record_failed();
        counters.record_dropped();

        let stats = counters.snapshot();
        assert_eq!(stats.outstanding(), 3);
        assert_eq!(stats.dropped, 1);
    }
}

//! Service counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Thread-safe counters for service activity.
#[derive(Debug, Default)]
pub struct ServiceStats {
    submissions: AtomicU64,
    inclusions: AtomicU64,
    submission_failures: AtomicU64,
    cache_hits: AtomicU64,
    ledger_scans: AtomicU64,
    not_found: AtomicU64,
}

/// Point-in-time copy of [`ServiceStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub submissions: u64,
    pub inclusions: u64,
    pub submission_failures: u64,
    pub cache_hits: u64,
    pub ledger_scans: u64,
    pub not_found: u64,
}

impl ServiceStats {
    pub fn record_submission(&self) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inclusion(&self) {
        self.inclusions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submission_failure(&self) {
        self.submission_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ledger_scan(&self) {
        self.ledger_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submissions: self.submissions.load(Ordering::Relaxed),
            inclusions: self.inclusions.load(Ordering::Relaxed),
            submission_failures: self.submission_failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            ledger_scans: self.ledger_scans.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
        }
    }
}

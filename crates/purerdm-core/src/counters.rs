//! Per-run submission counters.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Success/error pair for one kind of write.
#[derive(Debug, Default)]
pub struct OutcomePair {
    success: AtomicU64,
    error: AtomicU64,
}

impl OutcomePair {
    /// Record a success.
    pub fn success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an error.
    pub fn error(&self) {
        self.error.fetch_add(1, Ordering::Relaxed);
    }

    /// Current success count.
    pub fn successes(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    /// Current error count.
    pub fn errors(&self) -> u64 {
        self.error.load(Ordering::Relaxed)
    }
}

/// Mutable aggregate for one synchronization run.
///
/// Created once per run, incremented by every component that performs a
/// network call, and read only for the run's summary report. All fields are
/// atomics (the histogram sits behind a mutex) so a future worker pool can
/// share one instance through an `Arc` without changes.
#[derive(Debug, Default)]
pub struct Counters {
    total: AtomicU64,
    /// Metadata POST outcomes.
    pub metadata: OutcomePair,
    /// File PUT outcomes.
    pub file: OutcomePair,
    /// Duplicate-record DELETE outcomes.
    pub delete: OutcomePair,
    http_responses: Mutex<BTreeMap<u16, u64>>,
}

/// Point-in-time copy of [`Counters`] for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub total: u64,
    pub metadata_success: u64,
    pub metadata_error: u64,
    pub file_success: u64,
    pub file_error: u64,
    pub delete_success: u64,
    pub delete_error: u64,
    pub http_responses: BTreeMap<u16, u64>,
}

impl Counters {
    /// Create a fresh set of counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that one more record entered the pipeline.
    pub fn record_started(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Records processed so far.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Count one HTTP response by status code.
    pub fn count_http_response(&self, status: u16) {
        let mut map = self.http_responses.lock().expect("counter mutex poisoned");
        *map.entry(status).or_insert(0) += 1;
    }

    /// Responses seen for a given status code.
    pub fn http_responses_for(&self, status: u16) -> u64 {
        let map = self.http_responses.lock().expect("counter mutex poisoned");
        map.get(&status).copied().unwrap_or(0)
    }

    /// Copy out all counters for the run summary.
    pub fn snapshot(&self) -> CountersSnapshot {
        let http_responses = self
            .http_responses
            .lock()
            .expect("counter mutex poisoned")
            .clone();
        CountersSnapshot {
            total: self.total(),
            metadata_success: self.metadata.successes(),
            metadata_error: self.metadata.errors(),
            file_success: self.file.successes(),
            file_error: self.file.errors(),
            delete_success: self.delete.successes(),
            delete_error: self.delete.errors(),
            http_responses,
        }
    }
}

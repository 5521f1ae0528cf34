//! Metrics registry
//!
//! Counters only, monotonic, reset only when the registry is created.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters of one store
///
/// All counters use Relaxed atomics; values are exact once the
/// operations that produced them have returned.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    queries_executed: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    documents_scanned: AtomicU64,
    documents_skipped: AtomicU64,
    documents_updated: AtomicU64,
    documents_deleted: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_misses(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Documents read and decoded during scans
    pub fn increment_documents_scanned(&self) {
        self.documents_scanned.fetch_add(1, Ordering::Relaxed);
    }

    /// Documents a scan skipped as unreadable or corrupt
    pub fn increment_documents_skipped(&self) {
        self.documents_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_documents_updated(&self, count: u64) {
        self.documents_updated.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_documents_deleted(&self, count: u64) {
        self.documents_deleted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn queries_executed(&self) -> u64 {
        self.queries_executed.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            documents_scanned: self.documents_scanned.load(Ordering::Relaxed),
            documents_skipped: self.documents_skipped.load(Ordering::Relaxed),
            documents_updated: self.documents_updated.load(Ordering::Relaxed),
            documents_deleted: self.documents_deleted.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of the registry's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub documents_scanned: u64,
    pub documents_skipped: u64,
    pub documents_updated: u64,
    pub documents_deleted: u64,
}

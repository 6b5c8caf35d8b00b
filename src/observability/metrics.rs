//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe but lock-free

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters for one recipe instance
///
/// All counters use Relaxed atomics; readers see eventually consistent values.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Tables compiled (nested tables included)
    schemas_baked: AtomicU64,
    /// Bakes answered from the cache
    cache_hits: AtomicU64,
    bake_failures: AtomicU64,
    /// Records dumped by the validated engine
    records_dumped: AtomicU64,
    records_loaded: AtomicU64,
    /// Records dumped by the fast engine
    records_fast_dumped: AtomicU64,
    dump_failures: AtomicU64,
    load_failures: AtomicU64,
    hooks_registered: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Schema metrics

    pub fn add_schemas_baked(&self, count: u64) {
        self.schemas_baked.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_bake_failures(&self) {
        self.bake_failures.fetch_add(1, Ordering::Relaxed);
    }

    // Engine metrics

    pub fn increment_records_dumped(&self) {
        self.records_dumped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records_loaded(&self) {
        self.records_loaded.fetch_add(1, Ordering::Relaxed);
    }

    /// Counted per batch, once the whole batch has been dumped
    pub fn add_records_fast_dumped(&self, count: u64) {
        self.records_fast_dumped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_dump_failures(&self) {
        self.dump_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_load_failures(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    // Hook metrics

    pub fn increment_hooks_registered(&self) {
        self.hooks_registered.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of all metrics as JSON
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "schemas_baked": self.schemas_baked.load(Ordering::Relaxed),
            "cache_hits": self.cache_hits.load(Ordering::Relaxed),
            "bake_failures": self.bake_failures.load(Ordering::Relaxed),
            "records_dumped": self.records_dumped.load(Ordering::Relaxed),
            "records_loaded": self.records_loaded.load(Ordering::Relaxed),
            "records_fast_dumped": self.records_fast_dumped.load(Ordering::Relaxed),
            "dump_failures": self.dump_failures.load(Ordering::Relaxed),
            "load_failures": self.load_failures.load(Ordering::Relaxed),
            "hooks_registered": self.hooks_registered.load(Ordering::Relaxed),
        })
        .to_string()
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            schemas_baked: self.schemas_baked.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            bake_failures: self.bake_failures.load(Ordering::Relaxed),
            records_dumped: self.records_dumped.load(Ordering::Relaxed),
            records_loaded: self.records_loaded.load(Ordering::Relaxed),
            records_fast_dumped: self.records_fast_dumped.load(Ordering::Relaxed),
            dump_failures: self.dump_failures.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            hooks_registered: self.hooks_registered.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub schemas_baked: u64,
    pub cache_hits: u64,
    pub bake_failures: u64,
    pub records_dumped: u64,
    pub records_loaded: u64,
    pub records_fast_dumped: u64,
    pub dump_failures: u64,
    pub load_failures: u64,
    pub hooks_registered: u64,
}

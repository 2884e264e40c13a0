//! Operational counters for the cache layer.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters shared by the strategies and the rebuild pool.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    negative_hits: AtomicU64,
    misses: AtomicU64,
    store_loads: AtomicU64,
    corrupt_entries: AtomicU64,
    busy_timeouts: AtomicU64,
    rebuilds_dispatched: AtomicU64,
    rebuilds_dropped: AtomicU64,
}

impl CacheStats {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_negative_hit(&self) {
        self.negative_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_store_load(&self) {
        self.store_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_corrupt_entry(&self) {
        self.corrupt_entries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_busy_timeout(&self) {
        self.busy_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rebuild_dispatched(&self) {
        self.rebuilds_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rebuild_dropped(&self) {
        self.rebuilds_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            negative_hits: self.negative_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            store_loads: self.store_loads.load(Ordering::Relaxed),
            corrupt_entries: self.corrupt_entries.load(Ordering::Relaxed),
            busy_timeouts: self.busy_timeouts.load(Ordering::Relaxed),
            rebuilds_dispatched: self.rebuilds_dispatched.load(Ordering::Relaxed),
            rebuilds_dropped: self.rebuilds_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`CacheStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub negative_hits: u64,
    pub misses: u64,
    pub store_loads: u64,
    pub corrupt_entries: u64,
    pub busy_timeouts: u64,
    pub rebuilds_dispatched: u64,
    pub rebuilds_dropped: u64,
}

impl StatsSnapshot {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.negative_hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits + self.negative_hits) as f64 / total as f64
        }
    }
}

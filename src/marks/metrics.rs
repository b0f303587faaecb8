//! Hit/miss accounting for the shared mark cache.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of mark cache counters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkCacheMetrics {
    /// Lookups served from a cached entry, including callers that waited on
    /// another caller's in-flight load.
    pub hits: u64,
    /// Lookups that found no cached entry.
    pub misses: u64,
    /// Load functions executed through `get_or_set`.
    pub loads: u64,
}

#[derive(Default, Debug)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MarkCacheMetrics {
        MarkCacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
        }
    }
}

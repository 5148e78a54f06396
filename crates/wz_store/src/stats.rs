//! Cache accounting

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters shared by every unit of a store
#[derive(Debug, Default)]
pub(crate) struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    disk_reads: AtomicU64,
}

impl CacheStats {
    pub fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn disk_read(&self) {
        self.disk_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, cached_units: usize, memory_bytes: usize, categories: usize) -> CacheSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let requests = hits + misses;
        CacheSnapshot {
            hits,
            misses,
            disk_reads: self.disk_reads.load(Ordering::Relaxed),
            hit_ratio: if requests == 0 {
                0.0
            } else {
                hits as f64 / requests as f64
            },
            cached_units,
            memory_bytes,
            categories,
        }
    }
}

/// Point in time view of the cache counters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    /// Requests for a unit that was already parsed
    pub hits: u64,
    /// Requests that had to parse the unit
    pub misses: u64,
    /// Successful parses
    pub disk_reads: u64,
    /// `hits / (hits + misses)`, or 0 before the first request
    pub hit_ratio: f64,
    /// Units currently parsed
    pub cached_units: usize,
    /// Estimated size of every parsed tree
    pub memory_bytes: usize,
    pub categories: usize,
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::stats::CacheStats;

    #[test]
    fn hit_ratio_is_zero_without_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.snapshot(0, 0, 0).hit_ratio, 0.0);
    }

    #[test]
    fn hit_ratio_counts_hits_over_requests() {
        let stats = CacheStats::default();
        stats.miss();
        stats.disk_read();
        stats.hit();
        stats.hit();
        stats.hit();

        let snapshot = stats.snapshot(1, 64, 2);
        assert_eq!(snapshot.hits, 3);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.disk_reads, 1);
        assert_eq!(snapshot.hit_ratio, 0.75);
    }
}

//! Engine statistics

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters for one query execution.
///
/// Updated through shared references from the fetch path, so all fields
/// are atomics; read via [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct FetchStats {
    requests: AtomicU64,
    cache_hits: AtomicU64,
    records: AtomicU64,
}

impl FetchStats {
    /// Count one network request
    pub fn add_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one cache hit
    pub fn add_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Count records carried by a chunk
    pub fn add_records(&self, count: u64) {
        self.records.fetch_add(count, Ordering::Relaxed);
    }

    /// Consistent-enough point-in-time copy of the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of the fetch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Network requests issued (cache hits excluded)
    pub requests: u64,
    /// Responses served from the cache
    pub cache_hits: u64,
    /// Records observed across all chunks
    pub records: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let stats = FetchStats::default();
        stats.add_request();
        stats.add_request();
        stats.add_cache_hit();
        stats.add_records(25);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests, 2);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.records, 25);
    }
}

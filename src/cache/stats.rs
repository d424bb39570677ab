//! Cache Statistics Module
//!
//! Tracks cache performance metrics: local hits and misses, evictions,
//! expirations, and remote bridge activity.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the local store
    pub hits: u64,
    /// Lookups not found locally (read-through may still succeed)
    pub misses: u64,
    /// Number of entries evicted due to LRU policy
    pub evictions: u64,
    /// Number of entries removed by their TTL timer
    pub expirations: u64,
    /// Local misses filled from the remote store
    pub remote_hits: u64,
    /// Successful write-through calls
    pub remote_writes: u64,
    /// Remote calls that failed
    pub remote_errors: u64,
    /// Values that failed to serialize or deserialize
    pub codec_errors: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the local hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Recorders ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_remote_hit(&mut self) {
        self.remote_hits += 1;
    }

    pub fn record_remote_write(&mut self) {
        self.remote_writes += 1;
    }

    pub fn record_remote_error(&mut self) {
        self.remote_errors += 1;
    }

    pub fn record_codec_error(&mut self) {
        self.codec_errors += 1;
    }

    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

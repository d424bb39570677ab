//! LRU Store Module
//!
//! Bounded key -> entry map combining HashMap storage with LRU tracking.

use std::collections::HashMap;

use crate::cache::{CacheEntry, LruTracker};
use crate::error::ConfigError;

// == LRU Store ==
/// Capacity-bounded entry storage with move-to-end-on-access recency.
#[derive(Debug)]
pub struct LruStore<V> {
    /// Key-entry storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Maximum number of entries allowed
    maxsize: usize,
}

impl<V> LruStore<V> {
    // == Constructor ==
    /// Creates an empty store holding at most `maxsize` entries.
    pub fn new(maxsize: usize) -> Result<Self, ConfigError> {
        if maxsize == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            maxsize,
        })
    }

    // == Put ==
    /// Inserts or overwrites `key` and marks it most recently used.
    ///
    /// If this pushes the store over capacity, the least recently used entry
    /// is removed and returned so the caller can release what it owns (its
    /// TTL timer in particular). The evicted key is never `key` itself.
    pub fn put(&mut self, key: String, entry: CacheEntry<V>) -> Option<(String, CacheEntry<V>)> {
        self.lru.touch(&key);
        self.entries.insert(key, entry);

        if self.entries.len() <= self.maxsize {
            return None;
        }
        let evicted_key = self.lru.evict_oldest()?;
        let evicted = self.entries.remove(&evicted_key)?;
        Some((evicted_key, evicted))
    }

    // == Get ==
    /// Returns the entry for `key` and marks it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&mut CacheEntry<V>> {
        let entry = self.entries.get_mut(key)?;
        self.lru.touch(key);
        Some(entry)
    }

    /// Returns the entry without touching recency.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    // == Remove ==
    /// Removes and returns the entry for `key`.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        Some(entry)
    }

    /// Removes every entry, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        count
    }

    // == Queries ==
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<String> {
        self.lru.keys().cloned().collect()
    }

    pub fn maxsize(&self) -> usize {
        self.maxsize
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL metadata.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::cache::Deferred;

// == Entry Origin ==
/// Where an entry's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrigin {
    /// Stored by a caller through `set`
    Local,
    /// Filled by read-through from the remote store
    Remote,
}

// == Cache Entry ==
/// A single cache entry: the (possibly pending) value plus metadata.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: Deferred<V>,
    pub origin: EntryOrigin,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Expiration time, None = no expiration
    pub expires_at: Option<DateTime<Utc>>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry, expiring `ttl_seconds` from now when positive.
    pub fn new(value: Deferred<V>, origin: EntryOrigin, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            value,
            origin,
            created_at: now,
            expires_at: expiry_from(now, ttl_seconds),
        }
    }

    // == Refresh ==
    /// Pushes the expiration time out to `ttl_seconds` from now.
    pub fn refresh_expiry(&mut self, ttl_seconds: i64) {
        self.expires_at = expiry_from(Utc::now(), ttl_seconds);
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// Saturates at zero once the deadline has passed.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at.map(|expires| {
            let remaining = expires - Utc::now();
            u64::try_from(remaining.num_milliseconds()).unwrap_or(0)
        })
    }

    /// Returns remaining TTL in whole seconds, or None if no expiration is set.
    pub fn ttl_remaining(&self) -> Option<u64> {
        self.ttl_remaining_ms().map(|ms| ms / 1000)
    }
}

fn expiry_from(now: DateTime<Utc>, ttl_seconds: i64) -> Option<DateTime<Utc>> {
    if ttl_seconds <= 0 {
        return None;
    }
    Duration::try_seconds(ttl_seconds).and_then(|ttl| now.checked_add_signed(ttl))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new(Deferred::resolved("v"), EntryOrigin::Local, -1);

        assert_eq!(entry.value.value(), Some("v"));
        assert_eq!(entry.origin, EntryOrigin::Local);
        assert!(entry.expires_at.is_none());
        assert!(entry.ttl_remaining().is_none());
        assert!(entry.ttl_remaining_ms().is_none());
    }

    #[test]
    fn test_entry_zero_ttl_never_expires() {
        let entry = CacheEntry::new(Deferred::resolved(1), EntryOrigin::Remote, 0);
        assert!(entry.expires_at.is_none());
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new(Deferred::resolved(1), EntryOrigin::Local, 10);

        let remaining_ms = entry.ttl_remaining_ms().unwrap();
        assert!(remaining_ms <= 10_000);
        assert!(remaining_ms >= 9_000);
        assert!(entry.ttl_remaining().unwrap() >= 9);
    }

    #[test]
    fn test_ttl_remaining_saturates_when_past() {
        let now = Utc::now();
        let entry = CacheEntry {
            value: Deferred::resolved(1),
            origin: EntryOrigin::Local,
            created_at: now,
            expires_at: Some(now - Duration::seconds(5)),
        };

        assert_eq!(entry.ttl_remaining_ms(), Some(0));
        assert_eq!(entry.ttl_remaining(), Some(0));
    }

    #[test]
    fn test_refresh_expiry_moves_deadline() {
        let mut entry = CacheEntry::new(Deferred::resolved(1), EntryOrigin::Local, 1);
        let first = entry.expires_at.unwrap();

        entry.refresh_expiry(60);

        assert!(entry.expires_at.unwrap() > first);
        assert!(entry.ttl_remaining().unwrap() >= 59);
    }

    #[test]
    fn test_origin_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&EntryOrigin::Remote).unwrap(), "\"remote\"");
    }
}

//! In-process remote store with per-key TTL.
//!
//! Stands in for a networked key-value server: the link can be switched off,
//! failures can be injected, latency can be simulated, and every call is
//! counted so tests can assert on bridge traffic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::RemoteError;
use crate::remote::RemoteStore;

#[derive(Debug, Clone)]
struct RemoteEntry {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

impl RemoteEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires| now >= expires)
    }
}

// == Memory Remote ==
#[derive(Debug)]
pub struct MemoryRemote {
    data: Mutex<HashMap<String, RemoteEntry>>,
    active: AtomicBool,
    latency: Option<Duration>,
    max_value_size: Option<usize>,
    failures_pending: AtomicUsize,
    get_calls: AtomicU64,
    set_calls: AtomicU64,
}

impl MemoryRemote {
    // == Constructors ==
    /// Creates an empty, active store.
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            active: AtomicBool::new(true),
            latency: None,
            max_value_size: None,
            failures_pending: AtomicUsize::new(0),
            get_calls: AtomicU64::new(0),
            set_calls: AtomicU64::new(0),
        }
    }

    /// Delays every `get`/`set` by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Rejects writes whose encoded value is longer than `limit` bytes.
    pub fn with_max_value_size(mut self, limit: usize) -> Self {
        self.max_value_size = Some(limit);
        self
    }

    // == Link Control ==
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
        debug!(active, "remote link toggled");
    }

    /// Makes the next `count` calls fail with a transport error.
    pub fn fail_next(&self, count: usize) {
        self.failures_pending.store(count, Ordering::SeqCst);
    }

    // == Counters ==
    /// Number of `get` calls received, failed ones included.
    pub fn get_calls(&self) -> u64 {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of `set` calls received, failed ones included.
    pub fn set_calls(&self) -> u64 {
        self.set_calls.load(Ordering::SeqCst)
    }

    // == Direct Access ==
    /// Reads stored bytes without going through the link checks.
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        let data = self.data.lock();
        data.get(key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.bytes.clone())
    }

    /// Writes bytes directly, bypassing link checks and counters.
    pub fn insert_raw(&self, key: &str, bytes: Vec<u8>) {
        self.data.lock().insert(
            key.to_string(),
            RemoteEntry {
                bytes,
                expires_at: None,
            },
        );
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut data = self.data.lock();
        let before = data.len();
        data.retain(|_, entry| !entry.is_expired(now));
        before - data.len()
    }

    /// Number of stored keys, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    async fn enter(&self) -> Result<(), RemoteError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if !self.is_active() {
            return Err(RemoteError::Inactive);
        }
        let injected = self
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(RemoteError::Transport("injected failure".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RemoteError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;

        let now = Instant::now();
        let mut data = self.data.lock();
        match data.get(key) {
            Some(entry) if entry.is_expired(now) => {
                data.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.bytes.clone())),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), RemoteError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;

        if let Some(limit) = self.max_value_size.filter(|limit| value.len() > *limit) {
            return Err(RemoteError::Rejected(format!(
                "value of {} bytes exceeds limit of {} bytes",
                value.len(),
                limit
            )));
        }

        let entry = RemoteEntry {
            bytes: value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.data.lock().insert(key.to_string(), entry);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let remote = MemoryRemote::new();

        remote.set("k", b"v".to_vec(), None).await.unwrap();

        assert_eq!(remote.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(remote.get("missing").await.unwrap(), None);
        assert_eq!(remote.get_calls(), 2);
        assert_eq!(remote.set_calls(), 1);
    }

    #[tokio::test]
    async fn test_inactive_link_refuses_calls() {
        let remote = MemoryRemote::new();
        remote.insert_raw("k", b"v".to_vec());
        remote.set_active(false);

        assert!(!remote.is_active());
        assert_eq!(remote.get("k").await, Err(RemoteError::Inactive));
        assert_eq!(remote.set("k", vec![], None).await, Err(RemoteError::Inactive));

        remote.set_active(true);
        assert_eq!(remote.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let remote = MemoryRemote::new();
        remote.fail_next(2);

        assert!(matches!(
            remote.set("k", vec![1], None).await,
            Err(RemoteError::Transport(_))
        ));
        assert!(matches!(remote.get("k").await, Err(RemoteError::Transport(_))));
        assert!(remote.set("k", vec![1], None).await.is_ok());
        assert_eq!(remote.set_calls(), 2);
    }

    #[tokio::test]
    async fn test_oversized_value_rejected() {
        let remote = MemoryRemote::new().with_max_value_size(4);

        assert!(matches!(
            remote.set("big", vec![0; 5], None).await,
            Err(RemoteError::Rejected(_))
        ));
        assert!(remote.set("small", vec![0; 4], None).await.is_ok());
        assert!(remote.peek("big").is_none());
        assert_eq!(remote.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expires_entries() {
        let remote = MemoryRemote::new();
        remote
            .set("short", vec![1], Some(Duration::from_secs(1)))
            .await
            .unwrap();
        remote.set("forever", vec![2], None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(remote.peek("short"), None);
        assert_eq!(remote.len(), 2);
        assert_eq!(remote.purge_expired(), 1);
        assert_eq!(remote.len(), 1);
        assert_eq!(remote.get("forever").await.unwrap(), Some(vec![2]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_delays_calls() {
        let remote = MemoryRemote::new().with_latency(Duration::from_secs(2));
        let start = Instant::now();

        remote.set("k", vec![1], None).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}

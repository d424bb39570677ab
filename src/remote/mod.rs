//! Remote Store Module
//!
//! The key-value store the cache writes through to and reads through from.
//! The cache holds it as an injected `Arc<dyn RemoteStore>`, so several
//! caches can share one store and tests can substitute their own.

mod memory;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::RemoteError;

pub use memory::MemoryRemote;

// == Remote Store Trait ==
/// Byte-oriented key-value store behind the local cache.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the bytes stored under `key`, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RemoteError>;

    /// Stores `value` under `key`, expiring after `ttl` when given.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
        -> Result<(), RemoteError>;

    /// Whether the link is currently usable.
    ///
    /// Advisory and re-read on every bridge attempt; it may flip at any time.
    fn is_active(&self) -> bool;
}

// == Offline ==
/// A remote that is never available. Disables both bridge directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

#[async_trait]
impl RemoteStore for Offline {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, RemoteError> {
        Err(RemoteError::Inactive)
    }

    async fn set(
        &self,
        _key: &str,
        _value: Vec<u8>,
        _ttl: Option<Duration>,
    ) -> Result<(), RemoteError> {
        Err(RemoteError::Inactive)
    }

    fn is_active(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_is_inactive_and_refuses_calls() {
        let remote = Offline;
        assert!(!remote.is_active());
        assert_eq!(remote.get("k").await, Err(RemoteError::Inactive));
        assert_eq!(
            remote.set("k", vec![1], None).await,
            Err(RemoteError::Inactive)
        );
    }
}

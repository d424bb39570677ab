//! LRU Cache Module
//!
//! The public cache: LRU store + TTL timers + deferred values, bridged to a
//! remote store with write-through on resolution and read-through on miss.
//!
//! All local state sits behind one async mutex. Timer firings and
//! write-through completions take that same lock before touching it, and no
//! remote call is ever made while it is held.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::runtime::Handle;
use tokio::sync::{Mutex, MutexGuard, Notify};
use tracing::{debug, info, warn};

use crate::cache::{
    CacheEntry, CacheStats, Deferred, EntryOrigin, Expiry, LruStore, TtlScheduler, WriteOrder,
    WriteTicket,
};
use crate::codec::{BincodeCodec, Codec};
use crate::config::CacheConfig;
use crate::error::{CodecError, ConfigError};
use crate::remote::{Offline, RemoteStore};

/// Default capacity bound.
pub const DEFAULT_MAXSIZE: usize = 10;

/// Default TTL: expiration disabled.
pub const DEFAULT_TTL: i64 = -1;

// == Builder ==
/// Configures and builds an [`LruCache`].
pub struct CacheBuilder<V> {
    maxsize: usize,
    ttl: i64,
    codec: Arc<dyn Codec<V>>,
    remote: Arc<dyn RemoteStore>,
}

impl<V> CacheBuilder<V>
where
    V: Send + Sync + 'static,
{
    /// Starts a builder around `codec`, for value types bincode can't handle.
    pub fn with_codec<C>(codec: C) -> Self
    where
        C: Codec<V> + 'static,
    {
        Self {
            maxsize: DEFAULT_MAXSIZE,
            ttl: DEFAULT_TTL,
            codec: Arc::new(codec),
            remote: Arc::new(Offline),
        }
    }

    pub fn maxsize(mut self, maxsize: usize) -> Self {
        self.maxsize = maxsize;
        self
    }

    /// TTL in seconds. Zero or negative disables expiration.
    pub fn ttl(mut self, ttl: i64) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn codec<C>(mut self, codec: C) -> Self
    where
        C: Codec<V> + 'static,
    {
        self.codec = Arc::new(codec);
        self
    }

    /// Remote store to bridge to. Defaults to [`Offline`].
    pub fn remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = remote;
        self
    }

    /// Applies `maxsize` and `ttl` from a loaded config.
    pub fn config(self, config: &CacheConfig) -> Self {
        self.maxsize(config.maxsize).ttl(config.ttl)
    }

    // == Build ==
    /// Builds the cache.
    ///
    /// Fails if the codec is incomplete, `maxsize` is zero, or there is no
    /// Tokio runtime to run timers and write-through on.
    pub fn build(self) -> Result<LruCache<V>, ConfigError> {
        self.codec.check()?;
        let store = LruStore::new(self.maxsize)?;
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

        let ttl_duration = (self.ttl > 0).then(|| Duration::from_secs(self.ttl.unsigned_abs()));

        info!(
            maxsize = self.maxsize,
            ttl = self.ttl,
            remote_active = self.remote.is_active(),
            "LRU cache initialized"
        );

        Ok(LruCache {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    store,
                    timers: TtlScheduler::new(runtime.clone()),
                    stats: CacheStats::new(),
                }),
                codec: self.codec,
                remote: self.remote,
                runtime,
                maxsize: self.maxsize,
                ttl: self.ttl,
                ttl_duration,
                write_order: Arc::new(WriteOrder::new()),
                writes_in_flight: AtomicUsize::new(0),
                writes_done: Notify::new(),
            }),
        })
    }
}

// == Shared State ==
struct Inner<V> {
    store: LruStore<V>,
    timers: TtlScheduler,
    stats: CacheStats,
}

struct Shared<V> {
    inner: Mutex<Inner<V>>,
    codec: Arc<dyn Codec<V>>,
    remote: Arc<dyn RemoteStore>,
    runtime: Handle,
    maxsize: usize,
    ttl: i64,
    ttl_duration: Option<Duration>,
    write_order: Arc<WriteOrder>,
    writes_in_flight: AtomicUsize,
    writes_done: Notify,
}

// == LRU Cache ==
/// Least-recently-used cache with per-key TTL and a remote write-through /
/// read-through bridge.
///
/// Values are stored as [`Deferred`], so a caller can insert a placeholder
/// for a value still being computed. Once it resolves, the value is encoded
/// and written to the remote store if the link is up.
///
/// Cloning is cheap; clones share one cache.
pub struct LruCache<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for LruCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> LruCache<V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Builder using the default bincode codec.
    pub fn builder() -> CacheBuilder<V> {
        CacheBuilder::with_codec(BincodeCodec)
    }
}

impl<V> LruCache<V>
where
    V: Send + Sync + 'static,
{
    // == Get ==
    /// Looks up `key`, falling back to the remote store on a local miss.
    ///
    /// A local hit becomes most recently used and has its TTL restarted.
    /// Remote failures and undecodable remote bytes are logged and reported
    /// as a miss.
    pub async fn get(&self, key: &str) -> Option<Deferred<V>> {
        {
            let mut inner = self.lock().await;
            if let Some(value) = self.touch_locked(&mut inner, key) {
                inner.stats.record_hit();
                return Some(value);
            }
            inner.stats.record_miss();
        }
        self.read_through(key).await
    }

    // == Set ==
    /// Stores a ready value.
    pub async fn set(&self, key: impl Into<String>, value: V) {
        self.set_deferred(key, Deferred::resolved(value)).await;
    }

    /// Stores a possibly pending value.
    ///
    /// The entry takes part in eviction and expiry right away. Write-through
    /// happens once, when the value resolves, provided the remote link was
    /// active at insert time and still is at write time. Writes for one key
    /// reach the remote in set order; a value set again before its write goes
    /// out is never written.
    pub async fn set_deferred(&self, key: impl Into<String>, value: Deferred<V>) {
        let key = key.into();
        let ticket = {
            let mut inner = self.lock().await;
            self.insert_locked(&mut inner, key.clone(), value.clone(), EntryOrigin::Local);
            if self.shared.remote.is_active() {
                Some(self.shared.write_order.issue(&key))
            } else {
                self.shared.write_order.supersede(&key);
                None
            }
        };
        if let Some(ticket) = ticket {
            self.register_write_through(ticket, value);
        }
    }

    /// Stores several ready values in iteration order.
    pub async fn update<I, K>(&self, entries: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        for (key, value) in entries {
            self.set(key, value).await;
        }
        self
    }

    // == Pop ==
    /// Removes `key` and returns its value, cancelling its timer.
    pub async fn pop(&self, key: &str) -> Option<Deferred<V>> {
        let mut inner = self.lock().await;
        inner.timers.cancel(key);
        inner.store.remove(key).map(|entry| entry.value)
    }

    /// Like [`pop`](Self::pop), returning `default` when `key` is absent.
    pub async fn pop_or(&self, key: &str, default: Deferred<V>) -> Deferred<V> {
        self.pop(key).await.unwrap_or(default)
    }

    // == Clear ==
    /// Removes one key, or everything when `key` is `None`, along with the
    /// matching timers. Returns `self` for chaining.
    pub async fn clear(&self, key: Option<&str>) -> &Self {
        let mut inner = self.lock().await;
        match key {
            Some(key) => {
                inner.timers.cancel(key);
                if inner.store.remove(key).is_some() {
                    debug!(key, "entry cleared");
                }
            }
            None => {
                let timers = inner.timers.cancel_all();
                let entries = inner.store.clear();
                debug!(entries, timers, "cache cleared");
            }
        }
        self
    }

    // == Queries ==
    /// Number of local entries. Never consults the remote store.
    pub async fn len(&self) -> usize {
        self.lock().await.store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lock().await.store.is_empty()
    }

    /// Whether `key` is held locally. Does not promote or read through.
    pub async fn contains_key(&self, key: &str) -> bool {
        self.lock().await.store.contains_key(key)
    }

    /// Local keys from least to most recently used.
    pub async fn keys(&self) -> Vec<String> {
        self.lock().await.store.keys()
    }

    /// Origin and remaining TTL (whole seconds) of a local entry, without
    /// promoting it.
    pub async fn entry_info(&self, key: &str) -> Option<(EntryOrigin, Option<u64>)> {
        let inner = self.lock().await;
        inner
            .store
            .peek(key)
            .map(|entry| (entry.origin, entry.ttl_remaining()))
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.lock().await;
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.store.len());
        stats
    }

    pub fn maxsize(&self) -> usize {
        self.shared.maxsize
    }

    /// Configured TTL in seconds; zero or negative means no expiration.
    pub fn ttl(&self) -> i64 {
        self.shared.ttl
    }

    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.shared.remote
    }

    // == Flush ==
    /// Waits until every write-through already handed to the runtime has
    /// finished. Values still pending are not waited for.
    pub async fn flush(&self) {
        loop {
            let notified = self.shared.writes_done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.shared.writes_in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    #[cfg(test)]
    pub(crate) async fn timer_count(&self) -> usize {
        self.lock().await.timers.len()
    }

    // == Internals ==
    async fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.shared.inner.lock().await
    }

    /// Local hit path: promote, refresh expiry, restart the timer.
    fn touch_locked(&self, inner: &mut Inner<V>, key: &str) -> Option<Deferred<V>> {
        let entry = inner.store.get(key)?;
        entry.refresh_expiry(self.shared.ttl);
        let value = entry.value.clone();
        self.arm_timer(inner, key);
        Some(value)
    }

    fn insert_locked(
        &self,
        inner: &mut Inner<V>,
        key: String,
        value: Deferred<V>,
        origin: EntryOrigin,
    ) {
        let entry = CacheEntry::new(value, origin, self.shared.ttl);
        if let Some((evicted_key, _)) = inner.store.put(key.clone(), entry) {
            inner.timers.cancel(&evicted_key);
            inner.stats.record_eviction();
            debug!(key = %evicted_key, "evicted least recently used entry");
        }
        self.arm_timer(inner, &key);
    }

    fn arm_timer(&self, inner: &mut Inner<V>, key: &str) {
        let Some(after) = self.shared.ttl_duration else {
            return;
        };
        let shared = Arc::downgrade(&self.shared);
        inner
            .timers
            .schedule(key, after, move |expiry| expire(shared, expiry));
    }

    async fn read_through(&self, key: &str) -> Option<Deferred<V>> {
        let remote = &self.shared.remote;
        if !remote.is_active() {
            return None;
        }

        let bytes = match remote.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "read-through failed, treating as miss");
                self.lock().await.stats.record_remote_error();
                return None;
            }
        };

        let value = match self.shared.codec.deserialize(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable remote value");
                self.lock().await.stats.record_codec_error();
                return None;
            }
        };

        let mut inner = self.lock().await;
        // A local set that landed while the lock was released wins.
        if let Some(existing) = self.touch_locked(&mut inner, key) {
            return Some(existing);
        }
        let deferred = Deferred::resolved(value);
        self.insert_locked(&mut inner, key.to_string(), deferred.clone(), EntryOrigin::Remote);
        inner.stats.record_remote_hit();
        debug!(key, "filled from remote store");
        Some(deferred)
    }

    fn register_write_through(&self, ticket: WriteTicket, value: Deferred<V>) {
        let shared = Arc::downgrade(&self.shared);
        value.on_complete(move |resolved: &V| {
            if let Some(shared) = shared.upgrade() {
                let encoded = shared.codec.serialize(resolved);
                Shared::spawn_write(shared, ticket, encoded);
            }
        });
    }
}

impl<V> Shared<V>
where
    V: Send + Sync + 'static,
{
    fn spawn_write(shared: Arc<Self>, ticket: WriteTicket, encoded: Result<Vec<u8>, CodecError>) {
        shared.writes_in_flight.fetch_add(1, Ordering::SeqCst);
        let runtime = shared.runtime.clone();
        runtime.spawn(async move {
            shared.write_through(&ticket, encoded).await;
            drop(ticket);
            shared.writes_in_flight.fetch_sub(1, Ordering::SeqCst);
            shared.writes_done.notify_waiters();
        });
    }

    async fn write_through(&self, ticket: &WriteTicket, encoded: Result<Vec<u8>, CodecError>) {
        let key = ticket.key();
        let bytes = match encoded {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "write-through skipped, value failed to serialize");
                self.inner.lock().await.stats.record_codec_error();
                return;
            }
        };

        // Held until the remote call returns so a newer write for this key
        // can't overtake it.
        let Some(_turn) = self.write_order.begin(ticket).await else {
            debug!(key, seq = ticket.seq(), "write-through skipped, key was set again");
            return;
        };

        if !self.remote.is_active() {
            debug!(key, "write-through skipped, remote inactive");
            return;
        }

        match self.remote.set(key, bytes, self.ttl_duration).await {
            Ok(()) => {
                self.inner.lock().await.stats.record_remote_write();
                debug!(key, seq = ticket.seq(), "written through to remote store");
            }
            Err(e) => {
                warn!(key, error = %e, "write-through failed");
                self.inner.lock().await.stats.record_remote_error();
            }
        }
    }
}

/// Timer callback: removes the entry if this timer is still the live one.
async fn expire<V>(shared: Weak<Shared<V>>, expiry: Expiry)
where
    V: Send + Sync + 'static,
{
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let mut inner = shared.inner.lock().await;
    if !inner.timers.claim(&expiry) {
        return;
    }
    if inner.store.remove(&expiry.key).is_some() {
        inner.stats.record_expiration();
        debug!(key = %expiry.key, "entry expired");
    }
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = self.shared.inner.try_lock().ok().map(|inner| inner.store.keys());
        f.debug_struct("LruCache")
            .field("maxsize", &self.shared.maxsize)
            .field("ttl", &self.shared.ttl)
            .field("keys", &keys)
            .finish()
    }
}

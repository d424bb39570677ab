//! Dataloader Cache - LRU cache with TTL and remote write-through
//!
//! Sits in front of expensive or batched fetches. Values may be stored before
//! they are computed ([`Deferred`]); once resolved they are written through to
//! a shared remote store, and local misses are read back from it.

pub mod api;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheBuilder, CacheStats, Deferred, LruCache, Resolver};
pub use codec::{BincodeCodec, Codec, FnCodec, JsonCodec};
pub use config::{CacheConfig, Config};
pub use error::{CodecError, ConfigError, RemoteError};
pub use remote::{MemoryRemote, Offline, RemoteStore};
pub use tasks::spawn_remote_purge_task;

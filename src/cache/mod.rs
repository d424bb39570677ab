//! Cache Module
//!
//! In-process LRU cache with per-key TTL, deferred values and a remote
//! write-through / read-through bridge.

mod deferred;
mod entry;
mod lru;
mod lru_cache;
mod stats;
mod store;
mod ttl;
mod write_order;


// Re-export public types
pub use deferred::{Deferred, Resolver};
pub use entry::{CacheEntry, EntryOrigin};
pub use lru::LruTracker;
pub use lru_cache::{CacheBuilder, LruCache, DEFAULT_MAXSIZE, DEFAULT_TTL};
pub use stats::CacheStats;
pub use store::LruStore;
pub use ttl::{Expiry, TtlScheduler};
pub use write_order::{WriteOrder, WriteTicket};

//! Tiercache - a two-tier caching engine
//!
//! An in-process eviction engine (LRU, LFU, FIFO, TTL-only) with lazy and
//! active expiration, a remote-backed store over a pluggable key-value
//! adapter, and a tiered cache composing the two.

pub mod cache;
pub mod config;
pub mod error;
pub mod remote;
pub mod tasks;
pub mod tiered;

pub use cache::{Cache, CacheEntry, CacheStats, LocalStore, StatsSnapshot};
pub use config::{CacheConfig, CacheConfigBuilder, EvictionPolicy};
pub use error::{CacheError, OperationFailure, Result};
pub use remote::{InMemoryAdapter, RemoteError, RemoteStore, RemoteStoreAdapter};
pub use tasks::AsyncCache;
pub use tiered::TieredCache;

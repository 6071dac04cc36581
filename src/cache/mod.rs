//! Cache Module
//!
//! The uniform [`Cache`] contract plus the in-process eviction engine
//! ([`LocalStore`]) and its building blocks.

mod entry;
mod eviction;
pub mod ops;
mod order;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use crate::error::{CacheError, Result};

// Re-export public types
pub use entry::CacheEntry;
pub use order::AccessOrder;
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{EntryMetadata, LocalStore};

// == Key / Value Bounds ==
/// Bounds every cache key satisfies.
pub trait CacheKey: Eq + Hash + Clone + Send + Sync + 'static {}

impl<T: Eq + Hash + Clone + Send + Sync + 'static> CacheKey for T {}

/// Bounds every cached value satisfies.
pub trait CacheValue: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> CacheValue for T {}

// == Cache Contract ==
/// Operations shared by the local store, the remote-backed store and the
/// tiered cache.
///
/// Bulk operations apply the single-key operation per key with no
/// cross-key atomicity. Implementations may override them with batched
/// calls as long as the per-key outcome is unchanged.
pub trait Cache<K: CacheKey, V: CacheValue>: Send + Sync {
    /// Name of the cache, used for logging and remote key prefixes.
    fn name(&self) -> &str;

    /// Returns the live value for `key`, recording a hit or a miss.
    fn get(&self, key: &K) -> Result<Option<V>>;

    /// Stores `value`, replacing any previous entry. `ttl = None` applies
    /// the cache's default TTL.
    fn put(&self, key: K, value: V, ttl: Option<Duration>) -> Result<()>;

    /// Stores `value` only when no live entry exists. Returns whether the
    /// value was stored.
    fn put_if_absent(&self, key: K, value: V, ttl: Option<Duration>) -> Result<bool>;

    /// Removes `key`. Returns whether a live entry was removed.
    fn remove(&self, key: &K) -> Result<bool>;

    /// Checks for a live entry without counting as an access.
    fn exists(&self, key: &K) -> Result<bool>;

    fn clear(&self) -> Result<()>;

    fn size(&self) -> Result<usize>;

    fn stats(&self) -> StatsSnapshot;

    /// Removes every expired entry now. Returns how many were removed.
    fn evict_expired(&self) -> Result<usize>;

    /// Releases background resources. Idempotent.
    fn close(&self) -> Result<()>;

    fn get_or_default(&self, key: &K, default: V) -> Result<V> {
        ops::get_or_default(self, key, default)
    }

    /// See [`ops::get_or_compute`].
    fn get_or_compute<F, E>(
        &self,
        key: &K,
        ttl: Option<Duration>,
        loader: F,
    ) -> std::result::Result<Option<V>, E>
    where
        Self: Sized,
        F: FnOnce(&K) -> std::result::Result<Option<V>, E>,
        E: From<CacheError>,
    {
        ops::get_or_compute(self, key, ttl, loader)
    }

    fn get_all(&self, keys: &[K]) -> Result<HashMap<K, V>> {
        ops::get_all(self, keys)
    }

    fn put_all(&self, entries: HashMap<K, V>, ttl: Option<Duration>) -> Result<()> {
        ops::put_all(self, entries, ttl)
    }

    /// Returns how many live entries were removed.
    fn remove_all(&self, keys: &[K]) -> Result<usize> {
        ops::remove_all(self, keys)
    }
}

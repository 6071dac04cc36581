//! Remote-Backed Store
//!
//! A [`Cache`] over a [`RemoteStoreAdapter`]. Every key is namespaced as
//! `"{cache}:{key}"`, values go through a pluggable serializer, and every
//! adapter or serializer failure surfaces as [`CacheError::Operation`]
//! carrying the cache name and key. Nothing is retried.

use std::collections::HashMap;
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{Cache, CacheKey, CacheStats, CacheValue, StatsSnapshot};
use crate::config::CacheConfig;
use crate::error::{CacheError, OperationFailure, Result};
use crate::remote::adapter::{RemoteStoreAdapter, TTL_MISSING, TTL_PERSISTENT};
use crate::remote::serializer::ValueSerializer;

/// Converts a TTL to whole seconds, rounding up, never below one.
/// Saturates at `u64::MAX`.
pub fn ttl_to_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs().saturating_add(u64::from(ttl.subsec_nanos() > 0));
    secs.max(1)
}

// == Remote Store ==
pub struct RemoteStore<K, V, S> {
    name: String,
    default_ttl: Option<Duration>,
    adapter: Arc<dyn RemoteStoreAdapter>,
    serializer: S,
    stats: Option<CacheStats>,
    _marker: PhantomData<fn(K) -> V>,
}

impl<K, V, S> RemoteStore<K, V, S>
where
    K: CacheKey + Display,
    V: CacheValue,
    S: ValueSerializer<V>,
{
    /// Uses the name, default TTL and stats switch of `config`; size and
    /// eviction settings do not apply to a remote store.
    pub fn new(config: &CacheConfig, adapter: Arc<dyn RemoteStoreAdapter>, serializer: S) -> Self {
        Self {
            name: config.name().to_string(),
            default_ttl: config.default_ttl(),
            adapter,
            serializer,
            stats: config.record_stats().then(CacheStats::new),
            _marker: PhantomData,
        }
    }

    pub fn adapter(&self) -> &Arc<dyn RemoteStoreAdapter> {
        &self.adapter
    }

    /// Fully qualified key as stored remotely.
    pub fn remote_key(&self, key: &K) -> String {
        format!("{}:{}", self.name, key)
    }

    /// Pings the remote store. Any failure counts as unhealthy.
    pub fn is_healthy(&self) -> bool {
        match self.adapter.ping() {
            Ok(healthy) => healthy,
            Err(e) => {
                debug!("Cache '{}': health check failed: {}", self.name, e);
                false
            }
        }
    }

    /// Sets a new expiry on an existing key.
    pub fn expire(&self, key: &K, ttl: Duration) -> Result<bool> {
        self.adapter
            .expire(&self.remote_key(key), ttl_to_secs(ttl))
            .map_err(|e| self.key_error(key, e))
    }

    /// Remaining TTL of a key. `None` for a missing key, `Some(None)` for a
    /// key without expiry.
    pub fn remaining_ttl(&self, key: &K) -> Result<Option<Option<Duration>>> {
        let ttl = self
            .adapter
            .ttl(&self.remote_key(key))
            .map_err(|e| self.key_error(key, e))?;

        Ok(match ttl {
            TTL_MISSING => None,
            TTL_PERSISTENT => Some(None),
            secs => Some(u64::try_from(secs).ok().map(Duration::from_secs)),
        })
    }

    fn key_error(&self, key: &K, source: impl Into<OperationFailure>) -> CacheError {
        CacheError::operation(self.name.clone(), Some(key.to_string()), source)
    }

    fn store_error(&self, source: impl Into<OperationFailure>) -> CacheError {
        CacheError::operation(self.name.clone(), None, source)
    }

    fn record(&self, f: impl FnOnce(&CacheStats)) {
        if let Some(stats) = &self.stats {
            f(stats);
        }
    }

    fn encode(&self, key: &K, value: &V) -> Result<Vec<u8>> {
        self.serializer
            .serialize(value)
            .map_err(|e| self.key_error(key, e))
    }

    fn decode(&self, key: &K, bytes: &[u8]) -> Result<V> {
        self.serializer
            .deserialize(bytes)
            .map_err(|e| self.key_error(key, e))
    }

    fn namespace_keys(&self) -> Result<Vec<String>> {
        let keys = self
            .adapter
            .keys_matching(&format!("{}:*", self.name))
            .map_err(|e| self.store_error(e))?;
        Ok(keys.into_iter().collect())
    }
}

impl<K, V, S> Cache<K, V> for RemoteStore<K, V, S>
where
    K: CacheKey + Display,
    V: CacheValue,
    S: ValueSerializer<V>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &K) -> Result<Option<V>> {
        let bytes = self
            .adapter
            .get(&self.remote_key(key))
            .map_err(|e| self.key_error(key, e))?;

        match bytes {
            Some(bytes) => {
                let value = self.decode(key, &bytes)?;
                self.record(CacheStats::record_hit);
                Ok(Some(value))
            }
            None => {
                self.record(CacheStats::record_miss);
                Ok(None)
            }
        }
    }

    fn put(&self, key: K, value: V, ttl: Option<Duration>) -> Result<()> {
        let bytes = self.encode(&key, &value)?;
        let remote_key = self.remote_key(&key);

        let written = match ttl.or(self.default_ttl) {
            Some(ttl) => self
                .adapter
                .set_with_ttl(&remote_key, bytes, ttl_to_secs(ttl)),
            None => self.adapter.set(&remote_key, bytes),
        };
        written.map_err(|e| self.key_error(&key, e))?;

        self.record(CacheStats::record_put);
        Ok(())
    }

    fn put_if_absent(&self, key: K, value: V, ttl: Option<Duration>) -> Result<bool> {
        let bytes = self.encode(&key, &value)?;
        let stored = self
            .adapter
            .set_if_absent(
                &self.remote_key(&key),
                bytes,
                ttl.or(self.default_ttl).map(ttl_to_secs),
            )
            .map_err(|e| self.key_error(&key, e))?;

        if stored {
            self.record(CacheStats::record_put);
        }
        Ok(stored)
    }

    fn remove(&self, key: &K) -> Result<bool> {
        let removed = self
            .adapter
            .delete(&[self.remote_key(key)])
            .map_err(|e| self.key_error(key, e))?;
        Ok(removed > 0)
    }

    fn exists(&self, key: &K) -> Result<bool> {
        self.adapter
            .exists(&self.remote_key(key))
            .map_err(|e| self.key_error(key, e))
    }

    /// Deletes every key under this cache's namespace.
    fn clear(&self) -> Result<()> {
        let keys = self.namespace_keys()?;
        if keys.is_empty() {
            return Ok(());
        }
        let removed = self.adapter.delete(&keys).map_err(|e| self.store_error(e))?;
        debug!("Cache '{}': cleared {} remote keys", self.name, removed);
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        Ok(self.namespace_keys()?.len())
    }

    fn stats(&self) -> StatsSnapshot {
        self.stats
            .as_ref()
            .map(CacheStats::snapshot)
            .unwrap_or_else(StatsSnapshot::empty)
    }

    /// The remote store expires keys itself.
    fn evict_expired(&self) -> Result<usize> {
        Ok(0)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    // == Batched Operations ==
    fn get_all(&self, keys: &[K]) -> Result<HashMap<K, V>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let remote_keys: Vec<String> = keys.iter().map(|key| self.remote_key(key)).collect();
        let values = self
            .adapter
            .multi_get(&remote_keys)
            .map_err(|e| self.store_error(e))?;

        let mut found = HashMap::with_capacity(keys.len());
        for (key, bytes) in keys.iter().zip(values) {
            match bytes {
                Some(bytes) => {
                    found.insert(key.clone(), self.decode(key, &bytes)?);
                    self.record(CacheStats::record_hit);
                }
                None => self.record(CacheStats::record_miss),
            }
        }
        Ok(found)
    }

    /// One batched write when no TTL applies; the batch call carries no
    /// expiry, so TTL'd entries are written one by one.
    fn put_all(&self, entries: HashMap<K, V>, ttl: Option<Duration>) -> Result<()> {
        if ttl.or(self.default_ttl).is_some() {
            return crate::cache::ops::put_all(self, entries, ttl);
        }

        let mut encoded = HashMap::with_capacity(entries.len());
        for (key, value) in &entries {
            encoded.insert(self.remote_key(key), self.encode(key, value)?);
        }
        self.adapter
            .multi_set(encoded)
            .map_err(|e| self.store_error(e))?;

        for _ in 0..entries.len() {
            self.record(CacheStats::record_put);
        }
        Ok(())
    }

    fn remove_all(&self, keys: &[K]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let remote_keys: Vec<String> = keys.iter().map(|key| self.remote_key(key)).collect();
        self.adapter
            .delete(&remote_keys)
            .map_err(|e| self.store_error(e))
    }
}

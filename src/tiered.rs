//! Tiered Cache
//!
//! Composes a small, short-lived [`LocalStore`] (tier 1) in front of an
//! authoritative store (tier 2, normally a [`crate::remote::RemoteStore`]).
//!
//! Writes go to tier 2 first and only then to tier 1, so a failed remote
//! write never leaves a local value behind. Tier-1 entries live at most
//! `local_ttl`, which bounds how stale this instance can be relative to
//! writes made through other instances.

use std::time::Duration;

use tracing::warn;

use crate::cache::{Cache, CacheKey, CacheStats, CacheValue, LocalStore, StatsSnapshot};
use crate::error::Result;

pub struct TieredCache<K: CacheKey, V: CacheValue, R> {
    local: LocalStore<K, V>,
    remote: R,
    local_ttl: Duration,
    stats: CacheStats,
}

impl<K, V, R> TieredCache<K, V, R>
where
    K: CacheKey,
    V: CacheValue,
    R: Cache<K, V>,
{
    pub fn new(local: LocalStore<K, V>, remote: R, local_ttl: Duration) -> Self {
        Self {
            local,
            remote,
            local_ttl,
            stats: CacheStats::new(),
        }
    }

    pub fn local(&self) -> &LocalStore<K, V> {
        &self.local
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn local_ttl(&self) -> Duration {
        self.local_ttl
    }

    /// Caps a write TTL at the local TTL.
    fn effective_local_ttl(&self, ttl: Option<Duration>) -> Duration {
        ttl.map_or(self.local_ttl, |ttl| ttl.min(self.local_ttl))
    }
}

impl<K, V, R> Cache<K, V> for TieredCache<K, V, R>
where
    K: CacheKey,
    V: CacheValue,
    R: Cache<K, V>,
{
    fn name(&self) -> &str {
        self.remote.name()
    }

    // == Read Path ==
    /// Tier 1, then tier 2. A tier-2 hit is copied into tier 1 for
    /// `local_ttl` unless a write landed there meanwhile. Remote errors
    /// propagate; there is no stale fallback.
    fn get(&self, key: &K) -> Result<Option<V>> {
        if let Some(value) = self.local.get(key)? {
            self.stats.record_hit();
            return Ok(Some(value));
        }

        match self.remote.get(key)? {
            Some(value) => {
                // Never replaces a value written by a concurrent put
                self.local
                    .put_if_absent(key.clone(), value.clone(), Some(self.local_ttl))?;
                self.stats.record_hit();
                Ok(Some(value))
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Write Path ==
    fn put(&self, key: K, value: V, ttl: Option<Duration>) -> Result<()> {
        self.remote.put(key.clone(), value.clone(), ttl)?;
        self.local.put(key, value, Some(self.effective_local_ttl(ttl)))?;
        self.stats.record_put();
        Ok(())
    }

    /// Tier 2 decides absence; tier 1 is populated only when it stored.
    fn put_if_absent(&self, key: K, value: V, ttl: Option<Duration>) -> Result<bool> {
        let stored = self.remote.put_if_absent(key.clone(), value.clone(), ttl)?;
        if stored {
            self.local.put(key, value, Some(self.effective_local_ttl(ttl)))?;
            self.stats.record_put();
        }
        Ok(stored)
    }

    fn remove(&self, key: &K) -> Result<bool> {
        if let Err(e) = self.local.remove(key) {
            warn!("Cache '{}': local remove failed: {}", self.name(), e);
        }
        self.remote.remove(key)
    }

    fn exists(&self, key: &K) -> Result<bool> {
        Ok(self.local.exists(key)? || self.remote.exists(key)?)
    }

    fn clear(&self) -> Result<()> {
        if let Err(e) = self.local.clear() {
            warn!("Cache '{}': local clear failed: {}", self.name(), e);
        }
        self.remote.clear()
    }

    /// Tier 2's count.
    fn size(&self) -> Result<usize> {
        self.remote.size()
    }

    fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn evict_expired(&self) -> Result<usize> {
        Ok(self.local.evict_expired()? + self.remote.evict_expired()?)
    }

    /// Closes both tiers; reports the first failure.
    fn close(&self) -> Result<()> {
        let local = self.local.close();
        let remote = self.remote.close();
        local.and(remote)
    }
}

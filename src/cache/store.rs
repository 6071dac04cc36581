//! Local Store Module
//!
//! The in-process eviction engine: a sharded concurrent map of entries,
//! an access order for LRU, capacity enforcement with policy dispatch, and
//! lazy plus active expiration.
//!
//! # Locking
//!
//! Reads go straight to the concurrent map and never block on the store
//! lock; a hit only *tries* to promote its key in the access order, so LRU
//! recency is approximate when readers contend. Every structural change
//! (insert, remove, eviction, expiry sweep, clear) happens under the
//! store-wide write lock, which keeps the map and the access order in step.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::cache::eviction::select_victim;
use crate::cache::{
    AccessOrder, Cache, CacheEntry, CacheKey, CacheStats, CacheValue, StatsSnapshot,
};
use crate::config::{CacheConfig, EvictionPolicy};
use crate::error::{CacheError, Result};
use crate::tasks::{ExpirySweeper, Sweep, SHUTDOWN_GRACE};

// == Local Store ==
/// Thread-safe in-memory cache with eviction and TTL support.
pub struct LocalStore<K: CacheKey, V: CacheValue> {
    inner: Arc<StoreInner<K, V>>,
    sweeper: Mutex<Option<ExpirySweeper>>,
}

/// Read-only view of an entry's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    pub age: Duration,
    pub idle_time: Duration,
    pub access_count: u64,
    pub remaining_ttl: Option<Duration>,
}

struct StoreInner<K: CacheKey, V: CacheValue> {
    config: CacheConfig,
    entries: DashMap<K, CacheEntry<V>>,
    order: RwLock<AccessOrder<K>>,
    stats: Option<CacheStats>,
}

enum Lookup<V> {
    Missing,
    Expired,
    Idle,
    Hit(V),
}

impl<K: CacheKey, V: CacheValue> LocalStore<K, V> {
    // == Constructor ==
    /// Creates a store for `config` and starts its expiry sweeper.
    pub fn new(config: CacheConfig) -> Result<Self> {
        let inner = Arc::new(StoreInner {
            entries: DashMap::with_shard_amount(config.shard_amount()),
            order: RwLock::new(AccessOrder::new()),
            stats: config.record_stats().then(CacheStats::new),
            config,
        });

        let sweeper = ExpirySweeper::spawn(
            Arc::downgrade(&inner),
            inner.config.name(),
            inner.config.sweep_interval(),
        )
        .map_err(|e| {
            CacheError::Internal(format!(
                "failed to start expiry sweeper for '{}': {e}",
                inner.config.name()
            ))
        })?;

        Ok(Self {
            inner,
            sweeper: Mutex::new(Some(sweeper)),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Snapshot of the keys of live entries, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.inner.live_keys()
    }

    /// Bookkeeping of a live entry. Does not count as an access.
    pub fn entry_metadata(&self, key: &K) -> Option<EntryMetadata> {
        let entry = self.inner.entries.get(key)?;
        if !self.inner.is_live(&entry, Instant::now()) {
            return None;
        }
        Some(EntryMetadata {
            age: entry.age(),
            idle_time: entry.idle_time(),
            access_count: entry.access_count(),
            remaining_ttl: entry.remaining_ttl(),
        })
    }

    /// Zeroes the statistics counters.
    pub fn reset_stats(&self) {
        if let Some(stats) = &self.inner.stats {
            stats.reset();
        }
    }

    pub fn is_sweeper_running(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(ExpirySweeper::is_running)
    }

    fn stop_sweeper(&self) {
        let sweeper = self.sweeper.lock().take();
        if let Some(sweeper) = sweeper {
            sweeper.stop(SHUTDOWN_GRACE);
        }
    }
}

impl<K: CacheKey, V: CacheValue> Cache<K, V> for LocalStore<K, V> {
    fn name(&self) -> &str {
        self.inner.config.name()
    }

    fn get(&self, key: &K) -> Result<Option<V>> {
        Ok(self.inner.get(key))
    }

    fn put(&self, key: K, value: V, ttl: Option<Duration>) -> Result<()> {
        self.inner.put(key, value, ttl);
        Ok(())
    }

    fn put_if_absent(&self, key: K, value: V, ttl: Option<Duration>) -> Result<bool> {
        Ok(self.inner.put_if_absent(key, value, ttl))
    }

    fn remove(&self, key: &K) -> Result<bool> {
        Ok(self.inner.remove(key))
    }

    fn exists(&self, key: &K) -> Result<bool> {
        Ok(self
            .inner
            .entries
            .get(key)
            .is_some_and(|entry| self.inner.is_live(&entry, Instant::now())))
    }

    fn clear(&self) -> Result<()> {
        self.inner.clear();
        Ok(())
    }

    /// Counts stored entries, including expired ones not yet swept.
    fn size(&self) -> Result<usize> {
        Ok(self.inner.entries.len())
    }

    fn stats(&self) -> StatsSnapshot {
        self.inner
            .stats
            .as_ref()
            .map(CacheStats::snapshot)
            .unwrap_or_else(StatsSnapshot::empty)
    }

    fn evict_expired(&self) -> Result<usize> {
        Ok(self.inner.sweep_expired())
    }

    /// Stops the sweeper, then drops every entry.
    fn close(&self) -> Result<()> {
        self.stop_sweeper();
        self.inner.clear();
        debug!("Cache '{}' closed", self.inner.config.name());
        Ok(())
    }
}

impl<K: CacheKey, V: CacheValue> Drop for LocalStore<K, V> {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get_mut().take() {
            sweeper.stop(SHUTDOWN_GRACE);
        }
    }
}

impl<K: CacheKey, V: CacheValue> Sweep for StoreInner<K, V> {
    fn sweep_expired(&self) -> usize {
        let mut order = self.order.write();
        self.purge_expired(&mut order)
    }

    fn sweep_name(&self) -> &str {
        self.config.name()
    }
}

impl<K: CacheKey, V: CacheValue> StoreInner<K, V> {
    fn record(&self, f: impl FnOnce(&CacheStats)) {
        if let Some(stats) = &self.stats {
            f(stats);
        }
    }

    fn is_idle(&self, entry: &CacheEntry<V>) -> bool {
        self.config
            .max_idle_time()
            .is_some_and(|max_idle| entry.idle_time() > max_idle)
    }

    fn is_live(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        !entry.is_expired_at(now) && !self.is_idle(entry)
    }

    // == Get ==
    /// Returns the value if found, not expired and not idle too long.
    /// Expired and idle entries are removed on the spot and count as misses.
    fn get(&self, key: &K) -> Option<V> {
        let lookup = match self.entries.get(key) {
            None => Lookup::Missing,
            Some(entry) if entry.is_expired() => Lookup::Expired,
            Some(entry) if self.is_idle(&entry) => Lookup::Idle,
            Some(entry) => {
                entry.record_access();
                Lookup::Hit(entry.value.clone())
            }
        };

        match lookup {
            Lookup::Hit(value) => {
                // Skipped under contention; recency is best-effort
                if let Some(mut order) = self.order.try_write() {
                    order.promote(key);
                }
                self.record(CacheStats::record_hit);
                Some(value)
            }
            Lookup::Missing => {
                self.record(CacheStats::record_miss);
                None
            }
            Lookup::Expired => {
                if self.remove_if(key, CacheEntry::is_expired) {
                    self.record(|stats| stats.record_expirations(1));
                }
                self.record(CacheStats::record_miss);
                None
            }
            Lookup::Idle => {
                if self.remove_if(key, |entry| self.is_idle(entry)) {
                    debug!("Cache '{}': dropped idle entry", self.config.name());
                }
                self.record(CacheStats::record_miss);
                None
            }
        }
    }

    // == Put ==
    /// Inserts or replaces an entry. A new key first makes room, one victim
    /// at a time, so the size never exceeds `max_size`.
    fn put(&self, key: K, value: V, ttl: Option<Duration>) {
        let entry = CacheEntry::new(value, ttl.or(self.config.default_ttl()));

        let mut order = self.order.write();
        if !self.entries.contains_key(&key) {
            self.make_room(&mut order);
        }
        self.entries.insert(key.clone(), entry);
        order.touch(key);
        self.record(CacheStats::record_put);
    }

    fn put_if_absent(&self, key: K, value: V, ttl: Option<Duration>) -> bool {
        let mut order = self.order.write();
        let now = Instant::now();

        if let Some((_, stale)) = self
            .entries
            .remove_if(&key, |_, entry| !self.is_live(entry, now))
        {
            order.remove(&key);
            if stale.is_expired_at(now) {
                self.record(|stats| stats.record_expirations(1));
            }
        }
        if self.entries.contains_key(&key) {
            return false;
        }

        self.make_room(&mut order);
        let entry = CacheEntry::new(value, ttl.or(self.config.default_ttl()));
        self.entries.insert(key.clone(), entry);
        order.touch(key);
        self.record(CacheStats::record_put);
        true
    }

    // == Remove ==
    fn remove(&self, key: &K) -> bool {
        let mut order = self.order.write();
        let Some((_, entry)) = self.entries.remove(key) else {
            return false;
        };
        order.remove(key);

        let now = Instant::now();
        if entry.is_expired_at(now) {
            self.record(|stats| stats.record_expirations(1));
        }
        self.is_live(&entry, now)
    }

    fn remove_if(&self, key: &K, predicate: impl Fn(&CacheEntry<V>) -> bool) -> bool {
        let mut order = self.order.write();
        let removed = self
            .entries
            .remove_if(key, |_, entry| predicate(entry))
            .is_some();
        if removed {
            order.remove(key);
        }
        removed
    }

    fn clear(&self) {
        let mut order = self.order.write();
        self.entries.clear();
        order.clear();
    }

    fn live_keys(&self) -> Vec<K> {
        let _order = self.order.read();
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| self.is_live(entry.value(), now))
            .map(|entry| entry.key().clone())
            .collect()
    }

    // == Eviction ==
    fn make_room(&self, order: &mut AccessOrder<K>) {
        while self.entries.len() >= self.config.max_size() {
            if !self.evict_one(order) {
                break;
            }
        }
    }

    /// Evicts one entry per the configured policy. TTL-only first purges
    /// expired entries and only evicts a live one if none had expired.
    fn evict_one(&self, order: &mut AccessOrder<K>) -> bool {
        let policy = self.config.eviction_policy();
        if policy == EvictionPolicy::TtlOnly && self.purge_expired(order) > 0 {
            return true;
        }

        let Some(victim) = select_victim(policy, &self.entries, order) else {
            return false;
        };
        order.remove(&victim);
        if self.entries.remove(&victim).is_some() {
            self.record(CacheStats::record_eviction);
            debug!(
                "Cache '{}': evicted one entry ({} policy)",
                self.config.name(),
                policy
            );
        }
        true
    }

    // == Cleanup Expired ==
    /// Removes all expired entries; the caller holds the write lock.
    fn purge_expired(&self, order: &mut AccessOrder<K>) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in expired_keys {
            if self
                .entries
                .remove_if(&key, |_, entry| entry.is_expired_at(now))
                .is_some()
            {
                order.remove(&key);
                removed += 1;
            }
        }

        self.record(|stats| stats.record_expirations(removed as u64));
        removed
    }
}

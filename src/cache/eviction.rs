//! Eviction Policy Dispatch
//!
//! Picks exactly one victim for a full local store. LRU reads the access
//! order in O(1); FIFO, LFU and TTL-only scan every entry (O(n)), so they
//! suit small or moderately sized stores. Ties between equal candidates
//! resolve to whichever the map yields first.
//!
//! Selection runs under the store's structural lock, but readers keep
//! recording accesses concurrently, so under contention the choice is
//! approximate: a victim may have been touched a moment ago.

use dashmap::DashMap;

use crate::cache::{AccessOrder, CacheEntry, CacheKey};
use crate::config::EvictionPolicy;

// == Select Victim ==
/// Returns the key `policy` would evict, or None when nothing is stored.
pub(crate) fn select_victim<K: CacheKey, V>(
    policy: EvictionPolicy,
    entries: &DashMap<K, CacheEntry<V>>,
    order: &AccessOrder<K>,
) -> Option<K> {
    match policy {
        EvictionPolicy::Lru | EvictionPolicy::None => order.peek_oldest().cloned(),
        EvictionPolicy::Fifo => oldest_created(entries),
        EvictionPolicy::Lfu => least_accessed(entries),
        EvictionPolicy::TtlOnly => soonest_expiring(entries),
    }
}

fn oldest_created<K: CacheKey, V>(entries: &DashMap<K, CacheEntry<V>>) -> Option<K> {
    entries
        .iter()
        .min_by_key(|entry| entry.created_at())
        .map(|entry| entry.key().clone())
}

fn least_accessed<K: CacheKey, V>(entries: &DashMap<K, CacheEntry<V>>) -> Option<K> {
    entries
        .iter()
        .min_by_key(|entry| entry.access_count())
        .map(|entry| entry.key().clone())
}

/// Entries without a deadline sort after every entry with one.
fn soonest_expiring<K: CacheKey, V>(entries: &DashMap<K, CacheEntry<V>>) -> Option<K> {
    entries
        .iter()
        .min_by_key(|entry| (entry.expires_at().is_none(), entry.expires_at()))
        .map(|entry| entry.key().clone())
}

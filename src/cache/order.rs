//! Access Order Module
//!
//! Tracks recency for LRU eviction. Backed by an unbounded
//! [`lru::LruCache`] used purely as an ordered key index, so touching,
//! removing and peeking at the oldest key are all O(1).

use std::hash::Hash;

use lru::LruCache;

// == Access Order ==
/// Keys ordered from least to most recently touched.
#[derive(Debug)]
pub struct AccessOrder<K: Hash + Eq> {
    order: LruCache<K, ()>,
}

impl<K: Hash + Eq> AccessOrder<K> {
    pub fn new() -> Self {
        Self {
            order: LruCache::unbounded(),
        }
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if unknown.
    pub fn touch(&mut self, key: K) {
        self.order.put(key, ());
    }

    /// Marks a known key as most recently used; unknown keys are ignored.
    pub fn promote(&mut self, key: &K) {
        self.order.promote(key);
    }

    pub fn remove(&mut self, key: &K) {
        self.order.pop(key);
    }

    pub fn peek_oldest(&self) -> Option<&K> {
        self.order.peek_lru().map(|(key, ())| key)
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}

// Inspection helpers used by the unit tests
#[cfg(test)]
impl<K: Hash + Eq> AccessOrder<K> {
    /// Returns and removes the least recently used key.
    pub fn pop_oldest(&mut self) -> Option<K> {
        self.order.pop_lru().map(|(key, ())| key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.order.contains(key)
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter().map(|(key, ())| key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<K: Hash + Eq> Default for AccessOrder<K> {
    fn default() -> Self {
        Self::new()
    }
}

//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.
//! The value and timestamps are fixed at creation; access bookkeeping is
//! interior-mutable so readers can record hits through a shared reference.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    created_at: Instant,
    /// None = no expiration
    expires_at: Option<Instant>,
    /// Nanoseconds after `created_at`; keeps last access >= creation
    last_access_offset_nanos: AtomicU64,
    access_count: AtomicU64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    pub fn new(value: V, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            // An overflowing deadline is as good as no deadline
            expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
            last_access_offset_nanos: AtomicU64::new(0),
            access_count: AtomicU64::new(0),
        }
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn last_accessed_at(&self) -> Instant {
        let offset = self.last_access_offset_nanos.load(Ordering::Relaxed);
        self.created_at + Duration::from_nanos(offset)
    }

    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Relaxed)
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry expires once the current time is strictly past its deadline.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires| now > expires)
    }

    // == Time To Live ==
    /// Returns remaining TTL, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn remaining_ttl(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }

    // == Access Bookkeeping ==
    /// Marks the entry as read now.
    ///
    /// Safe to call concurrently; concurrent callers may interleave their
    /// timestamp stores, but the stored offset only ever moves forward.
    pub fn record_access(&self) {
        let offset = Instant::now()
            .saturating_duration_since(self.created_at)
            .as_nanos()
            .min(u128::from(u64::MAX)) as u64;
        self.last_access_offset_nanos
            .fetch_max(offset, Ordering::Relaxed);
        self.access_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Time since creation.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Time since the last read, or since creation if never read.
    pub fn idle_time(&self) -> Duration {
        Instant::now().saturating_duration_since(self.last_accessed_at())
    }
}

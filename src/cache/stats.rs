//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, puts,
//! evictions and expirations. Counters are independent atomics; a
//! [`StatsSnapshot`] is a monitoring view, not a linearizable one.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

// == Cache Stats ==
/// Lock-free cache counters.
#[derive(Debug)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    start_time: Mutex<DateTime<Utc>>,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            puts: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            start_time: Mutex::new(Utc::now()),
        }
    }
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records `count` expirations at once (lazy expiry records one,
    /// a sweep records its whole batch).
    pub fn record_expirations(&self, count: u64) {
        if count > 0 {
            self.expirations.fetch_add(count, Ordering::Relaxed);
        }
    }

    // == Snapshot ==
    /// Copies the counters into an immutable snapshot.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            start_time: *self.start_time.lock(),
            captured_at: Utc::now(),
        }
    }

    // == Reset ==
    /// Zeroes every counter and restarts the clock.
    ///
    /// Increments racing with a reset may land on either side of it
    /// (last write wins); callers needing an exact zero must quiesce the
    /// cache first.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.puts.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.expirations.store(0, Ordering::Relaxed);
        *self.start_time.lock() = Utc::now();
    }
}

// == Stats Snapshot ==
/// Point-in-time copy of a cache's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// When counting started (creation or last reset)
    pub start_time: DateTime<Utc>,
    /// When this snapshot was taken
    pub captured_at: DateTime<Utc>,
}

impl StatsSnapshot {
    /// A snapshot for a cache that does not record statistics.
    pub fn empty() -> Self {
        let now = Utc::now();
        Self {
            hits: 0,
            misses: 0,
            puts: 0,
            evictions: 0,
            expirations: 0,
            start_time: now,
            captured_at: now,
        }
    }

    pub fn request_count(&self) -> u64 {
        self.hits + self.misses
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.request_count();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Returns misses / (hits + misses), or 0.0 if no requests have been made.
    pub fn miss_rate(&self) -> f64 {
        if self.request_count() == 0 {
            0.0
        } else {
            1.0 - self.hit_rate()
        }
    }

    /// Time covered by the counters.
    pub fn uptime(&self) -> chrono::Duration {
        self.captured_at - self.start_time
    }
}

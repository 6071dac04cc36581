//! In-Memory Adapter
//!
//! A process-local [`RemoteStoreAdapter`] with lazy per-key expiry. Useful
//! in tests and single-process deployments; it can be switched offline to
//! simulate an outage.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::remote::adapter::{RemoteError, RemoteStoreAdapter, TTL_MISSING, TTL_PERSISTENT};

#[derive(Debug, Clone)]
struct StoredValue {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(bytes: Vec<u8>, ttl_secs: Option<u64>) -> Self {
        let expires_at =
            ttl_secs.and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs)));
        Self { bytes, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// DashMap-backed key-value store speaking the adapter contract.
#[derive(Debug)]
pub struct InMemoryAdapter {
    data: DashMap<String, StoredValue>,
    available: AtomicBool,
}

impl Default for InMemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// While offline every call fails with [`RemoteError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored keys, expired ones included.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check_available(&self) -> Result<(), RemoteError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("in-memory adapter is offline".to_string()))
        }
    }

    /// Drops `key` if it has expired; returns the live value otherwise.
    fn live(&self, key: &str) -> Option<StoredValue> {
        self.data.remove_if(key, |_, value| value.is_expired());
        self.data.get(key).map(|value| value.value().clone())
    }
}

impl RemoteStoreAdapter for InMemoryAdapter {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RemoteError> {
        self.check_available()?;
        Ok(self.live(key).map(|value| value.bytes))
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), RemoteError> {
        self.check_available()?;
        self.data.insert(key.to_string(), StoredValue::new(value, None));
        Ok(())
    }

    fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<(), RemoteError> {
        self.check_available()?;
        self.data
            .insert(key.to_string(), StoredValue::new(value, Some(ttl_secs)));
        Ok(())
    }

    fn set_if_absent(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_secs: Option<u64>,
    ) -> Result<bool, RemoteError> {
        self.check_available()?;
        self.data.remove_if(key, |_, stored| stored.is_expired());

        let mut stored = false;
        self.data.entry(key.to_string()).or_insert_with(|| {
            stored = true;
            StoredValue::new(value, ttl_secs)
        });
        Ok(stored)
    }

    fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, RemoteError> {
        self.check_available()?;
        Ok(keys
            .iter()
            .map(|key| self.live(key).map(|value| value.bytes))
            .collect())
    }

    fn multi_set(&self, entries: HashMap<String, Vec<u8>>) -> Result<(), RemoteError> {
        self.check_available()?;
        for (key, value) in entries {
            self.data.insert(key, StoredValue::new(value, None));
        }
        Ok(())
    }

    fn delete(&self, keys: &[String]) -> Result<usize, RemoteError> {
        self.check_available()?;
        Ok(keys
            .iter()
            .filter_map(|key| self.data.remove(key))
            .filter(|(_, value)| !value.is_expired())
            .count())
    }

    fn exists(&self, key: &str) -> Result<bool, RemoteError> {
        self.check_available()?;
        Ok(self.live(key).is_some())
    }

    fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, RemoteError> {
        self.check_available()?;
        self.data.remove_if(key, |_, value| value.is_expired());
        match self.data.get_mut(key) {
            Some(mut value) => {
                value.expires_at = Instant::now().checked_add(Duration::from_secs(ttl_secs));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn ttl(&self, key: &str) -> Result<i64, RemoteError> {
        self.check_available()?;
        let ttl = match self.live(key) {
            None => TTL_MISSING,
            Some(StoredValue {
                expires_at: None, ..
            }) => TTL_PERSISTENT,
            Some(StoredValue {
                expires_at: Some(at),
                ..
            }) => {
                let remaining = at.saturating_duration_since(Instant::now());
                i64::try_from(remaining.as_secs()).unwrap_or(i64::MAX)
            }
        };
        Ok(ttl)
    }

    fn keys_matching(&self, pattern: &str) -> Result<HashSet<String>, RemoteError> {
        self.check_available()?;
        Ok(self
            .data
            .iter()
            .filter(|entry| !entry.value().is_expired() && glob_match(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect())
    }

    fn ping(&self) -> Result<bool, RemoteError> {
        self.check_available()?;
        Ok(true)
    }
}

/// Matches `*` (any run, including empty) and `?` (one char).
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

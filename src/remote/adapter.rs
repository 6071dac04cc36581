//! Remote Store Adapter
//!
//! The boundary to an external key-value server. The core drives it but
//! never implements the wire protocol; connection pooling, timeouts and
//! retries belong to the adapter.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

/// `ttl` result for a key that does not exist.
pub const TTL_MISSING: i64 = -2;

/// `ttl` result for a key that exists without an expiry.
pub const TTL_PERSISTENT: i64 = -1;

/// Failures reported by a remote store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    #[error("command failed: {0}")]
    Command(String),

    #[error("remote store timed out")]
    Timeout,
}

// == Adapter Contract ==
/// Operations a remote key-value server must provide.
///
/// Keys arrive fully qualified (`"{cache}:{key}"`); values are opaque
/// bytes. TTLs are whole seconds.
pub trait RemoteStoreAdapter: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RemoteError>;

    /// Stores without an expiry.
    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), RemoteError>;

    fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<(), RemoteError>;

    /// Stores only when the key is absent. Returns whether it was stored.
    fn set_if_absent(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_secs: Option<u64>,
    ) -> Result<bool, RemoteError>;

    /// One slot per requested key, in request order.
    fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, RemoteError>;

    fn multi_set(&self, entries: HashMap<String, Vec<u8>>) -> Result<(), RemoteError>;

    /// Returns how many of `keys` existed.
    fn delete(&self, keys: &[String]) -> Result<usize, RemoteError>;

    fn exists(&self, key: &str) -> Result<bool, RemoteError>;

    /// Sets an expiry on an existing key. False when the key is absent.
    fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, RemoteError>;

    /// Remaining seconds, [`TTL_PERSISTENT`] or [`TTL_MISSING`].
    fn ttl(&self, key: &str) -> Result<i64, RemoteError>;

    /// Keys matching a glob pattern (`*` and `?`).
    fn keys_matching(&self, pattern: &str) -> Result<HashSet<String>, RemoteError>;

    fn ping(&self) -> Result<bool, RemoteError>;
}

//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

use crate::remote::{RemoteError, SerializationError};

// == Cache Error Enum ==
/// Unified error type for every cache implementation.
///
/// Local stores never produce an error for ordinary misses; only
/// configuration and remote-backed operations can fail.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid builder or environment configuration
    #[error("Invalid cache configuration: {0}")]
    Config(String),

    /// A remote-backed operation failed
    #[error("Cache '{cache}' operation failed{}: {source}", key_suffix(.key))]
    Operation {
        /// Name of the cache the operation ran against
        cache: String,
        /// Logical key involved, when the operation targeted one key
        key: Option<String>,
        /// Underlying failure
        #[source]
        source: OperationFailure,
    },

    /// Internal failure (thread spawn, missing runtime)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Builds an operation error for `cache`, optionally scoped to `key`.
    pub fn operation(
        cache: impl Into<String>,
        key: Option<String>,
        source: impl Into<OperationFailure>,
    ) -> Self {
        CacheError::Operation {
            cache: cache.into(),
            key,
            source: source.into(),
        }
    }

    /// Returns true for failures surfaced by the remote tier.
    pub fn is_operation(&self) -> bool {
        matches!(self, CacheError::Operation { .. })
    }
}

fn key_suffix(key: &Option<String>) -> String {
    key.as_ref()
        .map(|k| format!(" for key '{k}'"))
        .unwrap_or_default()
}

// == Operation Failure ==
/// What went wrong inside a remote-backed operation.
#[derive(Error, Debug)]
pub enum OperationFailure {
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;

//! Shared Cache Operations
//!
//! Bulk and compute helpers written once against the single-key
//! [`Cache`] methods. Every implementation gets them through the trait's
//! provided methods and can call them directly when overriding.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{Cache, CacheKey, CacheValue};
use crate::error::{CacheError, Result};

/// Returns the cached value or `default` on a miss. Nothing is stored.
pub fn get_or_default<K, V, C>(cache: &C, key: &K, default: V) -> Result<V>
where
    K: CacheKey,
    V: CacheValue,
    C: Cache<K, V> + ?Sized,
{
    Ok(cache.get(key)?.unwrap_or(default))
}

/// Returns the cached value, or invokes `loader` on a miss.
///
/// A `Some` from the loader is stored with `ttl` (or the cache default)
/// before being returned. A `None` is returned without caching anything.
/// Loader errors are passed through unchanged and leave the cache as it
/// was.
pub fn get_or_compute<K, V, C, F, E>(
    cache: &C,
    key: &K,
    ttl: Option<Duration>,
    loader: F,
) -> std::result::Result<Option<V>, E>
where
    K: CacheKey,
    V: CacheValue,
    C: Cache<K, V> + ?Sized,
    F: FnOnce(&K) -> std::result::Result<Option<V>, E>,
    E: From<CacheError>,
{
    if let Some(value) = cache.get(key)? {
        return Ok(Some(value));
    }

    match loader(key)? {
        Some(value) => {
            cache.put(key.clone(), value.clone(), ttl)?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Looks up every key; misses are simply absent from the result.
pub fn get_all<K, V, C>(cache: &C, keys: &[K]) -> Result<HashMap<K, V>>
where
    K: CacheKey,
    V: CacheValue,
    C: Cache<K, V> + ?Sized,
{
    let mut found = HashMap::with_capacity(keys.len());
    for key in keys {
        if let Some(value) = cache.get(key)? {
            found.insert(key.clone(), value);
        }
    }
    Ok(found)
}

/// Stores every entry with the same TTL. Stops at the first failure;
/// entries written before it stay written.
pub fn put_all<K, V, C>(cache: &C, entries: HashMap<K, V>, ttl: Option<Duration>) -> Result<()>
where
    K: CacheKey,
    V: CacheValue,
    C: Cache<K, V> + ?Sized,
{
    for (key, value) in entries {
        cache.put(key, value, ttl)?;
    }
    Ok(())
}

/// Removes every key and counts the live entries removed.
pub fn remove_all<K, V, C>(cache: &C, keys: &[K]) -> Result<usize>
where
    K: CacheKey,
    V: CacheValue,
    C: Cache<K, V> + ?Sized,
{
    let mut removed = 0;
    for key in keys {
        if cache.remove(key)? {
            removed += 1;
        }
    }
    Ok(removed)
}

//! Async Wrappers
//!
//! Submits synchronous cache calls to tokio's blocking pool. Each call
//! returns the task's [`JoinHandle`]; there is no ordering guarantee
//! relative to synchronous calls on the same cache.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::cache::{Cache, CacheKey, CacheValue};
use crate::error::{CacheError, Result};

pub struct AsyncCache<K, V, C> {
    cache: Arc<C>,
    handle: Handle,
    _marker: PhantomData<fn(K) -> V>,
}

impl<K, V, C> Clone for AsyncCache<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            handle: self.handle.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V, C> AsyncCache<K, V, C>
where
    K: CacheKey,
    V: CacheValue,
    C: Cache<K, V> + 'static,
{
    pub fn new(cache: Arc<C>, handle: Handle) -> Self {
        Self {
            cache,
            handle,
            _marker: PhantomData,
        }
    }

    /// Binds to the runtime of the calling context.
    pub fn current(cache: Arc<C>) -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| CacheError::Internal(format!("no tokio runtime available: {e}")))?;
        Ok(Self::new(cache, handle))
    }

    /// The wrapped synchronous cache.
    pub fn inner(&self) -> &Arc<C> {
        &self.cache
    }

    pub fn get(&self, key: K) -> JoinHandle<Result<Option<V>>> {
        let cache = Arc::clone(&self.cache);
        self.handle.spawn_blocking(move || cache.get(&key))
    }

    pub fn put(&self, key: K, value: V, ttl: Option<Duration>) -> JoinHandle<Result<()>> {
        let cache = Arc::clone(&self.cache);
        self.handle.spawn_blocking(move || cache.put(key, value, ttl))
    }

    pub fn remove(&self, key: K) -> JoinHandle<Result<bool>> {
        let cache = Arc::clone(&self.cache);
        self.handle.spawn_blocking(move || cache.remove(&key))
    }

    pub fn clear(&self) -> JoinHandle<Result<()>> {
        let cache = Arc::clone(&self.cache);
        self.handle.spawn_blocking(move || cache.clear())
    }
}

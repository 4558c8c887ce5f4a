//! LRU cache for artifacts compiled from lazy graphs (executables, lowered programs, ...).

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use tracing::debug;

use super::signature::GraphSignature;
use super::GraphConfig;

/// Thread-safe LRU map from [`GraphSignature`] to a shared computation.
pub struct ComputationCache<T> {
    entries: Mutex<LruCache<GraphSignature, Arc<T>>>,
}

impl<T> ComputationCache<T> {
    /// Creates a cache holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(config.cache_capacity)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<GraphSignature, Arc<T>>> {
        // Entries are only ever replaced wholesale, so a poisoned guard is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached computation and marks it most recently used.
    pub fn get(&self, key: &GraphSignature) -> Option<Arc<T>> {
        let hit = self.lock().get(key).cloned();
        debug!(signature = %key, hit = hit.is_some(), "computation cache lookup");
        hit
    }

    /// Stores `value`, evicting the least recently used entry when full.
    pub fn insert(&self, key: GraphSignature, value: T) -> Arc<T> {
        let value = Arc::new(value);
        if let Some((evicted, _)) = self.lock().push(key, Arc::clone(&value)) {
            if evicted != key {
                debug!(signature = %evicted, "computation cache evicted entry");
            }
        }
        value
    }

    /// Returns the cached entry for `key` or compiles and stores a new one.
    ///
    /// The lock is not held while `compile` runs, so concurrent misses may compile twice; the
    /// last insert wins.
    pub fn get_or_try_insert_with<E, F>(&self, key: GraphSignature, compile: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let value = compile()?;
        Ok(self.insert(key, value))
    }

    pub fn contains(&self, key: &GraphSignature) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

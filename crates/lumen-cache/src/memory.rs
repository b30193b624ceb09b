//! Bounded in-memory cache.
//!
//! Each bucket holds at most `capacity` entries. Inserting into a full bucket
//! evicts the least recently used entry; a successful `get` counts as a use.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use crate::{Cache, CacheBucket};

/// Default number of entries per bucket.
pub const DEFAULT_CAPACITY: usize = 1024;

struct Entry {
    etag: String,
    value: Vec<u8>,
}

type Store = Arc<Mutex<LruCache<String, Entry>>>;

/// In-memory [`Cache`] whose buckets are bounded LRU maps.
///
/// Buckets live as long as the cache; opening a name twice shares storage.
pub struct MemoryCache {
    capacity: NonZeroUsize,
    buckets: Mutex<HashMap<String, Store>>,
}

impl MemoryCache {
    /// Create a cache with `capacity` entries per bucket.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            buckets: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Cache for MemoryCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let store = buckets
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(LruCache::new(self.capacity))));
        Box::new(MemoryCacheBucket {
            store: Arc::clone(store),
        })
    }
}

/// A single bounded LRU bucket.
///
/// Can be used on its own when only one bucket is needed.
pub struct MemoryCacheBucket {
    store: Store,
}

impl MemoryCacheBucket {
    /// Create a standalone bucket holding at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            store: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Number of entries currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Entry>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheBucket for MemoryCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let mut store = self.lock();
        let entry = store.get(key)?;
        if !etag.is_empty() && entry.etag != etag {
            return None;
        }
        Some(entry.value.clone())
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        let evicted = self.lock().push(
            key.to_owned(),
            Entry {
                etag: etag.to_owned(),
                value: value.to_vec(),
            },
        );
        if let Some((evicted_key, _)) = evicted
            && evicted_key != key
        {
            tracing::debug!(key = %evicted_key, "evicted least recently used cache entry");
        }
    }
}

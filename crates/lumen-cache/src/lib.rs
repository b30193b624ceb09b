//! Cache abstraction layer for lumen.
//!
//! Consumers talk to two traits and never to a concrete store:
//!
//! - [`Cache`]: factory for named cache buckets
//! - [`CacheBucket`]: key-value store with etag-based invalidation
//!
//! # Implementations
//!
//! - [`MemoryCache`] / [`MemoryCacheBucket`]: bounded in-memory store with
//!   least-recently-used eviction
//!
//! # Example
//!
//! ```
//! use lumen_cache::{Cache, CacheBucketExt, MemoryCache};
//!
//! let cache = MemoryCache::new(16);
//! let bucket = cache.bucket("structures");
//! bucket.set_string("CCO", "", "https://img.example.com/cco.svg");
//! assert_eq!(
//!     bucket.get_string("CCO", "").as_deref(),
//!     Some("https://img.example.com/cco.svg")
//! );
//! ```

mod ext;
mod memory;

pub use ext::CacheBucketExt;
pub use memory::{DEFAULT_CAPACITY, MemoryCache, MemoryCacheBucket};

/// A named partition within a [`Cache`].
///
/// Values are invalidated by an etag, an opaque string chosen by the caller
/// (for structure images, the URL of the rendering service). A hit requires
/// both the key and the etag to match.
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value.
    ///
    /// Returns `None` on a miss or an etag mismatch. An empty `etag` skips
    /// validation.
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>>;

    /// Store a value, replacing any existing entry for `key`.
    fn set(&self, key: &str, etag: &str, value: &[u8]);
}

/// Factory for named [`CacheBucket`]s.
///
/// Buckets with different names never see each other's entries. Opening the
/// same name twice returns handles onto the same storage.
pub trait Cache: Send + Sync {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

//! Typed convenience methods on top of [`CacheBucket`].

use crate::CacheBucket;

/// Typed access to a [`CacheBucket`].
///
/// Kept as an extension trait so [`CacheBucket`] stays object-safe and
/// implementors only deal with raw bytes.
pub trait CacheBucketExt: CacheBucket {
    /// Retrieve a cached UTF-8 string.
    ///
    /// Returns `None` on a miss, an etag mismatch, or invalid UTF-8.
    fn get_string(&self, key: &str, etag: &str) -> Option<String> {
        let bytes = self.get(key, etag)?;
        String::from_utf8(bytes).ok()
    }

    fn set_string(&self, key: &str, etag: &str, value: &str) {
        self.set(key, etag, value.as_bytes());
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCacheBucket;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_string_round_trip() {
        let bucket = MemoryCacheBucket::with_capacity(4);
        bucket.set_string("O", "", "https://img/o.svg");
        assert_eq!(bucket.get_string("O", "").as_deref(), Some("https://img/o.svg"));
    }

    #[test]
    fn test_invalid_utf8_is_miss() {
        let bucket = MemoryCacheBucket::with_capacity(4);
        bucket.set("bad", "", &[0xff, 0xfe]);
        assert_eq!(bucket.get_string("bad", ""), None);
    }
}

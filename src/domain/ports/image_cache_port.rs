//! Port definition for the on-disk artwork cache.

use crate::domain::entities::CacheKey;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur during cache operations.
///
/// These never reach a subscriber: a failed write is logged and absorbed,
/// and a failed read is indistinguishable from a miss.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// I/O error during a cache read or write.
    #[error("IO error: {0}")]
    Io(String),
}

/// Port for content-addressed, namespace-scoped byte storage.
/// Implementations must be thread-safe.
#[async_trait::async_trait]
pub trait ImageCachePort: Send + Sync {
    /// Returns the stored payload for `key`, or `None` on a miss.
    async fn get(&self, key: &CacheKey, namespace: &str) -> Option<Vec<u8>>;

    /// Stores `bytes` under `key`, creating the namespace if needed and
    /// overwriting any existing entry.
    async fn put(&self, bytes: &[u8], key: &CacheKey, namespace: &str) -> CacheResult<()>;

    /// Returns true if an entry exists for `key`.
    async fn contains(&self, key: &CacheKey, namespace: &str) -> bool;
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory stand-in for the disk cache.
    #[derive(Default)]
    pub struct MemoryCacheFake {
        entries: Mutex<HashMap<(String, String), Vec<u8>>>,
    }

    impl MemoryCacheFake {
        /// Creates an empty fake.
        pub fn new() -> Self {
            Self::default()
        }

        /// Seeds an entry, as if a previous load had cached it.
        pub fn seed(&self, key: &CacheKey, namespace: &str, bytes: &[u8]) {
            self.entries.lock().unwrap().insert(
                (namespace.to_string(), key.as_str().to_string()),
                bytes.to_vec(),
            );
        }

        /// Number of stored entries.
        pub fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl ImageCachePort for MemoryCacheFake {
        async fn get(&self, key: &CacheKey, namespace: &str) -> Option<Vec<u8>> {
            self.entries
                .lock()
                .unwrap()
                .get(&(namespace.to_string(), key.as_str().to_string()))
                .cloned()
        }

        async fn put(&self, bytes: &[u8], key: &CacheKey, namespace: &str) -> CacheResult<()> {
            self.entries.lock().unwrap().insert(
                (namespace.to_string(), key.as_str().to_string()),
                bytes.to_vec(),
            );
            Ok(())
        }

        async fn contains(&self, key: &CacheKey, namespace: &str) -> bool {
            self.entries
                .lock()
                .unwrap()
                .contains_key(&(namespace.to_string(), key.as_str().to_string()))
        }
    }

    /// Cache whose writes always fail, as on a read-only filesystem.
    #[derive(Default)]
    pub struct WriteFailingCache;

    #[async_trait::async_trait]
    impl ImageCachePort for WriteFailingCache {
        async fn get(&self, _key: &CacheKey, _namespace: &str) -> Option<Vec<u8>> {
            None
        }

        async fn put(&self, _bytes: &[u8], _key: &CacheKey, _namespace: &str) -> CacheResult<()> {
            Err(CacheError::Io("read-only filesystem".into()))
        }

        async fn contains(&self, _key: &CacheKey, _namespace: &str) -> bool {
            false
        }
    }
}

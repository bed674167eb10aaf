//! Disk-based artwork cache that persists downloads across runs.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

use crate::domain::entities::CacheKey;
use crate::domain::ports::{CacheError, CacheResult, ImageCachePort};

/// Maximum cache size in bytes (200 MB default).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 200 * 1024 * 1024;

const ENTRY_EXT: &str = "png";

/// Content-addressed byte store laid out as `<root>/<namespace>/<key>.png`.
///
/// Writes are best-effort: the store is an accelerator, never a hard
/// dependency for an image reaching its subscriber.
pub struct DiskImageCache {
    root: PathBuf,
    max_size: u64,
    current_size: AtomicU64,
    item_count: AtomicUsize,
}

impl DiskImageCache {
    /// Opens a cache rooted at `root`, creating the directory if needed and
    /// scanning existing entries to seed the size accounting.
    ///
    /// # Errors
    /// Returns error if the root directory cannot be created or read.
    pub async fn open(root: PathBuf, max_size: u64) -> CacheResult<Self> {
        fs::create_dir_all(&root)
            .await
            .map_err(|e| CacheError::Io(format!("failed to create cache root: {e}")))?;

        let mut total_size = 0u64;
        let mut count = 0usize;

        let mut namespaces = fs::read_dir(&root)
            .await
            .map_err(|e| CacheError::Io(format!("failed to read cache root: {e}")))?;

        while let Ok(Some(ns_entry)) = namespaces.next_entry().await {
            let ns_path = ns_entry.path();
            if !ns_path.is_dir() {
                continue;
            }

            let Ok(mut entries) = fs::read_dir(&ns_path).await else {
                continue;
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == ENTRY_EXT)
                    && let Ok(meta) = entry.metadata().await
                {
                    total_size += meta.len();
                    count += 1;
                }
            }
        }

        let cache = Self {
            root,
            max_size,
            current_size: AtomicU64::new(total_size),
            item_count: AtomicUsize::new(count),
        };

        cache.cleanup_if_needed().await;

        Ok(cache)
    }

    /// Opens a cache in the platform cache directory.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be created.
    pub async fn default_location(max_size: u64) -> CacheResult<Self> {
        Self::open(platform_cache_path(), max_size).await
    }

    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace)
    }

    fn entry_path(&self, key: &CacheKey, namespace: &str) -> PathBuf {
        self.namespace_dir(namespace)
            .join(format!("{}.{ENTRY_EXT}", key.as_str()))
    }

    /// Reads the payload stored for `key`, or `None` on a miss.
    pub async fn get(&self, key: &CacheKey, namespace: &str) -> Option<Vec<u8>> {
        let path = self.entry_path(key, namespace);
        if let Ok(bytes) = fs::read(&path).await {
            trace!(key = %key, path = %path.display(), "disk cache hit");
            Some(bytes)
        } else {
            trace!(key = %key, "disk cache miss");
            None
        }
    }

    /// Stores `bytes` under `key`, creating the namespace directory on
    /// first use and overwriting any existing entry.
    ///
    /// # Errors
    /// Returns error if the directory or file cannot be created or written.
    pub async fn put(&self, bytes: &[u8], key: &CacheKey, namespace: &str) -> CacheResult<()> {
        fs::create_dir_all(self.namespace_dir(namespace))
            .await
            .map_err(|e| CacheError::Io(format!("failed to create namespace dir: {e}")))?;

        let path = self.entry_path(key, namespace);
        let old_size = fs::metadata(&path).await.map(|m| m.len()).ok();

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| CacheError::Io(format!("failed to create cache file: {e}")))?;

        file.write_all(bytes)
            .await
            .map_err(|e| CacheError::Io(format!("failed to write cache file: {e}")))?;

        file.flush()
            .await
            .map_err(|e| CacheError::Io(format!("failed to flush cache file: {e}")))?;

        let new_size = bytes.len() as u64;
        if let Some(old) = old_size {
            if new_size > old {
                self.current_size
                    .fetch_add(new_size - old, Ordering::Relaxed);
            } else {
                self.current_size
                    .fetch_sub(old - new_size, Ordering::Relaxed);
            }
        } else {
            self.current_size.fetch_add(new_size, Ordering::Relaxed);
            self.item_count.fetch_add(1, Ordering::Relaxed);
        }

        debug!(key = %key, path = %path.display(), size = bytes.len(), "stored artwork in disk cache");

        self.cleanup_if_needed().await;

        Ok(())
    }

    /// Returns true if an entry exists for `key`.
    pub async fn contains(&self, key: &CacheKey, namespace: &str) -> bool {
        fs::try_exists(&self.entry_path(key, namespace))
            .await
            .unwrap_or(false)
    }

    /// Removes the entry for `key`, if present.
    pub async fn evict(&self, key: &CacheKey, namespace: &str) {
        let path = self.entry_path(key, namespace);
        let size = fs::metadata(&path).await.map(|m| m.len()).ok();
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(key = %key, error = %e, "failed to evict from disk cache");
            }
        } else if let Some(s) = size {
            self.current_size.fetch_sub(s, Ordering::Relaxed);
            self.item_count.fetch_sub(1, Ordering::Relaxed);
            debug!(key = %key, "evicted from disk cache");
        }
    }

    /// Removes every entry in every namespace.
    ///
    /// # Errors
    /// Returns error if the cache root cannot be read.
    pub async fn clear(&self) -> CacheResult<()> {
        let mut namespaces = fs::read_dir(&self.root)
            .await
            .map_err(|e| CacheError::Io(format!("failed to read cache root: {e}")))?;

        while let Some(ns_entry) = namespaces
            .next_entry()
            .await
            .map_err(|e| CacheError::Io(format!("failed to read entry: {e}")))?
        {
            let ns_path = ns_entry.path();
            if !ns_path.is_dir() {
                continue;
            }

            let Ok(mut entries) = fs::read_dir(&ns_path).await else {
                continue;
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == ENTRY_EXT)
                    && fs::remove_file(&path).await.is_err()
                {
                    warn!(path = %path.display(), "failed to remove cache file");
                }
            }
        }

        self.current_size.store(0, Ordering::Relaxed);
        self.item_count.store(0, Ordering::Relaxed);
        debug!("cleared disk cache");
        Ok(())
    }

    /// Returns the current cache size in bytes.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.item_count.load(Ordering::Relaxed)
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes oldest-accessed entries once the store exceeds its budget.
    ///
    /// Frees down to a 10% headroom margin so back-to-back writes do not
    /// each trigger a sweep. A write itself never fails over the budget.
    async fn cleanup_if_needed(&self) {
        let current_size = self.current_size();
        if current_size <= self.max_size {
            return;
        }

        debug!(
            current_size = current_size,
            max_size = self.max_size,
            "disk cache over limit, cleaning up"
        );

        let Ok(mut namespaces) = fs::read_dir(&self.root).await else {
            return;
        };

        let mut files: Vec<(PathBuf, std::time::SystemTime, u64)> = Vec::new();

        while let Ok(Some(ns_entry)) = namespaces.next_entry().await {
            let ns_path = ns_entry.path();
            if !ns_path.is_dir() {
                continue;
            }

            let Ok(mut entries) = fs::read_dir(&ns_path).await else {
                continue;
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.extension().is_none_or(|ext| ext != ENTRY_EXT) {
                    continue;
                }

                if let Ok(meta) = entry.metadata().await {
                    let accessed = meta.accessed().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                    files.push((path, accessed, meta.len()));
                }
            }
        }

        files.sort_by_key(|(_, time, _)| *time);

        let mut freed_size = 0u64;
        let mut freed_count = 0usize;
        let target = current_size - self.max_size + (self.max_size / 10);

        for (path, _, size) in files {
            if freed_size >= target {
                break;
            }

            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "failed to remove old cache file");
            } else {
                debug!(path = %path.display(), "removed old cache file");
                freed_size += size;
                freed_count += 1;
            }
        }

        self.current_size.fetch_sub(freed_size, Ordering::Relaxed);
        self.item_count.fetch_sub(freed_count, Ordering::Relaxed);

        debug!(
            freed_size = freed_size,
            freed_count = freed_count,
            "disk cache cleanup complete"
        );
    }
}

#[async_trait::async_trait]
impl ImageCachePort for DiskImageCache {
    async fn get(&self, key: &CacheKey, namespace: &str) -> Option<Vec<u8>> {
        Self::get(self, key, namespace).await
    }

    async fn put(&self, bytes: &[u8], key: &CacheKey, namespace: &str) -> CacheResult<()> {
        Self::put(self, bytes, key, namespace).await
    }

    async fn contains(&self, key: &CacheKey, namespace: &str) -> bool {
        Self::contains(self, key, namespace).await
    }
}

/// Returns the platform cache directory for artwork.
fn platform_cache_path() -> PathBuf {
    directories::ProjectDirs::from("com", "oxistore", "oxistore").map_or_else(
        || std::env::temp_dir().join("oxistore").join("cache"),
        |dirs| dirs.cache_dir().join("images"),
    )
}

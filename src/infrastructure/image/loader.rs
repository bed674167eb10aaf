//! Per-request artwork loading coordinator.
//!
//! One `ImageLoader` serves one URL: check the disk cache, fall back to the
//! network, write back, publish. Loaders never share in-flight state, even
//! for the same URL; writes are idempotent per key, so concurrent loads are
//! wasteful but safe.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::entities::{CacheKey, ImageSource, ImageStatus, LoadedImage};
use crate::domain::errors::LoadError;
use crate::domain::ports::{FetchPort, ImageCachePort};

/// Cache namespace used for artwork when the caller has no reason to pick
/// another one.
pub const DEFAULT_NAMESPACE: &str = "artwork";

/// Coordinates one artwork load from construction to publish.
///
/// Construction itself starts the load; there is no separate start call.
/// The decoded image is published at most once: as a [`LoadedImage`] on the
/// consumer's event channel, mirrored by the status flipping to
/// [`ImageStatus::Ready`]. A failed load publishes nothing, so the
/// subscriber keeps rendering its placeholder.
pub struct ImageLoader {
    key: CacheKey,
    url: String,
    status_rx: watch::Receiver<ImageStatus>,
    cancel: CancellationToken,
}

impl ImageLoader {
    /// Starts loading `url`, checking `cache` before going through
    /// `fetcher`. Events are delivered on `event_tx`, which the consumer
    /// drains from its single event loop.
    pub fn new(
        url: impl Into<String>,
        namespace: impl Into<String>,
        cache: Arc<dyn ImageCachePort>,
        fetcher: Arc<dyn FetchPort>,
        event_tx: &mpsc::UnboundedSender<LoadedImage>,
    ) -> Self {
        let url = url.into();
        let key = CacheKey::from_url(&url);
        let (status_tx, status_rx) = watch::channel(ImageStatus::Idle);
        let cancel = CancellationToken::new();

        let task = LoadTask {
            key: key.clone(),
            url: url.clone(),
            namespace: namespace.into(),
            cache,
            fetcher,
            status_tx,
            event_tx: event_tx.clone(),
            cancel: cancel.clone(),
        };
        tokio::spawn(task.run());

        Self {
            key,
            url,
            status_rx,
            cancel,
        }
    }

    /// Cache identity of the requested artwork.
    #[must_use]
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// The URL this loader was constructed for.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Receiver over the load's state. Render the placeholder for any
    /// value other than [`ImageStatus::Ready`].
    #[must_use]
    pub fn status(&self) -> watch::Receiver<ImageStatus> {
        self.status_rx.clone()
    }

    /// Handle for cooperative cancellation; usable from another task.
    #[must_use]
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancels the load. A cancelled load never publishes. Dropping the
    /// loader without cancelling instead lets the download finish and be
    /// cached, with the result discarded.
    pub fn cancel(&self) {
        self.cancel.cancel();
        debug!(key = %self.key, "cancelled artwork load");
    }

    /// Waits until the load reaches a terminal state and returns it.
    pub async fn finished(&self) -> ImageStatus {
        let mut rx = self.status_rx.clone();
        match rx.wait_for(ImageStatus::is_terminal).await {
            Ok(status) => status.clone(),
            // The sender only drops mid-load if the task panicked.
            Err(_) => ImageStatus::Failed("load task dropped".into()),
        }
    }
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("key", &self.key)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// State moved into the spawned load task.
struct LoadTask {
    key: CacheKey,
    url: String,
    namespace: String,
    cache: Arc<dyn ImageCachePort>,
    fetcher: Arc<dyn FetchPort>,
    status_tx: watch::Sender<ImageStatus>,
    event_tx: mpsc::UnboundedSender<LoadedImage>,
    cancel: CancellationToken,
}

impl LoadTask {
    async fn run(self) {
        if let Err(e) = self.load().await {
            match e {
                LoadError::Cancelled => debug!(key = %self.key, "artwork load cancelled"),
                ref e => warn!(key = %self.key, url = %self.url, error = %e, "artwork load failed"),
            }
            let _ = self.status_tx.send(ImageStatus::Failed(e.to_string()));
        }
    }

    async fn load(&self) -> Result<(), LoadError> {
        let _ = self.status_tx.send(ImageStatus::CheckingCache);

        if let Some(bytes) = self.cache.get(&self.key, &self.namespace).await {
            match Self::decode(Bytes::from(bytes)).await {
                Ok(image) => {
                    self.publish(image, ImageSource::DiskCache);
                    return Ok(());
                }
                // A corrupt entry is just a miss; the download overwrites it.
                Err(e) => {
                    warn!(key = %self.key, error = %e, "cached artwork undecodable, re-downloading");
                }
            }
        }

        if self.cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        let _ = self.status_tx.send(ImageStatus::Downloading);
        let bytes = tokio::select! {
            () = self.cancel.cancelled() => return Err(LoadError::Cancelled),
            result = self.fetcher.download(&self.url) => result?,
        };

        let _ = self.status_tx.send(ImageStatus::Decoding);
        let image = Self::decode(bytes.clone()).await?;

        // Best-effort: the decoded image already satisfies the subscriber.
        if let Err(e) = self.cache.put(&bytes, &self.key, &self.namespace).await {
            warn!(key = %self.key, error = %e, "failed to cache artwork");
        }

        if self.cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        self.publish(image, ImageSource::Network);
        Ok(())
    }

    async fn decode(bytes: Bytes) -> Result<Arc<image::DynamicImage>, LoadError> {
        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| LoadError::decode(format!("decode task panicked: {e}")))?
            .map_err(|e| LoadError::decode(e.to_string()))?;

        Ok(Arc::new(decoded))
    }

    fn publish(&self, image: Arc<image::DynamicImage>, source: ImageSource) {
        let loaded = LoadedImage {
            key: self.key.clone(),
            url: self.url.clone(),
            image,
            source,
        };

        // Event before the status flip: a consumer woken by the status
        // change must find the event already queued.
        let _ = self.event_tx.send(loaded);
        let _ = self.status_tx.send(ImageStatus::Ready);
        debug!(key = %self.key, source = %source, "artwork published");
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::domain::errors::FetchError;
    use crate::domain::ports::mocks::{MemoryCacheFake, MockFetchPort, WriteFailingCache};

    use super::*;

    fn png_fixture() -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(2, 2);
        let mut cursor = std::io::Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    fn fetcher_returning(bytes: Vec<u8>) -> MockFetchPort {
        let mut fetcher = MockFetchPort::new();
        fetcher
            .expect_download()
            .times(1)
            .returning(move |_| Ok(Bytes::from(bytes.clone())));
        fetcher
    }

    fn untouchable_fetcher() -> MockFetchPort {
        let mut fetcher = MockFetchPort::new();
        fetcher.expect_download().times(0);
        fetcher
    }

    #[tokio::test]
    async fn cache_hit_publishes_without_downloading() {
        let url = "https://x/img@2x.png";
        let png = png_fixture();

        let cache = Arc::new(MemoryCacheFake::new());
        cache.seed(&CacheKey::from_url(url), DEFAULT_NAMESPACE, &png);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let loader = ImageLoader::new(url, DEFAULT_NAMESPACE, cache, Arc::new(untouchable_fetcher()), &tx);

        assert!(loader.finished().await.is_ready());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.source, ImageSource::DiskCache);
        assert_eq!(event.key, CacheKey::from_url(url));
    }

    #[tokio::test]
    async fn miss_downloads_decodes_and_caches_exact_bytes() {
        let url = "https://x/img@2x.png";
        let png = png_fixture();

        let cache = Arc::new(MemoryCacheFake::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let loader = ImageLoader::new(
            url,
            DEFAULT_NAMESPACE,
            cache.clone(),
            Arc::new(fetcher_returning(png.clone())),
            &tx,
        );

        assert!(loader.finished().await.is_ready());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.source, ImageSource::Network);
        assert_eq!(event.image.width(), 2);

        let stored = cache.get(&CacheKey::from_url(url), DEFAULT_NAMESPACE).await;
        assert_eq!(stored.unwrap(), png);
    }

    #[tokio::test]
    async fn second_load_is_served_from_cache() {
        let url = "https://x/img@2x.png";
        let png = png_fixture();
        let cache = Arc::new(MemoryCacheFake::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let first = ImageLoader::new(
            url,
            DEFAULT_NAMESPACE,
            cache.clone(),
            Arc::new(fetcher_returning(png)),
            &tx,
        );
        assert!(first.finished().await.is_ready());

        // The second loader gets a fetcher that must never be called.
        let second = ImageLoader::new(
            url,
            DEFAULT_NAMESPACE,
            cache,
            Arc::new(untouchable_fetcher()),
            &tx,
        );
        assert!(second.finished().await.is_ready());

        assert_eq!(rx.recv().await.unwrap().source, ImageSource::Network);
        assert_eq!(rx.recv().await.unwrap().source, ImageSource::DiskCache);
    }

    #[tokio::test]
    async fn exhausted_download_publishes_nothing_and_leaves_cache_untouched() {
        let url = "https://x/broken.png";
        let cache = Arc::new(MemoryCacheFake::new());

        let mut fetcher = MockFetchPort::new();
        fetcher
            .expect_download()
            .times(1)
            .returning(|url| Err(FetchError::bad_response(url)));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let loader = ImageLoader::new(url, DEFAULT_NAMESPACE, cache.clone(), Arc::new(fetcher), &tx);

        assert!(loader.finished().await.is_failed());
        assert!(rx.try_recv().is_err());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn cache_write_failure_still_publishes() {
        let url = "https://x/img@2x.png";
        let (tx, mut rx) = mpsc::unbounded_channel();

        let loader = ImageLoader::new(
            url,
            DEFAULT_NAMESPACE,
            Arc::new(WriteFailingCache),
            Arc::new(fetcher_returning(png_fixture())),
            &tx,
        );

        assert!(loader.finished().await.is_ready());
        assert_eq!(rx.recv().await.unwrap().source, ImageSource::Network);
    }

    #[tokio::test]
    async fn undecodable_bytes_fail_without_retry() {
        let url = "https://x/not-an-image.png";
        let cache = Arc::new(MemoryCacheFake::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let loader = ImageLoader::new(
            url,
            DEFAULT_NAMESPACE,
            cache,
            Arc::new(fetcher_returning(b"definitely not a png".to_vec())),
            &tx,
        );

        let status = loader.finished().await;
        assert!(status.is_failed());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn corrupt_cache_entry_falls_back_to_download() {
        let url = "https://x/img@2x.png";
        let key = CacheKey::from_url(url);
        let png = png_fixture();

        let cache = Arc::new(MemoryCacheFake::new());
        cache.seed(&key, DEFAULT_NAMESPACE, b"rotted bytes");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let loader = ImageLoader::new(
            url,
            DEFAULT_NAMESPACE,
            cache.clone(),
            Arc::new(fetcher_returning(png.clone())),
            &tx,
        );

        assert!(loader.finished().await.is_ready());
        assert_eq!(rx.recv().await.unwrap().source, ImageSource::Network);
        assert_eq!(cache.get(&key, DEFAULT_NAMESPACE).await.unwrap(), png);
    }

    #[tokio::test]
    async fn cancelled_load_never_publishes() {
        struct StalledFetcher;

        #[async_trait]
        impl FetchPort for StalledFetcher {
            async fn download(&self, _url: &str) -> Result<Bytes, FetchError> {
                std::future::pending().await
            }
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let loader = ImageLoader::new(
            "https://x/slow.png",
            DEFAULT_NAMESPACE,
            Arc::new(MemoryCacheFake::new()),
            Arc::new(StalledFetcher),
            &tx,
        );

        // Cancel through the detached handle, as a view teardown would.
        let cancel = loader.cancel_handle();
        cancel.cancel();

        let status = loader.finished().await;
        assert!(status.is_failed());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn concurrent_loaders_for_one_url_download_independently() {
        struct CountingFetcher {
            calls: AtomicUsize,
            png: Vec<u8>,
        }

        #[async_trait]
        impl FetchPort for CountingFetcher {
            async fn download(&self, _url: &str) -> Result<Bytes, FetchError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                // Hold every download open long enough that both loaders
                // miss the cache before either writes it.
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                Ok(Bytes::from(self.png.clone()))
            }
        }

        let url = "https://x/img@2x.png";
        let cache = Arc::new(MemoryCacheFake::new());
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            png: png_fixture(),
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let a = ImageLoader::new(url, DEFAULT_NAMESPACE, cache.clone(), fetcher.clone(), &tx);
        let b = ImageLoader::new(url, DEFAULT_NAMESPACE, cache.clone(), fetcher.clone(), &tx);

        assert!(a.finished().await.is_ready());
        assert!(b.finished().await.is_ready());

        // No de-duplication: both loads fetched, both events arrived, and
        // the idempotent writes left a single cache entry.
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
        assert_eq!(cache.len(), 1);
    }
}

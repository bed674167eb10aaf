//! Domain types for artwork loading and caching.

use std::sync::Arc;

/// Content-addressed identifier for a cached artwork payload.
///
/// Derived from the path component of the source URL, so the same artwork
/// served to different screens always maps to the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Creates a key from an already-computed fingerprint string.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derives the key for a URL by hashing its path component.
    ///
    /// A URL that does not parse hashes its entire string instead, so a
    /// malformed input still yields a stable, collision-resistant key.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let digest = match url::Url::parse(url) {
            Ok(parsed) => md5::compute(parsed.path().as_bytes()),
            Err(_) => md5::compute(url.as_bytes()),
        };
        Self(hex::encode(digest.0))
    }

    /// Returns the inner fingerprint string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subscriber-visible state of one artwork load.
///
/// Anything other than `Ready` renders as the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageStatus {
    /// Loading has not started.
    #[default]
    Idle,
    /// Looking up the on-disk cache.
    CheckingCache,
    /// Downloading from the network.
    Downloading,
    /// Decoding the downloaded bytes (CPU-intensive).
    Decoding,
    /// Image is loaded and was published.
    Ready,
    /// Loading failed with an error message; nothing was published.
    Failed(String),
}

impl ImageStatus {
    /// Returns true if the image was published.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns true if loading failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns true if the load reached a final state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_))
    }
}

/// Where a published image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Read back from the on-disk cache.
    DiskCache,
    /// Downloaded from the network.
    Network,
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DiskCache => write!(f, "disk"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// A decoded image together with its identity and provenance.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Cache identity of the artwork.
    pub key: CacheKey,
    /// The URL the load was requested for.
    pub url: String,
    /// The decoded image.
    pub image: Arc<image::DynamicImage>,
    /// Which tier produced the image.
    pub source: ImageSource,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn key_is_stable_across_calls() {
        let url = "https://is1-ssl.mzstatic.com/image/thumb/abc/100x100bb.png";
        assert_eq!(CacheKey::from_url(url), CacheKey::from_url(url));
    }

    #[test_case("https://x/img@2x.png", "https://x/img@3x.png")]
    #[test_case("https://x/a/icon.png", "https://x/b/icon.png")]
    #[test_case("https://x/one.png", "https://x/one.jpg")]
    fn distinct_paths_get_distinct_keys(a: &str, b: &str) {
        assert_ne!(CacheKey::from_url(a), CacheKey::from_url(b));
    }

    #[test]
    fn key_ignores_host_and_query() {
        // Content addressing is by path only; mirrors of the same asset share
        // one cache entry.
        let a = CacheKey::from_url("https://a.example/image/thumb/x.png?w=1");
        let b = CacheKey::from_url("https://b.example/image/thumb/x.png?w=2");
        assert_eq!(a, b);
    }

    #[test]
    fn key_is_hex_md5_of_path() {
        let key = CacheKey::from_url("https://x/img@2x.png");
        assert_eq!(key.as_str(), hex::encode(md5::compute(b"/img@2x.png").0));
    }

    #[test]
    fn unparseable_url_still_keys() {
        let key = CacheKey::from_url("not a url at all");
        assert_eq!(key.as_str().len(), 32);
    }

    #[test]
    fn status_terminal_states() {
        assert!(ImageStatus::Ready.is_terminal());
        assert!(ImageStatus::Failed("boom".into()).is_terminal());
        assert!(!ImageStatus::Downloading.is_terminal());
        assert!(!ImageStatus::Idle.is_terminal());
    }
}

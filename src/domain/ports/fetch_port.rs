//! Byte download port definition.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::FetchError;

/// Port for downloading raw bytes from a URL.
///
/// Implementations own their retry policy; a returned error means the
/// request is not worth repeating within this load.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FetchPort: Send + Sync {
    /// Downloads the resource at `url` and returns its body.
    async fn download(&self, url: &str) -> Result<Bytes, FetchError>;
}

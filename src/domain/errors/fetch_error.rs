//! Download error types.

use thiserror::Error;

/// Failures surfaced by the byte fetcher.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum FetchError {
    #[error("bad response from {url}")]
    BadResponse { url: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("unknown download error")]
    Unknown,
}

impl FetchError {
    /// Creates a bad-response error for the given URL.
    #[must_use]
    pub fn bad_response(url: impl Into<String>) -> Self {
        Self::BadResponse { url: url.into() }
    }

    /// Creates a transport-level error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Returns whether retrying the request could succeed.
    ///
    /// Every fetch failure is considered transient; the retry budget, not
    /// the error kind, bounds how often we try again.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::BadResponse { .. } | Self::Network { .. } | Self::Unknown
        )
    }
}

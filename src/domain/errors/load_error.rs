//! Terminal load error types.

use thiserror::Error;

use super::FetchError;

/// Why a load ended without publishing an image.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// The download failed after exhausting its retry budget.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The downloaded bytes did not decode as an image. Never retried.
    #[error("decode error: {message}")]
    Decode {
        /// Decoder failure description.
        message: String,
    },

    /// The load was cancelled before it could publish.
    #[error("load cancelled")]
    Cancelled,
}

impl LoadError {
    /// Creates a decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

//! HTTP byte fetcher with a bounded retry policy.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, warn};

use crate::domain::errors::FetchError;
use crate::domain::ports::FetchPort;

const USER_AGENT: &str = "oxistore/0.1 Mobile/15E148 Safari/604.1";

/// Total attempts per download: one initial try plus two retries.
const MAX_ATTEMPTS: u32 = 3;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Downloads raw bytes over HTTP, retrying failed attempts back to back.
///
/// Stateless beyond the shared connection pool; no caching, no decoding.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the default request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a fetcher with a custom request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    async fn attempt(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::network("request timed out")
            } else if e.is_connect() {
                FetchError::network(format!("failed to connect to {url}"))
            } else {
                FetchError::network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::bad_response(url));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(format!("failed to read body: {e}")))?;

        // A 2xx with an empty body cannot decode into anything useful.
        if bytes.is_empty() {
            return Err(FetchError::bad_response(url));
        }

        Ok(bytes)
    }
}

#[async_trait]
impl FetchPort for HttpFetcher {
    async fn download(&self, url: &str) -> Result<Bytes, FetchError> {
        let mut last_error = FetchError::Unknown;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(url).await {
                Ok(bytes) => {
                    debug!(url, attempt, size = bytes.len(), "download succeeded");
                    return Ok(bytes);
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "download attempt failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

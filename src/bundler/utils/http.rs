//! HTTP utilities for downloading runtime stubs and the bundler tool.
//!
//! Downloads go through the [`Fetch`] trait so builds can run against a
//! local double. [`HttpFetcher`] is the `reqwest` implementation.

use crate::bundler::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Timeout for a single HTTP request (2 minutes)
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Attempts per download, including the first one
pub const DOWNLOAD_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubled for each further retry
pub const DOWNLOAD_BACKOFF: Duration = Duration::from_millis(500);

/// Source of remote files.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Downloads `uri` and returns the body.
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>>;
}

/// `reqwest`-backed fetcher with bounded retries.
///
/// Only connection failures, timeouts, and 5xx responses are retried.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    attempts: u32,
    backoff: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher with the default timeout and retry policy.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::GenericError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            attempts: DOWNLOAD_ATTEMPTS,
            backoff: DOWNLOAD_BACKOFF,
        })
    }

    async fn fetch_once(&self, uri: &url::Url) -> std::result::Result<Vec<u8>, reqwest::Error> {
        let response = self
            .client
            .get(uri.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout()
        || error.is_connect()
        || error.status().is_some_and(|status| status.is_server_error())
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let url = url::Url::parse(uri)?;
        let mut delay = self.backoff;

        for attempt in 1..=self.attempts {
            log::info!("Downloading {} (attempt {}/{})", url, attempt, self.attempts);

            match self.fetch_once(&url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if attempt < self.attempts && is_transient(&e) => {
                    log::warn!("Download of {} failed: {}. Retrying in {:?}", url, e, delay);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    return Err(Error::Download {
                        uri: uri.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(Error::Download {
            uri: uri.to_string(),
            reason: "no download attempts configured".into(),
        })
    }
}

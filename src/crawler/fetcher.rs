//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the HTTP client with the configured user agent
//! - Single-attempt GET requests
//! - Error classification into network and status failures
//!
//! Retries are the caller's concern (see the paginator).

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct PageBody {
    /// Final URL after redirects
    pub url: Url,

    /// Decoded response body
    pub html: String,
}

/// Failure to fetch a single page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, TLS, timeout or body decoding failure
    #[error("network error for {url}: {cause}")]
    Network { url: String, cause: String },

    /// The server answered with a non-success status
    #[error("HTTP {code} for {url}")]
    HttpStatus { url: String, code: u16 },
}

impl FetchError {
    /// The URL that failed
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. } | Self::HttpStatus { url, .. } => url,
        }
    }

    /// Whether another attempt could plausibly succeed
    ///
    /// | Condition | Transient |
    /// |-----------|-----------|
    /// | Network failure | yes |
    /// | HTTP 429 | yes |
    /// | HTTP 5xx | yes |
    /// | Other HTTP status | no |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::HttpStatus { code, .. } => *code == 429 || *code >= 500,
        }
    }
}

/// Narrow fetch boundary used by the paginator
///
/// One call issues exactly one request. Implementations must not retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<PageBody, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Overall per-request timeout
///
/// # Example
///
/// ```no_run
/// use forum_scribe::config::UserAgentConfig;
/// use forum_scribe::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `PageFetcher` backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from the user agent configuration
    pub fn from_config(config: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config, timeout)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<PageBody, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_network_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                code: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| classify_network_error(url, &e))?;

        tracing::trace!("Fetched {} ({} bytes)", final_url, html.len());

        Ok(PageBody {
            url: final_url,
            html,
        })
    }
}

/// Maps a reqwest error onto `FetchError::Network`
fn classify_network_error(url: &Url, error: &reqwest::Error) -> FetchError {
    let cause = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else {
        error.to_string()
    };

    FetchError::Network {
        url: url.to_string(),
        cause,
    }
}

//! Content fetching from URLs and files.
//!
//! [`fetch_url`] performs the HTTP GET for web sources and [`fetch_file`]
//! reads saved pages from disk. The [`Fetch`] trait is the seam the
//! [`Pipeline`](crate::Pipeline) fetches through, so alternative transports
//! can be supplied.

use std::fs;
use std::future::Future;
use std::path::Path;
#[cfg(feature = "fetch")]
use std::time::Duration;

#[cfg(feature = "fetch")]
use reqwest::Client;
#[cfg(feature = "fetch")]
use url::Url;

use crate::{QuireError, Result};

/// User agent sent with every request. Several publishers reject the
/// default client identification.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: DEFAULT_USER_AGENT.to_string() }
    }
}

/// Something that can turn a URL into HTML text.
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Fetches HTML content from a URL.
///
/// Follows redirects, respects the configured timeout and fails on any
/// non-success status.
#[cfg(feature = "fetch")]
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = Url::parse(url).map_err(|e| QuireError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(QuireError::InvalidUrl(format!(
            "unsupported scheme '{}', expected http:// or https://",
            parsed_url.scheme()
        )));
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(QuireError::HttpError)?;

    tracing::debug!(url = %parsed_url, timeout = config.timeout, "fetching page");

    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.9,es;q=0.8")
        .send()
        .await
        .map_err(|e| classify(e, config))?;

    let status = response.status();
    if !status.is_success() {
        return Err(QuireError::HttpStatus { status: status.as_u16(), url: url.to_string() });
    }

    let content = response.text().await.map_err(|e| classify(e, config))?;
    tracing::debug!(bytes = content.len(), "page fetched");

    Ok(content)
}

#[cfg(feature = "fetch")]
fn classify(err: reqwest::Error, config: &FetchConfig) -> QuireError {
    if err.is_timeout() { QuireError::Timeout { timeout: config.timeout } } else { QuireError::HttpError(err) }
}

/// Reads HTML content from a local file.
///
/// Saved pages are not always valid UTF-8, so undecodable bytes are
/// replaced rather than rejected.
pub fn fetch_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(QuireError::FileNotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// The reqwest-backed fetcher used outside of tests.
#[cfg(feature = "fetch")]
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    config: FetchConfig,
}

#[cfg(feature = "fetch")]
impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "fetch")]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        fetch_url(url, &self.config).await
    }
}

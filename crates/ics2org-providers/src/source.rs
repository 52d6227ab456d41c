//! Calendar sources.
//!
//! A [`CalendarSource`] fetches the raw text of one calendar. Fetching always
//! completes before any parsing starts.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
#[cfg(feature = "http")]
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Boxed future type for async trait methods.
///
/// This is used because async fn in traits isn't object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Where raw calendar text comes from.
pub trait CalendarSource: Send + Sync {
    /// Returns a short description of the source (a path or URL).
    fn name(&self) -> &str;

    /// Fetches the whole calendar as text.
    ///
    /// # Errors
    ///
    /// Returns `Io` for local read failures and `Network` for remote ones.
    fn fetch(&self) -> BoxFuture<'_, ProviderResult<String>>;
}

/// Reads a calendar from a local `.ics` file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    /// Creates a source for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl CalendarSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(async move {
            debug!(path = %self.name, "Reading calendar file");
            let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
                ProviderError::io(format!("failed to read calendar: {}", e))
                    .with_origin(&self.name)
                    .with_source(e)
            })?;
            info!(path = %self.name, bytes = text.len(), "Read calendar file");
            Ok(text)
        })
    }
}

/// User agent sent with remote requests.
#[cfg(feature = "http")]
pub const USER_AGENT: &str = concat!("ics2org/", env!("CARGO_PKG_VERSION"));

/// Downloads a calendar over HTTP(S).
///
/// `webcal://` URLs are fetched over `https://`.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: url::Url,
}

#[cfg(feature = "http")]
impl HttpSource {
    /// Creates a source for `url` with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for malformed or non-HTTP URLs.
    pub fn new(url: &str, timeout: Duration) -> ProviderResult<Self> {
        let url = parse_calendar_url(url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, url })
    }

    /// Returns the URL that will be fetched.
    pub fn url(&self) -> &url::Url {
        &self.url
    }
}

#[cfg(feature = "http")]
impl CalendarSource for HttpSource {
    fn name(&self) -> &str {
        self.url.as_str()
    }

    fn fetch(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(async move {
            debug!(url = %self.url, "Downloading calendar");
            let response = self
                .client
                .get(self.url.clone())
                .send()
                .await
                .map_err(|e| {
                    ProviderError::network(format!("request failed: {}", e))
                        .with_origin(self.url.as_str())
                        .with_source(e)
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(ProviderError::network(format!("unexpected status {}", status))
                    .with_origin(self.url.as_str()));
            }

            let text = response.text().await.map_err(|e| {
                ProviderError::network(format!("failed to read response: {}", e))
                    .with_origin(self.url.as_str())
                    .with_source(e)
            })?;
            info!(url = %self.url, bytes = text.len(), "Downloaded calendar");
            Ok(text)
        })
    }
}

/// Parses a calendar URL, mapping `webcal` to `https`.
#[cfg(feature = "http")]
fn parse_calendar_url(raw: &str) -> ProviderResult<url::Url> {
    let raw = raw.trim();
    let normalized = match raw.get(..9) {
        Some(prefix) if prefix.eq_ignore_ascii_case("webcal://") => format!("https://{}", &raw[9..]),
        _ => raw.to_string(),
    };

    let url = url::Url::parse(&normalized).map_err(|e| {
        ProviderError::configuration(format!("invalid calendar URL '{}'", raw)).with_source(e)
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ProviderError::configuration(format!(
            "unsupported URL scheme '{}'",
            other
        ))),
    }
}

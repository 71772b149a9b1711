//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with a browser-like user agent
//! - Single-attempt GET requests bounded by a timeout
//! - Error classification (timeout / connection / other)
//!
//! The fetcher is the unit of error isolation: nothing it does returns an
//! error past this boundary, every problem becomes a [`FetchFailure`].

use crate::config::{ClientConfig, CrawlBudget};
use crate::url::CrawlTarget;
use reqwest::{header::CONTENT_TYPE, Client};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Upper bound for establishing a TCP/TLS connection
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A page whose response was received, whatever its status code
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The target that was requested
    pub requested: CrawlTarget,

    /// Final URL after redirects; relative links resolve against it
    pub final_url: Url,

    /// HTTP status code of the final response
    pub status_code: u16,

    /// Content-Type header value, if any
    pub content_type: Option<String>,

    /// Response body decoded as text
    pub body: String,
}

impl FetchedPage {
    /// Returns true for 2xx responses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Returns true unless the server declared a non-HTML content type
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map_or(true, |ct| ct.to_ascii_lowercase().contains("html"))
    }
}

/// Why a fetch produced no response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchFailureKind {
    /// The request did not complete within the timeout
    Timeout,
    /// DNS failure, refused connection, TLS error
    Connection,
    /// Anything else (malformed response, body decoding, redirect loop)
    Other,
}

impl FetchFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FetchFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed fetch with its classified reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FetchFailureKind,
    pub message: String,
}

impl FetchFailure {
    pub fn new(kind: FetchFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classifies a reqwest error
    fn from_reqwest(error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            FetchFailureKind::Timeout
        } else if error.is_connect() {
            FetchFailureKind::Connection
        } else {
            FetchFailureKind::Other
        };

        Self::new(kind, error.to_string())
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// A response was received (any status code)
    Fetched(FetchedPage),

    /// No usable response
    Failed(FetchFailure),
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The client identity configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use site_sweep::config::ClientConfig;
/// use site_sweep::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&ClientConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(config: &ClientConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues single GET requests with a fixed client identity and timeout
///
/// The fetcher owns the shared HTTP client; callers pass it explicitly to
/// whatever needs network access rather than reaching for ambient state.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Creates a fetcher from configuration
    pub fn new(config: &ClientConfig, budget: &CrawlBudget) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config, budget.timeout)?;
        Ok(Self::from_client(client, budget.timeout))
    }

    /// Wraps an existing client
    pub fn from_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// The per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches a crawl target
    ///
    /// # Request Flow
    ///
    /// 1. Send GET (redirects followed by the client, at most 10 hops)
    /// 2. Record status, final URL and Content-Type
    /// 3. Read the body as text
    ///
    /// There are no retries: one attempt per call.
    ///
    /// # Returns
    ///
    /// * `FetchOutcome::Fetched` - A response arrived, even a 404 or 500
    /// * `FetchOutcome::Failed` - Timeout, connection error or unreadable body
    pub async fn fetch(&self, target: &CrawlTarget) -> FetchOutcome {
        let response = match self
            .client
            .get(target.url().clone())
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failed(FetchFailure::from_reqwest(&e)),
        };

        let status_code = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match response.text().await {
            Ok(body) => FetchOutcome::Fetched(FetchedPage {
                requested: target.clone(),
                final_url,
                status_code,
                content_type,
                body,
            }),
            Err(e) => FetchOutcome::Failed(FetchFailure::from_reqwest(&e)),
        }
    }

    /// Downloads a binary resource, treating non-2xx statuses as failures
    pub async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchFailure> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchFailure::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::new(
                FetchFailureKind::Other,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchFailure::from_reqwest(&e))?;

        Ok(bytes.to_vec())
    }
}

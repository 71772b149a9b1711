//! Site-Sweep: a polite, bounded site crawler
//!
//! This crate visits a bounded set of same-origin pages reachable from a seed
//! URL, exactly once each, at a fixed pace, and hands every fetched page to a
//! pluggable handler (SEO metadata, broken-link flagging, image harvesting).

pub mod config;
pub mod crawler;
pub mod handlers;
pub mod output;
pub mod serp;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Sweep operations
///
/// Per-page problems never surface here; they are carried as
/// [`crawler::PageFailure`] values inside the crawl results.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Handler error: {0}")]
    Handler(#[from] handlers::HandlerError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),

    #[error("URL carries a fragment: {0}")]
    Fragment(String),

    #[error("Empty URL")]
    Empty,
}

/// Result type alias for Site-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlBudget};
pub use crawler::{run_crawl, Coordinator, CrawlReport, PageFailure, PageOutcome, PageResult};
pub use handlers::PageHandler;
pub use state::CrawlPhase;
pub use url::{normalize_seed, origin_key, CrawlTarget};

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Browser-like client identity; many sites reject default library agents
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for Site-Sweep
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub client: ClientConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages visited (and discovered) in one crawl
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Minimum time between the starts of two consecutive requests (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Order in which discovered pages are visited
    pub strategy: FrontierStrategy,

    /// Collapse equivalent URLs to one dedup key instead of exact-string matching
    #[serde(rename = "canonicalize-urls")]
    pub canonicalize_urls: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            delay_ms: 1000,
            timeout_secs: 10,
            strategy: FrontierStrategy::default(),
            canonicalize_urls: false,
        }
    }
}

impl CrawlerConfig {
    /// Freezes the limits of this configuration into a budget for one run
    pub fn budget(&self) -> CrawlBudget {
        CrawlBudget {
            max_pages: self.max_pages,
            delay: Duration::from_millis(self.delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Immutable limits for a single crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBudget {
    /// Maximum number of pages visited; also caps visited + queued URLs
    pub max_pages: usize,

    /// Inter-request delay
    pub delay: Duration,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for CrawlBudget {
    fn default() -> Self {
        CrawlerConfig::default().budget()
    }
}

/// Frontier selection policy
///
/// Under a page budget the policy decides which part of a site gets covered,
/// so it is always an explicit choice rather than container iteration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrontierStrategy {
    /// Queue: pages closest to the seed are visited first
    #[default]
    BreadthFirst,
    /// Stack: the most recently discovered page is visited first
    DepthFirst,
}

impl fmt::Display for FrontierStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BreadthFirst => write!(f, "breadth-first"),
            Self::DepthFirst => write!(f, "depth-first"),
        }
    }
}

impl std::str::FromStr for FrontierStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breadth-first" | "bfs" => Ok(Self::BreadthFirst),
            "depth-first" | "dfs" => Ok(Self::DepthFirst),
            other => Err(format!(
                "unknown strategy '{}', expected 'breadth-first' or 'depth-first'",
                other
            )),
        }
    }
}

/// HTTP client identity configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Link filtering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Path extensions that are never queued (e.g. ".pdf")
    #[serde(rename = "excluded-extensions")]
    pub excluded_extensions: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            excluded_extensions: [".pdf", ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".zip"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory where reports are written
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}

//! Search result position checker
//!
//! Fetches a fixed number of result pages per search engine for each keyword
//! and reports at which positions the tracked site appears. Uses the same
//! fetcher and pacer as the crawler, against fixed URLs instead of a
//! frontier.

use crate::crawler::{FetchOutcome, Fetcher, Pacer};
use crate::url::CrawlTarget;
use scraper::{Html, Selector};
use std::fmt;
use std::time::Duration;

/// Result pages checked per engine by default
pub const DEFAULT_PAGES: usize = 3;

/// Pause between two result page requests
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(2);

/// Organic results considered per page
const RESULTS_PER_PAGE: usize = 10;

/// Supported search engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchEngine {
    Google,
    Yandex,
}

impl SearchEngine {
    pub fn all() -> [SearchEngine; 2] {
        [Self::Google, Self::Yandex]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Yandex => "yandex",
        }
    }

    /// Public search endpoint
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Google => "https://www.google.com/search",
            Self::Yandex => "https://yandex.ru/search/",
        }
    }

    /// Builds the URL of result page `page` (0-based) for `keyword`
    ///
    /// # Example
    ///
    /// ```
    /// use site_sweep::serp::SearchEngine;
    ///
    /// let engine = SearchEngine::Google;
    /// assert_eq!(
    ///     engine.results_url(engine.default_endpoint(), "rust crawler", 1),
    ///     "https://www.google.com/search?q=rust%20crawler&start=10"
    /// );
    /// ```
    pub fn results_url(&self, endpoint: &str, keyword: &str, page: usize) -> String {
        let keyword = urlencoding::encode(keyword);
        match self {
            Self::Google => format!("{}?q={}&start={}", endpoint, keyword, page * RESULTS_PER_PAGE),
            Self::Yandex => format!("{}?text={}&p={}", endpoint, keyword, page),
        }
    }

    fn result_selector(&self) -> &'static str {
        match self {
            Self::Google => "div.g",
            Self::Yandex => "li.serp-item",
        }
    }

    fn link_selector(&self) -> &'static str {
        match self {
            Self::Google => "a",
            Self::Yandex => "a.organic__url",
        }
    }

    /// Finds the positions of `site` on one result page
    ///
    /// Only the first ten results count. A result matches when its link
    /// contains `site`; its position is `page * 10 + i` for the i-th result.
    pub fn parse_positions(&self, html: &str, site: &str, page: usize) -> Vec<usize> {
        let document = Html::parse_document(html);
        let mut positions = Vec::new();

        if let (Ok(result_selector), Ok(link_selector)) = (
            Selector::parse(self.result_selector()),
            Selector::parse(self.link_selector()),
        ) {
            for (i, result) in document
                .select(&result_selector)
                .take(RESULTS_PER_PAGE)
                .enumerate()
            {
                let href = result
                    .select(&link_selector)
                    .next()
                    .and_then(|link| link.value().attr("href"));

                if href.is_some_and(|href| href.contains(site)) {
                    positions.push(page * RESULTS_PER_PAGE + i + 1);
                }
            }
        }

        positions
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positions of the site for one keyword
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordPositions {
    pub keyword: String,
    pub google: Vec<usize>,
    pub yandex: Vec<usize>,
}

impl KeywordPositions {
    fn positions_mut(&mut self, engine: SearchEngine) -> &mut Vec<usize> {
        match engine {
            SearchEngine::Google => &mut self.google,
            SearchEngine::Yandex => &mut self.yandex,
        }
    }
}

/// Checks search positions of one site
pub struct SerpChecker {
    fetcher: Fetcher,
    site: String,
    pages: usize,
    delay: Duration,
    google_endpoint: String,
    yandex_endpoint: String,
}

impl SerpChecker {
    /// Creates a checker for `site` (matched as a substring of result links)
    pub fn new(fetcher: Fetcher, site: impl Into<String>) -> Self {
        Self {
            fetcher,
            site: site.into(),
            pages: DEFAULT_PAGES,
            delay: DEFAULT_PAGE_DELAY,
            google_endpoint: SearchEngine::Google.default_endpoint().to_string(),
            yandex_endpoint: SearchEngine::Yandex.default_endpoint().to_string(),
        }
    }

    /// Number of result pages per engine
    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = pages;
        self
    }

    /// Pause between result page requests
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Points an engine at a different endpoint
    pub fn with_endpoint(mut self, engine: SearchEngine, endpoint: impl Into<String>) -> Self {
        match engine {
            SearchEngine::Google => self.google_endpoint = endpoint.into(),
            SearchEngine::Yandex => self.yandex_endpoint = endpoint.into(),
        }
        self
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    fn endpoint(&self, engine: SearchEngine) -> &str {
        match engine {
            SearchEngine::Google => &self.google_endpoint,
            SearchEngine::Yandex => &self.yandex_endpoint,
        }
    }

    /// Checks one keyword on every engine
    pub async fn check(&self, keyword: &str) -> KeywordPositions {
        let mut pacer = Pacer::new(self.delay);
        self.check_paced(keyword, &mut pacer).await
    }

    /// Checks every keyword in order
    pub async fn run<S: AsRef<str>>(&self, keywords: &[S]) -> Vec<KeywordPositions> {
        let mut pacer = Pacer::new(self.delay);
        let mut results = Vec::with_capacity(keywords.len());

        for keyword in keywords {
            tracing::info!("Checking keyword: {}", keyword.as_ref());
            results.push(self.check_paced(keyword.as_ref(), &mut pacer).await);
        }

        results
    }

    async fn check_paced(&self, keyword: &str, pacer: &mut Pacer) -> KeywordPositions {
        let mut positions = KeywordPositions {
            keyword: keyword.to_string(),
            ..KeywordPositions::default()
        };

        for engine in SearchEngine::all() {
            for page in 0..self.pages {
                pacer.wait().await;
                pacer.record_request();

                let found = self.check_page(engine, keyword, page).await;
                positions.positions_mut(engine).extend(found);
            }
        }

        positions
    }

    /// Fetches one result page; failures count as no hits
    async fn check_page(&self, engine: SearchEngine, keyword: &str, page: usize) -> Vec<usize> {
        let url = engine.results_url(self.endpoint(engine), keyword, page);
        let target = match CrawlTarget::parse(&url) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!("Invalid {} results URL {}: {}", engine, url, e);
                return Vec::new();
            }
        };

        match self.fetcher.fetch(&target).await {
            FetchOutcome::Fetched(response) if response.is_success() => {
                let positions = engine.parse_positions(&response.body, &self.site, page);
                tracing::debug!("{} page {}: positions {:?}", engine, page + 1, positions);
                positions
            }
            FetchOutcome::Fetched(response) => {
                tracing::warn!(
                    "{} page {} returned HTTP {}",
                    engine,
                    page + 1,
                    response.status_code
                );
                Vec::new()
            }
            FetchOutcome::Failed(failure) => {
                tracing::warn!("Error checking {}: {}", engine, failure);
                Vec::new()
            }
        }
    }
}

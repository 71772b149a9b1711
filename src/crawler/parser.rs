//! HTML link extraction
//!
//! This module turns a fetched document into the set of outbound links worth
//! crawling: absolute, same-origin, fragment-free and not pointing at a
//! downloadable asset.

use crate::config::Config;
use crate::url::{canonicalize, origin_key, CrawlTarget};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Decides which resolved links may enter the frontier
#[derive(Debug, Clone)]
pub struct LinkFilter {
    /// Network location every accepted link must match exactly
    origin: String,

    /// Lowercase path extensions that are never crawled
    excluded_extensions: Vec<String>,

    /// Strip fragments and normalize instead of rejecting fragment links
    canonicalize: bool,
}

impl LinkFilter {
    /// Creates a filter for one origin
    pub fn new(origin: impl Into<String>, excluded_extensions: &[String]) -> Self {
        Self {
            origin: origin.into().to_lowercase(),
            excluded_extensions: excluded_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            canonicalize: false,
        }
    }

    /// Creates the filter for a crawl rooted at `seed`
    pub fn for_seed(seed: &CrawlTarget, config: &Config) -> Self {
        Self::new(seed.origin(), &config.filter.excluded_extensions)
            .with_canonicalization(config.crawler.canonicalize_urls)
    }

    /// Enables or disables canonicalization of accepted links
    pub fn with_canonicalization(mut self, enabled: bool) -> Self {
        self.canonicalize = enabled;
        self
    }

    /// The origin this filter admits
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns true if the URL path ends with an excluded asset extension
    pub fn is_excluded_asset(&self, url: &Url) -> bool {
        let path = url.path().to_lowercase();
        self.excluded_extensions
            .iter()
            .any(|ext| path.ends_with(ext.as_str()))
    }

    /// Applies the filter rules to a resolved link
    ///
    /// # Rules
    ///
    /// - scheme must be `http` or `https`
    /// - network location must equal the filter origin (no suffix matching)
    /// - no fragment (or, with canonicalization, the fragment is stripped)
    /// - path must not end with an excluded extension
    pub fn accept(&self, url: Url) -> Option<CrawlTarget> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }

        if origin_key(&url) != self.origin {
            return None;
        }

        let url = if self.canonicalize {
            canonicalize(url)
        } else if url.fragment().is_some() {
            return None;
        } else {
            url
        };

        if self.is_excluded_asset(&url) {
            return None;
        }

        CrawlTarget::from_url(url).ok()
    }
}

/// Extracts the crawlable links of a document
///
/// # Arguments
///
/// * `html` - The HTML content to parse (malformed markup is tolerated)
/// * `base_url` - The URL the document was served from (after redirects)
/// * `filter` - Origin and asset rules
///
/// # Returns
///
/// The deduplicated set of accepted targets; order is irrelevant.
///
/// # Example
///
/// ```
/// use site_sweep::crawler::{extract_links, LinkFilter};
/// use url::Url;
///
/// let html = r#"<a href="/about">About</a><a href="https://other.test/">Other</a>"#;
/// let base = Url::parse("https://site.test/").unwrap();
/// let filter = LinkFilter::new("site.test", &[".pdf".to_string()]);
///
/// let links = extract_links(html, &base, &filter);
/// assert_eq!(links.len(), 1);
/// assert!(links.iter().any(|l| l.as_str() == "https://site.test/about"));
/// ```
pub fn extract_links(html: &str, base_url: &Url, filter: &LinkFilter) -> HashSet<CrawlTarget> {
    resolve_hrefs(html, base_url)
        .into_iter()
        .filter_map(|url| filter.accept(url))
        .collect()
}

/// Resolves every `<a href>` of a document against `base_url`
///
/// Links that cannot be navigated to are silently dropped:
/// - empty hrefs and same-page `#anchors`
/// - `javascript:`, `mailto:`, `tel:` and `data:` schemes
/// - `<a download>` links
/// - hrefs that do not resolve to a URL
pub fn resolve_hrefs(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_link(href, base_url) {
                    links.push(url);
                }
            }
        }
    }

    links
}

/// Resolves a single href, or returns None if it should be ignored
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    base_url.join(href).ok()
}

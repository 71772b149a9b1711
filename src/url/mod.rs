//! URL handling module for Site-Sweep
//!
//! This module provides the crawl target type, seed normalization, origin
//! extraction and optional canonicalization of dedup keys.

mod domain;
mod normalize;

use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::origin_key;
pub use normalize::{canonicalize, normalize_seed};

/// A normalized absolute URL that can be crawled
///
/// Always has an `http` or `https` scheme and never carries a fragment. Its
/// string form is the dedup key used by the frontier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrawlTarget(Url);

impl CrawlTarget {
    /// Wraps an already parsed URL, enforcing the target invariants
    ///
    /// # Examples
    ///
    /// ```
    /// use site_sweep::url::CrawlTarget;
    /// use url::Url;
    ///
    /// let target = CrawlTarget::from_url(Url::parse("https://site.test/a").unwrap()).unwrap();
    /// assert_eq!(target.as_str(), "https://site.test/a");
    ///
    /// assert!(CrawlTarget::from_url(Url::parse("https://site.test/a#top").unwrap()).is_err());
    /// assert!(CrawlTarget::from_url(Url::parse("ftp://site.test/a").unwrap()).is_err());
    /// ```
    pub fn from_url(url: Url) -> UrlResult<Self> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(UrlError::MissingHost(url.to_string()));
        }

        if url.fragment().is_some() {
            return Err(UrlError::Fragment(url.to_string()));
        }

        Ok(Self(url))
    }

    /// Parses an absolute URL string into a target
    pub fn parse(input: &str) -> UrlResult<Self> {
        let url = Url::parse(input).map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?;
        Self::from_url(url)
    }

    /// The dedup key
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The underlying URL
    pub fn url(&self) -> &Url {
        &self.0
    }

    /// The network location (host and explicit port) of this target
    pub fn origin(&self) -> String {
        origin_key(&self.0)
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for CrawlTarget {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<CrawlTarget> for Url {
    fn from(target: CrawlTarget) -> Self {
        target.0
    }
}

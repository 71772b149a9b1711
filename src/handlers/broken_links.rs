//! Broken-link detection
//!
//! Every visited page yields a [`LinkCheck`]. A page is broken when it
//! answered 404 or did not answer at all; other error statuses are recorded
//! with their reason but are not counted as broken.

use super::{HandlerError, PageHandler};
use crate::crawler::{FetchedPage, PageFailure};
use crate::url::CrawlTarget;
use async_trait::async_trait;
use serde::Serialize;

/// Result of checking one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkCheck {
    pub url: String,

    /// HTTP status, if a response arrived
    pub status_code: Option<u16>,

    pub broken: bool,

    /// Why the page failed, if it did
    pub reason: Option<String>,
}

/// Records a [`LinkCheck`] for every visited page
#[derive(Debug, Clone, Default)]
pub struct BrokenLinkHandler;

impl BrokenLinkHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageHandler for BrokenLinkHandler {
    type Record = LinkCheck;

    fn name(&self) -> &'static str {
        "broken-links"
    }

    async fn handle(&self, page: &FetchedPage) -> Result<LinkCheck, HandlerError> {
        Ok(LinkCheck {
            url: page.requested.to_string(),
            status_code: Some(page.status_code),
            broken: false,
            reason: None,
        })
    }

    fn handle_failure(&self, url: &CrawlTarget, failure: &PageFailure) -> Option<LinkCheck> {
        let broken = failure.is_broken_link();
        if broken {
            tracing::info!("Broken link: {} ({})", url, failure);
        }

        Some(LinkCheck {
            url: url.to_string(),
            status_code: failure.status_code(),
            broken,
            reason: Some(failure.to_string()),
        })
    }
}

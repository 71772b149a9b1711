//! Page handlers
//!
//! A page handler receives every page the crawl engine fetched and turns it
//! into a record. The engine owns traversal; handlers own what a page means:
//! - [`SeoHandler`] extracts titles, meta descriptions, headings, images and
//!   microdata
//! - [`BrokenLinkHandler`] flags pages that answered 404 or not at all
//! - [`ImageHandler`] downloads the images a page references

mod broken_links;
mod images;
mod seo;

pub use broken_links::{BrokenLinkHandler, LinkCheck};
pub use images::{largest_variant_url, ImageHandler, ImageHarvest, ImageMode};
pub use seo::{
    images_recommendation, meta_recommendation, title_recommendation, ImageInfo, LengthVerdict,
    SeoHandler, SeoRecord,
};

use crate::crawler::{FetchedPage, PageFailure};
use crate::url::CrawlTarget;
use async_trait::async_trait;
use thiserror::Error;

/// Errors a handler can raise for a single page
///
/// These never abort a crawl; the engine records them as
/// [`PageFailure::Handler`].
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Failed to build selector: {0}")]
    Selector(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Consumer of fetched pages
///
/// Implementations must be cheap to call once per page and must not keep a
/// parsed document alive across an `.await`.
#[async_trait]
pub trait PageHandler: Send + Sync {
    /// What the handler produces per page
    type Record: Send;

    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Processes a page that answered with a 2xx status
    ///
    /// # Arguments
    ///
    /// * `page` - The fetched page; relative URLs resolve against `page.final_url`
    ///
    /// # Returns
    ///
    /// * `Ok(Record)` - The page was processed
    /// * `Err(HandlerError)` - The page could not be processed
    async fn handle(&self, page: &FetchedPage) -> Result<Self::Record, HandlerError>;

    /// Optionally derives a record from a failed page
    ///
    /// The default produces nothing.
    fn handle_failure(&self, _url: &CrawlTarget, _failure: &PageFailure) -> Option<Self::Record> {
        None
    }
}

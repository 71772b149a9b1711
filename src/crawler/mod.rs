//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with error classification
//! - HTML parsing and same-origin link extraction
//! - The frontier and visited set
//! - Inter-request pacing
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod pacer;
mod parser;
mod result;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{
    build_http_client, FetchFailure, FetchFailureKind, FetchOutcome, FetchedPage, Fetcher,
};
pub use frontier::Frontier;
pub use pacer::Pacer;
pub use parser::{extract_links, resolve_hrefs, LinkFilter};
pub use result::{CrawlReport, PageFailure, PageOutcome, PageResult};

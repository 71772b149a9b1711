//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the phase of the crawl engine's traversal loop
//!   (idle, fetching, extracting, delaying, done)

mod crawl_phase;

// Re-export main types
pub use crawl_phase::CrawlPhase;

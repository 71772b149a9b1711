//! Output module for crawl reports and statistics
//!
//! This module handles:
//! - Writing the SEO, broken link and search position reports
//! - Sampling microdata and summarizing per domain
//! - Recording and printing crawl statistics

mod link_report;
mod seo_report;
mod serp_report;
pub mod stats;

pub use link_report::{broken_links_file_name, write_broken_links};
pub use seo_report::{
    microdata_file_name, microdata_samples, print_domain_summary, seo_report_file_name,
    summarize_by_domain, write_microdata_samples, write_seo_report, DomainSummary,
    MicrodataSample, SeoReportRow,
};
pub use serp_report::{format_positions, write_serp_results, SERP_REPORT_FILE};
pub use stats::{print_statistics, CrawlStatistics};

use std::io::Write;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// UTF-8 byte order mark, so spreadsheet tools detect the encoding
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn write_bom<W: Write>(writer: &mut W) -> std::io::Result<()> {
    writer.write_all(UTF8_BOM)
}

/// Timestamp used in report file names (`YYYYmmdd_HHMM`, local time)
pub fn report_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M").to_string()
}

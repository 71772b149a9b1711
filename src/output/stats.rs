//! Statistics of a crawl run
//!
//! This module provides functionality for tallying and displaying what a
//! crawl run did.

use crate::crawler::PageResult;
use std::collections::BTreeMap;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Number of targets visited (fetched or attempted)
    pub pages_visited: usize,

    /// Pages handled without failure
    pub pages_processed: usize,

    /// Pages that ended with a failure marker
    pub pages_failed: usize,

    /// Failure counts keyed by failure label
    pub failures_by_kind: BTreeMap<&'static str, usize>,

    /// Same-origin links found across all pages (before dedup)
    pub links_discovered: usize,

    /// Targets still pending when the run stopped
    pub frontier_remaining: usize,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Tallies the results of a run
    ///
    /// # Arguments
    ///
    /// * `results` - Page results in visit order
    /// * `links_discovered` - Accepted links seen by the extractor
    /// * `frontier_remaining` - Pending targets left unvisited
    /// * `elapsed` - Duration of the run
    pub fn from_results<R>(
        results: &[PageResult<R>],
        links_discovered: usize,
        frontier_remaining: usize,
        elapsed: Duration,
    ) -> Self {
        let mut stats = Self {
            pages_visited: results.len(),
            links_discovered,
            frontier_remaining,
            elapsed,
            ..Self::default()
        };

        for result in results {
            match result.failure() {
                Some(failure) => {
                    stats.pages_failed += 1;
                    *stats
                        .failures_by_kind
                        .entry(failure.kind_label())
                        .or_insert(0) += 1;
                }
                None => stats.pages_processed += 1,
            }
        }

        stats
    }

    /// Share of visited pages processed without failure, in percent
    pub fn success_rate(&self) -> f64 {
        if self.pages_visited > 0 {
            (self.pages_processed as f64 / self.pages_visited as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages visited: {}", stats.pages_visited);
    println!("  Links discovered: {}", stats.links_discovered);
    println!("  Left in frontier: {}", stats.frontier_remaining);
    println!("  Duration: {:.1}s", stats.elapsed.as_secs_f64());
    println!();

    if !stats.failures_by_kind.is_empty() {
        println!("Failure Summary:");
        let mut failure_counts: Vec<_> = stats.failures_by_kind.iter().collect();
        failure_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in failure_counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully processed)",
        stats.success_rate(),
        stats.pages_processed,
        stats.pages_visited
    );
}

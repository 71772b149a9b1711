//! Frontier and dedup set for one crawl run
//!
//! This module owns every URL the run knows about, in exactly one of three
//! disjoint states:
//! - pending: discovered, waiting in the frontier
//! - claimed: popped by the engine and being processed
//! - visited: processed (fetched or attempted)
//!
//! Memory is bounded: the number of known URLs never exceeds the page budget.

use crate::config::FrontierStrategy;
use crate::url::CrawlTarget;
use std::collections::{HashSet, VecDeque};

/// Frontier of discovered URLs plus the visited set
#[derive(Debug)]
pub struct Frontier {
    /// Pending targets in discovery order
    queue: VecDeque<CrawlTarget>,

    /// Membership index for `queue`
    pending: HashSet<CrawlTarget>,

    /// Targets handed out by `pop_next` and not yet marked visited
    claimed: HashSet<CrawlTarget>,

    /// Processed targets; grows monotonically for the run
    visited: HashSet<CrawlTarget>,

    /// Cap on visited + claimed + pending
    max_pages: usize,

    /// Which end of the queue `pop_next` takes from
    strategy: FrontierStrategy,
}

impl Frontier {
    /// Creates a frontier holding only the seed
    pub fn new(seed: CrawlTarget, max_pages: usize, strategy: FrontierStrategy) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            pending: HashSet::new(),
            claimed: HashSet::new(),
            visited: HashSet::new(),
            max_pages,
            strategy,
        };

        frontier.pending.insert(seed.clone());
        frontier.queue.push_back(seed);
        frontier
    }

    /// Takes the next target to process, or None if nothing is pending
    ///
    /// Breadth-first takes the oldest discovery, depth-first the newest. The
    /// returned target is claimed: it will not be offered or handed out again.
    pub fn pop_next(&mut self) -> Option<CrawlTarget> {
        let next = match self.strategy {
            FrontierStrategy::BreadthFirst => self.queue.pop_front(),
            FrontierStrategy::DepthFirst => self.queue.pop_back(),
        }?;

        self.pending.remove(&next);
        self.claimed.insert(next.clone());
        Some(next)
    }

    /// Offers newly discovered candidates to the frontier
    ///
    /// A candidate is inserted only if it is unknown (not pending, claimed or
    /// visited) and the number of known URLs is still below the page budget.
    ///
    /// # Returns
    ///
    /// The number of candidates actually inserted
    pub fn offer<I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = CrawlTarget>,
    {
        let mut added = 0;

        for candidate in candidates {
            if self.known() >= self.max_pages {
                tracing::debug!(
                    "Frontier budget of {} reached, dropping further candidates",
                    self.max_pages
                );
                break;
            }

            if self.contains(&candidate) {
                continue;
            }

            tracing::trace!("Queued {}", candidate);
            self.pending.insert(candidate.clone());
            self.queue.push_back(candidate);
            added += 1;
        }

        added
    }

    /// Records a target as processed; idempotent
    pub fn mark_visited(&mut self, target: &CrawlTarget) {
        self.claimed.remove(target);
        if self.pending.remove(target) {
            self.queue.retain(|queued| queued != target);
        }
        self.visited.insert(target.clone());
    }

    /// Returns true if the URL is pending, claimed or visited
    pub fn contains(&self, target: &CrawlTarget) -> bool {
        self.pending.contains(target) || self.claimed.contains(target) || self.visited.contains(target)
    }

    /// Returns true if the target has been processed
    pub fn is_visited(&self, target: &CrawlTarget) -> bool {
        self.visited.contains(target)
    }

    /// Number of known URLs (visited + claimed + pending)
    pub fn known(&self) -> usize {
        self.visited.len() + self.claimed.len() + self.pending.len()
    }

    /// Number of processed targets
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of targets waiting in the frontier
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The page budget
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// The selection policy
    pub fn strategy(&self) -> FrontierStrategy {
        self.strategy
    }
}

//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the bounded traversal loop that ties together:
//! - The frontier and visited set
//! - Fetching with a fixed inter-request delay
//! - The pluggable page handler
//! - Link extraction feeding the frontier
//!
//! Every target is fetched once; the same body feeds both the handler and the
//! link extractor. Per-page failures become [`PageFailure`] values and never
//! end the loop.

use crate::config::{Config, CrawlBudget};
use crate::crawler::fetcher::{FetchOutcome, FetchedPage, Fetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::pacer::Pacer;
use crate::crawler::parser::{extract_links, LinkFilter};
use crate::crawler::result::{CrawlReport, PageFailure, PageOutcome, PageResult};
use crate::handlers::PageHandler;
use crate::output::CrawlStatistics;
use crate::state::CrawlPhase;
use crate::url::{normalize_seed, CrawlTarget};
use crate::SweepError;
use std::time::Instant;

/// Main crawler coordinator structure
///
/// A coordinator can run any number of crawls one after another; each run
/// gets a fresh frontier, visited set and pacer.
pub struct Coordinator<H: PageHandler> {
    config: Config,
    budget: CrawlBudget,
    fetcher: Fetcher,
    handler: H,
}

/// Mutable state of a single run, owned exclusively by the loop
struct CrawlRun<R> {
    frontier: Frontier,
    pacer: Pacer,
    filter: LinkFilter,
    phase: CrawlPhase,
    results: Vec<PageResult<R>>,
    links_discovered: usize,
}

impl<R> CrawlRun<R> {
    /// Loop invariant: something is pending and the budget is not spent
    fn should_continue(&self) -> bool {
        !self.frontier.is_empty() && self.frontier.visited_count() < self.frontier.max_pages()
    }

    fn advance(&mut self, next: CrawlPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "Invalid crawl phase transition: {} -> {}",
            self.phase,
            next
        );
        tracing::trace!("Phase {} -> {}", self.phase, next);
        self.phase = next;
    }
}

impl<H: PageHandler> Coordinator<H> {
    /// Creates a new coordinator with an HTTP client built from `config`
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SweepError)` - The HTTP client could not be built
    pub fn new(config: Config, handler: H) -> Result<Self, SweepError> {
        let budget = config.crawler.budget();
        let fetcher = Fetcher::new(&config.client, &budget)?;
        Ok(Self::with_fetcher(config, fetcher, handler))
    }

    /// Creates a coordinator that shares an existing fetcher
    pub fn with_fetcher(config: Config, fetcher: Fetcher, handler: H) -> Self {
        let budget = config.crawler.budget();
        Self {
            config,
            budget,
            fetcher,
            handler,
        }
    }

    /// The page handler
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The fetcher used for every request
    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// The budget applied to each run
    pub fn budget(&self) -> CrawlBudget {
        self.budget
    }

    /// Crawls from a user-supplied seed
    ///
    /// The seed gets `https://` prepended when it has no scheme.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The run completed (individual pages may have failed)
    /// * `Err(SweepError)` - The seed is not a crawlable URL
    pub async fn crawl(&self, seed: &str) -> Result<CrawlReport<H::Record>, SweepError> {
        let seed = normalize_seed(seed)?;
        Ok(self.crawl_target(seed).await)
    }

    /// Crawls several seeds one after another
    ///
    /// A seed that cannot be normalized is logged and skipped; it never
    /// aborts the rest of the batch.
    pub async fn crawl_batch<S: AsRef<str>>(&self, seeds: &[S]) -> Vec<CrawlReport<H::Record>> {
        let mut reports = Vec::with_capacity(seeds.len());

        for seed in seeds {
            match self.crawl(seed.as_ref()).await {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!("Skipping seed '{}': {}", seed.as_ref(), e),
            }
        }

        reports
    }

    /// Runs the traversal loop from an already normalized seed
    ///
    /// Per iteration:
    /// 1. Pop a target from the frontier
    /// 2. Fetch it (one attempt)
    /// 3. On a 2xx response, hand it to the page handler, then extract links
    ///    and offer them to the frontier
    /// 4. On any failure, record a failure marker and skip extraction
    /// 5. Mark the target visited
    /// 6. Wait out the inter-request delay if another iteration follows
    ///
    /// The loop ends when the frontier is empty or `max_pages` targets have
    /// been visited.
    pub async fn crawl_target(&self, seed: CrawlTarget) -> CrawlReport<H::Record> {
        let start_time = Instant::now();
        let mut run = CrawlRun {
            frontier: Frontier::new(
                seed.clone(),
                self.budget.max_pages,
                self.config.crawler.strategy,
            ),
            pacer: Pacer::new(self.budget.delay),
            filter: LinkFilter::for_seed(&seed, &self.config),
            phase: CrawlPhase::Idle,
            results: Vec::new(),
            links_discovered: 0,
        };

        tracing::info!(
            "Starting {} crawl of {} (origin {}, up to {} pages, {} order)",
            self.handler.name(),
            seed,
            run.filter.origin(),
            self.budget.max_pages,
            run.frontier.strategy()
        );

        while run.should_continue() {
            let Some(target) = run.frontier.pop_next() else {
                break;
            };

            run.advance(CrawlPhase::Fetching);
            run.pacer.record_request();
            let fetched = self.fetcher.fetch(&target).await;

            let outcome = match fetched {
                FetchOutcome::Fetched(page) if page.is_success() => {
                    self.process_page(&mut run, &page).await
                }
                FetchOutcome::Fetched(page) => self.fail(
                    &target,
                    PageFailure::HttpStatus {
                        code: page.status_code,
                    },
                ),
                FetchOutcome::Failed(failure) => self.fail(&target, PageFailure::Fetch(failure)),
            };

            run.frontier.mark_visited(&target);
            tracing::info!(
                "Visited {} ({}/{})",
                target,
                run.frontier.visited_count(),
                self.budget.max_pages
            );
            run.results.push(PageResult {
                url: target,
                outcome,
            });

            if run.should_continue() {
                run.advance(CrawlPhase::Delaying);
                run.pacer.wait().await;
            }
        }

        run.advance(CrawlPhase::Done);

        let stats = CrawlStatistics::from_results(
            &run.results,
            run.links_discovered,
            run.frontier.pending_count(),
            start_time.elapsed(),
        );

        tracing::info!(
            "Crawl of {} completed: {} pages visited, {} failed, {} left in frontier, in {:?}",
            seed,
            stats.pages_visited,
            stats.pages_failed,
            stats.frontier_remaining,
            stats.elapsed
        );

        CrawlReport {
            seed,
            results: run.results,
            stats,
        }
    }

    /// Handles a 2xx page and feeds its links to the frontier
    ///
    /// A handler error marks the page failed, but links are still extracted
    /// because the document itself was fetched fine.
    async fn process_page(
        &self,
        run: &mut CrawlRun<H::Record>,
        page: &FetchedPage,
    ) -> PageOutcome<H::Record> {
        let outcome = match self.handler.handle(page).await {
            Ok(record) => PageOutcome::Processed {
                status_code: page.status_code,
                record,
            },
            Err(e) => self.fail(&page.requested, PageFailure::Handler(e.to_string())),
        };

        if !page.is_html() {
            tracing::debug!(
                "Not extracting links from {} ({})",
                page.requested,
                page.content_type.as_deref().unwrap_or("unknown type")
            );
            return outcome;
        }

        run.advance(CrawlPhase::Extracting);

        let mut links: Vec<CrawlTarget> =
            extract_links(&page.body, &page.final_url, &run.filter)
                .into_iter()
                .collect();
        // Set iteration order is random; sort so budget truncation is reproducible
        links.sort();

        let found = links.len();
        let added = run.frontier.offer(links);
        run.links_discovered += found;

        tracing::debug!(
            "{}: {} same-origin links, {} new in frontier (frontier size {})",
            page.requested,
            found,
            added,
            run.frontier.pending_count()
        );

        outcome
    }

    /// Builds a failure outcome, letting the handler derive a record from it
    fn fail(&self, url: &CrawlTarget, failure: PageFailure) -> PageOutcome<H::Record> {
        tracing::warn!("Failed {}: {}", url, failure);
        let record = self.handler.handle_failure(url, &failure);
        PageOutcome::Failed { failure, record }
    }
}

/// Runs a single crawl with a freshly built coordinator
///
/// # Example
///
/// ```no_run
/// use site_sweep::config::Config;
/// use site_sweep::crawler::run_crawl;
/// use site_sweep::handlers::SeoHandler;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_crawl(Config::default(), "site.test", SeoHandler::new()).await?;
/// println!("{} pages visited", report.results.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl<H: PageHandler>(
    config: Config,
    seed: &str,
    handler: H,
) -> Result<CrawlReport<H::Record>, SweepError> {
    let coordinator = Coordinator::new(config, handler)?;
    coordinator.crawl(seed).await
}

//! Per-page results of a crawl run

use crate::crawler::fetcher::{FetchFailure, FetchFailureKind};
use crate::output::CrawlStatistics;
use crate::url::CrawlTarget;
use std::fmt;

/// Why a visited page produced no regular record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFailure {
    /// No response: timeout, connection error, unreadable body
    Fetch(FetchFailure),

    /// A response arrived with a non-2xx status
    HttpStatus { code: u16 },

    /// The page handler rejected a fetched page
    Handler(String),
}

impl PageFailure {
    /// Short machine-readable label, used for tallies and reports
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Fetch(f) => match f.kind {
                FetchFailureKind::Timeout => "timeout",
                FetchFailureKind::Connection => "connection",
                FetchFailureKind::Other => "fetch_error",
            },
            Self::HttpStatus { .. } => "http_status",
            Self::Handler(_) => "handler",
        }
    }

    /// The HTTP status, if a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { code } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if a link to this page counts as broken
    ///
    /// Only a 404 or a fetch that produced no response at all qualifies;
    /// other error statuses (500, 403, ...) are reported but not broken.
    pub fn is_broken_link(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::HttpStatus { code: 404 })
    }
}

impl fmt::Display for PageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(failure) => write!(f, "{}", failure),
            Self::HttpStatus { code } => write!(f, "HTTP {}", code),
            Self::Handler(message) => write!(f, "handler: {}", message),
        }
    }
}

/// What processing a single target produced
#[derive(Debug, Clone)]
pub enum PageOutcome<R> {
    /// 2xx response handled successfully
    Processed { status_code: u16, record: R },

    /// Failure marker, optionally with a record the handler derived from it
    Failed {
        failure: PageFailure,
        record: Option<R>,
    },
}

/// The outcome of processing one target, in visit order
#[derive(Debug, Clone)]
pub struct PageResult<R> {
    pub url: CrawlTarget,
    pub outcome: PageOutcome<R>,
}

impl<R> PageResult<R> {
    /// Returns true if the page was processed without failure
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, PageOutcome::Processed { .. })
    }

    /// The handler record, from either variant
    pub fn record(&self) -> Option<&R> {
        match &self.outcome {
            PageOutcome::Processed { record, .. } => Some(record),
            PageOutcome::Failed { record, .. } => record.as_ref(),
        }
    }

    /// Consumes the result, returning the handler record if any
    pub fn into_record(self) -> Option<R> {
        match self.outcome {
            PageOutcome::Processed { record, .. } => Some(record),
            PageOutcome::Failed { record, .. } => record,
        }
    }

    /// The failure marker, if the page failed
    pub fn failure(&self) -> Option<&PageFailure> {
        match &self.outcome {
            PageOutcome::Failed { failure, .. } => Some(failure),
            PageOutcome::Processed { .. } => None,
        }
    }
}

/// Everything one crawl run produced
#[derive(Debug, Clone)]
pub struct CrawlReport<R> {
    /// The seed the run started from
    pub seed: CrawlTarget,

    /// Results in visit order
    pub results: Vec<PageResult<R>>,

    /// Aggregate counters for the run
    pub stats: CrawlStatistics,
}

impl<R> CrawlReport<R> {
    /// Iterates over all handler records in visit order
    pub fn records(&self) -> impl Iterator<Item = &R> {
        self.results.iter().filter_map(PageResult::record)
    }

    /// Consumes the report, keeping only the records
    pub fn into_records(self) -> Vec<R> {
        self.results
            .into_iter()
            .filter_map(PageResult::into_record)
            .collect()
    }

    /// Iterates over failed pages
    pub fn failures(&self) -> impl Iterator<Item = (&CrawlTarget, &PageFailure)> {
        self.results
            .iter()
            .filter_map(|r| r.failure().map(|f| (&r.url, f)))
    }
}

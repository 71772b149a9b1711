/// Phase definitions for the crawl engine's traversal loop
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Run created, nothing fetched yet
    Idle,

    /// A target has been claimed and its fetch is in flight
    Fetching,

    /// The fetched document is being scanned for outbound links
    Extracting,

    /// Waiting out the inter-request delay before the next fetch
    Delaying,

    /// The frontier is exhausted or the page budget is spent
    Done,
}

impl CrawlPhase {
    /// Returns true if the run has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if this phase performs network I/O or sleeps
    pub fn is_suspending(&self) -> bool {
        matches!(self, Self::Fetching | Self::Delaying)
    }

    /// Checks whether the engine may move from this phase to `next`
    ///
    /// A failed fetch skips extraction (`Fetching -> Delaying`), and any
    /// non-terminal phase may end the run once the loop condition fails.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        matches!(
            (self, next),
            (Idle, Fetching)
                | (Fetching, Extracting)
                | (Fetching, Delaying)
                | (Extracting, Delaying)
                | (Delaying, Fetching)
                | (Idle, Done)
                | (Fetching, Done)
                | (Extracting, Done)
                | (Delaying, Done)
        )
    }

    /// Returns a short lowercase label for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Delaying => "delaying",
            Self::Done => "done",
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Fetching,
            Self::Extracting,
            Self::Delaying,
            Self::Done,
        ]
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

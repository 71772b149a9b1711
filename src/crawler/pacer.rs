//! Inter-request politeness delay
//!
//! The pacer sleeps the full configured delay between two requests, however
//! long the previous fetch took. Nothing is slept before the very first
//! request. The delay is fixed, never adaptive.

use std::time::Duration;

/// Fixed-delay request pacer
#[derive(Debug, Clone)]
pub struct Pacer {
    /// Sleep between the end of one request and the start of the next
    delay: Duration,

    /// Requests issued so far
    requests: usize,
}

impl Pacer {
    /// Creates a pacer with the given delay
    pub fn new(delay: Duration) -> Self {
        Self { delay, requests: 0 }
    }

    /// The configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records that a request is starting now
    pub fn record_request(&mut self) {
        self.requests += 1;
    }

    /// Number of requests recorded
    pub fn request_count(&self) -> usize {
        self.requests
    }

    /// How long to sleep before the next request
    ///
    /// Returns None before the first request or when the delay is zero.
    pub fn pending_delay(&self) -> Option<Duration> {
        if self.requests == 0 || self.delay.is_zero() {
            None
        } else {
            Some(self.delay)
        }
    }

    /// Sleeps the configured delay if a request came before
    pub async fn wait(&self) {
        if let Some(wait) = self.pending_delay() {
            tracing::trace!("Pacing: sleeping {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }
}

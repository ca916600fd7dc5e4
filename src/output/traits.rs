//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers and
//! associated data structures for crawl summaries.

use crate::crawler::Request;
use crate::scrape::ProductRecord;
use crate::state::RequestState;
use crate::storage::{RequestUpdate, RunStatus};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary statistics for a crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    // Run metadata
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,

    // Request state breakdown
    pub total_requests: u64,
    pub requests_pending: u64,
    pub requests_fetching: u64,
    pub requests_handled: u64,
    pub requests_rejected: u64,
    pub requests_dead_link: u64,
    pub requests_failed: u64,

    // Products emitted by this run
    pub total_products: u64,
    pub products_by_category: Vec<(String, u64)>,

    // Failed and dead requests: (url, state, message)
    pub failures: Vec<(String, RequestState, String)>,
}

impl CrawlSummary {
    /// Creates a new empty crawl summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of requests in terminal states
    pub fn total_terminal_requests(&self) -> u64 {
        self.requests_handled + self.requests_rejected + self.requests_dead_link + self.requests_failed
    }

    /// Share of product pages that passed the keyword filter, as a percentage
    pub fn acceptance_rate(&self) -> f64 {
        let extracted = self.total_products + self.requests_rejected;
        if extracted == 0 {
            return 0.0;
        }
        (self.total_products as f64 / extracted as f64) * 100.0
    }

    /// Returns the error rate as a percentage of terminal requests
    pub fn error_rate(&self) -> f64 {
        let terminal = self.total_terminal_requests();
        if terminal == 0 {
            return 0.0;
        }
        ((self.requests_dead_link + self.requests_failed) as f64 / terminal as f64) * 100.0
    }
}

/// Trait for output handlers
///
/// Output handlers record crawl events and produce the final summary.
/// Workers share one handler, so implementations must be thread-safe.
pub trait OutputHandler: Send + Sync {
    /// Records a newly discovered request
    ///
    /// # Returns
    ///
    /// `false` if the request was already known
    fn record_request(&self, request: &Request) -> OutputResult<bool>;

    /// Records a state change of a request
    fn update_request(&self, request: &Request, update: &RequestUpdate) -> OutputResult<()>;

    /// Emits an accepted product record
    ///
    /// # Returns
    ///
    /// `false` if a record for the same URL was already emitted this run
    fn emit_product(&self, record: &ProductRecord) -> OutputResult<bool>;

    /// Generates a summary of the crawl
    fn generate_summary(&self) -> OutputResult<CrawlSummary>;

    /// Finalizes the output, performing any cleanup or final writes
    ///
    /// # Arguments
    ///
    /// * `status` - The final status of the crawl run
    fn finalize(&self, status: RunStatus) -> OutputResult<()>;
}

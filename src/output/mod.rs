//! Output module for emitted products, crawl summaries and reports
//!
//! This module handles:
//! - Recording requests and emitted products through an `OutputHandler`
//! - Generating markdown summaries of crawl results
//! - Exporting products as JSON
//! - Printing crawl statistics

mod json;
mod markdown;
mod sqlite_output;
pub mod stats;
mod traits;

pub use json::{export_products_json, write_products_json};
pub use markdown::generate_markdown_summary;
pub use sqlite_output::{SharedStorage, SqliteOutputHandler};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use traits::{CrawlSummary, OutputError, OutputHandler, OutputResult};

use crate::state::RequestState;
use crate::storage::{RunRecord, Storage, StorageResult};
use crate::ScraperError;

/// Generates a summary of the most recent run
///
/// # Arguments
///
/// * `storage` - The storage backend containing crawl data
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Successfully generated summary
/// * `Err(ScraperError)` - No run recorded, or the query failed
pub fn generate_summary(storage: &dyn Storage) -> Result<CrawlSummary, ScraperError> {
    let run = storage
        .get_latest_run()?
        .ok_or_else(|| ScraperError::Storage("No crawl runs found in database".to_string()))?;

    Ok(summarize_run(storage, run)?)
}

/// Builds the summary of one run from storage
pub(crate) fn summarize_run(storage: &dyn Storage, run: RunRecord) -> StorageResult<CrawlSummary> {
    let duration_seconds = match (
        run.started_at.parse::<chrono::DateTime<chrono::Utc>>(),
        run.finished_at
            .as_deref()
            .map(str::parse::<chrono::DateTime<chrono::Utc>>),
    ) {
        (Ok(started), Some(Ok(finished))) => Some((finished - started).num_seconds().max(0) as u64),
        _ => None,
    };

    Ok(CrawlSummary {
        run_id: run.id,
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        total_requests: storage.count_total_requests()?,
        requests_pending: storage.count_requests_by_state(RequestState::Pending)?,
        requests_fetching: storage.count_requests_by_state(RequestState::Fetching)?,
        requests_handled: storage.count_requests_by_state(RequestState::Handled)?,
        requests_rejected: storage.count_requests_by_state(RequestState::Rejected)?,
        requests_dead_link: storage.count_requests_by_state(RequestState::DeadLink)?,
        requests_failed: storage.count_requests_by_state(RequestState::Failed)?,
        total_products: storage.count_products(run.id)?,
        products_by_category: storage.count_products_by_category(run.id)?,
        failures: storage.get_failed_requests()?,
        started_at: run.started_at,
        finished_at: run.finished_at,
        config_hash: run.config_hash,
    })
}

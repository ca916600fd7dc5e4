//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::scrape::ProductRecord;
use crate::state::RequestState;
use crate::storage::{RequestRecord, RequestUpdate, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Request not found: {0}")]
    RequestNotFound(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the scraper.
/// Callers share one backend behind a mutex.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Updates the status of a run
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Request Management =====

    /// Records a newly discovered request in the `pending` state
    ///
    /// # Returns
    ///
    /// `true` if the request was inserted, `false` if its unique key was
    /// already known
    fn insert_request(&mut self, request: &RequestRecord, run_id: i64) -> StorageResult<bool>;

    /// Gets a request by its unique key
    fn get_request(&self, unique_key: &str) -> StorageResult<Option<RequestRecord>>;

    /// Moves a request to a new state
    fn update_request_state(&mut self, unique_key: &str, update: &RequestUpdate) -> StorageResult<()>;

    /// Loads requests that were not finished (`pending` or `fetching`)
    fn load_unfinished_requests(&self) -> StorageResult<Vec<RequestRecord>>;

    /// Unique keys of every recorded request
    fn load_request_keys(&self) -> StorageResult<Vec<String>>;

    /// Removes all requests (used when a new run starts)
    fn clear_requests(&mut self) -> StorageResult<()>;

    /// Counts requests in a specific state
    fn count_requests_by_state(&self, state: RequestState) -> StorageResult<u64>;

    /// Counts all recorded requests
    fn count_total_requests(&self) -> StorageResult<u64>;

    /// URL and error message of every failed or dead request
    fn get_failed_requests(&self) -> StorageResult<Vec<(String, RequestState, String)>>;

    // ===== Product Management =====

    /// Stores an emitted product record
    ///
    /// # Returns
    ///
    /// The product ID, or `None` if this run already stored a product for the
    /// same URL
    fn insert_product(&mut self, record: &ProductRecord, run_id: i64) -> StorageResult<Option<i64>>;

    /// Loads the products of one run, or of every run when `run_id` is `None`
    fn get_products(&self, run_id: Option<i64>) -> StorageResult<Vec<ProductRecord>>;

    /// Counts products of a run
    fn count_products(&self, run_id: i64) -> StorageResult<u64>;

    /// Product counts per category for a run, largest first
    fn count_products_by_category(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>>;
}

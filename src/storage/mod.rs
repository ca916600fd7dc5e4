//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the scraper, including:
//! - SQLite database initialization and schema management
//! - Request state persistence for resuming interrupted runs
//! - Product record storage
//! - Run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{init_database, SqliteStorage};
pub use traits::{Storage, StorageError, StorageResult};

use crate::crawler::Request;
use crate::scrape::Label;
use crate::state::RequestState;
use crate::ScraperError;

use url::Url;

/// Represents a request in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub unique_key: String,
    pub url: String,
    pub label: Label,
    pub page_number: u32,
    pub state: RequestState,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub discovered_at: String,
    pub handled_at: Option<String>,
}

impl RequestRecord {
    /// A freshly discovered, pending request
    pub fn pending(request: &Request) -> Self {
        Self {
            unique_key: request.unique_key(),
            url: request.url.to_string(),
            label: request.label.clone(),
            page_number: request.page_number,
            state: RequestState::Pending,
            status_code: None,
            error_message: None,
            retry_count: 0,
            discovered_at: chrono::Utc::now().to_rfc3339(),
            handled_at: None,
        }
    }

    /// Rebuilds the frontier request this record was created from
    pub fn to_request(&self) -> Result<Request, ScraperError> {
        let url = Url::parse(&self.url)?;
        Ok(Request::with_page(url, self.label.clone(), self.page_number))
    }
}

/// State change of a request after a processing attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUpdate {
    pub state: RequestState,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub retry_count: u32,
}

impl RequestUpdate {
    pub fn new(state: RequestState) -> Self {
        Self {
            state,
            status_code: None,
            error_message: None,
            retry_count: 0,
        }
    }

    pub fn with_status(mut self, status_code: Option<u16>) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_retries(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

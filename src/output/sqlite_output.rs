//! SQLite-backed output handler
//!
//! Writes crawl events through the shared storage backend.

use crate::crawler::Request;
use crate::output::summarize_run;
use crate::output::traits::{CrawlSummary, OutputError, OutputHandler, OutputResult};
use crate::scrape::ProductRecord;
use crate::storage::{RequestRecord, RequestUpdate, RunStatus, Storage};
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage shared between the coordinator and its workers
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Output handler that records everything for one run in the database
pub struct SqliteOutputHandler {
    storage: SharedStorage,
    run_id: i64,
}

impl SqliteOutputHandler {
    pub fn new(storage: SharedStorage, run_id: i64) -> Self {
        Self { storage, run_id }
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    fn lock(&self) -> OutputResult<MutexGuard<'_, dyn Storage + Send + 'static>> {
        self.storage
            .lock()
            .map_err(|e| OutputError::Storage(format!("Failed to lock storage: {}", e)))
    }
}

impl OutputHandler for SqliteOutputHandler {
    fn record_request(&self, request: &Request) -> OutputResult<bool> {
        let mut storage = self.lock()?;
        storage
            .insert_request(&RequestRecord::pending(request), self.run_id)
            .map_err(|e| OutputError::Storage(e.to_string()))
    }

    fn update_request(&self, request: &Request, update: &RequestUpdate) -> OutputResult<()> {
        let mut storage = self.lock()?;
        storage
            .update_request_state(&request.unique_key(), update)
            .map_err(|e| OutputError::Storage(e.to_string()))
    }

    fn emit_product(&self, record: &ProductRecord) -> OutputResult<bool> {
        let mut storage = self.lock()?;
        let product_id = storage
            .insert_product(record, self.run_id)
            .map_err(|e| OutputError::Storage(e.to_string()))?;
        Ok(product_id.is_some())
    }

    fn generate_summary(&self) -> OutputResult<CrawlSummary> {
        let storage = self.lock()?;
        let run = storage
            .get_run(self.run_id)
            .map_err(|e| OutputError::Storage(e.to_string()))?;
        summarize_run(&*storage, run).map_err(|e| OutputError::Storage(e.to_string()))
    }

    fn finalize(&self, status: RunStatus) -> OutputResult<()> {
        let mut storage = self.lock()?;

        if status == RunStatus::Completed {
            storage
                .complete_run(self.run_id)
                .map_err(|e| OutputError::Storage(e.to_string()))?;
        } else {
            storage
                .update_run_status(self.run_id, status)
                .map_err(|e| OutputError::Storage(e.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::{Attributes, Label};
    use crate::state::RequestState;
    use crate::storage::SqliteStorage;
    use url::Url;

    fn handler() -> SqliteOutputHandler {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        let shared: SharedStorage = Arc::new(Mutex::new(storage));
        SqliteOutputHandler::new(shared, run_id)
    }

    fn product_request() -> Request {
        Request::new(
            Url::parse("https://shop.example.com/boots.html").unwrap(),
            Label::Product("Shoes".to_string()),
        )
    }

    #[test]
    fn test_record_and_update_request() {
        let handler = handler();
        let request = product_request();

        assert!(handler.record_request(&request).unwrap());
        assert!(!handler.record_request(&request).unwrap());

        handler
            .update_request(&request, &RequestUpdate::new(RequestState::Rejected).with_status(Some(200)))
            .unwrap();

        let summary = handler.generate_summary().unwrap();
        assert_eq!(summary.total_requests, 1);
        assert_eq!(summary.requests_rejected, 1);
    }

    #[test]
    fn test_emit_product_once() {
        let handler = handler();
        let record = ProductRecord {
            name: "Boots".to_string(),
            sku: "B-1".to_string(),
            category: "Shoes".to_string(),
            price: "$1".to_string(),
            image_url: "https://cdn.example.com/b.jpg".to_string(),
            url: "https://shop.example.com/boots.html".to_string(),
            description: "Boots".to_string(),
            attributes: Attributes::new(),
        };

        assert!(handler.emit_product(&record).unwrap());
        assert!(!handler.emit_product(&record).unwrap());

        let summary = handler.generate_summary().unwrap();
        assert_eq!(summary.total_products, 1);
        assert_eq!(summary.products_by_category, vec![("Shoes".to_string(), 1)]);
    }

    #[test]
    fn test_finalize() {
        let handler = handler();
        handler.finalize(RunStatus::Completed).unwrap();

        let summary = handler.generate_summary().unwrap();
        assert_eq!(summary.status, "completed");
        assert!(summary.finished_at.is_some());
    }

    #[test]
    fn test_finalize_interrupted() {
        let handler = handler();
        handler.finalize(RunStatus::Interrupted).unwrap();

        let summary = handler.generate_summary().unwrap();
        assert_eq!(summary.status, "interrupted");
        assert!(summary.finished_at.is_none());
    }
}

//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::scrape::{Attributes, Label, ProductRecord};
use crate::state::RequestState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RequestRecord, RequestUpdate, RunRecord, RunStatus};
use crate::ScraperError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const REQUEST_COLUMNS: &str = "unique_key, url, label, page_number, state, status_code, \
     error_message, retry_count, discovered_at, handled_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ScraperError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScraperError> {
        let conn = init_database(path)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, ScraperError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn load_attributes(&self, product_id: i64) -> StorageResult<Attributes> {
        let mut stmt = self.conn.prepare(
            "SELECT name, value FROM product_attributes WHERE product_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![product_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut attributes = Attributes::new();
        for row in rows {
            let (name, value) = row?;
            attributes.insert(name, value);
        }
        Ok(attributes)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Running),
    })
}

/// Raw request row; the state is validated after the query
type RequestRow = (RequestRecord, String);

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<RequestRow> {
    let label: String = row.get(2)?;
    let state: String = row.get(4)?;
    let record = RequestRecord {
        unique_key: row.get(0)?,
        url: row.get(1)?,
        label: Label::parse(&label),
        page_number: row.get(3)?,
        state: RequestState::Pending,
        status_code: row.get(5)?,
        error_message: row.get(6)?,
        retry_count: row.get(7)?,
        discovered_at: row.get(8)?,
        handled_at: row.get(9)?,
    };
    Ok((record, state))
}

fn with_state((mut record, state): RequestRow) -> StorageResult<RequestRecord> {
    record.state = RequestState::from_db_string(&state).ok_or_else(|| StorageError::CorruptRow {
        table: "requests",
        message: format!("unknown state '{}' for {}", state, record.url),
    })?;
    Ok(record)
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), run_id],
        )?;
        Ok(())
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Completed.to_db_string(), now, run_id],
        )?;
        Ok(())
    }

    // ===== Request Management =====

    fn insert_request(&mut self, request: &RequestRecord, run_id: i64) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO requests
                (unique_key, url, label, page_number, state, retry_count, discovered_at, run_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                request.unique_key,
                request.url,
                request.label.to_tag(),
                request.page_number,
                request.state.to_db_string(),
                request.retry_count,
                request.discovered_at,
                run_id
            ],
        )?;
        Ok(inserted > 0)
    }

    fn get_request(&self, unique_key: &str) -> StorageResult<Option<RequestRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM requests WHERE unique_key = ?1", REQUEST_COLUMNS),
                params![unique_key],
                request_from_row,
            )
            .optional()?;
        row.map(with_state).transpose()
    }

    fn update_request_state(&mut self, unique_key: &str, update: &RequestUpdate) -> StorageResult<()> {
        let handled_at = if update.state.is_terminal() {
            Some(Utc::now().to_rfc3339())
        } else {
            None
        };

        let changed = self.conn.execute(
            "UPDATE requests
             SET state = ?1,
                 status_code = COALESCE(?2, status_code),
                 error_message = ?3,
                 retry_count = ?4,
                 handled_at = ?5
             WHERE unique_key = ?6",
            params![
                update.state.to_db_string(),
                update.status_code,
                update.error_message,
                update.retry_count,
                handled_at,
                unique_key
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::RequestNotFound(unique_key.to_string()));
        }
        Ok(())
    }

    fn load_unfinished_requests(&self) -> StorageResult<Vec<RequestRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM requests WHERE state IN (?1, ?2) ORDER BY id",
            REQUEST_COLUMNS
        ))?;
        let rows = stmt
            .query_map(
                params![
                    RequestState::Pending.to_db_string(),
                    RequestState::Fetching.to_db_string()
                ],
                request_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(with_state).collect()
    }

    fn load_request_keys(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT unique_key FROM requests")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn clear_requests(&mut self) -> StorageResult<()> {
        self.conn.execute("DELETE FROM requests", [])?;
        Ok(())
    }

    fn count_requests_by_state(&self, state: RequestState) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM requests WHERE state = ?1",
            params![state.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_total_requests(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM requests", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn get_failed_requests(&self) -> StorageResult<Vec<(String, RequestState, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, state, COALESCE(error_message, '') FROM requests
             WHERE state IN (?1, ?2) ORDER BY id",
        )?;
        let rows = stmt
            .query_map(
                params![
                    RequestState::Failed.to_db_string(),
                    RequestState::DeadLink.to_db_string()
                ],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(url, state, message)| {
                let state = RequestState::from_db_string(&state).ok_or_else(|| {
                    StorageError::CorruptRow {
                        table: "requests",
                        message: format!("unknown state '{}' for {}", state, url),
                    }
                })?;
                Ok((url, state, message))
            })
            .collect()
    }

    // ===== Product Management =====

    fn insert_product(&mut self, record: &ProductRecord, run_id: i64) -> StorageResult<Option<i64>> {
        let tx = self.conn.transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO products
                (run_id, url, name, sku, category, price, image_url, description, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run_id,
                record.url,
                record.name,
                record.sku,
                record.category,
                record.price,
                record.image_url,
                record.description,
                Utc::now().to_rfc3339()
            ],
        )?;

        if inserted == 0 {
            return Ok(None);
        }

        let product_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO product_attributes (product_id, position, name, value)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, (name, value)) in record.attributes.iter().enumerate() {
                stmt.execute(params![product_id, position as i64, name, value])?;
            }
        }

        tx.commit()?;
        Ok(Some(product_id))
    }

    fn get_products(&self, run_id: Option<i64>) -> StorageResult<Vec<ProductRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, sku, category, price, image_url, url, description
             FROM products
             WHERE ?1 IS NULL OR run_id = ?1
             ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    ProductRecord {
                        name: row.get(1)?,
                        sku: row.get(2)?,
                        category: row.get(3)?,
                        price: row.get(4)?,
                        image_url: row.get(5)?,
                        url: row.get(6)?,
                        description: row.get(7)?,
                        attributes: Attributes::new(),
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut products = Vec::with_capacity(rows.len());
        for (product_id, mut record) in rows {
            record.attributes = self.load_attributes(product_id)?;
            products.push(record);
        }
        Ok(products)
    }

    fn count_products(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM products WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_products_by_category(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) FROM products
             WHERE run_id = ?1
             GROUP BY category
             ORDER BY COUNT(*) DESC, category",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Initializes or opens a database at the given path
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Successfully opened/created database
/// * `Err(rusqlite::Error)` - Failed to open database
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}

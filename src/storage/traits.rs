//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{CompanyRecord, CompletedPage, DeadLetterRecord, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawler.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new sweep run
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

    /// Gets all runs, newest first
    fn list_runs(&self) -> StorageResult<Vec<RunRecord>>;

    /// Updates the status of a run
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Page Results =====

    /// Persists the outcome of one successfully processed page
    ///
    /// Appends the company batch with `INSERT OR IGNORE` (dedup by
    /// `company_id`) and records the page in the completed-pages log,
    /// all inside a single transaction.
    ///
    /// # Arguments
    ///
    /// * `run_id` - The run processing this page
    /// * `page` - The page number
    /// * `companies` - The filtered companies extracted from the page
    ///
    /// # Returns
    ///
    /// The number of companies actually inserted (previously unseen)
    fn record_page(
        &mut self,
        run_id: i64,
        page: u32,
        companies: &[CompanyRecord],
    ) -> StorageResult<usize>;

    /// Loads the completed-pages log, ordered by page number
    fn load_completed_pages(&self) -> StorageResult<Vec<CompletedPage>>;

    // ===== Dead Letters =====

    /// Records a page that failed permanently
    fn record_dead_letter(
        &mut self,
        run_id: i64,
        page: u32,
        attempts: u32,
        last_error: &str,
    ) -> StorageResult<()>;

    /// Loads all dead-lettered pages, ordered by page number
    fn load_dead_letters(&self) -> StorageResult<Vec<DeadLetterRecord>>;

    // ===== Companies / Statistics =====

    /// Loads all persisted companies
    fn load_companies(&self) -> StorageResult<Vec<CompanyRecord>>;

    /// Gets a company by its identifier
    fn get_company(&self, company_id: &str) -> StorageResult<Option<CompanyRecord>>;

    /// Total number of persisted companies
    fn count_companies(&self) -> StorageResult<u64>;

    /// Number of pages in the completed log
    fn count_completed_pages(&self) -> StorageResult<u64>;

    /// Number of dead-lettered pages
    fn count_dead_letters(&self) -> StorageResult<u64>;
}

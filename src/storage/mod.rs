//! Storage module for persisting sweep data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Transactional company batch appends with identifier dedup
//! - The completed-pages checkpoint log
//! - Dead-letter tracking for permanently failing pages
//! - Run tracking and resumption support

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

use crate::SweepError;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SweepError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SweepError> {
    SqliteStorage::new(path)
}

/// A company extracted from one segmentation page
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRecord {
    /// Registry number or internal identifier; unique across the table
    pub company_id: String,
    pub name: Option<String>,
    pub homepage: Option<String>,
    /// Free-text category labels; persisted as a JSON array string
    pub categories: Vec<String>,
    pub revenue: Option<i64>,
    pub profit: Option<i64>,
    pub foundation_year: Option<i64>,
}

/// One row of the completed-pages checkpoint log
#[derive(Debug, Clone)]
pub struct CompletedPage {
    pub page: u32,
    pub run_id: i64,
    pub company_count: u32,
    pub completed_at: String,
}

/// A page that was set aside after exhausting its retry budget
#[derive(Debug, Clone)]
pub struct DeadLetterRecord {
    pub page: u32,
    pub run_id: i64,
    pub attempts: u32,
    pub last_error: String,
    pub failed_at: String,
}

/// Represents a sweep run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a sweep run
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Interrupted,
            RunStatus::Failed,
        ] {
            let s = status.to_db_string();
            assert_eq!(RunStatus::from_db_string(s), Some(*status));
        }
    }

    #[test]
    fn test_run_status_unknown_string() {
        assert_eq!(RunStatus::from_db_string("paused"), None);
    }
}

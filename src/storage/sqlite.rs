//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CompanyRecord, CompletedPage, DeadLetterRecord, RunRecord, RunStatus};
use crate::SweepError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

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
    /// * `Err(SweepError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SweepError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, SweepError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn row_to_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(RunStatus::Running),
        })
    }

    fn decode_categories(json: &str) -> StorageResult<Vec<String>> {
        serde_json::from_str(json).map_err(|e| {
            StorageError::Serialization(format!("invalid categories column: {}", e))
        })
    }
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
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
        )?;

        let run = stmt
            .query_row(params![run_id], Self::row_to_run)
            .map_err(|_| StorageError::RunNotFound(run_id))?;

        Ok(run)
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
        )?;

        let run = stmt.query_row([], Self::row_to_run).optional()?;

        Ok(run)
    }

    fn list_runs(&self) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC",
        )?;

        let runs = stmt
            .query_map([], Self::row_to_run)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(runs)
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

    // ===== Page Results =====

    fn record_page(
        &mut self,
        run_id: i64,
        page: u32,
        companies: &[CompanyRecord],
    ) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO companies
                 (company_id, name, homepage, categories, revenue, profit, foundation_year,
                  discovered_run, discovered_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;

            for company in companies {
                let categories = serde_json::to_string(&company.categories).map_err(|e| {
                    StorageError::Serialization(format!("categories for {}: {}", company.company_id, e))
                })?;

                inserted += stmt.execute(params![
                    company.company_id,
                    company.name,
                    company.homepage,
                    categories,
                    company.revenue,
                    company.profit,
                    company.foundation_year,
                    run_id,
                    now,
                ])?;
            }
        }

        // The checkpoint row commits atomically with the batch above, so a
        // crash leaves either both or neither.
        tx.execute(
            "INSERT OR REPLACE INTO completed_pages (page, run_id, company_count, completed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![page, run_id, companies.len() as u32, now],
        )?;

        tx.commit()?;
        Ok(inserted)
    }

    fn load_completed_pages(&self) -> StorageResult<Vec<CompletedPage>> {
        let mut stmt = self.conn.prepare(
            "SELECT page, run_id, company_count, completed_at FROM completed_pages ORDER BY page",
        )?;

        let pages = stmt
            .query_map([], |row| {
                Ok(CompletedPage {
                    page: row.get(0)?,
                    run_id: row.get(1)?,
                    company_count: row.get(2)?,
                    completed_at: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(pages)
    }

    // ===== Dead Letters =====

    fn record_dead_letter(
        &mut self,
        run_id: i64,
        page: u32,
        attempts: u32,
        last_error: &str,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO dead_letters (page, run_id, attempts, last_error, failed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![page, run_id, attempts, last_error, now],
        )?;
        Ok(())
    }

    fn load_dead_letters(&self) -> StorageResult<Vec<DeadLetterRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT page, run_id, attempts, last_error, failed_at FROM dead_letters ORDER BY page",
        )?;

        let letters = stmt
            .query_map([], |row| {
                Ok(DeadLetterRecord {
                    page: row.get(0)?,
                    run_id: row.get(1)?,
                    attempts: row.get(2)?,
                    last_error: row.get(3)?,
                    failed_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(letters)
    }

    // ===== Companies / Statistics =====

    fn load_companies(&self) -> StorageResult<Vec<CompanyRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT company_id, name, homepage, categories, revenue, profit, foundation_year
             FROM companies ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                    row.get::<_, Option<i64>>(6)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut companies = Vec::with_capacity(rows.len());
        for (company_id, name, homepage, categories, revenue, profit, foundation_year) in rows {
            companies.push(CompanyRecord {
                company_id,
                name,
                homepage,
                categories: Self::decode_categories(&categories)?,
                revenue,
                profit,
                foundation_year,
            });
        }

        Ok(companies)
    }

    fn get_company(&self, company_id: &str) -> StorageResult<Option<CompanyRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT company_id, name, homepage, categories, revenue, profit, foundation_year
             FROM companies WHERE company_id = ?1",
        )?;

        let row = stmt
            .query_row(params![company_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                    row.get::<_, Option<i64>>(6)?,
                ))
            })
            .optional()?;

        match row {
            Some((company_id, name, homepage, categories, revenue, profit, foundation_year)) => {
                Ok(Some(CompanyRecord {
                    company_id,
                    name,
                    homepage,
                    categories: Self::decode_categories(&categories)?,
                    revenue,
                    profit,
                    foundation_year,
                }))
            }
            None => Ok(None),
        }
    }

    fn count_companies(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_completed_pages(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM completed_pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_dead_letters(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM dead_letters", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(id: &str, categories: &[&str]) -> CompanyRecord {
        CompanyRecord {
            company_id: id.to_string(),
            name: Some(format!("Company {}", id)),
            homepage: Some(format!("https://{}.example.com", id)),
            categories: categories.iter().map(|s| s.to_string()).collect(),
            revenue: Some(100_000),
            profit: Some(10_000),
            foundation_year: Some(1998),
        }
    }

    #[test]
    fn test_create_and_get_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("abc123").unwrap();

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.config_hash, "abc123");
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.finished_at.is_none());
    }

    #[test]
    fn test_get_latest_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.get_latest_run().unwrap().is_none());

        storage.create_run("hash1").unwrap();
        let second = storage.create_run("hash2").unwrap();

        let latest = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(latest.id, second);
        assert_eq!(latest.config_hash, "hash2");
    }

    #[test]
    fn test_complete_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();

        storage.complete_run(run_id).unwrap();

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_record_page_inserts_companies_and_checkpoint() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();

        let batch = vec![company("1111", &["Byggverksamhet"]), company("2222", &[])];
        let inserted = storage.record_page(run_id, 1, &batch).unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(storage.count_companies().unwrap(), 2);

        let pages = storage.load_completed_pages().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page, 1);
        assert_eq!(pages[0].company_count, 2);
    }

    #[test]
    fn test_record_page_dedups_by_company_id() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();

        let batch = vec![company("1111", &["Byggverksamhet"])];
        assert_eq!(storage.record_page(run_id, 1, &batch).unwrap(), 1);

        // Same company appearing again on a later page is ignored
        assert_eq!(storage.record_page(run_id, 2, &batch).unwrap(), 0);
        assert_eq!(storage.count_companies().unwrap(), 1);
        assert_eq!(storage.count_completed_pages().unwrap(), 2);
    }

    #[test]
    fn test_record_same_page_twice_is_idempotent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();

        let batch = vec![company("1111", &[]), company("2222", &[])];
        storage.record_page(run_id, 7, &batch).unwrap();
        storage.record_page(run_id, 7, &batch).unwrap();

        assert_eq!(storage.count_companies().unwrap(), 2);
        assert_eq!(storage.count_completed_pages().unwrap(), 1);
    }

    #[test]
    fn test_categories_roundtrip() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();

        let batch = vec![company("1111", &["Byggverksamhet", "Uthyrning och leasing"])];
        storage.record_page(run_id, 1, &batch).unwrap();

        let fetched = storage.get_company("1111").unwrap().unwrap();
        assert_eq!(
            fetched.categories,
            vec!["Byggverksamhet".to_string(), "Uthyrning och leasing".to_string()]
        );
        assert_eq!(fetched.revenue, Some(100_000));
    }

    #[test]
    fn test_record_empty_page_still_checkpoints() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();

        let inserted = storage.record_page(run_id, 42, &[]).unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(storage.count_completed_pages().unwrap(), 1);
        assert_eq!(storage.load_completed_pages().unwrap()[0].company_count, 0);
    }

    #[test]
    fn test_dead_letters() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();

        storage
            .record_dead_letter(run_id, 13, 5, "HTTP 500")
            .unwrap();
        storage
            .record_dead_letter(run_id, 9, 5, "timeout")
            .unwrap();

        let letters = storage.load_dead_letters().unwrap();
        assert_eq!(letters.len(), 2);
        // Ordered by page
        assert_eq!(letters[0].page, 9);
        assert_eq!(letters[1].page, 13);
        assert_eq!(letters[1].last_error, "HTTP 500");
        assert_eq!(storage.count_dead_letters().unwrap(), 2);
    }

    #[test]
    fn test_load_companies() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();

        storage
            .record_page(run_id, 1, &[company("1111", &[]), company("2222", &[])])
            .unwrap();

        let companies = storage.load_companies().unwrap();
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].company_id, "1111");
    }

    #[test]
    fn test_get_company_missing() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.get_company("nope").unwrap().is_none());
    }
}

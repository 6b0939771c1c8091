//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the segment-sweep database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track sweep runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Companies extracted from the segmentation endpoint.
-- Dedup happens here: company_id is unique and batches are inserted
-- with INSERT OR IGNORE, so re-processing a page cannot duplicate rows.
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id TEXT NOT NULL UNIQUE,
    name TEXT,
    homepage TEXT,
    categories TEXT NOT NULL,
    revenue INTEGER,
    profit INTEGER,
    foundation_year INTEGER,
    discovered_run INTEGER NOT NULL REFERENCES runs(id),
    discovered_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_companies_company_id ON companies(company_id);

-- Durable ordered log of successfully processed pages.
-- One row per page, written in the same transaction as the page's
-- company batch; resumption reads this log instead of a checkpoint file.
CREATE TABLE IF NOT EXISTS completed_pages (
    page INTEGER PRIMARY KEY,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    company_count INTEGER NOT NULL,
    completed_at TEXT NOT NULL
);

-- Pages that exhausted their retry budget or failed permanently
CREATE TABLE IF NOT EXISTS dead_letters (
    page INTEGER PRIMARY KEY,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    attempts INTEGER NOT NULL,
    last_error TEXT NOT NULL,
    failed_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

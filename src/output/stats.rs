//! Statistics generation from the sweep database
//!
//! This module provides functionality for extracting and displaying
//! sweep statistics from the storage layer.

use crate::storage::{DeadLetterRecord, RunRecord, Storage};
use crate::SweepError;

/// Sweep statistics summary
#[derive(Debug, Clone)]
pub struct SweepStatistics {
    /// Total number of persisted companies
    pub total_companies: u64,

    /// Number of pages in the completed log
    pub completed_pages: u64,

    /// Pages set aside after exhausting retries
    pub dead_letters: Vec<DeadLetterRecord>,

    /// All runs, newest first
    pub runs: Vec<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(SweepStatistics)` - Successfully loaded statistics
/// * `Err(SweepError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<SweepStatistics, SweepError> {
    let total_companies = storage.count_companies()?;
    let completed_pages = storage.count_completed_pages()?;
    let dead_letters = storage.load_dead_letters()?;
    let runs = storage.list_runs()?;

    Ok(SweepStatistics {
        total_companies,
        completed_pages,
        dead_letters,
        runs,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &SweepStatistics) {
    println!("=== Sweep Statistics ===\n");

    println!("Overview:");
    println!("  Companies persisted: {}", stats.total_companies);
    println!("  Pages completed: {}", stats.completed_pages);
    println!("  Pages dead-lettered: {}", stats.dead_letters.len());
    println!();

    if !stats.runs.is_empty() {
        println!("Runs:");
        for run in &stats.runs {
            let finished = run.finished_at.as_deref().unwrap_or("-");
            println!(
                "  #{} [{}] started {} finished {}",
                run.id,
                run.status.to_db_string(),
                run.started_at,
                finished
            );
        }
        println!();
    }

    if !stats.dead_letters.is_empty() {
        println!("Dead Letters (retry by deleting the row):");
        for letter in &stats.dead_letters {
            println!(
                "  page {} after {} attempt(s): {}",
                letter.page, letter.attempts, letter.last_error
            );
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CompanyRecord, SqliteStorage};

    #[test]
    fn test_load_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();

        let companies = vec![CompanyRecord {
            company_id: "1111".to_string(),
            name: Some("Example AB".to_string()),
            homepage: None,
            categories: vec![],
            revenue: Some(100),
            profit: Some(10),
            foundation_year: None,
        }];
        storage.record_page(run_id, 1, &companies).unwrap();
        storage.record_dead_letter(run_id, 2, 5, "HTTP 500").unwrap();
        storage.complete_run(run_id).unwrap();

        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats.total_companies, 1);
        assert_eq!(stats.completed_pages, 1);
        assert_eq!(stats.dead_letters.len(), 1);
        assert_eq!(stats.runs.len(), 1);
    }

    #[test]
    fn test_load_statistics_empty_database() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage).unwrap();

        assert_eq!(stats.total_companies, 0);
        assert_eq!(stats.completed_pages, 0);
        assert!(stats.dead_letters.is_empty());
        assert!(stats.runs.is_empty());
    }
}

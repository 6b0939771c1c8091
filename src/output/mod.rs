//! Output module for generating sweep summaries and reports
//!
//! This module handles:
//! - Generating markdown summaries of sweep results
//! - Computing category and financial aggregates over persisted companies
//! - Recording sweep statistics

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{load_statistics, print_statistics, SweepStatistics};

use crate::storage::{CompanyRecord, DeadLetterRecord, Storage};
use crate::SweepError;
use std::collections::HashMap;

/// Number of categories listed in the summary's breakdown
const TOP_CATEGORY_LIMIT: usize = 10;

/// Full sweep summary used for the markdown export
#[derive(Debug, Clone)]
pub struct SweepSummary {
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,
    pub total_companies: u64,
    pub completed_pages: u64,
    pub dead_letters: Vec<DeadLetterRecord>,
    pub top_categories: Vec<(String, u64)>,
    pub financials: FinancialSummary,
}

/// Simple financial aggregates over the persisted companies
///
/// Margin is profit over revenue, computed per company where revenue is
/// positive.
#[derive(Debug, Clone)]
pub struct FinancialSummary {
    pub with_revenue: u64,
    pub mean_revenue: Option<f64>,
    pub mean_profit: Option<f64>,
    pub mean_margin: Option<f64>,
    pub margin_negative: u64,
    pub margin_low: u64,
    pub margin_high: u64,
}

/// Generates a sweep summary from storage
///
/// # Arguments
///
/// * `storage` - The storage backend containing sweep data
///
/// # Returns
///
/// * `Ok(SweepSummary)` - Successfully generated summary
/// * `Err(SweepError)` - Failed to generate summary
pub fn generate_summary(storage: &dyn Storage) -> Result<SweepSummary, SweepError> {
    // Get the latest run
    let run = storage
        .get_latest_run()?
        .ok_or_else(|| SweepError::Storage("No sweep runs found in database".to_string()))?;

    // Calculate duration if finished
    let duration_seconds = if let (Ok(started), Some(finished_str)) = (
        run.started_at.parse::<chrono::DateTime<chrono::Utc>>(),
        &run.finished_at,
    ) {
        if let Ok(finished) = finished_str.parse::<chrono::DateTime<chrono::Utc>>() {
            Some((finished - started).num_seconds() as u64)
        } else {
            None
        }
    } else {
        None
    };

    let companies = storage.load_companies()?;

    Ok(SweepSummary {
        run_id: run.id,
        started_at: run.started_at.clone(),
        finished_at: run.finished_at.clone(),
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        config_hash: run.config_hash.clone(),
        total_companies: storage.count_companies()?,
        completed_pages: storage.count_completed_pages()?,
        dead_letters: storage.load_dead_letters()?,
        top_categories: top_categories(&companies, TOP_CATEGORY_LIMIT),
        financials: financial_summary(&companies),
    })
}

/// Counts category labels across companies and returns the most common ones
fn top_categories(companies: &[CompanyRecord], limit: usize) -> Vec<(String, u64)> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for company in companies {
        for category in &company.categories {
            *counts.entry(category.as_str()).or_insert(0) += 1;
        }
    }

    let mut sorted: Vec<(String, u64)> = counts
        .into_iter()
        .map(|(category, count)| (category.to_string(), count))
        .collect();
    // Sort by count descending, then name for a stable order
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(limit);
    sorted
}

/// Computes mean revenue/profit and the profit-margin distribution
fn financial_summary(companies: &[CompanyRecord]) -> FinancialSummary {
    let mut revenue_sum = 0f64;
    let mut revenue_count = 0u64;
    let mut profit_sum = 0f64;
    let mut profit_count = 0u64;

    let mut margin_sum = 0f64;
    let mut margin_count = 0u64;
    let mut margin_negative = 0u64;
    let mut margin_low = 0u64;
    let mut margin_high = 0u64;

    for company in companies {
        if let Some(revenue) = company.revenue {
            revenue_sum += revenue as f64;
            revenue_count += 1;
        }
        if let Some(profit) = company.profit {
            profit_sum += profit as f64;
            profit_count += 1;
        }

        if let (Some(revenue), Some(profit)) = (company.revenue, company.profit) {
            if revenue > 0 {
                let margin = profit as f64 / revenue as f64;
                margin_sum += margin;
                margin_count += 1;

                if margin < 0.0 {
                    margin_negative += 1;
                } else if margin <= 0.10 {
                    margin_low += 1;
                } else {
                    margin_high += 1;
                }
            }
        }
    }

    FinancialSummary {
        with_revenue: revenue_count,
        mean_revenue: (revenue_count > 0).then(|| revenue_sum / revenue_count as f64),
        mean_profit: (profit_count > 0).then(|| profit_sum / profit_count as f64),
        mean_margin: (margin_count > 0).then(|| margin_sum / margin_count as f64),
        margin_negative,
        margin_low,
        margin_high,
    }
}

//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of sweep results,
//! including run metadata, dead letters, category breakdowns, and simple
//! financial aggregates over the persisted companies.

use crate::output::{FinancialSummary, SweepSummary};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary file from sweep data
///
/// # Arguments
///
/// * `summary` - The sweep summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(std::io::Error)` - Failed to write summary
pub fn generate_markdown_summary(
    summary: &SweepSummary,
    output_path: &Path,
) -> std::io::Result<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a sweep summary as markdown
pub fn format_markdown_summary(summary: &SweepSummary) -> String {
    let mut md = String::new();

    // Title
    md.push_str("# Segment-Sweep Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!(
        "- **Companies Persisted**: {}\n",
        summary.total_companies
    ));
    md.push_str(&format!(
        "- **Pages Completed**: {}\n",
        summary.completed_pages
    ));
    md.push_str(&format!(
        "- **Pages Dead-Lettered**: {}\n\n",
        summary.dead_letters.len()
    ));

    // Dead letters
    if !summary.dead_letters.is_empty() {
        md.push_str("## Dead Letters\n\n");
        md.push_str("| Page | Attempts | Last Error |\n");
        md.push_str("|------|----------|------------|\n");
        for letter in &summary.dead_letters {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                letter.page, letter.attempts, letter.last_error
            ));
        }
        md.push('\n');
    }

    // Category breakdown
    if !summary.top_categories.is_empty() {
        md.push_str("## Top Categories\n\n");
        md.push_str("| Category | Companies |\n");
        md.push_str("|----------|-----------|\n");
        for (category, count) in &summary.top_categories {
            md.push_str(&format!("| {} | {} |\n", category, count));
        }
        md.push('\n');
    }

    // Financial aggregates
    md.push_str("## Financials\n\n");
    format_financials(&mut md, &summary.financials);

    md
}

fn format_financials(md: &mut String, financials: &FinancialSummary) {
    md.push_str(&format!(
        "- **Companies with revenue figures**: {}\n",
        financials.with_revenue
    ));
    if let Some(mean_revenue) = financials.mean_revenue {
        md.push_str(&format!("- **Mean revenue**: {:.0}\n", mean_revenue));
    }
    if let Some(mean_profit) = financials.mean_profit {
        md.push_str(&format!("- **Mean profit**: {:.0}\n", mean_profit));
    }
    if let Some(mean_margin) = financials.mean_margin {
        md.push_str(&format!(
            "- **Mean profit margin**: {:.1}%\n",
            mean_margin * 100.0
        ));
    }
    md.push_str(&format!(
        "- **Margin distribution**: {} negative, {} up to 10%, {} above 10%\n",
        financials.margin_negative, financials.margin_low, financials.margin_high
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DeadLetterRecord;

    fn sample_summary() -> SweepSummary {
        SweepSummary {
            run_id: 1,
            started_at: "2025-01-01T00:00:00Z".to_string(),
            finished_at: Some("2025-01-01T01:00:00Z".to_string()),
            duration_seconds: Some(3600),
            status: "completed".to_string(),
            config_hash: "abc123".to_string(),
            total_companies: 250,
            completed_pages: 13,
            dead_letters: vec![DeadLetterRecord {
                page: 7,
                run_id: 1,
                attempts: 5,
                last_error: "HTTP 500".to_string(),
                failed_at: "2025-01-01T00:30:00Z".to_string(),
            }],
            top_categories: vec![
                ("Byggverksamhet".to_string(), 120),
                ("Datakonsultverksamhet".to_string(), 80),
            ],
            financials: FinancialSummary {
                with_revenue: 240,
                mean_revenue: Some(95_000.0),
                mean_profit: Some(8_200.0),
                mean_margin: Some(0.086),
                margin_negative: 12,
                margin_low: 150,
                margin_high: 78,
            },
        }
    }

    #[test]
    fn test_format_contains_sections() {
        let md = format_markdown_summary(&sample_summary());

        assert!(md.contains("# Segment-Sweep Summary"));
        assert!(md.contains("## Run Information"));
        assert!(md.contains("## Overall Statistics"));
        assert!(md.contains("## Dead Letters"));
        assert!(md.contains("## Top Categories"));
        assert!(md.contains("## Financials"));
    }

    #[test]
    fn test_format_contains_values() {
        let md = format_markdown_summary(&sample_summary());

        assert!(md.contains("**Companies Persisted**: 250"));
        assert!(md.contains("| 7 | 5 | HTTP 500 |"));
        assert!(md.contains("| Byggverksamhet | 120 |"));
        assert!(md.contains("**Mean profit margin**: 8.6%"));
    }

    #[test]
    fn test_format_omits_empty_sections() {
        let mut summary = sample_summary();
        summary.dead_letters.clear();
        summary.top_categories.clear();

        let md = format_markdown_summary(&summary);
        assert!(!md.contains("## Dead Letters"));
        assert!(!md.contains("## Top Categories"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");

        generate_markdown_summary(&sample_summary(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("# Segment-Sweep Summary"));
    }
}

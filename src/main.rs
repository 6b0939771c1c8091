//! Segment-sweep main entry point
//!
//! This is the command-line interface for the segment-sweep crawler.

use anyhow::Context;
use clap::Parser;
use segment_sweep::config::load_config_with_hash;
use segment_sweep::crawler::sweep;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Segment-sweep: a resumable registry-segmentation crawler
///
/// Sweeps a paginated company-registry segmentation endpoint, filters
/// companies by category keyword rules, and appends them to a local
/// SQLite database with exact per-page checkpointing.
#[derive(Parser, Debug)]
#[command(name = "segment-sweep")]
#[command(version = "0.1.0")]
#[command(about = "A resumable registry-segmentation crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume an interrupted sweep (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh sweep, ignoring previous progress
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be swept without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Generate markdown summary from existing data and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else {
        handle_sweep(config, &config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("segment_sweep=info,warn"),
            1 => EnvFilter::new("segment_sweep=debug,info"),
            2 => EnvFilter::new("segment_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be swept
fn handle_dry_run(config: &segment_sweep::config::Config) {
    println!("=== Segment-Sweep Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.max_concurrent_fetches);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Page delay: {}ms", config.crawler.page_delay);
    println!("  Page cap: {}", config.crawler.max_pages);
    println!("  Empty-page stop: {}", config.crawler.max_empty_pages);
    println!(
        "  Retry: {} attempts, {}ms..{}ms backoff (x{})",
        config.crawler.retry.max_attempts,
        config.crawler.retry.initial_backoff,
        config.crawler.retry.max_backoff,
        config.crawler.retry.backoff_multiplier
    );

    println!("\nEndpoint:");
    println!("  Base URL: {}", config.endpoint.base_url);
    println!("  Start page: {}", config.endpoint.start_page);
    println!("  User agent: {}", config.endpoint.user_agent);

    println!("\nSegmentation Parameters:");
    println!(
        "  Revenue: {} - {}",
        config.segmentation.revenue_from, config.segmentation.revenue_to
    );
    println!(
        "  Profit: {} - {}",
        config.segmentation.profit_from, config.segmentation.profit_to
    );
    println!("  Company type: {}", config.segmentation.company_type);

    println!(
        "\nCategory Filter ({} exclusions, {} exceptions):",
        config.filter.exclude_keywords.len(),
        config.filter.exception_keywords.len()
    );
    for keyword in &config.filter.exclude_keywords {
        println!("  - {}", keyword);
    }
    for keyword in &config.filter.exception_keywords {
        println!("  + {}", keyword);
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &segment_sweep::config::Config) -> anyhow::Result<()> {
    use segment_sweep::output::{load_statistics, print_statistics};
    use segment_sweep::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    // Open the database
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    // Load statistics
    let stats = load_statistics(&storage)?;

    // Print statistics
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &segment_sweep::config::Config) -> anyhow::Result<()> {
    use segment_sweep::output::{generate_markdown_summary, generate_summary};
    use segment_sweep::storage::SqliteStorage;
    use std::path::Path;

    println!("=== Exporting Sweep Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    // Open the database
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    // Generate summary from storage
    tracing::info!("Loading sweep data from database...");
    let summary = generate_summary(&storage)?;

    // Write markdown summary to file
    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the main sweep operation
async fn handle_sweep(
    config: segment_sweep::config::Config,
    config_hash: &str,
    fresh: bool,
) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh sweep (ignoring previous progress)");
    } else {
        tracing::info!("Starting sweep (will resume from the completed-pages log)");
    }

    match sweep(config, config_hash, fresh).await {
        Ok(()) => {
            tracing::info!("Sweep completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Sweep failed: {}", e);
            Err(e.into())
        }
    }
}

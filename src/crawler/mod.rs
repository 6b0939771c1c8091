//! Crawler module for sweeping the segmentation endpoint
//!
//! This module contains the core sweep logic, including:
//! - HTTP fetching with bounded retry and backoff
//! - Response extraction and category filtering
//! - Frontier management with defensive next-page validation
//! - Worker pool coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;

pub use coordinator::{run_sweep, Coordinator};
pub use extractor::{extract_page, ExtractedPage, PageEnvelope};
pub use fetcher::{backoff_delay, build_http_client, build_page_url, fetch_page, FetchError};
pub use frontier::{Frontier, HintOutcome};

use crate::config::Config;
use crate::SweepError;

/// Runs a complete sweep operation
///
/// This is the main entry point for starting a sweep. It will:
/// 1. Initialize the storage layer
/// 2. Create or resume a sweep run
/// 3. Seed the frontier from the completed-pages log
/// 4. Spawn the worker pool and drain the frontier
///
/// # Arguments
///
/// * `config` - The sweep configuration
/// * `config_hash` - Hash of the configuration file
/// * `fresh` - Whether to ignore previous progress and start over
pub async fn sweep(config: Config, config_hash: &str, fresh: bool) -> Result<(), SweepError> {
    run_sweep(config, config_hash, fresh).await
}

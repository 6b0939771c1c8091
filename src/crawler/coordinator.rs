//! Sweep coordinator - main orchestration logic
//!
//! This module contains the sweep loop that coordinates all aspects of
//! the crawl, including:
//! - Initializing storage and resuming from the completed-pages log
//! - Seeding and managing the frontier
//! - Spawning the worker pool
//! - Fetching with bounded backoff, extraction, and transactional persistence
//! - Dead-lettering pages that exhaust their retry budget

use crate::config::Config;
use crate::crawler::extractor::extract_page;
use crate::crawler::fetcher::{
    backoff_delay, build_http_client, build_page_url, fetch_page,
};
use crate::crawler::frontier::{Frontier, HintOutcome};
use crate::filter::CategoryFilter;
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::SweepError;
use reqwest::Client;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;

/// Main sweep coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    storage: Arc<Mutex<SqliteStorage>>,
    frontier: Arc<Mutex<Frontier>>,
    client: Client,
    filter: Arc<CategoryFilter>,
    run_id: i64,
    pages_processed: Arc<AtomicU64>,
    companies_inserted: Arc<AtomicU64>,
}

/// Shared handles passed to each worker task
#[derive(Clone)]
struct WorkerContext {
    config: Arc<Config>,
    storage: Arc<Mutex<SqliteStorage>>,
    frontier: Arc<Mutex<Frontier>>,
    client: Client,
    filter: Arc<CategoryFilter>,
    run_id: i64,
    pages_processed: Arc<AtomicU64>,
    companies_inserted: Arc<AtomicU64>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// On a fresh sweep the frontier is seeded with the configured start
    /// page. Otherwise the completed-pages log is consulted: every gap
    /// between the start page and the highest completed page is reseeded,
    /// plus the first page past the log, so resumption is exact.
    ///
    /// # Arguments
    ///
    /// * `config` - The sweep configuration
    /// * `config_hash` - Hash of the configuration file, recorded on the run
    /// * `fresh` - Whether to ignore previous progress and start over
    pub fn new(config: Config, config_hash: &str, fresh: bool) -> Result<Self, SweepError> {
        // Initialize storage
        let storage_path = Path::new(&config.output.database_path);
        let mut storage = SqliteStorage::new(storage_path)?;

        // Create or resume run
        let run_id = match storage.get_latest_run()? {
            Some(latest) if !fresh && matches!(latest.status, RunStatus::Running) => {
                tracing::info!("Resuming interrupted run {}", latest.id);
                latest.id
            }
            Some(_) | None => {
                tracing::info!("Starting new run");
                storage.create_run(config_hash)?
            }
        };

        // Seed the frontier
        let mut frontier = Frontier::new(config.crawler.max_pages, config.crawler.max_empty_pages);
        let start_page = config.endpoint.start_page;

        if fresh {
            tracing::info!("Fresh sweep, seeding frontier with page {}", start_page);
            frontier.seed([start_page]);
        } else {
            let completed = storage.load_completed_pages()?;
            let dead = storage.load_dead_letters()?;

            let mut blocked: HashSet<u32> = completed.iter().map(|c| c.page).collect();
            blocked.extend(dead.iter().map(|d| d.page));
            for &page in &blocked {
                frontier.mark_seen(page);
            }

            // Gaps in the log, then the first page past it
            let resume_from = completed
                .last()
                .map(|c| c.page + 1)
                .unwrap_or(start_page)
                .max(start_page);
            let mut seeds: Vec<u32> = (start_page..resume_from)
                .filter(|p| !blocked.contains(p))
                .collect();
            if resume_from <= config.crawler.max_pages && !blocked.contains(&resume_from) {
                seeds.push(resume_from);
            }

            if seeds.is_empty() {
                tracing::info!("Completed-pages log covers everything up to the cap");
            } else {
                tracing::info!(
                    "Resuming: seeding {} page(s) starting at {}",
                    seeds.len(),
                    seeds[0]
                );
            }
            frontier.seed(seeds);
        }

        // Build HTTP client
        let client = build_http_client(&config.endpoint.user_agent, config.crawler.request_timeout)?;

        let filter = CategoryFilter::new(&config.filter);

        Ok(Self {
            config: Arc::new(config),
            storage: Arc::new(Mutex::new(storage)),
            frontier: Arc::new(Mutex::new(frontier)),
            client,
            filter: Arc::new(filter),
            run_id,
            pages_processed: Arc::new(AtomicU64::new(0)),
            companies_inserted: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Runs the sweep to completion
    ///
    /// Spawns the worker pool and waits for it to drain the frontier.
    /// The run is marked completed on success and failed if any worker
    /// returned an error.
    pub async fn run(&mut self) -> Result<(), SweepError> {
        let workers = self.config.crawler.max_concurrent_fetches;
        tracing::info!(run_id = self.run_id, workers, "Starting sweep");

        let start_time = std::time::Instant::now();

        let mut join_set = JoinSet::new();
        for worker_id in 0..workers {
            let ctx = self.worker_context();
            join_set.spawn(worker_loop(ctx, worker_id));
        }

        let mut failure: Option<SweepError> = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!("Worker failed: {}", e);
                    failure.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!("Worker task aborted: {}", e);
                    failure.get_or_insert(SweepError::Storage(format!(
                        "worker task aborted: {}",
                        e
                    )));
                }
            }
        }

        if let Some(e) = failure {
            let mut storage = self.storage.lock().unwrap();
            storage.update_run_status(self.run_id, RunStatus::Failed)?;
            return Err(e);
        }

        {
            let mut storage = self.storage.lock().unwrap();
            storage.complete_run(self.run_id)?;
        }

        tracing::info!(
            pages = self.pages_processed.load(Ordering::Relaxed),
            new_companies = self.companies_inserted.load(Ordering::Relaxed),
            "Sweep completed in {:?}",
            start_time.elapsed()
        );

        Ok(())
    }

    fn worker_context(&self) -> WorkerContext {
        WorkerContext {
            config: Arc::clone(&self.config),
            storage: Arc::clone(&self.storage),
            frontier: Arc::clone(&self.frontier),
            client: self.client.clone(),
            filter: Arc::clone(&self.filter),
            run_id: self.run_id,
            pages_processed: Arc::clone(&self.pages_processed),
            companies_inserted: Arc::clone(&self.companies_inserted),
        }
    }
}

/// One worker task: pulls pages until the frontier is idle
async fn worker_loop(ctx: WorkerContext, worker_id: u32) -> Result<(), SweepError> {
    loop {
        let page = { ctx.frontier.lock().unwrap().next() };

        let Some(page) = page else {
            let idle = { ctx.frontier.lock().unwrap().is_idle() };
            if idle {
                break;
            }
            // Another worker may still produce a next-page hint
            tokio::time::sleep(Duration::from_millis(50)).await;
            continue;
        };

        let result = process_page(&ctx, page).await;
        {
            ctx.frontier.lock().unwrap().task_done();
        }
        result?;

        if ctx.config.crawler.page_delay > 0 {
            tokio::time::sleep(Duration::from_millis(ctx.config.crawler.page_delay)).await;
        }
    }

    tracing::debug!(worker_id, "Worker finished");
    Ok(())
}

/// Processes a single page
///
/// Fetches with bounded exponential backoff, extracts and filters the
/// companies, persists the batch together with the checkpoint row, and
/// offers the next-page hint to the frontier. A page that exhausts its
/// retry budget (or fails permanently) is dead-lettered; the worker then
/// advances past it so one poison page cannot end the sweep.
async fn process_page(ctx: &WorkerContext, page: u32) -> Result<(), SweepError> {
    let url = build_page_url(&ctx.config.endpoint, &ctx.config.segmentation, page)?;
    let retry = &ctx.config.crawler.retry;

    let mut attempt = 0u32;
    let envelope = loop {
        attempt += 1;
        match fetch_page(&ctx.client, url.clone()).await {
            Ok(envelope) => break Some(envelope),
            Err(e) if e.is_transient() && attempt < retry.max_attempts => {
                let delay = backoff_delay(retry, attempt);
                tracing::warn!(
                    page,
                    attempt,
                    error = %e,
                    "Transient failure, backing off {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::warn!(page, attempts = attempt, error = %e, "Dead-lettering page");
                {
                    let mut storage = ctx.storage.lock().unwrap();
                    storage.record_dead_letter(ctx.run_id, page, attempt, &e.to_string())?;
                }
                break None;
            }
        }
    };

    match envelope {
        Some(envelope) => {
            let extracted = extract_page(envelope, &ctx.filter);

            let inserted = {
                let mut storage = ctx.storage.lock().unwrap();
                storage.record_page(ctx.run_id, page, &extracted.companies)?
            };

            ctx.pages_processed.fetch_add(1, Ordering::Relaxed);
            ctx.companies_inserted
                .fetch_add(inserted as u64, Ordering::Relaxed);

            tracing::info!(
                page,
                raw = extracted.raw_count,
                kept = extracted.companies.len(),
                inserted,
                "Page processed"
            );

            let mut frontier = ctx.frontier.lock().unwrap();

            if extracted.raw_count == 0 {
                if frontier.record_empty() {
                    tracing::info!(page, "Consecutive empty pages reached threshold, stopping");
                }
            } else {
                frontier.record_nonempty();
            }

            match extracted.next_page {
                Some(hint) => match frontier.offer_hint(page, hint) {
                    HintOutcome::Enqueued => {
                        tracing::debug!(page, hint, "Next page enqueued");
                    }
                    HintOutcome::AlreadySeen => {
                        tracing::debug!(page, hint, "Next page already seen");
                    }
                    HintOutcome::NotAdvancing => {
                        tracing::warn!(page, hint, "Rejected non-advancing next-page hint");
                    }
                    HintOutcome::BeyondCap => {
                        tracing::warn!(page, hint, "Next-page hint beyond page cap");
                    }
                    HintOutcome::Stopped => {}
                },
                None => {
                    tracing::debug!(page, "No next-page hint, chain ends here");
                }
            }
        }
        None => {
            // Advance past the poison page so one bad page cannot end the
            // sweep; dead-lettered pages count as non-productive so a dead
            // endpoint still hits the stop threshold.
            let mut frontier = ctx.frontier.lock().unwrap();
            if frontier.record_empty() {
                tracing::info!(page, "Consecutive non-productive pages reached threshold");
            } else if frontier.offer_hint(page, page + 1) == HintOutcome::Enqueued {
                tracing::debug!(page, "Continuing sweep past dead-lettered page");
            }
        }
    }

    Ok(())
}

/// Runs a complete sweep with the given configuration
///
/// # Arguments
///
/// * `config` - The sweep configuration
/// * `config_hash` - Hash of the configuration file
/// * `fresh` - Whether to ignore previous progress and start over
///
/// # Returns
///
/// * `Ok(())` - Sweep completed successfully
/// * `Err(SweepError)` - Sweep failed with an error
pub async fn run_sweep(config: Config, config_hash: &str, fresh: bool) -> Result<(), SweepError> {
    let mut coordinator = Coordinator::new(config, config_hash, fresh)?;
    coordinator.run().await
}

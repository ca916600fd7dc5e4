//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker pool that drives a run:
//! - Initializing storage and creating or resuming a run
//! - Seeding the frontier with the shop's home page
//! - Fetching pages with retries and dispatching them to the page handler
//! - Feeding discovered requests back into the frontier
//! - Recording request outcomes and emitted products

use crate::config::Config;
use crate::crawler::context::{CrawlContext, HandlerOutput, RequestHandler};
use crate::crawler::fetcher::{fetch_url, is_dead_link, ClientPool, FetchResult};
use crate::crawler::scheduler::{Request, Scheduler};
use crate::output::{generate_markdown_summary, OutputHandler, SharedStorage, SqliteOutputHandler};
use crate::scrape::{FilterSettings, Label, Router};
use crate::state::RequestState;
use crate::storage::{RequestUpdate, RunStatus, SqliteStorage, Storage};
use crate::{ExtractError, ScraperError};
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// Progress is logged every this many processed requests
const PROGRESS_INTERVAL: u64 = 10;

/// Final tally of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: i64,
    pub requests_processed: u64,
    pub products_emitted: u64,
    pub products_rejected: u64,
    pub requests_failed: u64,
    pub dead_links: u64,
    pub retries: u64,
    pub interrupted: bool,
}

#[derive(Debug, Default)]
struct Counters {
    processed: AtomicU64,
    emitted: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    dead_links: AtomicU64,
    retries: AtomicU64,
}

impl Counters {
    fn report(&self, run_id: i64, interrupted: bool) -> RunReport {
        RunReport {
            run_id,
            requests_processed: self.processed.load(Ordering::Relaxed),
            products_emitted: self.emitted.load(Ordering::Relaxed),
            products_rejected: self.rejected.load(Ordering::Relaxed),
            requests_failed: self.failed.load(Ordering::Relaxed),
            dead_links: self.dead_links.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            interrupted,
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    output: Arc<SqliteOutputHandler>,
    scheduler: Arc<Scheduler>,
    clients: Arc<ClientPool>,
    handler: Arc<dyn RequestHandler>,
    run_id: i64,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The scraper configuration
    /// * `config_hash` - Hash of the configuration file, recorded with the run
    /// * `fresh` - Start a new run even if an interrupted one exists
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ScraperError)` - Failed to initialize
    pub fn new(config: Config, config_hash: &str, fresh: bool) -> Result<Self, ScraperError> {
        let filter = Arc::new(FilterSettings::from_config(&config.filter));
        filter.log_summary();

        let router = Router::new(filter, config.crawler.max_category_pages)?;
        Self::with_handler(config, config_hash, fresh, Arc::new(router))
    }

    /// Creates a coordinator that dispatches every page to `handler`
    pub fn with_handler(
        config: Config,
        config_hash: &str,
        fresh: bool,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<Self, ScraperError> {
        let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

        let latest = storage.get_latest_run()?;
        let resumable = latest
            .as_ref()
            .filter(|run| matches!(run.status, RunStatus::Running | RunStatus::Interrupted));

        let (run_id, scheduler) = match resumable {
            Some(run) if !fresh => {
                tracing::info!("Resuming interrupted run {}", run.id);
                let scheduler = resume_frontier(&mut storage)?;
                storage.update_run_status(run.id, RunStatus::Running)?;
                (run.id, scheduler)
            }
            _ => {
                if let Some(run) = resumable {
                    tracing::info!("Abandoning unfinished run {}", run.id);
                    storage.update_run_status(run.id, RunStatus::Interrupted)?;
                }
                storage.clear_requests()?;
                let run_id = storage.create_run(config_hash)?;
                tracing::info!("Starting new run {}", run_id);
                (run_id, Scheduler::new())
            }
        };

        let storage: SharedStorage = Arc::new(Mutex::new(storage));
        let output = Arc::new(SqliteOutputHandler::new(storage, run_id));
        let clients = ClientPool::from_config(&config)?;

        if scheduler.seen_count() == 0 {
            let seed = Request::new(Url::parse(&config.site.start_url)?, Label::TopNav);
            tracing::info!("Seeding frontier with {}", seed.url);
            output.record_request(&seed)?;
            scheduler.add_request(seed);
        }

        Ok(Self {
            config: Arc::new(config),
            output,
            scheduler: Arc::new(scheduler),
            clients: Arc::new(clients),
            handler,
            run_id,
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn output(&self) -> Arc<SqliteOutputHandler> {
        self.output.clone()
    }

    /// Runs the crawl until the frontier is exhausted
    ///
    /// Spawns `desired-concurrency` workers that share the frontier. The run
    /// is marked completed when every worker has finished, or interrupted on
    /// Ctrl-C so it can be resumed later.
    pub async fn run(&self) -> Result<RunReport, ScraperError> {
        let concurrency = self.config.crawler.desired_concurrency.max(1);
        tracing::info!(
            "Starting scrape run {} with {} worker(s), {} request(s) queued",
            self.run_id,
            concurrency,
            self.scheduler.frontier_size()
        );

        let counters = Arc::new(Counters::default());
        let started = Instant::now();

        let mut workers = JoinSet::new();
        for id in 0..concurrency {
            let worker = Worker {
                id,
                scheduler: self.scheduler.clone(),
                clients: self.clients.clone(),
                handler: self.handler.clone(),
                output: self.output.clone(),
                counters: counters.clone(),
                max_retries: self.config.crawler.max_request_retries,
                retry_delay: Duration::from_millis(self.config.crawler.retry_delay_ms),
                started,
            };
            workers.spawn(worker.run());
        }

        let interrupted = wait_for_workers(&mut workers, tokio::signal::ctrl_c()).await?;

        let report = counters.report(self.run_id, interrupted);
        if interrupted {
            workers.abort_all();
            tracing::warn!(
                "Interrupted; run {} can be resumed ({} request(s) still queued)",
                self.run_id,
                self.scheduler.frontier_size()
            );
            self.output.finalize(RunStatus::Interrupted)?;
        } else {
            self.output.finalize(RunStatus::Completed)?;
        }

        tracing::info!(
            "Run {} finished in {:?}: {} request(s), {} product(s) emitted, {} filtered out, {} failed, {} dead link(s)",
            self.run_id,
            started.elapsed(),
            report.requests_processed,
            report.products_emitted,
            report.products_rejected,
            report.requests_failed,
            report.dead_links
        );

        Ok(report)
    }
}

/// Reloads unfinished requests of an interrupted run
fn resume_frontier(storage: &mut SqliteStorage) -> Result<Scheduler, ScraperError> {
    let unfinished = storage.load_unfinished_requests()?;

    let mut pending = Vec::with_capacity(unfinished.len());
    for record in &unfinished {
        if record.state == RequestState::Fetching {
            let update = RequestUpdate::new(RequestState::Pending).with_retries(record.retry_count);
            storage.update_request_state(&record.unique_key, &update)?;
        }
        pending.push(record.to_request()?);
    }

    let known = storage.load_request_keys()?;
    tracing::info!(
        "Loaded {} unfinished of {} known request(s)",
        pending.len(),
        known.len()
    );
    Ok(Scheduler::resume(pending, known))
}

async fn join_workers(workers: &mut JoinSet<()>) -> Result<(), ScraperError> {
    while let Some(result) = workers.join_next().await {
        result?;
    }
    Ok(())
}

/// Waits for every worker, or for `shutdown` to resolve
///
/// Returns true when the run was interrupted. A shutdown listener that fails
/// is logged and the workers are awaited to completion.
async fn wait_for_workers<F>(workers: &mut JoinSet<()>, shutdown: F) -> Result<bool, ScraperError>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        result = join_workers(workers) => {
            result?;
            return Ok(false);
        }
        signal = shutdown => match signal {
            Ok(()) => return Ok(true),
            Err(e) => tracing::warn!("Cannot listen for Ctrl-C, running to completion: {}", e),
        },
    }

    join_workers(workers).await?;
    Ok(false)
}

/// Outcome of one fetch-and-handle attempt
enum Attempt {
    Finished(RequestUpdate),
    Retryable(RequestUpdate),
}

struct Worker {
    id: u32,
    scheduler: Arc<Scheduler>,
    clients: Arc<ClientPool>,
    handler: Arc<dyn RequestHandler>,
    output: Arc<SqliteOutputHandler>,
    counters: Arc<Counters>,
    max_retries: u32,
    retry_delay: Duration,
    started: Instant,
}

impl Worker {
    async fn run(self) {
        tracing::debug!("Worker {} started", self.id);

        while let Some(request) = self.scheduler.next_request().await {
            self.process_request(&request).await;
            self.scheduler.complete();
            self.report_progress();
        }

        tracing::debug!("Worker {} finished", self.id);
    }

    /// Fetches and handles one request, retrying transient failures
    async fn process_request(&self, request: &Request) {
        tracing::debug!("Processing {} [{}]", request.url, request.label);
        self.record_state(request, &RequestUpdate::new(RequestState::Fetching));

        let mut retries = 0;
        let update = loop {
            match self.attempt(request).await {
                Attempt::Finished(update) => break update,
                Attempt::Retryable(update) if retries < self.max_retries => {
                    retries += 1;
                    self.counters.retries.fetch_add(1, Ordering::Relaxed);
                    let delay = self.retry_delay * retries;
                    tracing::warn!(
                        "Retrying {} ({}/{}) in {:?}: {}",
                        request.url,
                        retries,
                        self.max_retries,
                        delay,
                        update.error_message.as_deref().unwrap_or("unknown error")
                    );
                    tokio::time::sleep(delay).await;
                }
                Attempt::Retryable(update) => {
                    tracing::error!(
                        "Giving up on {} after {} retries: {}",
                        request.url,
                        retries,
                        update.error_message.as_deref().unwrap_or("unknown error")
                    );
                    break update;
                }
            }
        };

        match update.state {
            RequestState::Failed => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
            }
            RequestState::DeadLink => {
                tracing::warn!("Dead link: {}", request.url);
                self.counters.dead_links.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }

        self.record_state(request, &update.with_retries(retries));
    }

    async fn attempt(&self, request: &Request) -> Attempt {
        let client = self.clients.next_client();

        match fetch_url(client, request.url.as_str()).await {
            FetchResult::Success {
                final_url,
                status_code,
                body,
                ..
            } => {
                let loaded_url = Url::parse(&final_url).unwrap_or_else(|_| request.url.clone());
                match self.dispatch(request, loaded_url, &body) {
                    Ok(output) => Attempt::Finished(self.commit(output).with_status(Some(status_code))),
                    Err(e) => {
                        tracing::warn!("Extraction failed for {}: {}", request.url, e);
                        Attempt::Retryable(
                            RequestUpdate::new(RequestState::Failed)
                                .with_status(Some(status_code))
                                .with_error(e.to_string()),
                        )
                    }
                }
            }

            FetchResult::ContentMismatch {
                status_code,
                content_type,
            } => Attempt::Finished(
                RequestUpdate::new(RequestState::Failed)
                    .with_status(Some(status_code))
                    .with_error(format!("Expected HTML, got {}", content_type)),
            ),

            FetchResult::HttpError {
                status_code,
                retryable,
            } => {
                let state = if is_dead_link(status_code) {
                    RequestState::DeadLink
                } else {
                    RequestState::Failed
                };
                let update = RequestUpdate::new(state)
                    .with_status(Some(status_code))
                    .with_error(format!("HTTP {}", status_code));
                if retryable {
                    Attempt::Retryable(update)
                } else {
                    Attempt::Finished(update)
                }
            }

            FetchResult::NetworkError { error, retryable } => {
                let update = RequestUpdate::new(RequestState::Failed).with_error(error);
                if retryable {
                    Attempt::Retryable(update)
                } else {
                    Attempt::Finished(update)
                }
            }
        }
    }

    /// Parses the page and runs the handler on it
    ///
    /// Kept synchronous: the parsed document never lives across an await.
    fn dispatch(&self, request: &Request, loaded_url: Url, body: &str) -> Result<HandlerOutput, ExtractError> {
        let mut ctx = CrawlContext::new(request, loaded_url, body);
        self.handler.handle(&mut ctx)?;
        Ok(ctx.into_output())
    }

    /// Feeds handler output into the frontier and the output sink
    fn commit(&self, output: HandlerOutput) -> RequestUpdate {
        let mut discovered = 0;
        for next in output.requests {
            if let Err(e) = self.output.record_request(&next) {
                tracing::error!("Failed to record request {}: {}", next.url, e);
            }
            if self.scheduler.add_request(next) {
                discovered += 1;
            }
        }
        if discovered > 0 {
            tracing::debug!("Enqueued {} new request(s)", discovered);
        }

        let emitted_any = !output.records.is_empty();
        for record in &output.records {
            match self.output.emit_product(record) {
                Ok(true) => {
                    self.counters.emitted.fetch_add(1, Ordering::Relaxed);
                }
                Ok(false) => tracing::debug!("Product {} already emitted", record.url),
                Err(e) => tracing::error!("Failed to store product {}: {}", record.url, e),
            }
        }

        if output.rejected > 0 {
            self.counters
                .rejected
                .fetch_add(output.rejected as u64, Ordering::Relaxed);
        }

        if output.rejected > 0 && !emitted_any {
            RequestUpdate::new(RequestState::Rejected)
        } else {
            RequestUpdate::new(RequestState::Handled)
        }
    }

    fn record_state(&self, request: &Request, update: &RequestUpdate) {
        if let Err(e) = self.output.update_request(request, update) {
            tracing::error!("Failed to record state of {}: {}", request.url, e);
        }
    }

    fn report_progress(&self) {
        let processed = self.counters.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if processed % PROGRESS_INTERVAL == 0 {
            let rate = processed as f64 / self.started.elapsed().as_secs_f64().max(0.001);
            tracing::info!(
                "Progress: {} requests processed, {} products emitted, {} in frontier, {:.2} req/sec",
                processed,
                self.counters.emitted.load(Ordering::Relaxed),
                self.scheduler.frontier_size(),
                rate
            );
        }
    }
}

/// Runs the main crawl operation
///
/// This function orchestrates the entire run:
///
/// 1. Create or resume a run in storage
/// 2. Seed the frontier with the shop's home page
/// 3. Spawn the worker pool and crawl until the frontier is exhausted
/// 4. Mark the run as completed
/// 5. Write the markdown summary
///
/// # Example
///
/// ```no_run
/// use rex_scraper::config::load_config_with_hash;
/// use rex_scraper::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let report = run_crawl(config, &hash, false).await?;
/// println!("{} products", report.products_emitted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, config_hash: &str, fresh: bool) -> Result<RunReport, ScraperError> {
    let summary_path = config.output.summary_path.clone();
    let coordinator = Coordinator::new(config, config_hash, fresh)?;
    let report = coordinator.run().await?;

    if !report.interrupted {
        let summary = coordinator.output().generate_summary()?;
        generate_markdown_summary(&summary, Path::new(&summary_path))?;
        tracing::info!("Summary written to {}", summary_path);
    }

    Ok(report)
}

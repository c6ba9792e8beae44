//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the pieces of one crawl run together:
//! - Opening the store, optionally wiping it for a fresh run
//! - Building the frontier from the seed list plus links persisted by the
//!   previous run
//! - Running the worker pool until the frontier drains or a termination
//!   signal (SIGINT or SIGTERM) arrives
//! - Persisting the unprocessed pool on the way out
//! - Running the deferred normalization pass

use crate::config::{load_seed_list, Config};
use crate::crawler::build_http_client;
use crate::crawler::scheduler::{CrawlReport, Scheduler};
use crate::frontier::{persist_unprocessed, restore_unprocessed, Frontier};
use crate::index::{IndexEngine, NormalizationReport};
use crate::storage::{DocumentStore, SqliteStore};
use crate::url::normalize_links;
use crate::{DexError, Result};
use parking_lot::Mutex;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Per-run switches coming from the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlOptions {
    /// Drop every collection before crawling
    pub fresh: bool,
    /// Leave raw counts un-normalized after the crawl
    pub skip_normalize: bool,
}

/// Everything one run produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    pub crawl: CrawlReport,
    /// Links written to `unprocessed_links` at shutdown
    pub persisted_links: usize,
    /// `None` when normalization was skipped
    pub normalization: Option<NormalizationReport>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    engine: IndexEngine<SqliteStore>,
    frontier: Arc<Frontier>,
    options: CrawlOptions,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Opens the database, wipes it when `options.fresh` is set, and merges
    /// the links persisted by an earlier run into the frontier's pool.
    pub fn new(config: Config, options: CrawlOptions) -> Result<Self> {
        let seeds = load_seed_list(&config)?;

        let storage_path = Path::new(&config.output.database_path);
        let mut store = SqliteStore::new(storage_path)?;

        if options.fresh {
            tracing::info!("Fresh run: dropping all stored data");
            store.drop_all()?;
        }

        let restored = normalize_links(&restore_unprocessed(&mut store)?);
        tracing::info!(
            "Frontier starts with {} seeds and {} restored links",
            seeds.len(),
            restored.len()
        );
        let frontier = Arc::new(Frontier::with_pool(seeds, restored));

        let engine = IndexEngine::from_config(Arc::new(Mutex::new(store)), &config.index);

        Ok(Self {
            config: Arc::new(config),
            engine,
            frontier,
            options,
        })
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    pub fn engine(&self) -> &IndexEngine<SqliteStore> {
        &self.engine
    }

    /// Runs the crawl with `workers` workers
    ///
    /// SIGINT or SIGTERM cancels the workers; in-flight fetches are
    /// abandoned. Either way the undispatched pool is persisted before this
    /// returns. A signal during normalization stops the pass between
    /// entries.
    pub async fn run(&self, workers: usize) -> Result<CrawlSummary> {
        self.run_with_shutdown(workers, shutdown_signal()).await
    }

    /// Like `run`, but cancelled when `shutdown` completes
    pub async fn run_with_shutdown<F>(&self, workers: usize, shutdown: F) -> Result<CrawlSummary>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let signal_token = cancel.clone();
        let signal_listener = tokio::spawn(async move {
            tokio::select! {
                _ = shutdown => {
                    tracing::warn!("Shutdown signal received, stopping workers");
                    signal_token.cancel();
                }
                _ = signal_token.cancelled() => {}
            }
        });

        let result = self.run_until_cancelled(workers, cancel).await;
        signal_listener.abort();
        result
    }

    /// Like `run`, but stopped only through `cancel`
    pub async fn run_until_cancelled(
        &self,
        workers: usize,
        cancel: CancellationToken,
    ) -> Result<CrawlSummary> {
        let client = build_http_client(
            &self.config.user_agent,
            self.config.crawler.request_timeout_secs,
        )?;
        let scheduler = Scheduler::new(
            Arc::clone(&self.frontier),
            self.engine.clone(),
            client,
            Duration::from_millis(self.config.crawler.idle_poll_ms),
            cancel.clone(),
        );

        let start_time = std::time::Instant::now();
        let crawl = scheduler.run(workers).await;

        // Persist even when the workers failed, so discovery can resume
        let persisted_links = {
            let mut store = self.engine.store().lock();
            persist_unprocessed(&self.frontier, &mut *store)?
        };
        let crawl = crawl?;

        tracing::info!(
            "Crawl finished in {:?}: {} links processed",
            start_time.elapsed(),
            crawl.links_processed
        );

        let normalization = if self.options.skip_normalize {
            tracing::info!("Skipping normalization");
            None
        } else if crawl.cancelled {
            tracing::info!("Crawl interrupted; run with --normalize-only to normalize later");
            None
        } else {
            let engine = self.engine.clone();
            let report =
                tokio::task::spawn_blocking(move || engine.index_cycle_until(&cancel))
                    .await
                    .map_err(|e| DexError::Worker(e.to_string()))??;
            Some(report)
        };

        Ok(CrawlSummary {
            crawl,
            persisted_links,
            normalization,
        })
    }
}

/// Completes on the first SIGINT or SIGTERM
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => tracing::warn!("Cannot listen for SIGTERM: {}", e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Runs the main crawl operation
///
/// # Example
///
/// ```no_run
/// use dex_crawler::config::load_config;
/// use dex_crawler::crawler::{run_crawl, CrawlOptions};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// run_crawl(config, 4, CrawlOptions::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    workers: usize,
    options: CrawlOptions,
) -> Result<CrawlSummary> {
    let coordinator = Coordinator::new(config, options)?;
    coordinator.run(workers).await
}

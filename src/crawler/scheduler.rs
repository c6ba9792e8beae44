//! Worker pool that drains the frontier
//!
//! This module handles:
//! - Spawning a fixed number of workers against one shared `Frontier`
//! - The per-link pipeline: fetch, extract, store, index, follow links
//! - Idling while other workers may still discover links
//! - Stopping every worker when the cancellation token fires
//!
//! Work is pulled, not pushed: each worker asks the frontier for its next
//! link and nothing is partitioned up front.

use crate::crawler::fetcher::{fetch_url, FetchResult};
use crate::crawler::parser::extract_page;
use crate::frontier::{Dispatch, Frontier};
use crate::index::IndexEngine;
use crate::storage::DocumentStore;
use crate::url::normalize_links;
use crate::{DexError, Result};
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Totals gathered across all workers of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Links taken from the frontier and completed
    pub links_processed: usize,
    /// Pages stored and indexed
    pub pages_stored: usize,
    /// Pages fetched but dropped as invalid
    pub pages_dropped: usize,
    /// Links whose fetch did not produce an HTML page
    pub fetch_failures: usize,
    /// Workers that stopped on an error before the frontier drained
    pub workers_failed: usize,
    /// Whether the run was stopped by the cancellation token
    pub cancelled: bool,
}

#[derive(Debug, Default)]
struct Counters {
    links_processed: AtomicUsize,
    pages_stored: AtomicUsize,
    pages_dropped: AtomicUsize,
    fetch_failures: AtomicUsize,
}

/// What happened to one dispatched link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkOutcome {
    Stored,
    Dropped,
    FetchFailed,
}

/// Holds one dispatched link until it is completed
///
/// Dropping the guard without `complete` (the worker was cancelled or
/// panicked) releases the link so the frontier can still drain.
struct InFlight<'a> {
    frontier: &'a Frontier,
    url: &'a str,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn new(frontier: &'a Frontier, url: &'a str) -> Self {
        Self {
            frontier,
            url,
            done: false,
        }
    }

    fn complete(mut self) {
        self.done = true;
        self.frontier.mark_processed(self.url);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.frontier.abandon(self.url);
        }
    }
}

/// Runs crawl workers against a shared frontier and index engine
pub struct Scheduler<S> {
    frontier: Arc<Frontier>,
    engine: IndexEngine<S>,
    client: Client,
    idle_poll: Duration,
    cancel: CancellationToken,
}

impl<S> Clone for Scheduler<S> {
    fn clone(&self) -> Self {
        Self {
            frontier: Arc::clone(&self.frontier),
            engine: self.engine.clone(),
            client: self.client.clone(),
            idle_poll: self.idle_poll,
            cancel: self.cancel.clone(),
        }
    }
}

impl<S: DocumentStore + 'static> Scheduler<S> {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `frontier` - The link frontier shared by all workers
    /// * `engine` - Index engine owning the document store
    /// * `client` - HTTP client used for every fetch
    /// * `idle_poll` - Back-off while the frontier reports `Idle`
    /// * `cancel` - Token that stops all workers when cancelled
    pub fn new(
        frontier: Arc<Frontier>,
        engine: IndexEngine<S>,
        client: Client,
        idle_poll: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            frontier,
            engine,
            client,
            idle_poll,
            cancel,
        }
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Spawns `workers` workers and waits for all of them
    ///
    /// Returns once the frontier is drained or the token is cancelled. A
    /// worker that fails is logged and counted; the others keep going.
    pub async fn run(&self, workers: usize) -> Result<CrawlReport> {
        let workers = workers.max(1);
        let counters = Arc::new(Counters::default());

        tracing::info!(
            "Starting {} workers ({} seeds, {} pooled links)",
            workers,
            self.frontier.seed_len(),
            self.frontier.pool_len()
        );

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let scheduler = self.clone();
            let counters = Arc::clone(&counters);
            handles.push(tokio::spawn(async move {
                scheduler.worker_loop(id, &counters).await
            }));
        }

        let mut workers_failed = 0;
        for (id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!("Worker {} stopped: {}", id, e);
                    workers_failed += 1;
                }
                Err(e) => {
                    tracing::error!("Worker {} panicked: {}", id, DexError::Worker(e.to_string()));
                    workers_failed += 1;
                }
            }
        }

        let report = CrawlReport {
            links_processed: counters.links_processed.load(Ordering::SeqCst),
            pages_stored: counters.pages_stored.load(Ordering::SeqCst),
            pages_dropped: counters.pages_dropped.load(Ordering::SeqCst),
            fetch_failures: counters.fetch_failures.load(Ordering::SeqCst),
            workers_failed,
            cancelled: self.cancel.is_cancelled(),
        };

        tracing::info!(
            "Workers finished: {} links processed, {} pages stored, {} dropped, {} fetch failures",
            report.links_processed,
            report.pages_stored,
            report.pages_dropped,
            report.fetch_failures
        );

        Ok(report)
    }

    async fn worker_loop(&self, id: usize, counters: &Counters) -> Result<()> {
        tracing::debug!("Worker {} started", id);

        loop {
            if self.cancel.is_cancelled() {
                tracing::debug!("Worker {} cancelled", id);
                return Ok(());
            }

            match self.frontier.next_link()? {
                Dispatch::Link(url) => {
                    let in_flight = InFlight::new(&self.frontier, &url);
                    let outcome = tokio::select! {
                        _ = self.cancel.cancelled() => {
                            tracing::debug!("Worker {} cancelled during {}", id, url);
                            return Ok(());
                        }
                        outcome = self.process_link(&url) => outcome,
                    };

                    // Discoveries are already in the pool at this point
                    in_flight.complete();
                    counters.links_processed.fetch_add(1, Ordering::SeqCst);

                    match outcome? {
                        LinkOutcome::Stored => counters.pages_stored.fetch_add(1, Ordering::SeqCst),
                        LinkOutcome::Dropped => {
                            counters.pages_dropped.fetch_add(1, Ordering::SeqCst)
                        }
                        LinkOutcome::FetchFailed => {
                            counters.fetch_failures.fetch_add(1, Ordering::SeqCst)
                        }
                    };
                }
                Dispatch::Idle => {
                    tokio::select! {
                        _ = self.cancel.cancelled() => {}
                        _ = tokio::time::sleep(self.idle_poll) => {}
                    }
                }
                Dispatch::Drained => {
                    tracing::debug!("Worker {} found the frontier drained", id);
                    return Ok(());
                }
            }
        }
    }

    /// Fetch, extract, store, index and follow one link
    async fn process_link(&self, url: &str) -> Result<LinkOutcome> {
        tracing::debug!("Processing URL: {}", url);

        let (final_url, body) = match fetch_url(&self.client, url).await {
            FetchResult::Success {
                final_url, body, ..
            } => (final_url, body),
            FetchResult::ContentMismatch { content_type } => {
                tracing::debug!("Skipping {}: content type {}", url, content_type);
                return Ok(LinkOutcome::FetchFailed);
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("HTTP {} for {}", status_code, url);
                return Ok(LinkOutcome::FetchFailed);
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Failed to fetch {}: {}", url, error);
                return Ok(LinkOutcome::FetchFailed);
            }
        };

        let base_url = Url::parse(&final_url)?;
        let page = extract_page(&body, &base_url);
        let discovered = normalize_links(&page.links);

        let outcome = match self.engine.store_document(&page)? {
            Some(document) => {
                let counts = self.engine.index_document(document, &page)?;
                tracing::debug!(
                    "Indexed {} as document {} ({} title terms, {} body terms)",
                    url,
                    document,
                    counts.title,
                    counts.body
                );
                LinkOutcome::Stored
            }
            None => LinkOutcome::Dropped,
        };

        let added = self.frontier.add_discovered_links(discovered);
        tracing::trace!("{} new links from {}", added, url);

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;
    use parking_lot::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
    }

    fn scheduler(seeds: Vec<String>) -> Scheduler<SqliteStore> {
        let store = Arc::new(Mutex::new(SqliteStore::new_in_memory().unwrap()));
        Scheduler::new(
            Arc::new(Frontier::new(seeds)),
            IndexEngine::new(store),
            Client::new(),
            Duration::from_millis(10),
            CancellationToken::new(),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_crawl_follows_discovered_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(
                r#"<html><head><title>Home</title></head><body>
                   <a href="/a">A</a><a href="/b">B</a><a href="/a#dup">A again</a></body></html>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(html(
                r#"<html><head><title>A</title></head><body>cat <a href="/">home</a></body></html>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let sched = scheduler(vec![format!("{}/", server.uri())]);
        let report = sched.run(3).await.unwrap();

        // "/" is rediscovered from /a and dispatched again
        assert_eq!(report.pages_stored, 3);
        assert_eq!(report.fetch_failures, 1);
        assert_eq!(report.links_processed, 4);
        assert_eq!(report.workers_failed, 0);
        assert!(!report.cancelled);
        assert_eq!(sched.frontier().in_flight(), 0);
        assert!(sched.frontier().snapshot_unprocessed().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_page_is_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(html("<html><body>  </body></html>"))
            .mount(&server)
            .await;

        let sched = scheduler(vec![format!("{}/empty", server.uri())]);
        let report = sched.run(1).await.unwrap();

        assert_eq!(report.pages_dropped, 1);
        assert_eq!(report.pages_stored, 0);
        assert_eq!(sched.engine.store().lock().count_pages().unwrap(), 0);
    }

    #[test]
    fn test_panicking_link_is_released() {
        let frontier = Frontier::new(vec!["http://a".to_string()]);
        assert_eq!(
            frontier.next_link().unwrap(),
            Dispatch::Link("http://a".to_string())
        );

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _in_flight = InFlight::new(&frontier, "http://a");
            panic!("extractor blew up");
        }));

        assert!(result.is_err());
        assert_eq!(frontier.in_flight(), 0);
        assert_eq!(frontier.next_link().unwrap(), Dispatch::Drained);
    }

    #[test]
    fn test_completed_link_is_recorded() {
        let frontier = Frontier::new(vec!["http://a".to_string()]);
        frontier.next_link().unwrap();

        InFlight::new(&frontier, "http://a").complete();

        assert_eq!(frontier.in_flight(), 0);
        assert_eq!(frontier.processed_links(), vec!["http://a".to_string()]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let sched = scheduler(vec!["http://127.0.0.1:9/".to_string()]);
        sched.cancellation_token().cancel();

        let report = sched.run(2).await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.links_processed, 0);
    }
}

//! Link frontier shared by all crawl workers
//!
//! The frontier hands out URLs exactly once: first the seed list in its
//! original order, then links discovered while crawling, in append order.
//!
//! # Components
//!
//! - `SeedList`: fixed at startup, read-only afterwards
//! - `UnprocessedPool`: discovered links, deduplicated on every append
//! - `ProcessedLog`: append-only record of completed links
//! - `DispatchCursor`: one counter plus the seed-exhausted flag
//!
//! The cursor, the phase flag and the pool live behind a single lock, so
//! reading the cursor, bounds-checking it and advancing it is one step.
//! The processed log has its own lock.

mod persist;
mod state;

pub use persist::{persist_unprocessed, restore_unprocessed};

use parking_lot::Mutex;
use state::DispatchState;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Errors raised by the frontier
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontierError {
    /// The cursor points past the end of the pool it addresses
    #[error("dispatch cursor {cursor} out of sync with seed list ({seeds}) and pool ({pool})")]
    CursorDesync {
        cursor: usize,
        seeds: usize,
        pool: usize,
    },
}

/// Which backing sequence the cursor currently walks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierPhase {
    Seeding,
    Discovery,
}

/// Result of asking the frontier for work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A URL now owned by the caller
    Link(String),
    /// Nothing available, but other workers may still append links
    Idle,
    /// Nothing available and no dispatched link is still being worked on
    Drained,
}

/// Thread-safe seed list plus discovered-link pool
pub struct Frontier {
    dispatch: Mutex<DispatchState>,
    processed: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
}

impl Frontier {
    /// Creates a frontier in the seeding phase
    pub fn new(seeds: Vec<String>) -> Self {
        Self::with_pool(seeds, Vec::new())
    }

    /// Creates a frontier whose pool starts with `pool` (e.g. links restored
    /// from a previous run)
    pub fn with_pool(seeds: Vec<String>, pool: Vec<String>) -> Self {
        let mut state = DispatchState::new(seeds);
        state.append(pool);
        Self {
            dispatch: Mutex::new(state),
            processed: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Hands out the next URL, or reports why there is none
    ///
    /// A returned link counts as in flight until `mark_processed` is called
    /// for it. `Idle` means other workers are still in flight and may append
    /// more links; `Drained` means no more work can appear.
    pub fn next_link(&self) -> Result<Dispatch, FrontierError> {
        let mut state = self.dispatch.lock();
        match state.advance()? {
            Some(link) => {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                Ok(Dispatch::Link(link))
            }
            None if self.in_flight.load(Ordering::SeqCst) == 0 => Ok(Dispatch::Drained),
            None => Ok(Dispatch::Idle),
        }
    }

    /// Merges newly discovered links into the pool
    ///
    /// Links already in the pool (dispatched or not) are dropped. Links that
    /// were seeds or were processed earlier are not checked against.
    /// Returns how many links were actually added.
    pub fn add_discovered_links<I>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let added = self.dispatch.lock().append(urls);
        tracing::trace!("Added {} discovered links to pool", added);
        added
    }

    /// Records a dispatched link as completed
    ///
    /// Call after the link's discoveries have been added, so an idle worker
    /// never sees the pool empty with nothing in flight while links are
    /// still on their way in.
    pub fn mark_processed(&self, url: &str) {
        self.processed.lock().push(url.to_string());
        self.release_in_flight();
    }

    /// Releases a dispatched link without recording it as completed
    ///
    /// Used when a worker stops mid-link (cancellation or panic). The link
    /// is not re-queued.
    pub fn abandon(&self, url: &str) {
        tracing::debug!("Abandoned {}", url);
        self.release_in_flight();
    }

    fn release_in_flight(&self) {
        let _ = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// Pool links not yet dispatched, in dispatch order
    pub fn snapshot_unprocessed(&self) -> Vec<String> {
        self.dispatch.lock().undispatched_pool()
    }

    /// Completed links, in completion order
    pub fn processed_links(&self) -> Vec<String> {
        self.processed.lock().clone()
    }

    pub fn phase(&self) -> FrontierPhase {
        if self.dispatch.lock().seed_exhausted() {
            FrontierPhase::Discovery
        } else {
            FrontierPhase::Seeding
        }
    }

    pub fn seed_len(&self) -> usize {
        self.dispatch.lock().seed_len()
    }

    /// Pool size, including links already dispatched from it
    pub fn pool_len(&self) -> usize {
        self.dispatch.lock().pool_len()
    }

    /// Links dispatched and not yet marked processed
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

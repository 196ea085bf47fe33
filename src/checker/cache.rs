// src/checker/cache.rs
// =============================================================================
// This module remembers probe outcomes for the length of one run.
//
// A site usually links the same stylesheet, logo and nav pages from every
// file. Each distinct URL must hit the network once, even when many
// documents reach it at the same moment.
//
// How it works:
// - Every URL maps to a shared OnceCell
// - Getting (or inserting) the cell happens under DashMap's shard lock,
//   so all callers for one URL end up with the same cell
// - OnceCell::get_or_init runs the probe for the first caller only; the
//   others wait for that result instead of starting their own request
//
// Rust concepts:
// - Arc: Shared ownership, so the cell outlives the map's lock guard
// - Generic closures: the cache does not know how probing works
// =============================================================================

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use super::http::ProbeOutcome;

#[derive(Debug, Default)]
pub struct ProbeCache {
    entries: DashMap<Url, Arc<OnceCell<ProbeOutcome>>>,
}

impl ProbeCache {
    pub fn new() -> Self {
        Self::default()
    }

    // Returns the outcome for `url`, running `probe` only if no other caller
    // has run (or is running) it yet
    pub async fn get_or_probe<F, Fut>(&self, url: &Url, probe: F) -> ProbeOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProbeOutcome>,
    {
        // The map guard is dropped at the end of this statement, before any .await
        let cell = Arc::clone(self.entries.entry(url.clone()).or_default().value());

        if let Some(outcome) = cell.get() {
            debug!(%url, "probe cache hit");
            return outcome.clone();
        }

        cell.get_or_init(probe).await.clone()
    }

    /// Number of distinct URLs seen so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why not a Mutex<HashMap<Url, ProbeOutcome>>?
//    - "look up, and insert if missing" would be two steps
//    - Two tasks can both miss and both probe between those steps
//    - Here the map stores a cell that exists BEFORE the probe finishes,
//      so late callers find it and wait on it
//
// 2. What if the probing task is cancelled?
//    - tokio's OnceCell lets the next waiter run its own closure
//    - Nothing is stored until some probe actually completes
// -----------------------------------------------------------------------------

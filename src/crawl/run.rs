// src/crawl/run.rs
// =============================================================================
// This module drives a whole link check over a directory of HTML files.
//
// How it works:
// 1. Walk the crawl root and collect every HTML document
// 2. For each document (one task each, many at once): read it, parse it
//    on the blocking pool, resolve its links against the server base
// 3. Drop outgoing links when only local checks were asked for
// 4. Look every URL up in the probe cache; a miss probes the network
// 5. Turn each outcome into a record for the referencing file
//
// Failures in one document or one link become severe records. They never
// stop the other documents.
// =============================================================================

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::checker::{
    extract_html_links, read_document, record_for, resolve_link, Locality, ProbeCache,
    Prober, ResolvedLink, ValidationRecord,
};
use crate::config::CheckerConfig;
use crate::error::CrawlError;

use super::walk::{find_html_files, Discovered};

/// What the crawl is doing right now.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// A document is being read and its links resolved
    Processing(&'a Path),
    /// A URL is being probed over the network (cache misses only)
    Checking(&'a Url),
}

/// Called from whichever task is active. No ordering guarantee.
pub type ProgressFn = Arc<dyn Fn(Progress<'_>) + Send + Sync>;

// Checks every link in every HTML file under the crawl root
//
// Returns one record per problem per referencing file, in no particular
// order. Only a failing HTTP client setup or an aborted walk is an Err.
pub async fn crawl_directory(
    config: &CheckerConfig,
    progress: Option<ProgressFn>,
) -> Result<Vec<ValidationRecord>, CrawlError> {
    let crawl = Arc::new(Crawl {
        config: config.clone(),
        prober: Prober::new(config.into())?,
        cache: ProbeCache::new(),
        progress,
    });
    crawl.run().await
}

// Same as crawl_directory, without progress reporting
pub async fn validate(config: &CheckerConfig) -> Result<Vec<ValidationRecord>, CrawlError> {
    crawl_directory(config, None).await
}

// Shared by every document task
struct Crawl {
    config: CheckerConfig,
    prober: Prober,
    cache: ProbeCache,
    progress: Option<ProgressFn>,
}

impl Crawl {
    async fn run(self: Arc<Self>) -> Result<Vec<ValidationRecord>, CrawlError> {
        info!(
            root = %self.config.crawl_root.display(),
            server = %self.config.server_base,
            "starting link check"
        );

        let root = self.config.crawl_root.clone();
        let discovered = tokio::task::spawn_blocking(move || find_html_files(&root)).await?;
        let documents = discovered.len();

        // One task per document, at most file_concurrency of them working
        let slots = Arc::new(Semaphore::new(self.config.file_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for entry in discovered {
            let crawl = Arc::clone(&self);
            let slots = Arc::clone(&slots);
            tasks.spawn(async move {
                let _slot = slots.acquire_owned().await.ok();
                match entry {
                    Discovered::Document(path) => crawl.check_document(path).await,
                    Discovered::Failed { path, message } => vec![ValidationRecord::error(
                        format!("Could not read directory entry: {}", message),
                        path,
                    )],
                }
            });
        }

        let mut records = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(file_records) => records.extend(file_records),
                Err(e) => error!(error = %e, "document task did not complete"),
            }
        }

        info!(
            documents,
            urls = self.cache.len(),
            records = records.len(),
            "link check finished"
        );

        Ok(records)
    }

    // Extracts, resolves and checks all links of one document
    async fn check_document(&self, path: PathBuf) -> Vec<ValidationRecord> {
        self.report(Progress::Processing(&path));

        let html = match read_document(&path).await {
            Ok(html) => html,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not parse document");
                return vec![ValidationRecord::error(
                    format!("Could not parse document: {}", e),
                    path,
                )];
            }
        };

        // html5ever parsing is CPU work, keep it off the async workers
        let raw_links = match tokio::task::spawn_blocking(move || extract_html_links(&html)).await
        {
            Ok(raw_links) => raw_links,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not parse document");
                return vec![ValidationRecord::error(
                    format!("Could not parse document: {}", e),
                    path,
                )];
            }
        };

        let mut records = Vec::new();
        let mut links = Vec::new();
        let mut seen = HashSet::new();

        for raw in raw_links {
            match resolve_link(
                &path,
                &raw,
                &self.config.server_base,
                &self.config.crawl_root,
            ) {
                Ok(Some(link)) => {
                    if self.config.local_only && link.locality == Locality::Outgoing {
                        continue;
                    }
                    // One record per URL per file
                    if seen.insert(link.url.clone()) {
                        links.push(link);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %path.display(), link = %raw, error = %e, "could not resolve link");
                    records.push(ValidationRecord::error(
                        format!("Could not resolve link '{}': {}", raw, e),
                        &path,
                    ));
                }
            }
        }

        debug!(path = %path.display(), links = links.len(), "resolved document links");

        let checked: Vec<Option<ValidationRecord>> = stream::iter(links)
            .map(|link| self.check_link(link))
            .buffer_unordered(self.config.max_in_flight.max(1))
            .collect()
            .await;

        records.extend(checked.into_iter().flatten());
        records
    }

    async fn check_link(&self, link: ResolvedLink) -> Option<ValidationRecord> {
        let outcome = self
            .cache
            .get_or_probe(&link.url, || async {
                self.report(Progress::Checking(&link.url));
                self.prober.probe(&link.url).await
            })
            .await;

        record_for(&link.url, &outcome, &link.source, self.config.fail_on_5xx)
    }

    fn report(&self, progress: Progress<'_>) {
        if let Some(callback) = &self.progress {
            callback(progress);
        }
    }
}

// src/checker/mod.rs
// =============================================================================
// This module contains all link checking logic.
//
// Submodules:
// - resolve: Turns raw attribute values into absolute URLs
// - html: Extracts raw links from HTML documents
// - http: Makes HTTP requests to check if links are alive
// - cache: Makes sure every URL is probed at most once per run
// - record: Turns probe outcomes into per-file records
// =============================================================================

mod cache;
mod html;
mod http;
mod record;
mod resolve;

pub use cache::ProbeCache;
pub use html::{extract_html_links, read_document};
pub use http::{ProbeOutcome, ProbeSettings, Prober};
pub use record::{record_for, ValidationRecord};
pub use resolve::{locality_of, resolve_link, Locality, ResolvedLink};

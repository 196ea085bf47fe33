// src/crawl/mod.rs
// =============================================================================
// This module handles crawling a directory of HTML files.
//
// Features:
// - Recursive discovery of .html/.htm files (walk)
// - Concurrent per-document extraction and link checking (run)
// - Optional progress callback for the CLI spinner
// =============================================================================

mod run;
mod walk;

// Re-export the main crawling functions
pub use run::{crawl_directory, validate, Progress, ProgressFn};
pub use walk::{find_html_files, Discovered};

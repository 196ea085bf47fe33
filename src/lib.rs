// src/lib.rs
// =============================================================================
// link-sentinel checks that every link in a directory of HTML files resolves
// to a live resource, on the site's own server or elsewhere.
//
// The library holds the checking engine. Sorting, suppression, printing and
// exit codes are the binary's job (see report.rs and main.rs).
// =============================================================================

pub mod checker;
pub mod config;
pub mod crawl;
pub mod error;
pub mod report;

pub use checker::{ProbeOutcome, ValidationRecord};
pub use config::CheckerConfig;
pub use crawl::{crawl_directory, validate, Progress, ProgressFn};
pub use error::{ConfigError, CrawlError};

// src/error.rs
// =============================================================================
// Error types for the link checking engine.
//
// Only ConfigError and ReportError are fatal. Everything else is caught
// close to where it happens and turned into a ValidationRecord, so one bad
// file or link never stops the rest of the crawl.
// =============================================================================

use std::path::PathBuf;

use thiserror::Error;

/// Problems with the run configuration. Reported before any crawling starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid server URL '{url}': {source}")]
    InvalidServerUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("server URL '{url}' must use http or https")]
    UnsupportedScheme { url: String },

    #[error("crawl root {} does not exist: {source}", path.display())]
    MissingCrawlRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("crawl root {} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Failures that stop a whole run.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("directory walk did not complete: {0}")]
    Walk(#[from] tokio::task::JoinError),
}

/// A single raw link that could not be turned into an absolute URL.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("malformed URL '{url}': {source}")]
    Malformed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("document {} is outside the crawl root", path.display())]
    OutsideRoot { path: PathBuf },
}

/// A document that could not be loaded for link extraction.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("could not read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("file is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Why a probe could not produce a final status code.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("too many redirects (more than {0})")]
    TooManyRedirects(usize),

    #[error("redirect loop back to '{0}'")]
    RedirectLoop(String),

    #[error("invalid redirect location '{location}': {source}")]
    BadLocation {
        location: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request limiter closed")]
    LimiterClosed(#[from] tokio::sync::AcquireError),

    // Redirects are always followed, so a 3xx should never be final.
    #[error("answered {status} but the redirect could not be followed")]
    UnfollowedRedirect { status: u16 },
}

/// Problems loading the ignore-pattern file.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("could not read ignore file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid ignore pattern on line {line}: {source}")]
    Pattern {
        line: usize,
        #[source]
        source: regex::Error,
    },
}

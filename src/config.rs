// src/config.rs
// =============================================================================
// Run configuration for one link check.
//
// CheckerConfig::new validates the two required inputs (server base URL and
// crawl root) up front. Once it returns Ok, crawling cannot fail for
// configuration reasons anymore.
// =============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of retries after a transport failure.
pub const DEFAULT_RETRIES: u32 = 1;

/// Default number of redirect hops followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Default number of probes allowed on the wire at the same time.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 32;

/// Default number of documents processed at the same time.
pub const DEFAULT_FILE_CONCURRENCY: usize = 16;

#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Origin the site will be served from. Always ends with '/'.
    pub server_base: Url,
    /// Canonical, absolute directory holding the HTML files.
    pub crawl_root: PathBuf,
    /// Skip links that leave the server origin.
    pub local_only: bool,
    /// Treat 5xx answers as errors instead of warnings.
    pub fail_on_5xx: bool,
    /// Do not warn about permanent (301) redirects.
    pub ignore_301: bool,
    pub timeout: Duration,
    pub retries: u32,
    pub max_redirects: usize,
    pub max_in_flight: usize,
    pub file_concurrency: usize,
    pub user_agent: String,
}

impl CheckerConfig {
    // Builds a config with default flags after validating both inputs
    //
    // Fails when the server is not an absolute http(s) URL or when the
    // crawl root is missing or not a directory.
    pub fn new(server: &str, crawl_root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let server_base = normalize_server_base(server)?;

        let root = crawl_root.as_ref();
        let crawl_root = root
            .canonicalize()
            .map_err(|source| ConfigError::MissingCrawlRoot {
                path: root.to_path_buf(),
                source,
            })?;
        if !crawl_root.is_dir() {
            return Err(ConfigError::NotADirectory { path: crawl_root });
        }

        Ok(Self {
            server_base,
            crawl_root,
            local_only: false,
            fail_on_5xx: false,
            ignore_301: false,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            file_concurrency: DEFAULT_FILE_CONCURRENCY,
            user_agent: concat!("link-sentinel/", env!("CARGO_PKG_VERSION")).to_string(),
        })
    }
}

// Parses the server URL and puts it into the form every resolved link is
// compared against: http(s) only, no query or fragment, trailing slash.
pub fn normalize_server_base(server: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(server.trim()).map_err(|source| ConfigError::InvalidServerUrl {
        url: server.to_string(),
        source,
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
        return Err(ConfigError::UnsupportedScheme {
            url: server.to_string(),
        });
    }

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

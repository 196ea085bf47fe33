// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
// =============================================================================

use std::path::PathBuf;

use clap::Parser;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
#[derive(Parser, Debug)]
#[command(
    name = "link-sentinel",
    version,
    about = "Checks every link in a directory of HTML files before you publish it",
    long_about = "link-sentinel walks a directory of HTML files, resolves every href/src \
                  against the server the site will be served from, and checks each URL \
                  with a HEAD request. Broken links are errors; permanent redirects and \
                  5xx answers are warnings. Perfect for CI/CD pipelines."
)]
pub struct Cli {
    /// Server the directory is served from (e.g., http://localhost:8080)
    #[arg(short, long)]
    pub server: String,

    /// Directory with the HTML files to check
    #[arg(short, long)]
    pub dir: PathBuf,

    /// File with line-separated regular expressions; matching errors and
    /// warnings are not reported
    #[arg(long, value_name = "FILE")]
    pub ignore_file: Option<PathBuf>,

    /// Only check links pointing at the server, skip outgoing links
    #[arg(short, long = "local-checks-only")]
    pub local_only: bool,

    /// Always exit with code 0, even when errors were found
    #[arg(short, long)]
    pub ignore_errors: bool,

    /// Treat 5xx answers as errors instead of warnings
    #[arg(long = "fail-500")]
    pub fail_500: bool,

    /// Do not warn about permanent (301) redirects
    #[arg(long = "ignore-301")]
    pub ignore_301: bool,

    /// Output results in JSON format instead of text lines
    #[arg(long)]
    pub json: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Maximum number of requests in flight at the same time
    #[arg(long, default_value_t = 32)]
    pub max_in_flight: usize,

    /// Hide the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Print debug logs to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

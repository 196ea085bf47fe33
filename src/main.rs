// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging and the progress spinner
// 3. Run the link check over the directory
// 4. Sort, filter and print the results
// 5. Exit with proper code (0 = success, 1 = errors found, 2 = fatal error)
// =============================================================================

mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use link_sentinel::report::{self, Suppressions};
use link_sentinel::{crawl_directory, CheckerConfig, Progress, ProgressFn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so stdout only carries the report
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Returns:
//   Ok(0) = no errors (or errors ignored)
//   Ok(1) = errors found
//   Err   = configuration problem, nothing was checked
async fn run(cli: Cli) -> Result<i32> {
    debug!(?cli, "CLI arguments parsed");

    let suppressions = match &cli.ignore_file {
        Some(path) => Suppressions::load(path).context("loading ignore patterns")?,
        None => Suppressions::default(),
    };

    let mut config = CheckerConfig::new(&cli.server, &cli.dir).context("invalid configuration")?;
    config.local_only = cli.local_only;
    config.fail_on_5xx = cli.fail_500;
    config.ignore_301 = cli.ignore_301;
    config.timeout = Duration::from_secs(cli.timeout);
    config.max_in_flight = cli.max_in_flight;

    let spinner = (!cli.no_progress && !cli.json).then(new_spinner);
    let progress = spinner.clone().map(|bar| -> ProgressFn {
        Arc::new(move |p: Progress<'_>| match p {
            Progress::Processing(path) => bar.set_message(format!("Processing {}", path.display())),
            Progress::Checking(url) => bar.set_message(format!("Checking {}", url)),
        })
    });

    let records = crawl_directory(&config, progress).await;
    if let Some(bar) = &spinner {
        bar.finish_and_clear();
    }
    let records = records.context("link check failed")?;

    let records = report::prepare(records, &suppressions);

    if cli.json {
        println!("{}", report::render_json(&records)?);
    } else {
        println!("{}", report::render_text(&records));
    }

    Ok(report::exit_code(&records, cli.ignore_errors))
}

fn new_spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

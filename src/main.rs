//! # LA Times News
//!
//! Collects Los Angeles Times search results for a phrase and topic over a
//! trailing window of calendar months, then exports them as thumbnail images
//! plus a CSV table.
//!
//! ## Usage
//!
//! ```sh
//! latimes_news -s "wildfire" -t California -m 2
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: CLI flags over an optional YAML job file, validated
//!    before a browser is ever started
//! 2. **Crawl**: a headless Chromium session searches, filters by topic,
//!    sorts by newest and walks result pages until the date cutoff
//! 3. **Retry**: a failed crawl is discarded along with its browser and
//!    started over, up to `max_tries` times
//! 4. **Export**: thumbnails and `data.csv`

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod runner;
mod scrapers;
#[cfg(test)]
mod testing;
mod topics;
mod utils;

use browser::chromium::ChromiumLauncher;
use cli::Cli;
use config::JobConfig;
use outputs::{images, table};
use runner::{DiagnosticsPaths, SessionRunner};
use scrapers::navigation::NavigationController;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("latimes_news starting up");

    // Parse CLI and resolve the job
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let job = JobConfig::resolve(&args).await?;
    if let Err(e) = job.validate() {
        error!(error = %e, "Job configuration rejected");
        return Err(e.into());
    }
    info!(
        search_phrase = %job.search_phrase,
        topic = %job.topic,
        months_behind = ?job.months_behind,
        max_tries = job.max_tries,
        wait_seconds = job.wait_seconds,
        "Job configured"
    );

    // Early check: every output location must be writable before we spend a crawl
    let spreadsheet_dir = job
        .spreadsheet_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| ".".into());
    for dir in [&job.images_dir, &job.diagnostics_dir, &spreadsheet_dir] {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Crawl ----
    let cutoff = job.cutoff(Local::now().date_naive())?;
    let controller = NavigationController::new(job.query(), job.start_url()?, cutoff, job.wait());
    info!(cutoff = %controller.cutoff(), "Collecting articles published on or after cutoff");

    let launcher = ChromiumLauncher::new(job.headful, job.wait());
    let runner = SessionRunner::new(
        launcher,
        controller,
        job.max_tries,
        DiagnosticsPaths::in_dir(&job.diagnostics_dir),
    );

    let records = match runner.run_until_success().await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "Giving up on the crawl");
            return Err(e.into());
        }
    };

    // ---- Export ----
    // Table first: an image problem must not cost the whole result set.
    table::write_table(&records, &job.spreadsheet_path).await?;
    images::write_images(&records, &job.images_dir).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        records = records.len(),
        spreadsheet = %job.spreadsheet_path.display(),
        "Execution complete"
    );

    Ok(())
}

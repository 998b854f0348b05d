//! Command-line interface definitions for the LA Times news scraper.
//!
//! Every option can also come from a `LATIMES_*` environment variable or from
//! the YAML job file given with `--config`. Flags win over the file.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for one scraping job.
///
/// # Examples
///
/// ```sh
/// # Everything on the command line
/// latimes_news -s "wildfire" -t California -m 2
///
/// # Job file, with the topic overridden
/// latimes_news -c job.yaml -t Politics
/// ```
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML job file
    #[arg(short, long, env = "LATIMES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Phrase typed into the site search
    #[arg(short, long, env = "LATIMES_SEARCH_PHRASE")]
    pub search_phrase: Option<String>,

    /// Topic filter, one of the site's topic labels
    #[arg(short, long, env = "LATIMES_TOPIC")]
    pub topic: Option<String>,

    /// How many calendar months back to collect (0 and 1 both mean the current month)
    #[arg(short, long, env = "LATIMES_MONTHS_BEHIND")]
    pub months_behind: Option<u32>,

    /// Budget in seconds for every individual wait in the browser
    #[arg(long, env = "LATIMES_WAIT_SECONDS")]
    pub wait_seconds: Option<u64>,

    /// Whole-session attempts before giving up
    #[arg(long, env = "LATIMES_MAX_TRIES")]
    pub max_tries: Option<u32>,

    /// Page the browser opens first
    #[arg(long, env = "LATIMES_START_URL")]
    pub start_url: Option<String>,

    /// Output CSV file
    #[arg(long, env = "LATIMES_SPREADSHEET_PATH")]
    pub spreadsheet_path: Option<PathBuf>,

    /// Directory thumbnails are written to
    #[arg(long, env = "LATIMES_IMAGES_DIR")]
    pub images_dir: Option<PathBuf>,

    /// Directory the page source and screenshot of a failed attempt go to
    #[arg(long, env = "LATIMES_DIAGNOSTICS_DIR")]
    pub diagnostics_dir: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long, env = "LATIMES_HEADFUL")]
    pub headful: bool,
}

//! Job configuration: YAML file, command-line overrides, and validation.
//!
//! ```yaml
//! search_phrase: wildfire
//! topic: California
//! months_behind: 2
//! wait_seconds: 20
//! max_tries: 2
//! spreadsheet_path: output/data.csv
//! images_dir: output
//! ```
//!
//! Only the first three keys are required (from the file or the command
//! line); the rest fall back to the defaults below. A missing
//! `months_behind` is rejected rather than defaulted.

use crate::cli::Cli;
use crate::error::{Result, ScraperError};
use crate::scrapers::navigation::SearchQuery;
use crate::topics::is_allowed_topic;
use crate::utils::cutoff_date;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_START_URL: &str = "https://www.latimes.com/";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    pub search_phrase: String,
    pub topic: String,
    /// Required; `None` only until a file or flag supplies it.
    pub months_behind: Option<u32>,
    pub wait_seconds: u64,
    pub max_tries: u32,
    pub start_url: String,
    pub spreadsheet_path: PathBuf,
    pub images_dir: PathBuf,
    pub diagnostics_dir: PathBuf,
    pub headful: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            search_phrase: String::new(),
            topic: String::new(),
            months_behind: None,
            wait_seconds: 20,
            max_tries: 2,
            start_url: DEFAULT_START_URL.to_string(),
            spreadsheet_path: PathBuf::from("output/data.csv"),
            images_dir: PathBuf::from("output"),
            diagnostics_dir: PathBuf::from("output"),
            headful: false,
        }
    }
}

impl JobConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml(&text)?;
        info!("Loaded job configuration");
        Ok(config)
    }

    /// Build the job from the optional file named by `--config`, then apply
    /// every flag that was given on top of it.
    pub async fn resolve(cli: &Cli) -> Result<Self> {
        let base = match &cli.config {
            Some(path) => Self::load(path).await?,
            None => Self::default(),
        };
        Ok(base.with_overrides(cli))
    }

    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(v) = &cli.search_phrase {
            self.search_phrase = v.clone();
        }
        if let Some(v) = &cli.topic {
            self.topic = v.clone();
        }
        if let Some(v) = cli.months_behind {
            self.months_behind = Some(v);
        }
        if let Some(v) = cli.wait_seconds {
            self.wait_seconds = v;
        }
        if let Some(v) = cli.max_tries {
            self.max_tries = v;
        }
        if let Some(v) = &cli.start_url {
            self.start_url = v.clone();
        }
        if let Some(v) = &cli.spreadsheet_path {
            self.spreadsheet_path = v.clone();
        }
        if let Some(v) = &cli.images_dir {
            self.images_dir = v.clone();
        }
        if let Some(v) = &cli.diagnostics_dir {
            self.diagnostics_dir = v.clone();
        }
        self.headful |= cli.headful;
        self
    }

    /// Reject jobs that could never produce a meaningful crawl.
    pub fn validate(&self) -> Result<()> {
        if self.search_phrase.trim().is_empty() {
            return Err(ScraperError::Config("search_phrase must not be empty".to_string()));
        }
        self.months_behind()?;
        if self.max_tries < 1 {
            return Err(ScraperError::Config("max_tries must be at least 1".to_string()));
        }
        if !is_allowed_topic(&self.topic) {
            return Err(ScraperError::Config(format!(
                "topic {:?} is not one of the site's topics",
                self.topic
            )));
        }
        self.start_url()?;
        Ok(())
    }

    pub fn months_behind(&self) -> Result<u32> {
        self.months_behind
            .ok_or_else(|| ScraperError::Config("months_behind is required".to_string()))
    }

    /// First publication date in scope, relative to `today`.
    pub fn cutoff(&self, today: NaiveDate) -> Result<NaiveDate> {
        Ok(cutoff_date(self.months_behind()?, today))
    }

    pub fn start_url(&self) -> Result<Url> {
        Url::parse(&self.start_url)
            .map_err(|e| ScraperError::Config(format!("start_url {:?}: {e}", self.start_url)))
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_seconds)
    }

    pub fn query(&self) -> SearchQuery {
        SearchQuery {
            phrase: self.search_phrase.clone(),
            topic: self.topic.clone(),
        }
    }
}

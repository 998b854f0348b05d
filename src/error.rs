//! Error type shared by the crawler, the browser binding and the export step.
//!
//! Nothing inside the navigation or extraction code recovers from an error:
//! every variant travels up with `?` to [`crate::runner::SessionRunner`],
//! which decides whether another attempt is made.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScraperError>;

#[derive(Debug, Error)]
pub enum ScraperError {
    /// A control or condition never became ready within the wait budget.
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },

    /// Markup did not look the way the crawler expects it to.
    #[error("unexpected page structure: {0}")]
    Structure(String),

    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ScraperError {
    pub fn structure(message: impl Into<String>) -> Self {
        ScraperError::Structure(message.into())
    }

    pub fn timeout(what: impl Into<String>, waited: Duration) -> Self {
        ScraperError::Timeout {
            what: what.into(),
            waited,
        }
    }
}

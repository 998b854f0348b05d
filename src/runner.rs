//! Whole-session retry around a crawl.
//!
//! A crawl that fails halfway leaves the browser in an unknown state, so
//! nothing is retried in place. Instead every attempt gets a brand new
//! browser from a [`SessionLauncher`], and a failed attempt is torn down
//! completely before the next one starts.
//!
//! # Per-attempt lifecycle
//!
//! 1. Launch a session.
//! 2. Run the [`Crawl`] against it.
//! 3. On failure, save the rendered page source and a screenshot to the
//!    [`DiagnosticsPaths`] for post-mortem inspection.
//! 4. Close the session, on success and on failure alike.
//!
//! After `max_tries` failed attempts the last error is returned as is.
//! There is no partial result.

use crate::browser::{BrowserSession, SessionLauncher};
use crate::error::Result;
use crate::models::NewsRecord;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// One full crawl against a live session.
///
/// Implementors start from whatever page the launcher left the session on
/// and must not close the session; the runner owns it.
pub trait Crawl {
    async fn crawl<S: BrowserSession>(&self, session: &S) -> Result<Vec<NewsRecord>>;
}

/// Fixed locations diagnostics are (over)written to after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticsPaths {
    pub page_source: PathBuf,
    pub screenshot: PathBuf,
}

impl DiagnosticsPaths {
    /// `page_source.html` and `screenshot.png` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            page_source: dir.join("page_source.html"),
            screenshot: dir.join("screenshot.png"),
        }
    }
}

/// Runs a [`Crawl`] until it succeeds or `max_tries` attempts have failed.
pub struct SessionRunner<L, C> {
    launcher: L,
    crawler: C,
    max_tries: u32,
    diagnostics: DiagnosticsPaths,
}

impl<L, C> SessionRunner<L, C>
where
    L: SessionLauncher,
    C: Crawl,
{
    /// `max_tries` below 1 is treated as 1.
    pub fn new(launcher: L, crawler: C, max_tries: u32, diagnostics: DiagnosticsPaths) -> Self {
        Self {
            launcher,
            crawler,
            max_tries: max_tries.max(1),
            diagnostics,
        }
    }

    /// Attempt the crawl until one attempt succeeds.
    ///
    /// # Returns
    ///
    /// The records of the first successful attempt, or the error of the last
    /// attempt once `max_tries` attempts have failed. Earlier errors are only
    /// logged.
    #[instrument(level = "info", skip_all, fields(max_tries = self.max_tries))]
    pub async fn run_until_success(&self) -> Result<Vec<NewsRecord>> {
        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let attempt_t0 = Instant::now();
            info!(attempt, max = self.max_tries, "Running crawl attempt");

            match self.attempt().await {
                Ok(records) => {
                    info!(
                        attempt,
                        count = records.len(),
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "Crawl succeeded"
                    );
                    return Ok(records);
                }
                Err(e) => {
                    let elapsed_ms_attempt = attempt_t0.elapsed().as_millis();
                    let elapsed_ms_total = total_t0.elapsed().as_millis();

                    if attempt >= self.max_tries {
                        error!(
                            attempt,
                            max = self.max_tries,
                            elapsed_ms_attempt,
                            elapsed_ms_total,
                            error = %e,
                            "Crawl exhausted attempts"
                        );
                        return Err(e);
                    }

                    warn!(
                        attempt,
                        max = self.max_tries,
                        elapsed_ms_attempt,
                        elapsed_ms_total,
                        error = %e,
                        "Crawl attempt failed; retrying with a fresh browser"
                    );
                }
            }
        }
    }

    /// Launch, crawl, and always close. A launch failure leaves nothing to
    /// snapshot or close.
    async fn attempt(&self) -> Result<Vec<NewsRecord>> {
        info!("Opening browser...");
        let session = self.launcher.launch().await?;

        let outcome = self.crawler.crawl(&session).await;
        if let Err(ref e) = outcome {
            error!(error = %e, "Crawl attempt failed");
            self.capture_diagnostics(&session).await;
        }

        info!("Closing browser...");
        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser session");
        }

        outcome
    }

    /// Best effort: problems here are logged and never mask the crawl error.
    async fn capture_diagnostics<S: BrowserSession>(&self, session: &S) {
        match session.page_source().await {
            Ok(html) => match write_file(&self.diagnostics.page_source, html.as_bytes()).await {
                Ok(()) => info!(
                    path = %self.diagnostics.page_source.display(),
                    "Page HTML content saved"
                ),
                Err(e) => warn!(error = %e, "Failed to save page HTML"),
            },
            Err(e) => warn!(error = %e, "Failed to read page HTML"),
        }

        match session.screenshot().await {
            Ok(png) => match write_file(&self.diagnostics.screenshot, &png).await {
                Ok(()) => info!(
                    path = %self.diagnostics.screenshot.display(),
                    "Screenshot saved"
                ),
                Err(e) => warn!(error = %e, "Failed to save screenshot"),
            },
            Err(e) => warn!(error = %e, "Failed to take screenshot"),
        }
    }
}

impl<L, C> fmt::Debug for SessionRunner<L, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRunner")
            .field("max_tries", &self.max_tries)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await
}

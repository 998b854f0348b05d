//! Date window arithmetic, log-friendly string truncation, and output
//! directory checks.

use chrono::{Datelike, Months, NaiveDate};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Earliest publication date (inclusive) that is still in scope.
///
/// The window always starts on the first of a month: `months_behind` 0 and 1
/// both mean "the current month", 2 means "this month and the previous
/// one", and so on.
///
/// # Examples
///
/// ```ignore
/// let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// assert_eq!(cutoff_date(2, today), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
/// ```
pub fn cutoff_date(months_behind: u32, today: NaiveDate) -> NaiveDate {
    let first_of_month = today.with_day(1).unwrap_or(today);
    let back = Months::new(months_behind.max(1) - 1);
    let cutoff = first_of_month
        .checked_sub_months(back)
        .unwrap_or(NaiveDate::MIN);
    debug!(months_behind, %today, %cutoff, "Computed cutoff date");
    cutoff
}

/// Truncate a string for logging purposes.
///
/// Strings longer than `max` characters keep their first `max` characters,
/// followed by `"…(+N bytes)"` for the remainder. Never splits a character.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Create `path` if needed and prove it accepts new files.
///
/// A probe file is created and removed again. Failing to remove it is only
/// logged; the directory was still shown to be writable.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;

    let probe_path = path.join("..__probe_write__");
    fs::File::create(&probe_path).await?;
    if let Err(e) = fs::remove_file(&probe_path).await {
        warn!(probe = %probe_path.display(), error = %e, "Could not remove write probe");
    }
    info!("Output directory is writable");
    Ok(())
}

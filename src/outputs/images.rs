//! Thumbnail files.
//!
//! Each record's bytes go to `images_dir/<image_file_name>`. Two records with
//! the same title and date share a file name; the later one wins.
//!
//! Headlines such as "9/11 memorial" or "AC/DC" put a path separator into
//! the file name. Those thumbnails are skipped with a warning, since writing
//! them would either fail or land outside `images_dir`.

use crate::error::Result;
use crate::models::NewsRecord;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Write every thumbnail whose file name is safe to use.
///
/// # Arguments
///
/// * `records` - Crawled records, in crawl order
/// * `images_dir` - Target directory, created if missing
///
/// # Returns
///
/// The paths actually written, in record order. Skipped records are absent.
#[instrument(level = "info", skip_all, fields(images_dir = %images_dir.display(), count = records.len()))]
pub async fn write_images(records: &[NewsRecord], images_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(images_dir).await?;

    let mut written = Vec::with_capacity(records.len());
    for record in records {
        let name = record.image_file_name();
        if !is_plain_file_name(name) {
            warn!(title = %record.title(), file_name = %name, "Thumbnail file name is not a plain file name; skipping");
            continue;
        }
        let path = images_dir.join(name);
        fs::write(&path, record.thumbnail()).await?;
        debug!(path = %path.display(), bytes = record.thumbnail().len(), "Wrote thumbnail");
        written.push(path);
    }

    info!(
        written = written.len(),
        skipped = records.len() - written.len(),
        "Wrote thumbnails"
    );
    Ok(written)
}

/// True when `name` is exactly one normal path component.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(only)), None) if only == OsStr::new(name)
    )
}

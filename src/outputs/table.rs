//! CSV table of records.
//!
//! Columns, in order: `title`, `description`, `date`, `image_filename`,
//! `mentions_money`. Rows keep the crawl order (newest first).

use crate::error::Result;
use crate::models::NewsRecord;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
struct Row<'a> {
    title: &'a str,
    description: &'a str,
    date: String,
    image_filename: &'a str,
    mentions_money: bool,
}

impl<'a> From<&'a NewsRecord> for Row<'a> {
    fn from(record: &'a NewsRecord) -> Self {
        Row {
            title: record.title(),
            description: record.summary(),
            date: record.published_on().format("%Y-%m-%d").to_string(),
            image_filename: record.image_file_name(),
            mentions_money: record.mentions_money(),
        }
    }
}

/// Serialize `records` as CSV into any writer. The header row is always
/// written, even for an empty slice.
pub fn write_csv<W: Write>(records: &[NewsRecord], out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(["title", "description", "date", "image_filename", "mentions_money"])?;
    for record in records {
        writer.serialize(Row::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `records` as a CSV file at `path`.
///
/// # Arguments
///
/// * `records` - Crawled records, in crawl order
/// * `path` - Target file; missing parent directories are created and an
///   existing file is replaced
///
/// # Returns
///
/// `Ok(())` once the whole file is on disk. Rows are serialized in memory
/// first, so a serialization error never leaves a half-written file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_table(records: &[NewsRecord], path: &Path) -> Result<()> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, buf).await?;
    info!("Wrote CSV table");
    Ok(())
}

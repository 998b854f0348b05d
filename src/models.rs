//! Data model for articles extracted from the search results.
//!
//! A [`NewsRecord`] is built once per result item by the page extractor and
//! never changes afterwards. Its derived fields ([`NewsRecord::mentions_money`]
//! and [`NewsRecord::image_file_name`]) are computed in the constructor so
//! every consumer sees the same values.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Dollar amounts such as `$11.1`, `$111,111.11`, `11 dollars` or `11 USD`.
static MONEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\$\d{1,3}(,\d{3})*(\.\d{2})?)|(\d{1,3}(,\d{3})*(\.\d{2})?\s?(USD|dollars))",
    )
    .expect("money pattern is a valid regex")
});

/// One article from the results list.
///
/// # Fields
///
/// * `title` - Headline as rendered in the result item
/// * `summary` - Teaser paragraph under the headline
/// * `published_on` - Local calendar date of publication
/// * `thumbnail` - Screenshot bytes of the article's thumbnail image
#[derive(Clone, PartialEq, Eq)]
pub struct NewsRecord {
    title: String,
    summary: String,
    published_on: NaiveDate,
    thumbnail: Vec<u8>,
    mentions_money: bool,
    image_file_name: String,
}

impl NewsRecord {
    pub fn new(title: String, summary: String, published_on: NaiveDate, thumbnail: Vec<u8>) -> Self {
        let mentions_money = MONEY_PATTERN.is_match(&title);
        let image_file_name = image_file_name_for(&title, published_on);
        Self {
            title,
            summary,
            published_on,
            thumbnail,
            mentions_money,
            image_file_name,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn published_on(&self) -> NaiveDate {
        self.published_on
    }

    pub fn thumbnail(&self) -> &[u8] {
        &self.thumbnail
    }

    /// True when the title contains an amount of money.
    pub fn mentions_money(&self) -> bool {
        self.mentions_money
    }

    /// File name the thumbnail is exported under, e.g.
    /// `la_fires_spread_2024-03-05.jpg`.
    ///
    /// Two records with the same title and date share a file name.
    pub fn image_file_name(&self) -> &str {
        &self.image_file_name
    }
}

fn image_file_name_for(title: &str, published_on: NaiveDate) -> String {
    let formatted_title = title.to_lowercase().replace(' ', "_");
    format!("{}_{}.jpg", formatted_title, published_on.format("%Y-%m-%d"))
}

// Thumbnails are large; keep them out of log lines.
impl fmt::Debug for NewsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsRecord")
            .field("title", &self.title)
            .field("summary", &self.summary)
            .field("published_on", &self.published_on)
            .field("thumbnail_bytes", &self.thumbnail.len())
            .field("mentions_money", &self.mentions_money)
            .field("image_file_name", &self.image_file_name)
            .finish()
    }
}

impl fmt::Display for NewsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title           : {}", self.title)?;
        writeln!(f, "Summary         : {}", self.summary)?;
        writeln!(f, "Published       : {}", self.published_on)?;
        write!(f, "Image file name : {}", self.image_file_name)
    }
}

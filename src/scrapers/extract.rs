//! Extraction of one page of search results.
//!
//! Items are read in the order the site renders them. Because results are
//! sorted newest first, the first item older than the cutoff means every
//! remaining item (on this page and later ones) is out of range too, so the
//! page is abandoned right there and the caller is told to stop paginating.
//!
//! # Thumbnails
//!
//! The thumbnail `src` is not a plain static asset, so it is not downloaded.
//! The image URL is opened in its own browsing context, the extractor waits
//! for the image to finish decoding, screenshots the context, then closes it
//! and returns focus to the results page.

use super::selectors;
use crate::browser::{BrowserSession, ContextId, wait_for_script};
use crate::error::{Result, ScraperError};
use crate::models::NewsRecord;
use crate::utils::truncate_for_log;
use chrono::{DateTime, Local, NaiveDate};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

static PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

const IMAGE_READY_SCRIPT: &str = "(() => { const img = document.querySelector('img'); \
     return !!img && img.complete && img.naturalWidth > 0; })()";

/// Everything learned from one results page.
#[derive(Debug)]
pub struct PageHarvest {
    /// Records inside the date window, in page order.
    pub records: Vec<NewsRecord>,
    /// Cleared as soon as an item older than the cutoff is seen.
    pub within_window: bool,
    /// Whether the page counter says further pages exist.
    pub has_more_pages: bool,
}

/// Reads result items off the current page.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    cutoff: NaiveDate,
    wait: Duration,
}

impl PageExtractor {
    /// # Arguments
    ///
    /// * `cutoff` - Earliest publication date kept, inclusive
    /// * `wait` - Budget for every wait performed while extracting
    pub fn new(cutoff: NaiveDate, wait: Duration) -> Self {
        Self { cutoff, wait }
    }

    /// Extract the current page.
    ///
    /// # Errors
    ///
    /// Any missing element or attribute, an unparseable timestamp, a
    /// thumbnail that never loads, or a missing/malformed page counter fails
    /// the whole page.
    #[instrument(level = "info", skip_all, fields(cutoff = %self.cutoff))]
    pub async fn extract<S: BrowserSession>(&self, session: &S) -> Result<PageHarvest> {
        session
            .wait_until_visible(selectors::PAGE_COUNTER, self.wait)
            .await?;
        let items = session.locate_all(selectors::RESULT_ITEMS).await?;
        debug!(count = items.len(), "Located result items");

        let mut records = Vec::with_capacity(items.len());
        let mut within_window = true;

        for (index, item) in items.iter().enumerate() {
            let title = required_text(session, item, selectors::ITEM_TITLE).await?;
            let summary = required_text(session, item, selectors::ITEM_DESCRIPTION).await?;
            let published_on = publication_date(session, item).await?;

            if published_on < self.cutoff {
                info!(
                    index,
                    %title,
                    %published_on,
                    "Reached article older than cutoff; stopping"
                );
                within_window = false;
                break;
            }

            let thumbnail = self.thumbnail(session, item).await?;
            let record = NewsRecord::new(title, summary, published_on, thumbnail);
            info!(
                index,
                title = %record.title(),
                summary = %truncate_for_log(record.summary(), 80),
                published_on = %record.published_on(),
                mentions_money = record.mentions_money(),
                "Extracted article"
            );
            records.push(record);
        }

        let (current, total) = read_page_counter(session).await?;
        debug!(current, total, "Read page counter");

        Ok(PageHarvest {
            records,
            within_window,
            has_more_pages: current < total,
        })
    }

    async fn thumbnail<S: BrowserSession>(&self, session: &S, item: &S::Element) -> Result<Vec<u8>> {
        let image = session
            .locate_in(item, selectors::ITEM_IMAGE)
            .await?
            .ok_or_else(|| ScraperError::structure("result item has no image"))?;
        let src = session
            .attribute(&image, "src")
            .await?
            .ok_or_else(|| ScraperError::structure("thumbnail image has no src"))?;
        let url = Url::parse(&src)
            .map_err(|e| ScraperError::structure(format!("bad thumbnail URL {src:?}: {e}")))?;
        self.capture_in_popup(session, &url).await
    }

    /// Screenshot `url` in an auxiliary context.
    ///
    /// The auxiliary context is always closed and the original context
    /// re-activated before returning, whatever the capture outcome.
    #[instrument(level = "debug", skip_all, fields(%url))]
    pub async fn capture_in_popup<S: BrowserSession>(&self, session: &S, url: &Url) -> Result<Vec<u8>> {
        let original = session.current_context().await?;
        let popup = session.open_context(url.as_str()).await?;

        let captured = self.capture_loaded_image(session, popup).await;
        let released = release_popup(session, popup, original).await;

        let bytes = captured?;
        released?;
        Ok(bytes)
    }

    async fn capture_loaded_image<S: BrowserSession>(&self, session: &S, popup: ContextId) -> Result<Vec<u8>> {
        session.switch_context(popup).await?;
        session
            .wait_until_visible(selectors::POPUP_IMAGE, self.wait)
            .await?;
        wait_for_script(session, IMAGE_READY_SCRIPT, self.wait, "thumbnail image to load").await?;
        session.screenshot().await
    }
}

async fn release_popup<S: BrowserSession>(session: &S, popup: ContextId, original: ContextId) -> Result<()> {
    let closed = session.close_context(popup).await;
    if let Err(ref e) = closed {
        warn!(?popup, error = %e, "Failed to close thumbnail context");
    }
    let restored = session.switch_context(original).await;
    closed.and(restored)
}

async fn required_text<S: BrowserSession>(session: &S, item: &S::Element, selector: &str) -> Result<String> {
    let element = session
        .locate_in(item, selector)
        .await?
        .ok_or_else(|| ScraperError::structure(format!("result item is missing {selector}")))?;
    session.text(&element).await
}

async fn publication_date<S: BrowserSession>(session: &S, item: &S::Element) -> Result<NaiveDate> {
    let element = session
        .locate_in(item, selectors::ITEM_TIMESTAMP)
        .await?
        .ok_or_else(|| ScraperError::structure("result item has no timestamp"))?;
    let raw = session
        .attribute(&element, selectors::TIMESTAMP_ATTRIBUTE)
        .await?
        .ok_or_else(|| ScraperError::structure("timestamp element has no data-timestamp"))?;
    let millis: i64 = raw
        .trim()
        .parse()
        .map_err(|e| ScraperError::structure(format!("bad timestamp {raw:?}: {e}")))?;
    local_date_from_millis(millis)
}

/// Millisecond epoch → whole seconds → local calendar date.
pub fn local_date_from_millis(millis: i64) -> Result<NaiveDate> {
    let seconds = millis.div_euclid(1000);
    DateTime::from_timestamp(seconds, 0)
        .map(|utc| utc.with_timezone(&Local).date_naive())
        .ok_or_else(|| ScraperError::structure(format!("timestamp {millis} out of range")))
}

/// Read the "X of Y" counter of the current results page.
pub async fn read_page_counter<S: BrowserSession>(session: &S) -> Result<(u32, u32)> {
    let counter = session
        .locate(selectors::PAGE_COUNTER)
        .await?
        .ok_or_else(|| ScraperError::structure("page counter not found"))?;
    let text = session.text(&counter).await?;
    parse_page_counter(&text)
}

/// Parse counter text such as `1 of 25` into `(current, total)`.
///
/// Exactly two numbers must be present. Thousands separators are ignored.
pub fn parse_page_counter(text: &str) -> Result<(u32, u32)> {
    let cleaned = text.replace(',', "");
    PAGE_NUMBER
        .find_iter(&cleaned)
        .map(|m| m.as_str().parse::<u32>())
        .collect_tuple()
        .and_then(|(current, total)| Some((current.ok()?, total.ok()?)))
        .ok_or_else(|| ScraperError::structure(format!("malformed page counter {text:?}")))
}

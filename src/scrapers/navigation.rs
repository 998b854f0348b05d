//! Navigation through the search flow.
//!
//! One run walks a fixed sequence of stages and never goes back:
//!
//! ```text
//! Init → SearchSubmitted → TopicFiltered → Sorted → Paginating → Done
//! ```
//!
//! Loading the start page belongs to the first transition, so a blocked or
//! timed-out home page fails the attempt like any other step.
//!
//! A failure at any stage ends the run. Retrying is the job of
//! [`crate::runner::SessionRunner`], which starts over with a new browser.
//!
//! Pagination stops on either of two independent signals from the
//! extractor: the date cutoff was crossed, or the counter says the last page
//! has been read. The second one matters when the requested window reaches
//! further back than the site's archive does.

use super::extract::{PageExtractor, read_page_counter};
use super::selectors;
use crate::browser::{BrowserSession, poll_until};
use crate::error::{Result, ScraperError};
use crate::models::NewsRecord;
use crate::runner::Crawl;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Progress of one run. Ordered, so a stage can only be followed by a
/// greater one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CrawlStage {
    Init,
    SearchSubmitted,
    TopicFiltered,
    Sorted,
    Paginating,
    Done,
}

/// What to search for.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub phrase: String,
    /// Matched as a substring of the rendered topic label; the first
    /// matching entry wins.
    pub topic: String,
}

#[derive(Debug)]
struct CrawlState {
    stage: CrawlStage,
    page: u32,
    within_window: bool,
    records: Vec<NewsRecord>,
}

impl CrawlState {
    fn new() -> Self {
        Self {
            stage: CrawlStage::Init,
            page: 1,
            within_window: true,
            records: Vec::new(),
        }
    }

    fn advance(&mut self, next: CrawlStage) {
        debug_assert!(next > self.stage, "crawl stages only move forward");
        info!(from = ?self.stage, to = ?next, "Crawl stage reached");
        self.stage = next;
    }
}

/// Drives one browser session from the home page to the last in-window
/// result.
#[derive(Debug, Clone)]
pub struct NavigationController {
    query: SearchQuery,
    start_url: Url,
    extractor: PageExtractor,
    cutoff: NaiveDate,
    wait: Duration,
}

impl NavigationController {
    /// # Arguments
    ///
    /// * `query` - Phrase and topic to search for
    /// * `start_url` - Page the search button is clicked on
    /// * `cutoff` - Earliest publication date kept. Fixed for the lifetime of
    ///   the controller, so every retry of the same crawl uses the same window
    /// * `wait` - Budget for each individual wait
    pub fn new(query: SearchQuery, start_url: Url, cutoff: NaiveDate, wait: Duration) -> Self {
        Self {
            query,
            start_url,
            extractor: PageExtractor::new(cutoff, wait),
            cutoff,
            wait,
        }
    }

    /// Earliest publication date this controller keeps.
    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Walk every stage once against `session`.
    ///
    /// # Returns
    ///
    /// Records of every in-window result, newest first. The first failing
    /// step ends the run with its error; nothing is retried here.
    #[instrument(
        level = "info",
        skip_all,
        fields(phrase = %self.query.phrase, topic = %self.query.topic, cutoff = %self.cutoff)
    )]
    pub async fn run<S: BrowserSession>(&self, session: &S) -> Result<Vec<NewsRecord>> {
        let mut state = CrawlState::new();

        info!(start_url = %self.start_url, "Opening start page");
        session.navigate(self.start_url.as_str()).await?;

        info!("Searching for news with phrase");
        self.submit_search(session).await?;
        state.advance(CrawlStage::SearchSubmitted);

        info!("Filtering news for topic");
        self.filter_topic(session).await?;
        state.advance(CrawlStage::TopicFiltered);

        info!("Sorting news by newest");
        self.sort_newest(session).await?;
        state.advance(CrawlStage::Sorted);

        info!("Scraping news in defined time period");
        state.advance(CrawlStage::Paginating);
        self.paginate(session, &mut state).await?;

        state.advance(CrawlStage::Done);
        info!(
            count = state.records.len(),
            pages = state.page,
            cutoff_reached = !state.within_window,
            "Finished scraping"
        );
        Ok(state.records)
    }

    async fn submit_search<S: BrowserSession>(&self, session: &S) -> Result<()> {
        let button = session
            .wait_until_visible(selectors::SEARCH_BUTTON, self.wait)
            .await?;
        session.click(&button).await?;

        let input = session
            .wait_until_visible(selectors::SEARCH_INPUT, self.wait)
            .await?;
        session.input_text(&input, &self.query.phrase).await?;
        session.submit(&input).await
    }

    async fn filter_topic<S: BrowserSession>(&self, session: &S) -> Result<()> {
        session
            .wait_until_visible(selectors::TOPIC_MENU, self.wait)
            .await?;

        let mut chosen = None;
        for entry in session.locate_all(selectors::TOPIC_ENTRIES).await? {
            let label = session.text(&entry).await?;
            if label.contains(&self.query.topic) {
                debug!(%label, "Matched topic entry");
                chosen = Some(entry);
                break;
            }
        }
        let entry = chosen.ok_or_else(|| {
            ScraperError::structure(format!(
                "topic {:?} is not offered for this search",
                self.query.topic
            ))
        })?;

        let checkbox = session
            .locate_in(&entry, selectors::TOPIC_CHECKBOX)
            .await?
            .ok_or_else(|| ScraperError::structure("topic entry has no checkbox"))?;
        session.click(&checkbox).await
    }

    async fn sort_newest<S: BrowserSession>(&self, session: &S) -> Result<()> {
        let select = session
            .wait_until_visible(selectors::SORT_SELECT, self.wait)
            .await?;
        session.select_by_label(&select, selectors::NEWEST_LABEL).await
    }

    async fn paginate<S: BrowserSession>(&self, session: &S, state: &mut CrawlState) -> Result<()> {
        loop {
            let harvest = self.extractor.extract(session).await?;
            info!(
                page = state.page,
                extracted = harvest.records.len(),
                within_window = harvest.within_window,
                has_more_pages = harvest.has_more_pages,
                "Scraped results page"
            );
            state.records.extend(harvest.records);

            if !harvest.within_window {
                state.within_window = false;
                info!(page = state.page, "Date cutoff reached");
                return Ok(());
            }
            if !harvest.has_more_pages {
                info!(page = state.page, "Reached last results page before the cutoff");
                return Ok(());
            }

            self.go_to_next_page(session).await?;
            state.page += 1;
        }
    }

    async fn go_to_next_page<S: BrowserSession>(&self, session: &S) -> Result<()> {
        let (current, _) = read_page_counter(session).await?;
        let next = session
            .wait_until_visible(selectors::NEXT_PAGE, self.wait)
            .await?;
        session.click(&next).await?;

        // The old results stay on screen until the next page renders.
        poll_until(self.wait, "next results page", move || async move {
            Ok(matches!(read_page_counter(session).await, Ok((page, _)) if page > current))
        })
        .await
    }
}

impl Crawl for NavigationController {
    async fn crawl<S: BrowserSession>(&self, session: &S) -> Result<Vec<NewsRecord>> {
        self.run(session).await
    }
}

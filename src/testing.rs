//! Scripted in-memory stand-in for the search site, used by unit tests.
//!
//! [`FakeSite`] answers the selectors in [`crate::scrapers::selectors`] the
//! way the real pages do: the search input only appears once the search
//! button is clicked, result items and the "X of Y" counter follow the
//! current page, and opening an image URL yields a context whose screenshot
//! is the URL's bytes.

use crate::browser::{BrowserSession, ContextId, SessionLauncher};
use crate::error::{Result, ScraperError};
use crate::scrapers::selectors;
use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn local_noon_millis(day: NaiveDate) -> i64 {
    day.and_hms_opt(12, 0, 0)
        .unwrap()
        .and_local_timezone(Local)
        .earliest()
        .unwrap()
        .timestamp_millis()
}

/// `count` articles, one per day, going back from `newest`.
pub fn descending_articles(newest: NaiveDate, count: usize, prefix: &str) -> Vec<FakeArticle> {
    (0..count)
        .map(|i| {
            FakeArticle::new(
                &format!("{prefix} {i}"),
                newest - ChronoDuration::days(i as i64),
            )
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct FakeArticle {
    pub title: String,
    pub summary: String,
    pub published_on: NaiveDate,
    pub image_url: String,
    pub timestamp_override: Option<String>,
}

impl FakeArticle {
    pub fn new(title: &str, published_on: NaiveDate) -> Self {
        let slug = title.to_lowercase().replace(' ', "-");
        Self {
            title: title.to_string(),
            summary: format!("Summary of {title}"),
            published_on,
            image_url: format!("https://ca-times.brightspotcdn.com/{slug}.jpg"),
            timestamp_override: None,
        }
    }

    fn timestamp(&self) -> String {
        self.timestamp_override
            .clone()
            .unwrap_or_else(|| local_noon_millis(self.published_on).to_string())
    }
}

/// Counters shared between a launcher and every session it produced.
#[derive(Debug, Default)]
pub struct Probe {
    pub launches: AtomicUsize,
    pub closes: AtomicUsize,
    pub page_sources: AtomicUsize,
    pub screenshots: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeElement {
    SearchButton,
    SearchInput,
    TopicMenu,
    TopicEntry(usize),
    TopicCheckbox(usize),
    SortSelect,
    Item(usize),
    Title(usize),
    Description(usize),
    Timestamp(usize),
    Image(usize),
    Counter,
    NextPage,
    PopupImage,
}

const SORT_OPTIONS: [&str; 3] = ["Relevance", "Newest", "Oldest"];

#[derive(Debug)]
struct SiteState {
    pages: Vec<Vec<FakeArticle>>,
    current_page: usize,
    pages_shown: Vec<usize>,
    topics: Vec<String>,
    search_opened: bool,
    typed: String,
    submitted: Option<String>,
    checked_topic: Option<String>,
    sort: Option<String>,
    counter_text: Option<String>,
    missing: Vec<&'static str>,
    image_loads: bool,
    navigation_fails: bool,
    visited: Vec<String>,
    contexts: Vec<(ContextId, Option<String>)>,
    active: ContextId,
    next_context: u64,
    popups_opened: usize,
}

#[derive(Debug)]
pub struct FakeSite {
    state: Mutex<SiteState>,
    probe: Arc<Probe>,
}

impl FakeSite {
    pub const MAIN_CONTEXT: ContextId = ContextId(0);

    pub fn new(pages: Vec<Vec<FakeArticle>>) -> Self {
        Self {
            state: Mutex::new(SiteState {
                pages,
                current_page: 0,
                pages_shown: vec![1],
                topics: vec![
                    "World & Nation".to_string(),
                    "California".to_string(),
                    "Politics".to_string(),
                ],
                search_opened: false,
                typed: String::new(),
                submitted: None,
                checked_topic: None,
                sort: None,
                counter_text: None,
                missing: Vec::new(),
                image_loads: true,
                navigation_fails: false,
                visited: Vec::new(),
                contexts: vec![(Self::MAIN_CONTEXT, None)],
                active: Self::MAIN_CONTEXT,
                next_context: 1,
                popups_opened: 0,
            }),
            probe: Arc::new(Probe::default()),
        }
    }

    pub fn with_probe(mut self, probe: Arc<Probe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_topics(self, topics: &[&str]) -> Self {
        self.state.lock().unwrap().topics = topics.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_counter_text(self, text: &str) -> Self {
        self.state.lock().unwrap().counter_text = Some(text.to_string());
        self
    }

    /// Never render anything matching `selector`.
    pub fn without(self, selector: &'static str) -> Self {
        self.state.lock().unwrap().missing.push(selector);
        self
    }

    pub fn with_image_never_loading(self) -> Self {
        self.state.lock().unwrap().image_loads = false;
        self
    }

    /// The start page never finishes loading.
    pub fn with_failing_navigation(self) -> Self {
        self.state.lock().unwrap().navigation_fails = true;
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    /// 1-based numbers of every results page that was displayed.
    pub fn pages_shown(&self) -> Vec<usize> {
        self.state.lock().unwrap().pages_shown.clone()
    }

    pub fn submitted_search(&self) -> Option<String> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn checked_topic(&self) -> Option<String> {
        self.state.lock().unwrap().checked_topic.clone()
    }

    pub fn sort(&self) -> Option<String> {
        self.state.lock().unwrap().sort.clone()
    }

    pub fn popups_opened(&self) -> usize {
        self.state.lock().unwrap().popups_opened
    }

    pub fn open_context_count(&self) -> usize {
        self.state.lock().unwrap().contexts.len()
    }

    pub fn active_context(&self) -> ContextId {
        self.state.lock().unwrap().active
    }

    fn find(&self, selector: &str) -> Vec<FakeElement> {
        let state = self.state.lock().unwrap();
        if state.missing.contains(&selector) {
            return Vec::new();
        }
        if state.active != Self::MAIN_CONTEXT {
            return match selector {
                selectors::POPUP_IMAGE => vec![FakeElement::PopupImage],
                _ => Vec::new(),
            };
        }
        let item_count = state.pages.get(state.current_page).map_or(0, Vec::len);
        match selector {
            selectors::SEARCH_BUTTON => vec![FakeElement::SearchButton],
            selectors::SEARCH_INPUT if state.search_opened => vec![FakeElement::SearchInput],
            selectors::TOPIC_MENU if state.submitted.is_some() => vec![FakeElement::TopicMenu],
            selectors::TOPIC_ENTRIES if state.submitted.is_some() => {
                (0..state.topics.len()).map(FakeElement::TopicEntry).collect()
            }
            selectors::SORT_SELECT if state.submitted.is_some() => vec![FakeElement::SortSelect],
            selectors::RESULT_ITEMS => (0..item_count).map(FakeElement::Item).collect(),
            selectors::PAGE_COUNTER => vec![FakeElement::Counter],
            selectors::NEXT_PAGE if state.current_page + 1 < state.pages.len() => {
                vec![FakeElement::NextPage]
            }
            _ => Vec::new(),
        }
    }

    fn find_in(&self, parent: &FakeElement, selector: &str) -> Vec<FakeElement> {
        let state = self.state.lock().unwrap();
        if state.missing.contains(&selector) {
            return Vec::new();
        }
        match (*parent, selector) {
            (FakeElement::TopicEntry(i), selectors::TOPIC_CHECKBOX) => vec![FakeElement::TopicCheckbox(i)],
            (FakeElement::Item(i), selectors::ITEM_TITLE) => vec![FakeElement::Title(i)],
            (FakeElement::Item(i), selectors::ITEM_DESCRIPTION) => vec![FakeElement::Description(i)],
            (FakeElement::Item(i), selectors::ITEM_TIMESTAMP) => vec![FakeElement::Timestamp(i)],
            (FakeElement::Item(i), selectors::ITEM_IMAGE) => vec![FakeElement::Image(i)],
            _ => Vec::new(),
        }
    }

    fn article(state: &SiteState, index: usize) -> Result<FakeArticle> {
        state
            .pages
            .get(state.current_page)
            .and_then(|page| page.get(index))
            .cloned()
            .ok_or_else(|| ScraperError::structure("stale element"))
    }
}

impl BrowserSession for FakeSite {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.navigation_fails {
            return Err(ScraperError::timeout(format!("navigation to {url}"), Duration::from_secs(20)));
        }
        state.visited.push(url.to_string());
        Ok(())
    }

    async fn locate(&self, selector: &str) -> Result<Option<FakeElement>> {
        Ok(self.find(selector).into_iter().next())
    }

    async fn locate_all(&self, selector: &str) -> Result<Vec<FakeElement>> {
        Ok(self.find(selector))
    }

    async fn locate_in(&self, parent: &FakeElement, selector: &str) -> Result<Option<FakeElement>> {
        Ok(self.find_in(parent, selector).into_iter().next())
    }

    async fn locate_all_in(&self, parent: &FakeElement, selector: &str) -> Result<Vec<FakeElement>> {
        Ok(self.find_in(parent, selector))
    }

    async fn wait_until_visible(&self, selector: &str, timeout: Duration) -> Result<FakeElement> {
        self.find(selector)
            .into_iter()
            .next()
            .ok_or_else(|| ScraperError::timeout(selector, timeout))
    }

    async fn click(&self, element: &FakeElement) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match *element {
            FakeElement::SearchButton => state.search_opened = true,
            FakeElement::TopicCheckbox(i) => state.checked_topic = state.topics.get(i).cloned(),
            FakeElement::NextPage => {
                if state.current_page + 1 < state.pages.len() {
                    state.current_page += 1;
                    let shown = state.current_page + 1;
                    state.pages_shown.push(shown);
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn input_text(&self, element: &FakeElement, text: &str) -> Result<()> {
        match element {
            FakeElement::SearchInput => {
                self.state.lock().unwrap().typed.push_str(text);
                Ok(())
            }
            other => Err(ScraperError::structure(format!("cannot type into {other:?}"))),
        }
    }

    async fn submit(&self, element: &FakeElement) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match element {
            FakeElement::SearchInput => {
                state.submitted = Some(state.typed.clone());
                Ok(())
            }
            other => Err(ScraperError::structure(format!("cannot submit {other:?}"))),
        }
    }

    async fn select_by_label(&self, element: &FakeElement, label: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match element {
            FakeElement::SortSelect if SORT_OPTIONS.contains(&label) => {
                state.sort = Some(label.to_string());
                Ok(())
            }
            _ => Err(ScraperError::structure(format!("no option labelled {label:?}"))),
        }
    }

    async fn attribute(&self, element: &FakeElement, name: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(match (*element, name) {
            (FakeElement::Timestamp(i), selectors::TIMESTAMP_ATTRIBUTE) => {
                Some(Self::article(&state, i)?.timestamp())
            }
            (FakeElement::Image(i), "src") => Some(Self::article(&state, i)?.image_url),
            _ => None,
        })
    }

    async fn text(&self, element: &FakeElement) -> Result<String> {
        let state = self.state.lock().unwrap();
        match *element {
            FakeElement::Title(i) => Ok(Self::article(&state, i)?.title),
            FakeElement::Description(i) => Ok(Self::article(&state, i)?.summary),
            FakeElement::TopicEntry(i) => Ok(format!("{} (42)", state.topics[i])),
            FakeElement::Counter => Ok(state.counter_text.clone().unwrap_or_else(|| {
                format!("{} of {}", state.current_page + 1, state.pages.len().max(1))
            })),
            _ => Ok(String::new()),
        }
    }

    async fn execute_script(&self, _script: &str) -> Result<serde_json::Value> {
        let state = self.state.lock().unwrap();
        if state.active == Self::MAIN_CONTEXT {
            Ok(serde_json::Value::Null)
        } else {
            Ok(serde_json::Value::Bool(state.image_loads))
        }
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.probe.screenshots.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        let url = state
            .contexts
            .iter()
            .find(|(id, _)| *id == state.active)
            .and_then(|(_, url)| url.clone());
        Ok(url.map_or_else(|| b"results-page".to_vec(), String::into_bytes))
    }

    async fn page_source(&self) -> Result<String> {
        self.probe.page_sources.fetch_add(1, Ordering::SeqCst);
        Ok("<html><body>results</body></html>".to_string())
    }

    async fn current_context(&self) -> Result<ContextId> {
        Ok(self.state.lock().unwrap().active)
    }

    async fn open_context(&self, url: &str) -> Result<ContextId> {
        let mut state = self.state.lock().unwrap();
        let id = ContextId(state.next_context);
        state.next_context += 1;
        state.popups_opened += 1;
        state.contexts.push((id, Some(url.to_string())));
        Ok(id)
    }

    async fn switch_context(&self, context: ContextId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.contexts.iter().any(|(id, _)| *id == context) {
            state.active = context;
            Ok(())
        } else {
            Err(ScraperError::structure(format!("unknown context {context:?}")))
        }
    }

    async fn close_context(&self, context: ContextId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.contexts.len();
        state.contexts.retain(|(id, _)| *id != context);
        if state.contexts.len() == before {
            Err(ScraperError::structure(format!("unknown context {context:?}")))
        } else {
            Ok(())
        }
    }

    async fn close(self) -> Result<()> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out a new [`FakeSite`] per launch, all reporting into one [`Probe`].
pub struct FakeLauncher<F> {
    pub probe: Arc<Probe>,
    build: F,
}

impl<F: Fn() -> FakeSite> FakeLauncher<F> {
    pub fn new(build: F) -> Self {
        Self {
            probe: Arc::new(Probe::default()),
            build,
        }
    }
}

impl<F: Fn() -> FakeSite> SessionLauncher for FakeLauncher<F> {
    type Session = FakeSite;

    async fn launch(&self) -> Result<FakeSite> {
        self.probe.launches.fetch_add(1, Ordering::SeqCst);
        Ok((self.build)().with_probe(Arc::clone(&self.probe)))
    }
}

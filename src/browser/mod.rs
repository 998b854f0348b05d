//! Browser capability layer.
//!
//! The crawler never touches a driver library directly. It talks to a
//! [`BrowserSession`], a small set of capabilities (locate, wait, click,
//! type, read, screenshot, manage auxiliary contexts) that any browser
//! automation backend can provide. [`chromium`] binds it to `chromiumoxide`;
//! the test suite binds it to a scripted in-memory site.
//!
//! Selectors are CSS selectors throughout.

pub mod chromium;

use crate::error::{Result, ScraperError};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// How often polled conditions are re-evaluated.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Identifies one browsing context (tab or popup) inside a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

/// Capabilities the crawler needs from a live browser.
///
/// Every method acts on the currently active context. Element handles are
/// only valid inside the context that produced them.
pub trait BrowserSession {
    type Element;

    /// Load `url` in the active context and wait for the navigation to
    /// finish.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// First element matching `selector`, or `None`.
    async fn locate(&self, selector: &str) -> Result<Option<Self::Element>>;

    /// All elements matching `selector`, in document order.
    async fn locate_all(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// First descendant of `parent` matching `selector`, or `None`.
    async fn locate_in(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> Result<Option<Self::Element>>;

    /// All descendants of `parent` matching `selector`, in document order.
    async fn locate_all_in(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>>;

    /// Wait until an element matching `selector` is rendered, visible and
    /// enabled. Fails with [`ScraperError::Timeout`] once `timeout` elapses.
    async fn wait_until_visible(&self, selector: &str, timeout: Duration)
    -> Result<Self::Element>;

    /// Scroll `element` into view and click it.
    async fn click(&self, element: &Self::Element) -> Result<()>;

    /// Focus `element` and type `text` into it, key by key.
    ///
    /// # Arguments
    ///
    /// * `element` - An input or textarea
    /// * `text` - Characters to type; existing content is kept
    async fn input_text(&self, element: &Self::Element, text: &str) -> Result<()>;

    /// Submit the form owning `element`, as pressing Enter would.
    async fn submit(&self, element: &Self::Element) -> Result<()>;

    /// Pick the `<option>` of a `<select>` whose visible label equals `label`.
    async fn select_by_label(&self, element: &Self::Element, label: &str) -> Result<()>;

    /// Value of the attribute `name` on `element`.
    ///
    /// # Returns
    ///
    /// `None` when the attribute is absent, which callers usually turn into
    /// a [`ScraperError::Structure`].
    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    /// Rendered text of `element`, trimmed.
    async fn text(&self, element: &Self::Element) -> Result<String>;

    /// Evaluate a JavaScript expression in the active context.
    async fn execute_script(&self, script: &str) -> Result<serde_json::Value>;

    /// PNG screenshot of the whole active context.
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Serialized DOM of the active context.
    async fn page_source(&self) -> Result<String>;

    /// The context every other method currently acts on.
    async fn current_context(&self) -> Result<ContextId>;

    /// Open `url` in a new context. The active context does not change.
    async fn open_context(&self, url: &str) -> Result<ContextId>;

    /// Make `context` the active one. Unknown ids are a
    /// [`ScraperError::Structure`].
    async fn switch_context(&self, context: ContextId) -> Result<()>;

    /// Close `context`. Closing the active context leaves no valid active
    /// context until [`BrowserSession::switch_context`] is called.
    async fn close_context(&self, context: ContextId) -> Result<()>;

    /// Tear down the whole session.
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Opens fresh sessions, one per crawl attempt.
pub trait SessionLauncher {
    type Session: BrowserSession;

    /// Start a browser and hand back a session on a blank page.
    ///
    /// Nothing site-specific happens here. Once a session exists, any later
    /// failure happens inside the attempt, where diagnostics and teardown
    /// are guaranteed.
    async fn launch(&self) -> Result<Self::Session>;
}

/// Re-run `probe` every [`POLL_INTERVAL`] until it reports `true`.
///
/// Errors from `probe` end the wait immediately. Running out of `timeout`
/// yields [`ScraperError::Timeout`] naming `what`.
pub async fn poll_until<F, Fut>(timeout: Duration, what: &str, mut probe: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if probe().await? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(ScraperError::timeout(what, timeout));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Wait until a JavaScript expression evaluates to `true`.
pub async fn wait_for_script<S: BrowserSession>(
    session: &S,
    script: &str,
    timeout: Duration,
    what: &str,
) -> Result<()> {
    poll_until(timeout, what, move || async move {
        Ok(session.execute_script(script).await?.as_bool().unwrap_or(false))
    })
    .await
}

//! [`BrowserSession`] backed by a local Chromium driven over CDP.
//!
//! Each [`ChromiumLauncher::launch`] starts a new browser process with a
//! launch profile that passes for a regular desktop client: sandbox off (the
//! crawler usually runs in a container), automation switches suppressed, a
//! stock desktop user agent, and `navigator.webdriver` hidden before any site
//! script runs.
//!
//! The launcher leaves the session on `about:blank`. Loading the site is the
//! crawl's first step.

use super::{BrowserSession, ContextId, POLL_INTERVAL, SessionLauncher};
use crate::error::{Result, ScraperError};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/113.0.0.0 Safari/537.36";

const STEALTH_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

const INTERACTIVE_FN: &str = "function() { \
     const rect = this.getBoundingClientRect(); \
     return this.getClientRects().length > 0 && rect.width > 0 && rect.height > 0 \
         && getComputedStyle(this).visibility !== 'hidden' && !this.disabled; }";

/// Starts one Chromium process per crawl attempt.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    headful: bool,
    request_timeout: Duration,
}

impl ChromiumLauncher {
    /// # Arguments
    ///
    /// * `headful` - Show the browser window
    /// * `request_timeout` - Upper bound for every CDP request, navigation
    ///   included
    pub fn new(headful: bool, request_timeout: Duration) -> Self {
        Self {
            headful,
            request_timeout,
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .request_timeout(self.request_timeout)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-extensions")
            .arg("--disable-gpu")
            .arg("--disable-web-security")
            .arg("--disable-infobars")
            .arg(format!("--user-agent={USER_AGENT}"));
        if self.headful {
            builder = builder.with_head();
        }
        builder.build().map_err(ScraperError::Launch)
    }
}

impl SessionLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    #[instrument(level = "info", skip_all, fields(headful = self.headful))]
    async fn launch(&self) -> Result<ChromiumSession> {
        let (mut browser, mut handler) = Browser::launch(self.browser_config()?).await?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        // The process exists from here on; a failed setup must not leak it.
        let page = match blank_stealth_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "Browser setup failed; shutting it down");
                if let Err(close_err) = browser.close().await {
                    warn!(error = %close_err, "Failed to close browser after setup error");
                }
                if let Err(wait_err) = browser.wait().await {
                    warn!(error = %wait_err, "Failed waiting for browser process to exit");
                }
                handler_task.abort();
                return Err(e);
            }
        };
        info!("Browser opened");

        let main = ContextId(0);
        let mut contexts = HashMap::new();
        contexts.insert(main, page);

        Ok(ChromiumSession {
            browser,
            handler_task,
            contexts: Mutex::new(contexts),
            active: Mutex::new(main),
            next_context: AtomicU64::new(1),
        })
    }
}

async fn blank_stealth_page(browser: &Browser) -> Result<Page> {
    let page = browser.new_page("about:blank").await?;
    page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
        .await?;
    Ok(page)
}

/// A running Chromium plus the pages opened in it.
pub struct ChromiumSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    contexts: Mutex<HashMap<ContextId, Page>>,
    active: Mutex<ContextId>,
    next_context: AtomicU64,
}

impl ChromiumSession {
    async fn active_page(&self) -> Result<Page> {
        let active = *self.active.lock().await;
        self.contexts
            .lock()
            .await
            .get(&active)
            .cloned()
            .ok_or_else(|| ScraperError::structure(format!("active context {active:?} is gone")))
    }

    async fn is_interactive(element: &Element) -> Result<bool> {
        let returns = element.call_js_fn(INTERACTIVE_FN, false).await?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }
}

impl BrowserSession for ChromiumSession {
    type Element = Element;

    #[instrument(level = "info", skip(self))]
    async fn navigate(&self, url: &str) -> Result<()> {
        self.active_page().await?.goto(url).await?;
        Ok(())
    }

    async fn locate(&self, selector: &str) -> Result<Option<Element>> {
        Ok(self.locate_all(selector).await?.into_iter().next())
    }

    async fn locate_all(&self, selector: &str) -> Result<Vec<Element>> {
        Ok(self.active_page().await?.find_elements(selector).await?)
    }

    async fn locate_in(&self, parent: &Element, selector: &str) -> Result<Option<Element>> {
        Ok(self.locate_all_in(parent, selector).await?.into_iter().next())
    }

    async fn locate_all_in(&self, parent: &Element, selector: &str) -> Result<Vec<Element>> {
        Ok(parent.find_elements(selector).await?)
    }

    async fn wait_until_visible(&self, selector: &str, timeout: Duration) -> Result<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            let page = self.active_page().await?;
            // The document may be mid-navigation; treat lookup errors as "not yet".
            match page.find_elements(selector).await {
                Ok(elements) => {
                    for element in elements {
                        if Self::is_interactive(&element).await.unwrap_or(false) {
                            return Ok(element);
                        }
                    }
                }
                Err(e) => debug!(selector, error = %e, "Lookup failed while waiting"),
            }
            if Instant::now() >= deadline {
                return Err(ScraperError::timeout(selector, timeout));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, element: &Element) -> Result<()> {
        element.scroll_into_view().await?;
        element.click().await?;
        Ok(())
    }

    async fn input_text(&self, element: &Element, text: &str) -> Result<()> {
        element.focus().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn submit(&self, element: &Element) -> Result<()> {
        element.press_key("Enter").await?;
        Ok(())
    }

    async fn select_by_label(&self, element: &Element, label: &str) -> Result<()> {
        let label_json = serde_json::to_string(label)
            .map_err(|e| ScraperError::structure(format!("unencodable label {label:?}: {e}")))?;
        let function = format!(
            "function() {{ \
                 const option = Array.from(this.options).find(o => o.text.trim() === {label_json}); \
                 if (!option) return false; \
                 this.value = option.value; \
                 this.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                 return true; }}"
        );
        let returns = element.call_js_fn(function, false).await?;
        let selected = returns.result.value.and_then(|v| v.as_bool()).unwrap_or(false);
        if selected {
            Ok(())
        } else {
            Err(ScraperError::structure(format!("no option labelled {label:?}")))
        }
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>> {
        Ok(element.attribute(name).await?)
    }

    async fn text(&self, element: &Element) -> Result<String> {
        Ok(element
            .inner_text()
            .await?
            .map(|t| t.trim().to_string())
            .unwrap_or_default())
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
        let evaluation = self.active_page().await?.evaluate(script).await?;
        Ok(evaluation.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder().full_page(true).build();
        Ok(self.active_page().await?.screenshot(params).await?)
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.active_page().await?.content().await?)
    }

    async fn current_context(&self) -> Result<ContextId> {
        Ok(*self.active.lock().await)
    }

    async fn open_context(&self, url: &str) -> Result<ContextId> {
        let page = self.browser.new_page(url).await?;
        let id = ContextId(self.next_context.fetch_add(1, Ordering::SeqCst));
        self.contexts.lock().await.insert(id, page);
        debug!(?id, url, "Opened context");
        Ok(id)
    }

    async fn switch_context(&self, context: ContextId) -> Result<()> {
        let page = self
            .contexts
            .lock()
            .await
            .get(&context)
            .cloned()
            .ok_or_else(|| ScraperError::structure(format!("unknown context {context:?}")))?;
        page.bring_to_front().await?;
        *self.active.lock().await = context;
        Ok(())
    }

    async fn close_context(&self, context: ContextId) -> Result<()> {
        let page = self.contexts.lock().await.remove(&context);
        match page {
            Some(page) => {
                page.close().await?;
                debug!(?context, "Closed context");
                Ok(())
            }
            None => Err(ScraperError::structure(format!("unknown context {context:?}"))),
        }
    }

    #[instrument(level = "info", skip_all)]
    async fn close(self) -> Result<()> {
        let ChromiumSession {
            mut browser,
            handler_task,
            contexts,
            ..
        } = self;

        for (id, page) in contexts.into_inner() {
            if let Err(e) = page.close().await {
                warn!(context = ?id, error = %e, "Failed to close page");
            }
        }

        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "Failed waiting for browser process to exit");
        }
        handler_task.abort();
        closed?;
        info!("Browser closed");
        Ok(())
    }
}

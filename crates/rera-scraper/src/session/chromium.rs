// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-backed session using chromiumoxide.
//!
//! Every DOM operation is a single page script that re-resolves its
//! [`Target`] from scratch. Scripts answer with a tagged reply so a missing
//! element maps to [`SessionError::Stale`] without parsing error strings.

use super::{ClickMode, ElementInfo, Query, ScrollTo, Session, SessionFactory, Target};
use crate::config::{ScraperConfig, Timings};
use crate::error::SessionError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Attribute used to hand a script-resolved element to a native click.
const MARK_ATTR: &str = "data-rera-target";

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    if let Ok(p) = std::env::var("RERA_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".rera/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".rera/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".rera/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".rera/chromium/chrome-linux64/chrome"),
                home.join(".rera/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launches one Chromium process per session.
pub struct ChromiumLauncher {
    chromium_path: Option<PathBuf>,
    headless: bool,
    timings: Timings,
}

impl ChromiumLauncher {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            chromium_path: config.chromium_path.clone(),
            headless: config.headless,
            timings: config.timings.clone(),
        }
    }
}

#[async_trait]
impl SessionFactory for ChromiumLauncher {
    async fn open(&self) -> Result<Box<dyn Session>, SessionError> {
        let chrome_path = find_chromium(self.chromium_path.as_deref()).ok_or_else(|| {
            SessionError::Launch(
                "Chromium not found; set RERA_CHROMIUM_PATH or chromium_path".into(),
            )
        })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(1920, 1080)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");
        builder = if self.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };
        let config = builder
            .build()
            .map_err(|e| SessionError::Launch(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(format!("failed to launch Chromium: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(format!("failed to create page: {e}")))?;

        info!(headless = self.headless, "Chromium session started");

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
            timings: self.timings.clone(),
        }))
    }
}

/// One browser process driving one tab.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    timings: Timings,
}

/// Tagged answer of every DOM script.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Reply<T> {
    Ok { value: T },
    Stale,
    /// Another element sits on top of the target's center point.
    Intercepted { by: String },
}

impl<T> Reply<T> {
    fn into_result(self, target: &str) -> Result<T, SessionError> {
        match self {
            Self::Ok { value } => Ok(value),
            Self::Stale => Err(SessionError::Stale(target.to_string())),
            Self::Intercepted { by } => Err(SessionError::NotInteractable(format!(
                "{target} is covered by {by}"
            ))),
        }
    }
}

impl ChromiumSession {
    async fn bounded<T, E, F>(&self, op: &'static str, ms: u64, fut: F) -> Result<T, SessionError>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match tokio::time::timeout(Duration::from_millis(ms), fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(SessionError::Script(format!("{op}: {e}"))),
            Err(_) => Err(SessionError::Timeout { op, ms }),
        }
    }

    async fn eval<T: DeserializeOwned>(
        &self,
        op: &'static str,
        script: String,
    ) -> Result<T, SessionError> {
        let ms = self.timings.element_timeout_ms;
        let result = self.bounded(op, ms, self.page.evaluate(script)).await?;
        result
            .into_value()
            .map_err(|e| SessionError::Script(format!("{op}: unexpected result: {e}")))
    }

    async fn eval_reply<T: DeserializeOwned>(
        &self,
        op: &'static str,
        script: String,
        target: &str,
    ) -> Result<T, SessionError> {
        self.eval::<Reply<T>>(op, script).await?.into_result(target)
    }

    async fn wait_for_navigation(&self) {
        let ms = self.timings.navigation_timeout_ms;
        if let Err(e) = self
            .bounded("wait_for_navigation", ms, self.page.wait_for_navigation())
            .await
        {
            debug!(error = %e, "navigation wait ended without a load event");
        }
    }
}

#[async_trait]
impl Session for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let ms = self.timings.navigation_timeout_ms;
        match tokio::time::timeout(Duration::from_millis(ms), self.page.goto(url)).await {
            Ok(Ok(_)) => {
                self.wait_for_navigation().await;
                Ok(())
            }
            Ok(Err(e)) => Err(SessionError::Navigation(format!("{url}: {e}"))),
            Err(_) => Err(SessionError::Timeout { op: "navigate", ms }),
        }
    }

    async fn back(&mut self) -> Result<(), SessionError> {
        self.eval::<serde_json::Value>("back", "(() => { history.back(); return null; })()".into())
            .await?;
        self.wait_for_navigation().await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        let ms = self.timings.element_timeout_ms;
        let url = self.bounded("current_url", ms, self.page.url()).await?;
        Ok(url.map(|u| u.to_string()).unwrap_or_default())
    }

    async fn page_source(&self) -> Result<String, SessionError> {
        let ms = self.timings.element_timeout_ms;
        self.bounded("page_source", ms, self.page.content()).await
    }

    async fn scroll(&mut self, to: ScrollTo) -> Result<(), SessionError> {
        self.eval::<serde_json::Value>("scroll", scroll_script(to))
            .await
            .map(|_| ())
    }

    async fn query(&self, query: &Query) -> Result<Vec<ElementInfo>, SessionError> {
        self.eval_reply("query", query_script(query), &describe(query))
            .await
    }

    async fn scroll_into_view(&mut self, target: &Target) -> Result<(), SessionError> {
        let body = "el.scrollIntoView({block: 'center'}); return null;";
        self.eval_reply::<serde_json::Value>(
            "scroll_into_view",
            target_script(target, body),
            &describe_target(target),
        )
        .await
        .map(|_| ())
    }

    async fn click(&mut self, target: &Target, mode: ClickMode) -> Result<(), SessionError> {
        let label = describe_target(target);
        match mode {
            ClickMode::Script => self
                .eval_reply::<serde_json::Value>("click", target_script(target, "el.click(); return null;"), &label)
                .await
                .map(|_| ()),
            ClickMode::Native => {
                // Input events land on the topmost element at the click point.
                self.eval_reply::<serde_json::Value>("mark", mark_script(target), &label)
                    .await?;

                let ms = self.timings.element_timeout_ms;
                let selector = format!("[{MARK_ATTR}]");
                let element = self
                    .bounded("find_marked", ms, self.page.find_element(selector))
                    .await
                    .map_err(|_| SessionError::Stale(label.clone()))?;
                self.bounded("native_click", ms, element.click())
                    .await
                    .map(|_| ())
                    .map_err(|e| match e {
                        SessionError::Script(msg) => SessionError::NotInteractable(msg),
                        other => other,
                    })
            }
        }
    }

    async fn close(self: Box<Self>) -> Result<(), SessionError> {
        let ChromiumSession {
            mut browser,
            page,
            handler_task,
            ..
        } = *self;
        let _ = page.close().await;
        let closed = browser.close().await;
        let _ = browser.wait().await;
        handler_task.abort();
        closed
            .map(|_| ())
            .map_err(|e| SessionError::Script(format!("close: {e}")))
    }
}

/// Quote a Rust string as a JS string literal.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// JS expression yielding an array of the query's matches, or `null` when a
/// scope element has disappeared.
fn elements_expr(query: &Query) -> String {
    match query {
        Query::Css(sel) => format!("Array.from(document.querySelectorAll({}))", js_str(sel)),
        Query::XPath(xp) => format!("__reraXPath({}, document)", js_str(xp)),
        Query::Within { scope, xpath } => format!(
            "((() => {{ const s = {}; return s ? __reraXPath({}, s) : null; }})())",
            target_expr(scope),
            js_str(xpath)
        ),
    }
}

/// JS expression yielding the target element, or `null`.
fn target_expr(target: &Target) -> String {
    format!(
        "((() => {{ const els = {}; return els ? (els[{}] || null) : null; }})())",
        elements_expr(&target.query),
        target.index
    )
}

const XPATH_HELPER: &str = "const __reraXPath = (xp, root) => { \
    const r = document.evaluate(xp, root, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
    const out = []; for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
    return out; };";

fn query_script(query: &Query) -> String {
    format!(
        "(() => {{ {XPATH_HELPER} const els = {}; \
         if (els === null) return {{status: 'stale'}}; \
         return {{status: 'ok', value: els.map(el => ({{ \
           text: (el.innerText || el.textContent || '').trim(), \
           visible: !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length) \
             && getComputedStyle(el).visibility !== 'hidden', \
           enabled: !el.disabled }}))}}; }})()",
        elements_expr(query)
    )
}

fn target_script(target: &Target, body: &str) -> String {
    format!(
        "(() => {{ {XPATH_HELPER} const el = {}; \
         if (!el) return {{status: 'stale'}}; \
         const value = (() => {{ {body} }})(); \
         return {{status: 'ok', value: value === undefined ? null : value}}; }})()",
        target_expr(target)
    )
}

/// Mark the target for a native click, or report what covers its center.
fn mark_script(target: &Target) -> String {
    format!(
        "(() => {{ {XPATH_HELPER} const el = {}; \
         if (!el) return {{status: 'stale'}}; \
         document.querySelectorAll('[{MARK_ATTR}]').forEach(e => e.removeAttribute('{MARK_ATTR}')); \
         el.scrollIntoView({{block: 'center'}}); \
         const r = el.getBoundingClientRect(); \
         const hit = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2); \
         if (hit && !el.contains(hit)) {{ \
           const cls = typeof hit.className === 'string' && hit.className.trim() \
             ? '.' + hit.className.trim().split(/\\s+/)[0] : ''; \
           return {{status: 'intercepted', by: hit.tagName.toLowerCase() + cls}}; }} \
         el.setAttribute('{MARK_ATTR}', '1'); \
         return {{status: 'ok', value: null}}; }})()",
        target_expr(target)
    )
}

fn scroll_script(to: ScrollTo) -> String {
    match to {
        ScrollTo::Offset(y) => format!("(() => {{ window.scrollTo(0, {y}); return null; }})()"),
        ScrollTo::Bottom => {
            "(() => { window.scrollTo(0, document.body.scrollHeight); return null; })()".into()
        }
    }
}

fn describe(query: &Query) -> String {
    match query {
        Query::Css(sel) => sel.clone(),
        Query::XPath(xp) => xp.clone(),
        Query::Within { scope, xpath } => format!("{} >> {xpath}", describe_target(scope)),
    }
}

fn describe_target(target: &Target) -> String {
    format!("{}[{}]", describe(&target.query), target.index)
}

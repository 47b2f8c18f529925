// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! Browser session abstraction.
//!
//! A [`Session`] is one automated browsing surface. Elements are never handed
//! out as handles: callers describe what they want with a [`Target`] (a
//! [`Query`] plus a match index) and the session re-resolves it against the
//! live DOM on every call. A listing page that re-renders between two calls
//! therefore surfaces as [`SessionError::Stale`] instead of a dangling
//! reference.

pub mod chromium;
#[cfg(test)]
pub mod fake;

use crate::error::SessionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How to find a set of elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// CSS selector against the whole document.
    Css(String),
    /// XPath expression against the whole document.
    XPath(String),
    /// XPath expression evaluated relative to another element.
    Within { scope: Box<Target>, xpath: String },
}

impl Query {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    pub fn within(scope: Target, xpath: impl Into<String>) -> Self {
        Self::Within {
            scope: Box::new(scope),
            xpath: xpath.into(),
        }
    }
}

/// One element: the `index`-th match of `query` at the time of use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub query: Query,
    pub index: usize,
}

impl Target {
    pub fn new(query: Query, index: usize) -> Self {
        Self { query, index }
    }
}

/// Snapshot of an element's interactable state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Trimmed visible text.
    pub text: String,
    /// Rendered with a non-empty box and not `visibility: hidden`.
    pub visible: bool,
    /// Not a disabled form control.
    pub enabled: bool,
}

impl ElementInfo {
    pub fn is_clickable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// Window scroll destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTo {
    /// Absolute vertical offset in CSS pixels.
    Offset(u32),
    /// Bottom of the document.
    Bottom,
}

/// How a click is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMode {
    /// Synthesized mouse input at the element's position. Overlays can
    /// intercept it.
    Native,
    /// `element.click()` dispatched from page script.
    Script,
}

/// A single automated browsing surface.
///
/// All calls are bounded by the implementation's element or navigation
/// timeout; none blocks indefinitely.
#[async_trait]
pub trait Session: Send + Sync {
    /// Load a URL in the current tab.
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;
    /// Go one step back in history.
    async fn back(&mut self) -> Result<(), SessionError>;
    /// URL currently displayed.
    async fn current_url(&self) -> Result<String, SessionError>;
    /// Serialized DOM of the current page.
    async fn page_source(&self) -> Result<String, SessionError>;
    /// Scroll the window.
    async fn scroll(&mut self, to: ScrollTo) -> Result<(), SessionError>;
    /// Resolve `query` now and describe every match.
    async fn query(&self, query: &Query) -> Result<Vec<ElementInfo>, SessionError>;
    /// Center `target` in the viewport.
    async fn scroll_into_view(&mut self, target: &Target) -> Result<(), SessionError>;
    /// Click `target`.
    async fn click(&mut self, target: &Target, mode: ClickMode) -> Result<(), SessionError>;
    /// Release the browser.
    async fn close(self: Box<Self>) -> Result<(), SessionError>;
}

/// Creates sessions. Failure here is the one fatal pipeline error.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Session>, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_nests_scope() {
        let card = Target::new(Query::css(".card"), 2);
        let q = Query::within(card.clone(), ".//a");
        match q {
            Query::Within { scope, xpath } => {
                assert_eq!(*scope, card);
                assert_eq!(xpath, ".//a");
            }
            _ => panic!("expected Within"),
        }
    }

    #[test]
    fn test_clickable_requires_visible_and_enabled() {
        let mut info = ElementInfo {
            text: "View Details".into(),
            visible: true,
            enabled: true,
        };
        assert!(info.is_clickable());
        info.enabled = false;
        assert!(!info.is_clickable());
        info.enabled = true;
        info.visible = false;
        assert!(!info.is_clickable());
    }
}

// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-memory session for tests.
//!
//! Models a listing page whose cards mount lazily and re-render after every
//! return from a detail page, plus detail pages with an optional promoter tab.
//! Selectors and XPath strategies are matched with a small interpreter that
//! understands the shapes the discoverer and extractor emit.

use super::{ClickMode, ElementInfo, Query, ScrollTo, Session, SessionFactory, Target};
use crate::error::SessionError;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FakeButton {
    pub tag: &'static str,
    pub text: String,
    pub classes: Vec<&'static str>,
    pub visible: bool,
    pub enabled: bool,
    /// Where a click leads. `None` leaves the page unchanged.
    pub href: Option<String>,
    /// Native clicks are intercepted by an overlay.
    pub overlaid: bool,
}

impl FakeButton {
    pub fn view_details(href: &str) -> Self {
        Self {
            tag: "a",
            text: "View Details".into(),
            classes: vec!["btn", "btn-primary"],
            visible: true,
            enabled: true,
            href: Some(href.to_string()),
            overlaid: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeCard {
    pub classes: Vec<&'static str>,
    pub buttons: Vec<FakeButton>,
}

impl FakeCard {
    pub fn project(href: &str) -> Self {
        Self {
            classes: vec!["card", "project-card", "mb-3"],
            buttons: vec![FakeButton::view_details(href)],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub html: String,
    /// Markup after the promoter tab is clicked; `None` means no tab exists.
    pub promoter_html: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FakeSite {
    pub listing_url: String,
    pub cards: Vec<FakeCard>,
    /// Cards mounted before a scroll to the bottom.
    pub initially_mounted: usize,
    pub pages: HashMap<String, FakePage>,
    /// Unmount every card the first time a button is scrolled into view,
    /// as if the grid re-rendered between locating and using it.
    pub rerender_once: bool,
}

impl FakeSite {
    pub fn new(listing_url: &str, cards: Vec<FakeCard>) -> Self {
        let initially_mounted = cards.len();
        Self {
            listing_url: listing_url.to_string(),
            cards,
            initially_mounted,
            pages: HashMap::new(),
            rerender_once: false,
        }
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }
}

/// Shared counters a test can inspect after the session is gone.
#[derive(Debug, Clone, Default)]
pub struct FakeCounters {
    pub closed: Arc<AtomicBool>,
    pub opened: Arc<AtomicUsize>,
    pub navigations: Arc<AtomicUsize>,
    pub script_clicks: Arc<AtomicUsize>,
    pub rerenders: Arc<AtomicUsize>,
}

pub struct FakeSession {
    site: FakeSite,
    history: Vec<String>,
    mounted: usize,
    promoter_revealed: bool,
    panic_on_detail: bool,
    rerendered: bool,
    counters: FakeCounters,
}

impl FakeSession {
    pub fn new(site: FakeSite, counters: FakeCounters) -> Self {
        Self {
            site,
            history: vec!["about:blank".to_string()],
            mounted: 0,
            promoter_revealed: false,
            panic_on_detail: false,
            rerendered: false,
            counters,
        }
    }

    fn current(&self) -> &str {
        self.history.last().map(String::as_str).unwrap_or("about:blank")
    }

    fn on_listing(&self) -> bool {
        self.current() == self.site.listing_url
    }

    fn enter(&mut self, url: &str) {
        self.history.push(url.to_string());
        self.promoter_revealed = false;
        self.mounted = if url == self.site.listing_url {
            self.site.initially_mounted.min(self.site.cards.len())
        } else {
            0
        };
    }

    fn mounted_cards(&self, selector: &str) -> Vec<&FakeCard> {
        if !self.on_listing() {
            return Vec::new();
        }
        self.site.cards[..self.mounted]
            .iter()
            .filter(|c| css_matches(selector, &c.classes))
            .collect()
    }

    fn card(&self, scope: &Target) -> Result<&FakeCard, SessionError> {
        let Query::Css(selector) = &scope.query else {
            return Err(SessionError::Script("fake scopes must be CSS".into()));
        };
        self.mounted_cards(selector)
            .get(scope.index)
            .copied()
            .ok_or_else(|| SessionError::Stale(format!("{selector}[{}]", scope.index)))
    }

    fn buttons(&self, scope: &Target, xpath: &str) -> Result<Vec<&FakeButton>, SessionError> {
        let card = self.card(scope)?;
        Ok(card.buttons.iter().filter(|b| xpath_matches(xpath, b)).collect())
    }

    fn has_promoter_tab(&self) -> bool {
        self.site
            .pages
            .get(self.current())
            .is_some_and(|p| p.promoter_html.is_some())
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.counters.navigations.fetch_add(1, Ordering::Relaxed);
        if url == self.site.listing_url {
            self.enter(url);
            return Ok(());
        }
        if self.site.pages.contains_key(url) {
            if self.panic_on_detail {
                panic!("renderer crashed on {url}");
            }
            self.enter(url);
            return Ok(());
        }
        Err(SessionError::Navigation(format!("{url}: 404")))
    }

    async fn back(&mut self) -> Result<(), SessionError> {
        if self.history.len() < 2 {
            return Err(SessionError::Navigation("no history".into()));
        }
        self.history.pop();
        let url = self.current().to_string();
        self.history.pop();
        self.enter(&url);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.current().to_string())
    }

    async fn page_source(&self) -> Result<String, SessionError> {
        if self.on_listing() {
            return Ok("<html><body><h1>Projects</h1></body></html>".into());
        }
        let page = self
            .site
            .pages
            .get(self.current())
            .ok_or_else(|| SessionError::Navigation("no page loaded".into()))?;
        match (&page.promoter_html, self.promoter_revealed) {
            (Some(html), true) => Ok(html.clone()),
            _ => Ok(page.html.clone()),
        }
    }

    async fn scroll(&mut self, to: ScrollTo) -> Result<(), SessionError> {
        if self.on_listing() && to == ScrollTo::Bottom {
            self.mounted = self.site.cards.len();
        }
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<ElementInfo>, SessionError> {
        match query {
            Query::Css(selector) => Ok(self
                .mounted_cards(selector)
                .iter()
                .map(|_| ElementInfo {
                    text: String::new(),
                    visible: true,
                    enabled: true,
                })
                .collect()),
            Query::XPath(xpath) => {
                if xpath.contains("romoter") && self.has_promoter_tab() {
                    Ok(vec![ElementInfo {
                        text: "Promoter Details".into(),
                        visible: true,
                        enabled: true,
                    }])
                } else {
                    Ok(Vec::new())
                }
            }
            Query::Within { scope, xpath } => Ok(self
                .buttons(scope, xpath)?
                .into_iter()
                .map(|b| ElementInfo {
                    text: b.text.clone(),
                    visible: b.visible,
                    enabled: b.enabled,
                })
                .collect()),
        }
    }

    async fn scroll_into_view(&mut self, target: &Target) -> Result<(), SessionError> {
        if self.site.rerender_once && !self.rerendered && self.on_listing() {
            self.rerendered = true;
            self.mounted = 0;
            self.counters.rerenders.fetch_add(1, Ordering::Relaxed);
        }
        if let Query::Within { scope, xpath } = &target.query {
            self.buttons(scope, xpath)?
                .get(target.index)
                .ok_or_else(|| SessionError::Stale("button".into()))?;
        }
        Ok(())
    }

    async fn click(&mut self, target: &Target, mode: ClickMode) -> Result<(), SessionError> {
        if mode == ClickMode::Script {
            self.counters.script_clicks.fetch_add(1, Ordering::Relaxed);
        }
        match &target.query {
            Query::XPath(_) => {
                if !self.has_promoter_tab() {
                    return Err(SessionError::Stale("promoter tab".into()));
                }
                self.promoter_revealed = true;
                Ok(())
            }
            Query::Within { scope, xpath } => {
                let button = self
                    .buttons(scope, xpath)?
                    .get(target.index)
                    .copied()
                    .cloned()
                    .ok_or_else(|| SessionError::Stale("button".into()))?;
                if mode == ClickMode::Native && (button.overlaid || !button.visible) {
                    return Err(SessionError::NotInteractable(button.text));
                }
                if let Some(href) = button.href {
                    self.enter(&href);
                }
                Ok(())
            }
            Query::Css(_) => Ok(()),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), SessionError> {
        self.counters.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Factory handing out fresh [`FakeSession`]s over one site.
pub struct FakeFactory {
    pub site: FakeSite,
    pub counters: FakeCounters,
    pub fail: bool,
    pub panic_on_detail: bool,
}

impl FakeFactory {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site,
            counters: FakeCounters::default(),
            fail: false,
            panic_on_detail: false,
        }
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn open(&self) -> Result<Box<dyn Session>, SessionError> {
        if self.fail {
            return Err(SessionError::Launch("Chromium not found".into()));
        }
        self.counters.opened.fetch_add(1, Ordering::Relaxed);
        let mut session = FakeSession::new(self.site.clone(), self.counters.clone());
        session.panic_on_detail = self.panic_on_detail;
        Ok(Box::new(session))
    }
}

/// Match the selector shapes `.a.b`, `div[class*='x']` and `div.a`.
fn css_matches(selector: &str, classes: &[&str]) -> bool {
    if let Some(rest) = selector.strip_prefix("div[class*='") {
        let needle = rest.trim_end_matches("']");
        return classes.iter().any(|c| c.contains(needle));
    }
    let wanted: Vec<&str> = selector
        .trim_start_matches("div")
        .split('.')
        .filter(|s| !s.is_empty())
        .collect();
    !wanted.is_empty() && wanted.iter().all(|w| classes.contains(w))
}

/// Match `.//tag[contains(text(), 'T')]` and `.//tag[contains(@class, 'c') and ...]`.
fn xpath_matches(xpath: &str, button: &FakeButton) -> bool {
    let tag_re = Regex::new(r"^\.//(\w+)\[").expect("tag regex is valid");
    let text_re = Regex::new(r"contains\(text\(\),\s*'([^']+)'\)").expect("text regex is valid");
    let class_re = Regex::new(r"contains\(@class,\s*'([^']+)'\)").expect("class regex is valid");

    let Some(tag) = tag_re.captures(xpath).and_then(|c| c.get(1)) else {
        return false;
    };
    if tag.as_str() != button.tag {
        return false;
    }
    if let Some(text) = text_re.captures(xpath).and_then(|c| c.get(1)) {
        return button.text.contains(text.as_str());
    }
    let classes: Vec<&str> = class_re
        .captures_iter(xpath)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    !classes.is_empty() && classes.iter().all(|c| button.classes.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_shapes() {
        let classes = ["card", "project-card", "mb-3"];
        assert!(css_matches(".card.project-card.mb-3", &classes));
        assert!(css_matches(".card", &classes));
        assert!(css_matches("div[class*='project-card']", &classes));
        assert!(!css_matches(".card.featured", &classes));
    }

    #[test]
    fn test_xpath_shapes() {
        let b = FakeButton::view_details("/x");
        assert!(xpath_matches(".//a[contains(text(), 'View Details')]", &b));
        assert!(!xpath_matches(".//button[contains(text(), 'View Details')]", &b));
        assert!(xpath_matches(
            ".//a[contains(@class, 'btn') and contains(@class, 'btn-primary')]",
            &b
        ));
        assert!(!xpath_matches(".//a[contains(@class, 'btn-link')]", &b));
    }
}

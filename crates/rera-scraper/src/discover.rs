// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! Detail-page link discovery on the project listing.
//!
//! The listing is a client-rendered card grid that re-mounts whenever the
//! browser returns to it, so discovery never keeps anything but card indices
//! between interactions. Every pass re-runs the card selector strategies,
//! every card is re-resolved by `(selector, index)` right before use, and a
//! successful click restarts the scan on the freshly rendered page.
//!
//! Discovery always terminates: each pass either records a new link or
//! counts as empty, and two consecutive empty passes end the run.

use crate::config::{settle, ScraperConfig, Timings};
use crate::error::SessionError;
use crate::session::{ClickMode, Query, ScrollTo, Session, Target};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Card selectors, most specific first. The first one matching more than one
/// element is used for the pass.
pub const CARD_SELECTORS: [&str; 5] = [
    ".card.project-card.mb-3",
    ".card.project-card",
    "div[class*='project-card']",
    ".card",
    "div[class*='card']",
];

/// Affordances inside a card that lead to its detail page, in priority order.
pub const CLICKABLE_XPATHS: [&str; 5] = [
    ".//a[contains(text(), 'View Details')]",
    ".//button[contains(text(), 'View Details')]",
    ".//a[contains(@class, 'btn') and contains(@class, 'btn-primary')]",
    ".//a[contains(@class, 'btn')]",
    ".//button[contains(@class, 'btn')]",
];

/// Vertical offset scrolled to after loading the listing.
const LISTING_SCROLL_OFFSET: u32 = 1000;

/// Consecutive passes without a new link before giving up.
const MAX_EMPTY_PASSES: u32 = 2;

/// What a click did to the current URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// Still on the same URL.
    Unchanged,
    /// Landed on a project detail page.
    Detail,
    /// Went somewhere that does not look like a detail page.
    Ambiguous,
}

/// Classify a navigation from `before` to `after`.
///
/// A detail page is any changed URL that contains `marker` or is nested
/// deeper than the page it came from.
pub fn classify_navigation(before: &str, after: &str, marker: &str) -> NavigationKind {
    if before == after {
        return NavigationKind::Unchanged;
    }
    if after.contains(marker) || path_depth(after, before) {
        NavigationKind::Detail
    } else {
        NavigationKind::Ambiguous
    }
}

/// Whether `after` has more path segments than `before`.
fn path_depth(after: &str, before: &str) -> bool {
    match (url::Url::parse(after), url::Url::parse(before)) {
        (Ok(a), Ok(b)) => segments(&a) > segments(&b),
        _ => after.matches('/').count() > before.matches('/').count(),
    }
}

fn segments(url: &url::Url) -> usize {
    url.path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).count())
        .unwrap_or(0)
}

/// Remove repeated URLs, keeping the first occurrence of each.
pub fn dedup_preserving_order(links: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(links.len());
    links
        .into_iter()
        .filter(|l| seen.insert(l.clone()))
        .collect()
}

/// Result of one scan over the listing.
#[derive(Debug)]
enum Pass {
    /// A new detail URL; the session is back on the listing.
    Found(String),
    /// The page changed under the scan or produced a known URL.
    Restart,
    /// Every card was tried without reaching a new detail page.
    Exhausted,
}

/// Walks the listing page and collects detail-page URLs.
pub struct LinkDiscoverer<'a> {
    listing_url: &'a str,
    detail_marker: &'a str,
    timings: &'a Timings,
}

impl<'a> LinkDiscoverer<'a> {
    pub fn new(config: &'a ScraperConfig) -> Self {
        Self {
            listing_url: &config.listing_url,
            detail_marker: &config.detail_marker,
            timings: &config.timings,
        }
    }

    /// Collect up to `max_count` distinct detail URLs in discovery order.
    ///
    /// Never fails: whatever was found before a dead end is returned.
    pub async fn discover(&self, session: &mut dyn Session, max_count: usize) -> Vec<String> {
        if max_count == 0 {
            return Vec::new();
        }
        if let Err(e) = self.open_listing(session).await {
            warn!(url = self.listing_url, error = %e, "could not load listing page");
            return Vec::new();
        }

        let mut links: Vec<String> = Vec::new();
        let mut processed: HashSet<usize> = HashSet::new();
        let mut empty_passes = 0u32;

        while links.len() < max_count {
            let Some((selector, count)) = self.find_cards(session).await else {
                warn!("no project cards found on listing page");
                break;
            };
            debug!(selector, count, "listing cards located");

            let scan = self.scan(session, selector, count.min(max_count), &mut processed, &links);
            match scan.await {
                Pass::Found(url) => {
                    info!(n = links.len() + 1, url = %url, "discovered project");
                    links.push(url);
                    empty_passes = 0;
                    continue;
                }
                Pass::Restart => debug!("listing changed during scan"),
                Pass::Exhausted => debug!("scan found no new project"),
            }

            empty_passes += 1;
            if empty_passes >= MAX_EMPTY_PASSES {
                info!(
                    found = links.len(),
                    wanted = max_count,
                    "no new projects after a corrective scroll, stopping discovery"
                );
                break;
            }
            if let Err(e) = session.scroll(ScrollTo::Bottom).await {
                debug!(error = %e, "corrective scroll failed");
            }
            settle(self.timings.scroll_settle_ms).await;
        }

        let mut links = dedup_preserving_order(links);
        links.truncate(max_count);
        info!(count = links.len(), "link discovery finished");
        links
    }

    async fn open_listing(&self, session: &mut dyn Session) -> Result<(), SessionError> {
        session.navigate(self.listing_url).await?;
        settle(self.timings.listing_settle_ms).await;
        self.mount_cards(session).await;
        Ok(())
    }

    /// Scroll down far enough for lazily rendered cards to mount.
    async fn mount_cards(&self, session: &mut dyn Session) {
        if let Err(e) = session.scroll(ScrollTo::Offset(LISTING_SCROLL_OFFSET)).await {
            debug!(error = %e, "listing scroll failed");
        }
        settle(self.timings.scroll_settle_ms).await;
    }

    /// First card selector matching more than one element, with its count.
    async fn find_cards(&self, session: &mut dyn Session) -> Option<(&'static str, usize)> {
        for selector in CARD_SELECTORS {
            match session.query(&Query::css(selector)).await {
                Ok(cards) if cards.len() > 1 => return Some((selector, cards.len())),
                Ok(_) => {}
                Err(e) => debug!(selector, error = %e, "card query failed"),
            }
        }
        None
    }

    /// Try the unprocessed cards among the first `limit` positions.
    async fn scan(
        &self,
        session: &mut dyn Session,
        selector: &'static str,
        limit: usize,
        processed: &mut HashSet<usize>,
        links: &[String],
    ) -> Pass {
        for index in 0..limit {
            if processed.contains(&index) {
                continue;
            }

            // Re-resolve right before use; the grid may have re-rendered.
            let live = match session.query(&Query::css(selector)).await {
                Ok(cards) => cards.len(),
                Err(e) => {
                    debug!(error = %e, "card re-query failed");
                    return Pass::Restart;
                }
            };
            if index >= live {
                debug!(card = index, live, "card no longer mounted, re-scanning");
                return Pass::Restart;
            }

            let card = Target::new(Query::css(selector), index);
            match self.try_card(session, &card).await {
                Ok(Some(url)) => {
                    processed.insert(index);
                    self.return_to_listing(session).await;
                    if links.contains(&url) {
                        debug!(card = index, url = %url, "card led to a known project");
                        return Pass::Restart;
                    }
                    return Pass::Found(url);
                }
                Ok(None) => debug!(card = index, "no working affordance in card"),
                Err(e) if e.is_stale() => {
                    debug!(card = index, error = %e, "stale card, re-scanning");
                    return Pass::Restart;
                }
                Err(e) => warn!(card = index, error = %e, "card failed"),
            }
        }
        Pass::Exhausted
    }

    /// Try each affordance strategy on one card until a click reaches a
    /// detail page. Only staleness propagates; other failures move on to the
    /// next candidate.
    async fn try_card(
        &self,
        session: &mut dyn Session,
        card: &Target,
    ) -> Result<Option<String>, SessionError> {
        for xpath in CLICKABLE_XPATHS {
            let query = Query::within(card.clone(), xpath);
            let elements = match session.query(&query).await {
                Ok(found) => found,
                Err(e) if e.is_stale() => return Err(e),
                Err(e) => {
                    debug!(strategy = xpath, error = %e, "affordance query failed");
                    continue;
                }
            };

            for (i, element) in elements.iter().enumerate() {
                if !element.is_clickable() {
                    continue;
                }
                debug!(strategy = xpath, text = %element.text, "trying candidate");
                let target = Target::new(query.clone(), i);
                match self.follow(session, &target).await {
                    Ok(Some(url)) => return Ok(Some(url)),
                    Ok(None) => {}
                    Err(e) if e.is_stale() => return Err(e),
                    Err(e) => debug!(strategy = xpath, error = %e, "candidate failed"),
                }
            }
        }
        Ok(None)
    }

    /// Click a candidate and report the detail URL it reached, if any.
    async fn follow(
        &self,
        session: &mut dyn Session,
        target: &Target,
    ) -> Result<Option<String>, SessionError> {
        let before = session.current_url().await?;

        session.scroll_into_view(target).await?;
        settle(self.timings.scroll_into_view_ms).await;

        if let Err(e) = session.click(target, ClickMode::Native).await {
            if e.is_stale() {
                return Err(e);
            }
            debug!(error = %e, "native click failed, retrying from script");
            session.click(target, ClickMode::Script).await?;
        }
        settle(self.timings.click_settle_ms).await;

        let after = session.current_url().await?;
        match classify_navigation(&before, &after, self.detail_marker) {
            NavigationKind::Detail => Ok(Some(after)),
            NavigationKind::Unchanged => Ok(None),
            NavigationKind::Ambiguous => {
                debug!(url = %after, "navigation is not a detail page, going back");
                if let Err(e) = session.back().await {
                    warn!(error = %e, "back navigation failed, reloading listing");
                    session.navigate(self.listing_url).await?;
                }
                settle(self.timings.ambiguous_back_ms).await;
                Ok(None)
            }
        }
    }

    /// Leave a detail page and restore the listing's scroll state.
    async fn return_to_listing(&self, session: &mut dyn Session) {
        if let Err(e) = session.back().await {
            warn!(error = %e, "back navigation failed, reloading listing");
            if let Err(e) = session.navigate(self.listing_url).await {
                warn!(error = %e, "could not reload listing page");
                return;
            }
        }
        settle(self.timings.back_settle_ms).await;
        self.mount_cards(session).await;
    }
}

// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scraper configuration: target site, browser location and wait intervals.
//!
//! Defaults reproduce the pacing the portal tolerates in practice. A JSON
//! file can override any subset of fields; missing fields keep their default.

use crate::error::ScrapeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Listing page of the RERA Odisha project registry.
pub const DEFAULT_LISTING_URL: &str = "https://rera.odisha.gov.in/projects/project-list";

/// Substring that marks a project detail page URL.
pub const DEFAULT_DETAIL_MARKER: &str = "project-details";

/// Default CSV output file.
pub const DEFAULT_OUTPUT: &str = "rera_projects.csv";

/// Default number of projects collected per run.
pub const DEFAULT_MAX_PROJECTS: usize = 6;

/// Top-level scraper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Listing page the discoverer starts from.
    pub listing_url: String,
    /// URL substring that identifies a detail page.
    pub detail_marker: String,
    /// Explicit Chromium binary; resolved automatically when unset.
    pub chromium_path: Option<PathBuf>,
    /// Run the browser without a window.
    pub headless: bool,
    /// Where each run's records are written.
    pub output: PathBuf,
    /// Projects collected when the caller does not say otherwise.
    pub max_projects: usize,
    pub timings: Timings,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            detail_marker: DEFAULT_DETAIL_MARKER.to_string(),
            chromium_path: None,
            headless: true,
            output: PathBuf::from(DEFAULT_OUTPUT),
            max_projects: DEFAULT_MAX_PROJECTS,
            timings: Timings::default(),
        }
    }
}

impl ScraperConfig {
    /// Load a configuration file, filling unspecified fields with defaults.
    pub fn load(path: &Path) -> Result<Self, ScrapeError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| ScrapeError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if url::Url::parse(&self.listing_url).is_err() {
            return Err(ScrapeError::Config(format!(
                "listing_url is not a valid URL: {}",
                self.listing_url
            )));
        }
        if self.detail_marker.trim().is_empty() {
            return Err(ScrapeError::Config("detail_marker must not be empty".into()));
        }
        if self.max_projects == 0 {
            return Err(ScrapeError::Config("max_projects must be at least 1".into()));
        }
        Ok(())
    }
}

/// Settle intervals and timeouts, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// After loading the listing page.
    pub listing_settle_ms: u64,
    /// After scrolling the listing to mount lazy cards.
    pub scroll_settle_ms: u64,
    /// After scrolling a candidate into view.
    pub scroll_into_view_ms: u64,
    /// After clicking a card affordance.
    pub click_settle_ms: u64,
    /// After returning from a detail page to the listing.
    pub back_settle_ms: u64,
    /// After backing out of a non-detail navigation.
    pub ambiguous_back_ms: u64,
    /// After loading a detail page.
    pub detail_settle_ms: u64,
    /// After clicking the promoter tab.
    pub tab_settle_ms: u64,
    /// Between two detail pages.
    pub pacing_ms: u64,
    /// Upper bound for any single element query or interaction.
    pub element_timeout_ms: u64,
    /// Upper bound for a page navigation.
    pub navigation_timeout_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            listing_settle_ms: 8_000,
            scroll_settle_ms: 3_000,
            scroll_into_view_ms: 1_000,
            click_settle_ms: 4_000,
            back_settle_ms: 4_000,
            ambiguous_back_ms: 2_000,
            detail_settle_ms: 5_000,
            tab_settle_ms: 3_000,
            pacing_ms: 2_000,
            element_timeout_ms: 10_000,
            navigation_timeout_ms: 30_000,
        }
    }
}

impl Timings {
    /// Zero settle intervals; used by tests and offline replays.
    pub fn instant() -> Self {
        Self {
            listing_settle_ms: 0,
            scroll_settle_ms: 0,
            scroll_into_view_ms: 0,
            click_settle_ms: 0,
            back_settle_ms: 0,
            ambiguous_back_ms: 0,
            detail_settle_ms: 0,
            tab_settle_ms: 0,
            pacing_ms: 0,
            ..Self::default()
        }
    }
}

/// Sleep for a settle interval. Zero returns immediately.
pub async fn settle(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! `rera-scraper serve`: expose the HTTP trigger.

use crate::cli::output::Styled;
use anyhow::Result;
use rera_scraper::config::ScraperConfig;
use rera_scraper::rest;
use rera_scraper::service::ScrapeService;
use rera_scraper::session::chromium::{find_chromium, ChromiumLauncher};
use std::sync::Arc;
use tracing::warn;

/// Start the HTTP server and block until Ctrl-C.
pub async fn run(config: ScraperConfig, port: u16) -> Result<()> {
    let s = Styled::new();
    if find_chromium(config.chromium_path.as_deref()).is_none() {
        warn!("no Chromium binary found; POST /scrape will fail until one is installed");
        eprintln!(
            "  {} Chromium not found. Set RERA_CHROMIUM_PATH or chromium_path in the config.",
            s.warn_sym()
        );
    }

    let factory = Arc::new(ChromiumLauncher::new(&config));
    let service = Arc::new(ScrapeService::new(factory, config));

    eprintln!("  {} Serving on http://127.0.0.1:{port}", s.ok_sym());
    tokio::select! {
        result = rest::start(port, service) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("  {} Stopped.", s.ok_sym());
            Ok(())
        }
    }
}

// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! `rera-scraper run`: scrape once, persist, print what was found.

use crate::cli::output::{self, Styled};
use anyhow::{Context, Result};
use rera_scraper::config::ScraperConfig;
use rera_scraper::service::ScrapeService;
use rera_scraper::session::chromium::ChromiumLauncher;
use std::sync::Arc;

/// Run the scrape command.
pub async fn run(config: ScraperConfig, json: bool) -> Result<()> {
    let s = Styled::new();
    let factory = Arc::new(ChromiumLauncher::new(&config));
    let service = ScrapeService::new(factory, config);

    let summary = service.run_now().await.context("scrape run failed")?;
    let records = service
        .results()
        .with_context(|| format!("failed to read back {}", summary.output.display()))?;

    if json {
        output::print_json(&serde_json::json!({
            "count": summary.count,
            "output": summary.output.display().to_string(),
            "started_at": summary.started_at,
            "finished_at": summary.finished_at,
            "records": records,
        }));
        return Ok(());
    }

    if records.is_empty() {
        eprintln!(
            "  {} No projects found. Header written to {}.",
            s.warn_sym(),
            summary.output.display()
        );
        return Ok(());
    }

    print!("{}", output::render_table(&records));
    let elapsed = summary.finished_at - summary.started_at;
    eprintln!(
        "  {} {} project(s) saved to {} in {}s",
        s.ok_sym(),
        summary.count,
        summary.output.display(),
        elapsed.num_seconds()
    );
    Ok(())
}

// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! One scrape run: open a session, discover links, extract each, close.

use crate::config::{settle, ScraperConfig};
use crate::discover::LinkDiscoverer;
use crate::error::ScrapeError;
use crate::extract::FieldExtractor;
use crate::record::ProjectRecord;
use crate::session::{Session, SessionFactory};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Drives a complete run over a single browser session.
pub struct Orchestrator {
    factory: Arc<dyn SessionFactory>,
    config: ScraperConfig,
}

impl Orchestrator {
    pub fn new(factory: Arc<dyn SessionFactory>, config: ScraperConfig) -> Self {
        Self { factory, config }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Scrape up to `max_count` projects.
    ///
    /// Only a failure to open the session is an error. The session is closed
    /// on every exit path; a panic inside the pipeline is re-raised after the
    /// browser has been released.
    pub async fn run(&self, max_count: usize) -> Result<Vec<ProjectRecord>, ScrapeError> {
        let started = Instant::now();
        let mut session = self.factory.open().await.map_err(ScrapeError::Setup)?;
        info!(max_count, listing = %self.config.listing_url, "scrape run started");

        let outcome = AssertUnwindSafe(self.pipeline(session.as_mut(), max_count))
            .catch_unwind()
            .await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "failed to close browser session");
        }

        match outcome {
            Ok(records) => {
                info!(
                    count = records.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "scrape run finished"
                );
                Ok(records)
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn pipeline(&self, session: &mut dyn Session, max_count: usize) -> Vec<ProjectRecord> {
        let links = LinkDiscoverer::new(&self.config)
            .discover(session, max_count)
            .await;
        if links.is_empty() {
            info!("no project links discovered");
            return Vec::new();
        }

        let extractor = FieldExtractor::new(&self.config.timings);
        let total = links.len();
        let mut records = Vec::with_capacity(total);
        for (i, url) in links.iter().enumerate() {
            info!(n = i + 1, total, url = %url, "extracting project");
            records.push(extractor.extract(session, url).await);
            if i + 1 < total {
                settle(self.config.timings.pacing_ms).await;
            }
        }
        records
    }
}

// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! Trigger interface: run a scrape, persist it, serve the latest result set.

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::orchestrator::Orchestrator;
use crate::record::ProjectRecord;
use crate::session::SessionFactory;
use crate::store;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// Outcome of the most recent completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub count: usize,
    pub output: PathBuf,
}

/// Serializes runs over one orchestrator and owns the output file.
pub struct ScrapeService {
    orchestrator: Orchestrator,
    output: PathBuf,
    max_projects: usize,
    /// Held for the duration of a run.
    run_guard: Mutex<()>,
    last_run: RwLock<Option<RunSummary>>,
}

impl ScrapeService {
    pub fn new(factory: Arc<dyn SessionFactory>, config: ScraperConfig) -> Self {
        let output = config.output.clone();
        let max_projects = config.max_projects;
        Self {
            orchestrator: Orchestrator::new(factory, config),
            output,
            max_projects,
            run_guard: Mutex::new(()),
            last_run: RwLock::new(None),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Run with the configured project limit.
    pub async fn run_now(&self) -> Result<RunSummary, ScrapeError> {
        self.run_with(self.max_projects).await
    }

    /// Run once, persist the records and return a summary.
    ///
    /// Concurrent callers wait for the run in progress to finish; only one
    /// browser session is ever driven at a time.
    pub async fn run_with(&self, max_count: usize) -> Result<RunSummary, ScrapeError> {
        let _running = self.run_guard.lock().await;
        let started_at = Utc::now();

        let records = self.orchestrator.run(max_count).await?;
        store::write_records(&self.output, &records)?;

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            count: records.len(),
            output: self.output.clone(),
        };
        info!(
            count = summary.count,
            output = %self.output.display(),
            "run persisted"
        );
        *self.last_run.write().await = Some(summary.clone());
        Ok(summary)
    }

    /// The most recently persisted records. Empty before the first run.
    pub fn results(&self) -> Result<Vec<ProjectRecord>, ScrapeError> {
        store::read_records(&self.output)
    }

    /// Summary of the last completed run, if any. Answers during a run.
    pub async fn last_run(&self) -> Option<RunSummary> {
        self.last_run.read().await.clone()
    }
}

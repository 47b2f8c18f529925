// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the browser session and the scrape pipeline.
//!
//! Only [`ScrapeError::Setup`] ever reaches a caller of the pipeline. Every
//! [`SessionError`] raised while discovering links or extracting fields is
//! logged and absorbed by the component that hit it.

/// Errors raised by a browser session.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// The addressed element no longer exists in the current DOM.
    #[error("stale element: {0}")]
    Stale(String),

    /// The element exists but cannot receive the interaction.
    #[error("element not interactable: {0}")]
    NotInteractable(String),

    /// A browser call did not finish within its bound.
    #[error("{op} timed out after {ms}ms")]
    Timeout { op: &'static str, ms: u64 },

    /// Page navigation failed.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Script evaluation failed or returned an unexpected shape.
    #[error("script failed: {0}")]
    Script(String),

    /// The browser could not be started.
    #[error("browser launch failed: {0}")]
    Launch(String),
}

impl SessionError {
    /// Whether the DOM changed under the caller and the scan should restart.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }
}

/// Errors surfaced by the pipeline, the store and the service layer.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("failed to start browser session: {0}")]
    Setup(#[source] SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

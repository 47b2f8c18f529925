// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! RERA Odisha project scraper.
//!
//! Drives a headless Chromium over the portal's project listing, follows each
//! project card to its detail page and extracts the registration number,
//! project name, promoter name, promoter address and GSTIN into a
//! [`record::ProjectRecord`]. The pipeline is strictly sequential over one
//! browser session; see [`orchestrator::Orchestrator`].

pub mod config;
pub mod discover;
pub mod error;
pub mod extract;
pub mod fields;
pub mod orchestrator;
pub mod record;
pub mod rest;
pub mod service;
pub mod session;
pub mod store;
pub mod text;

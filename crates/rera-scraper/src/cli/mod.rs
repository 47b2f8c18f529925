// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommand implementations for the `rera-scraper` binary.

pub mod output;
pub mod run_cmd;
pub mod serve_cmd;

// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! Terminal output helpers.

use rera_scraper::record::{ProjectRecord, COLUMNS};
use std::io::IsTerminal;

/// Status symbols, colored when stderr is a terminal and `NO_COLOR` is unset.
pub struct Styled {
    color: bool,
}

impl Styled {
    pub fn new() -> Self {
        let color = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        Self { color }
    }

    pub fn ok_sym(&self) -> &'static str {
        if self.color {
            "\x1b[32m✓\x1b[0m"
        } else {
            "OK"
        }
    }

    pub fn warn_sym(&self) -> &'static str {
        if self.color {
            "\x1b[33m!\x1b[0m"
        } else {
            "WARN"
        }
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

/// Display width of a table cell.
const MAX_CELL: usize = 36;

fn cell(value: &str) -> String {
    if value.is_empty() {
        return "-".to_string();
    }
    if value.chars().count() <= MAX_CELL {
        return value.to_string();
    }
    let mut short: String = value.chars().take(MAX_CELL - 1).collect();
    short.push('…');
    short
}

fn row(record: &ProjectRecord) -> [String; 6] {
    [
        cell(&record.registration_number),
        cell(&record.project_name),
        cell(&record.promoter_name),
        cell(&record.promoter_address),
        cell(&record.tax_id),
        record.source_url.clone(),
    ]
}

/// Render records as an aligned text table, one line per record.
pub fn render_table(records: &[ProjectRecord]) -> String {
    let rows: Vec<[String; 6]> = records.iter().map(row).collect();
    let mut widths = COLUMNS.map(|c| c.chars().count());
    for r in &rows {
        for (w, v) in widths.iter_mut().zip(r.iter()) {
            *w = (*w).max(v.chars().count());
        }
    }

    let line = |values: &[String]| {
        values
            .iter()
            .zip(widths.iter())
            .map(|(v, w)| format!("{v:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut out = line(&header);
    out.push('\n');
    for r in &rows {
        out.push_str(&line(r));
        out.push('\n');
    }
    out
}

// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! The project record produced for every discovered detail page.

use serde::{Deserialize, Serialize};

/// Column headers of the persisted table, in order.
pub const COLUMNS: [&str; 6] = [
    "Rera Regd. No",
    "Project Name",
    "Promoter Name",
    "Address of the Promoter",
    "GST No",
    "URL",
];

/// One registered project.
///
/// Every field is always present. A field no pattern resolved holds the empty
/// string so each row carries every column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(rename = "Rera Regd. No")]
    pub registration_number: String,
    #[serde(rename = "Project Name")]
    pub project_name: String,
    #[serde(rename = "Promoter Name")]
    pub promoter_name: String,
    #[serde(rename = "Address of the Promoter")]
    pub promoter_address: String,
    #[serde(rename = "GST No")]
    pub tax_id: String,
    /// Detail page the record was read from. Never empty.
    #[serde(rename = "URL")]
    pub source_url: String,
}

impl ProjectRecord {
    /// An empty record for a detail page.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            ..Self::default()
        }
    }

    /// Number of extracted fields that resolved to a value.
    pub fn resolved_fields(&self) -> usize {
        [
            &self.registration_number,
            &self.project_name,
            &self.promoter_name,
            &self.promoter_address,
            &self.tax_id,
        ]
        .iter()
        .filter(|v| !v.is_empty())
        .count()
    }
}

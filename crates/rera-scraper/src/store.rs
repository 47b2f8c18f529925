// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! CSV persistence for scraped records.
//!
//! Each run replaces the previous file. The header row is always written,
//! even when the run produced nothing, so a stale result set never survives
//! an empty run.

use crate::error::ScrapeError;
use crate::record::{ProjectRecord, COLUMNS};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write `records` to `path`, replacing any existing file.
///
/// The table is written beside the destination first and renamed into place,
/// so readers never observe a half-written file.
pub fn write_records(path: &Path, records: &[ProjectRecord]) -> Result<(), ScrapeError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let staging = staging_path(path);

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&staging)?;
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    drop(writer);

    std::fs::rename(&staging, path)?;
    debug!(path = %path.display(), rows = records.len(), "records written");
    Ok(())
}

/// Read a previously written table. A missing file reads as no records.
pub fn read_records(path: &Path) -> Result<Vec<ProjectRecord>, ScrapeError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::ReaderBuilder::new().from_path(path)?;
    let records = reader
        .deserialize::<ProjectRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ProjectRecord> {
        vec![
            ProjectRecord {
                registration_number: "RP/01/2024/01234".into(),
                project_name: "Sunrise Residency".into(),
                promoter_name: "Kalinga Homes, Pvt Ltd".into(),
                promoter_address: "Plot 12, Sahid Nagar, Bhubaneswar".into(),
                tax_id: "21AAACK1234F1Z5".into(),
                source_url: "https://rera.example.test/projects/project-details/1".into(),
            },
            ProjectRecord::new("https://rera.example.test/projects/project-details/2"),
        ]
    }

    #[test]
    fn test_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records(&path, &sample()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("Rera Regd. No,Project Name,Promoter Name,Address of the Promoter,GST No,URL")
        );
        assert_eq!(
            lines.nth(1),
            Some(",,,,,https://rera.example.test/projects/project-details/2")
        );
        assert_eq!(read_records(&path).unwrap(), sample());
    }

    #[test]
    fn test_empty_run_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records(&path, &sample()).unwrap();
        write_records(&path, &[]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(read_records(&path).unwrap().is_empty());
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_records(&dir.path().join("absent.csv")).unwrap().is_empty());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/run/out.csv");
        write_records(&path, &sample()[..1]).unwrap();
        assert_eq!(read_records(&path).unwrap().len(), 1);
    }
}

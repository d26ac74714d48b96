//! # Classifier Module
//!
//! Sorts images into date folders directly below the scan root.
//!
//! | Granularity | Folder       | Example      |
//! |-------------|--------------|--------------|
//! | by-day      | `YYYY-MM-DD` | `2024-03-15` |
//! | by-quarter  | `YYYY-Qn`    | `2024-Q1`    |
//!
//! The quarter is `(month - 1) / 3 + 1`. File names never change; a file
//! whose target is already occupied is skipped.

use crate::core::metadata::capture_time;
use crate::core::mover::{MoveReport, Mover};
use crate::core::scanner::FileRecord;
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Folder granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    #[default]
    ByDay,
    ByQuarter,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::ByDay => "by-day",
            Granularity::ByQuarter => "by-quarter",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "by-day" | "day" | "date" => Ok(Granularity::ByDay),
            "by-quarter" | "quarter" => Ok(Granularity::ByQuarter),
            other => Err(format!(
                "unknown granularity '{other}' (expected by-day or by-quarter)"
            )),
        }
    }
}

/// Maps capture timestamps to folder names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub granularity: Granularity,
}

impl ClassificationRule {
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    pub fn folder_name(&self, timestamp: NaiveDateTime) -> String {
        folder_name(timestamp, self.granularity)
    }
}

/// 1..=4
pub fn quarter_of(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

/// Pure mapping from timestamp to folder name
pub fn folder_name(timestamp: NaiveDateTime, granularity: Granularity) -> String {
    match granularity {
        Granularity::ByDay => timestamp.format("%Y-%m-%d").to_string(),
        Granularity::ByQuarter => {
            format!("{:04}-Q{}", timestamp.year(), quarter_of(timestamp.month()))
        }
    }
}

/// Moves image records into their date folders
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    rule: ClassificationRule,
    dry_run: bool,
}

impl Classifier {
    pub fn new(rule: ClassificationRule, dry_run: bool) -> Self {
        Self { rule, dry_run }
    }

    /// Target path for one file
    pub fn destination(
        &self,
        root: &Path,
        source: &Path,
        timestamp: NaiveDateTime,
    ) -> Option<PathBuf> {
        let file_name = source.file_name()?;
        Some(root.join(self.rule.folder_name(timestamp)).join(file_name))
    }

    /// Classify every image record; non-images are ignored. Records
    /// without a capture time get one on the spot.
    pub fn classify(&self, root: &Path, records: &[FileRecord]) -> MoveReport {
        let mut mover = Mover::new(self.dry_run);

        for record in records.iter().filter(|r| r.is_image) {
            let capture = record.capture.unwrap_or_else(|| capture_time(&record.path));
            let Some(destination) = self.destination(root, &record.path, capture.timestamp) else {
                mover.fail(&record.path, "path has no file name");
                continue;
            };
            if destination == record.path {
                mover.skip(&record.path, "already organized");
                continue;
            }
            mover.apply(&record.path, &destination, record.size);
        }

        let report = mover.finish();
        info!(
            granularity = %self.rule.granularity,
            moved = report.moved,
            skipped = report.skipped,
            errors = report.errors.len(),
            dry_run = self.dry_run,
            "classification finished"
        );
        report
    }
}

//! Run report returned by every operation.

use crate::core::mover::{MoveReport, MovedFile};
use crate::core::resolver::DuplicateGroup;
use crate::core::scanner::FileIssue;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Which operation produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Deduplicate,
    Organize,
    Both,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Deduplicate => write!(f, "deduplicate"),
            Operation::Organize => write!(f, "organize"),
            Operation::Both => write!(f, "both"),
        }
    }
}

/// Counters for one phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseSummary {
    pub moved: usize,
    pub skipped: usize,
    pub errors: usize,
    pub bytes_moved: u64,
}

impl From<&MoveReport> for PhaseSummary {
    fn from(report: &MoveReport) -> Self {
        Self {
            moved: report.moved,
            skipped: report.skipped,
            errors: report.errors.len(),
            bytes_moved: report.bytes_moved,
        }
    }
}

/// Outcome of `deduplicate`, `organize` or `both`
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub operation: Operation,
    pub root: PathBuf,
    pub dry_run: bool,
    /// Files that made it into the scan index
    pub files_scanned: usize,
    pub groups_found: usize,
    pub files_moved: usize,
    /// Equals `skipped.len()`
    pub files_skipped: usize,
    pub bytes_moved: u64,
    /// Set by deduplication runs that had something to relocate
    pub quarantine_dir: Option<PathBuf>,
    pub dedup: Option<PhaseSummary>,
    pub organize: Option<PhaseSummary>,
    pub groups: Vec<DuplicateGroup>,
    pub moves: Vec<MovedFile>,
    /// Everything left in place, with the cause
    pub skipped: Vec<FileIssue>,
    /// Everything that failed, with the cause
    pub errors: Vec<FileIssue>,
    pub duration_ms: u64,
}

impl Report {
    pub(crate) fn new(operation: Operation, root: PathBuf, dry_run: bool) -> Self {
        Self {
            operation,
            root,
            dry_run,
            files_scanned: 0,
            groups_found: 0,
            files_moved: 0,
            files_skipped: 0,
            bytes_moved: 0,
            quarantine_dir: None,
            dedup: None,
            organize: None,
            groups: Vec::new(),
            moves: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Fold one phase's moves into the totals
    pub(crate) fn absorb(&mut self, moves: MoveReport) {
        self.files_moved += moves.moved;
        self.bytes_moved += moves.bytes_moved;
        self.moves.extend(moves.moved_files);
        self.skipped.extend(moves.skipped_entries);
        self.errors.extend(moves.errors);
        self.files_skipped = self.skipped.len();
    }

    pub(crate) fn add_scan_issues(&mut self, issues: Vec<FileIssue>) {
        self.skipped.extend(issues);
        self.files_skipped = self.skipped.len();
    }

    pub fn megabytes_moved(&self) -> f64 {
        self.bytes_moved as f64 / (1024.0 * 1024.0)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn absorb_accumulates_phases() {
        let mut report = Report::new(Operation::Both, PathBuf::from("/root"), false);

        let mut dedup = MoveReport::default();
        dedup.record_moved(Path::new("/root/a"), Path::new("/q/a"), 1024 * 1024);
        dedup.record_skipped(Path::new("/root/b"), "destination exists");
        report.absorb(dedup);

        let mut organize = MoveReport::default();
        organize.record_moved(Path::new("/root/c"), Path::new("/root/2024-Q1/c"), 1024 * 1024);
        organize.record_error(Path::new("/root/d"), "permission denied");
        report.absorb(organize);

        assert_eq!(report.files_moved, 2);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.errors.len(), 1);
        assert!((report.megabytes_moved() - 2.0).abs() < f64::EPSILON);
        assert!(report.has_errors());
    }

    #[test]
    fn scan_issues_count_as_skipped() {
        let mut report = Report::new(Operation::Deduplicate, PathBuf::from("/root"), false);
        report.add_scan_issues(vec![FileIssue::new("/root/locked", "permission denied")]);
        assert_eq!(report.files_skipped, 1);
    }

    #[test]
    fn serializes_operation_name() {
        let report = Report::new(Operation::Organize, PathBuf::from("/root"), true);
        let json = report.to_json().unwrap();
        assert!(json.contains("\"operation\": \"organize\""));
        assert!(json.contains("\"dry_run\": true"));
    }
}

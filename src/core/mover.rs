//! Collision-safe file moves shared by the relocator and the classifier.
//!
//! A destination that already exists is never overwritten: the entry is
//! skipped and the source left untouched. A hard link is tried first; when
//! that fails (typically across filesystems) the file is copied into a newly
//! created destination, the copy's length verified, and only then is the
//! source removed.

use crate::core::scanner::FileIssue;
use crate::error::MoveError;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A completed (or, in dry-run, planned) move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub size: u64,
}

/// Tally of one batch of moves
#[derive(Debug, Clone, Default, Serialize)]
pub struct MoveReport {
    pub moved: usize,
    pub skipped: usize,
    pub bytes_moved: u64,
    pub moved_files: Vec<MovedFile>,
    pub skipped_entries: Vec<FileIssue>,
    pub errors: Vec<FileIssue>,
}

impl MoveReport {
    pub fn record_moved(&mut self, source: &Path, destination: &Path, size: u64) {
        self.moved += 1;
        self.bytes_moved += size;
        self.moved_files.push(MovedFile {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            size,
        });
    }

    pub fn record_skipped(&mut self, source: &Path, reason: impl Into<String>) {
        self.skipped += 1;
        self.skipped_entries.push(FileIssue::new(source, reason));
    }

    pub fn record_error(&mut self, source: &Path, reason: impl Into<String>) {
        self.errors.push(FileIssue::new(source, reason));
    }

    pub fn merge(&mut self, other: MoveReport) {
        self.moved += other.moved;
        self.skipped += other.skipped;
        self.bytes_moved += other.bytes_moved;
        self.moved_files.extend(other.moved_files);
        self.skipped_entries.extend(other.skipped_entries);
        self.errors.extend(other.errors);
    }
}

/// Executes moves one at a time and keeps the tally
#[derive(Debug, Default)]
pub struct Mover {
    dry_run: bool,
    created_dirs: HashSet<PathBuf>,
    /// Destinations taken during a dry run
    claimed: HashSet<PathBuf>,
    report: MoveReport,
}

impl Mover {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Move `source` to `destination`, recording the outcome. A collision
    /// counts as skipped; any other failure counts as an error.
    pub fn apply(&mut self, source: &Path, destination: &Path, size: u64) {
        let result = if self.dry_run {
            if self.claimed.contains(destination) {
                Err(MoveError::Collision {
                    path: destination.to_path_buf(),
                })
            } else {
                check_move(source, destination).map(|()| {
                    self.claimed.insert(destination.to_path_buf());
                })
            }
        } else {
            self.ensure_parent(destination)
                .and_then(|()| move_file(source, destination))
        };

        match result {
            Ok(()) => {
                debug!(
                    from = %source.display(),
                    to = %destination.display(),
                    dry_run = self.dry_run,
                    "moved"
                );
                self.report.record_moved(source, destination, size);
            }
            Err(MoveError::Collision { path }) => {
                debug!(from = %source.display(), to = %path.display(), "destination exists, skipping");
                self.report
                    .record_skipped(source, format!("destination exists: {}", path.display()));
            }
            Err(e) => {
                warn!(from = %source.display(), error = %e, "move failed");
                self.report.record_error(source, e.to_string());
            }
        }
    }

    pub fn skip(&mut self, source: &Path, reason: impl Into<String>) {
        self.report.record_skipped(source, reason);
    }

    pub fn fail(&mut self, source: &Path, reason: impl Into<String>) {
        self.report.record_error(source, reason);
    }

    pub fn finish(self) -> MoveReport {
        self.report
    }

    fn ensure_parent(&mut self, destination: &Path) -> Result<(), MoveError> {
        let Some(parent) = destination.parent() else {
            return Ok(());
        };
        if self.created_dirs.contains(parent) {
            return Ok(());
        }
        fs::create_dir_all(parent).map_err(|e| MoveError::CreateDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
        self.created_dirs.insert(parent.to_path_buf());
        Ok(())
    }
}

/// Preconditions of a move without performing it
pub fn check_move(source: &Path, destination: &Path) -> Result<(), MoveError> {
    if fs::symlink_metadata(destination).is_ok() {
        return Err(MoveError::Collision {
            path: destination.to_path_buf(),
        });
    }
    match fs::symlink_metadata(source) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(MoveError::SourceMissing {
            path: source.to_path_buf(),
        }),
        Err(e) => Err(MoveError::Io {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: e,
        }),
    }
}

fn collision(destination: &Path) -> MoveError {
    MoveError::Collision {
        path: destination.to_path_buf(),
    }
}

/// Move one file. The destination's parent must already exist.
///
/// The new name is created with `hard_link`, which fails instead of
/// replacing a destination that appeared after the check.
pub fn move_file(source: &Path, destination: &Path) -> Result<(), MoveError> {
    check_move(source, destination)?;

    match fs::hard_link(source, destination) {
        Ok(()) => fs::remove_file(source).map_err(|e| {
            let _ = fs::remove_file(destination);
            MoveError::Io {
                from: source.to_path_buf(),
                to: destination.to_path_buf(),
                source: e,
            }
        }),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(collision(destination)),
        // Cross-device, or no hard links on this filesystem
        Err(_) => copy_verify_remove(source, destination),
    }
}

/// Copy into a freshly created destination, verify its length, then
/// remove the source
pub(crate) fn copy_verify_remove(source: &Path, destination: &Path) -> Result<(), MoveError> {
    let io_error = |e| MoveError::Io {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: e,
    };

    let mut reader = File::open(source).map_err(io_error)?;
    let source_size = reader.metadata().map_err(io_error)?.len();
    let mut writer = match OpenOptions::new().write(true).create_new(true).open(destination) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(collision(destination)),
        Err(e) => return Err(io_error(e)),
    };

    let copied = io::copy(&mut reader, &mut writer).and_then(|n| writer.flush().map(|()| n));
    drop(writer);
    let dest_size = match copied {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(destination);
            return Err(io_error(e));
        }
    };
    if dest_size != source_size {
        let _ = fs::remove_file(destination);
        return Err(MoveError::VerifyFailed {
            path: destination.to_path_buf(),
            expected: source_size,
            actual: dest_size,
        });
    }

    if let Err(e) = fs::remove_file(source) {
        // Leave exactly one copy behind
        let _ = fs::remove_file(destination);
        return Err(io_error(e));
    }
    Ok(())
}

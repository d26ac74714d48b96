//! # Scanner Module
//!
//! Builds the in-memory index of files for one run.
//!
//! ## Phases
//! 1. **Walk** - recursive, symlinks not followed, quarantine folders skipped
//! 2. **Pre-filter** - a content digest is only worth computing for files
//!    whose size collides with another file
//! 3. **Fingerprint** - one task per file on a bounded worker pool; each task
//!    computes only what the current operation needs
//! 4. **Fan-in** - tasks send their record (or the reason it was skipped) to
//!    a single collector
//!
//! ## Example
//! ```rust,ignore
//! use dedup_organizer::core::scanner::{FileScanner, ParallelScanner, ScanNeeds};
//!
//! let scanner = ParallelScanner::new(&EngineConfig::default())?;
//! let result = scanner.scan(Path::new("/photos"), ScanNeeds::deduplicate())?;
//! ```

mod filter;
mod pool;
mod walker;

pub use filter::{is_quarantine_dir_name, FileFilter};
pub use pool::WorkerPool;
pub use walker::{validate_root, walk, DiscoveredFile};

use crate::config::EngineConfig;
use crate::core::hasher::{content_fingerprint, ContentDigest, PerceptualCode, PerceptualHasher};
use crate::core::metadata::{capture_time_or, CaptureTime};
use crate::error::{Result, ScanError};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

/// One scanned file and whatever fingerprints the run asked for
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    /// Absolute path
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Birth time, or the modification time where the filesystem has none
    pub created: SystemTime,
    /// Last modified time
    pub modified: SystemTime,
    /// Whole-file digest; `None` when not needed or when no other file has
    /// the same size
    pub content: Option<ContentDigest>,
    /// pHash; `None` for non-images and undecodable images
    pub perceptual: Option<PerceptualCode>,
    /// Capture timestamp for images, when the run classifies
    pub capture: Option<CaptureTime>,
    /// Extension is in the configured image set
    pub is_image: bool,
}

/// A file that was left out, or an action that failed, with the cause
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIssue {
    pub path: PathBuf,
    pub reason: String,
}

impl FileIssue {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// What the current operation needs from each file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanNeeds {
    pub content: bool,
    pub perceptual: bool,
    pub capture: bool,
    /// Drop non-image files during the walk
    pub images_only: bool,
}

impl ScanNeeds {
    pub fn deduplicate() -> Self {
        Self {
            content: true,
            perceptual: true,
            capture: false,
            images_only: false,
        }
    }

    pub fn organize() -> Self {
        Self {
            content: false,
            perceptual: false,
            capture: true,
            images_only: true,
        }
    }

    pub fn both() -> Self {
        Self {
            content: true,
            perceptual: true,
            capture: true,
            images_only: false,
        }
    }
}

/// Result of a scan operation
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Absolute scan root
    pub root: PathBuf,
    /// Successfully indexed files, sorted by path
    pub records: Vec<FileRecord>,
    /// Files left out of the index (non-fatal)
    pub issues: Vec<FileIssue>,
}

/// Trait for scanners
///
/// Implement this trait to feed the engine a prepared index (e.g., for testing).
pub trait FileScanner: Send + Sync {
    /// Scan `root`; only an inaccessible root is an error
    fn scan(&self, root: &Path, needs: ScanNeeds) -> std::result::Result<ScanResult, ScanError>;
}

/// Walks with walkdir and fingerprints on a rayon pool
pub struct ParallelScanner {
    filter: FileFilter,
    skip_empty: bool,
    hasher: PerceptualHasher,
    pool: WorkerPool,
}

impl ParallelScanner {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let hasher = PerceptualHasher::new(config.perceptual)?;
        Ok(Self {
            filter: FileFilter::new(config.extension_set()).with_hidden(config.include_hidden),
            skip_empty: config.skip_empty_files,
            hasher,
            pool: WorkerPool::new(config.workers)?,
        })
    }

    fn fingerprint(
        &self,
        file: DiscoveredFile,
        hash_content: bool,
        needs: ScanNeeds,
    ) -> std::result::Result<FileRecord, FileIssue> {
        let content = if hash_content {
            match content_fingerprint(&file.path) {
                Ok(digest) => Some(digest),
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "skipping unreadable file");
                    return Err(FileIssue::new(&file.path, e.to_string()));
                }
            }
        } else {
            None
        };

        let perceptual = if needs.perceptual && file.is_image {
            self.hasher.fingerprint(&file.path)
        } else {
            None
        };

        let capture = if needs.capture && file.is_image {
            Some(capture_time_or(&file.path, Some(file.modified)))
        } else {
            None
        };

        Ok(FileRecord {
            path: file.path,
            size: file.size,
            created: file.created,
            modified: file.modified,
            content,
            perceptual,
            capture,
            is_image: file.is_image,
        })
    }
}

impl FileScanner for ParallelScanner {
    fn scan(&self, root: &Path, needs: ScanNeeds) -> std::result::Result<ScanResult, ScanError> {
        let root = validate_root(root)?;
        // Empty files only stay out of fingerprinting; organizing still sees them
        let skip_empty = self.skip_empty && (needs.content || needs.perceptual);
        let walked = walk(&root, &self.filter, needs.images_only, skip_empty);
        let mut issues = walked.issues;

        let mut size_counts: HashMap<u64, usize> = HashMap::new();
        if needs.content {
            for file in &walked.files {
                *size_counts.entry(file.size).or_default() += 1;
            }
        }

        let candidates = walked.files.len();
        let tasks: Vec<(DiscoveredFile, bool)> = walked
            .files
            .into_iter()
            .map(|file| {
                let hash_content = size_counts.get(&file.size).copied().unwrap_or(0) > 1;
                (file, hash_content)
            })
            .collect();

        let outcomes = self
            .pool
            .run(tasks, |(file, hash_content)| self.fingerprint(file, hash_content, needs));

        let mut records = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(record) => records.push(record),
                Err(issue) => issues.push(issue),
            }
        }
        records.sort_by(|a, b| a.path.cmp(&b.path));
        issues.sort_by(|a, b| a.path.cmp(&b.path));

        info!(
            root = %root.display(),
            candidates,
            indexed = records.len(),
            skipped = issues.len(),
            workers = self.pool.workers(),
            "scan complete"
        );

        Ok(ScanResult {
            root,
            records,
            issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::fs;
    use tempfile::TempDir;

    fn scanner() -> ParallelScanner {
        ParallelScanner::new(&EngineConfig {
            workers: 2,
            ..Default::default()
        })
        .unwrap()
    }

    fn write_png(path: &Path, shade: u8) {
        let img = ImageBuffer::from_fn(64, 64, |x, _| Rgb([shade, (x * 4) as u8, 255 - shade]));
        img.save(path).unwrap();
    }

    #[test]
    fn content_only_computed_for_size_collisions() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.bin"), b"same").unwrap();
        fs::write(temp_dir.path().join("b.bin"), b"same").unwrap();
        fs::write(temp_dir.path().join("c.bin"), b"unique size").unwrap();

        let result = scanner().scan(temp_dir.path(), ScanNeeds::deduplicate()).unwrap();
        assert_eq!(result.records.len(), 3);
        assert!(result.records[0].content.is_some());
        assert_eq!(result.records[0].content, result.records[1].content);
        assert!(result.records[2].content.is_none());
    }

    #[test]
    fn organize_skips_hashing_and_non_images() {
        let temp_dir = TempDir::new().unwrap();
        write_png(&temp_dir.path().join("a.png"), 10);
        write_png(&temp_dir.path().join("b.png"), 10);
        fs::write(temp_dir.path().join("notes.txt"), b"text").unwrap();

        let result = scanner().scan(temp_dir.path(), ScanNeeds::organize()).unwrap();
        assert_eq!(result.records.len(), 2);
        for record in &result.records {
            assert!(record.content.is_none());
            assert!(record.perceptual.is_none());
            assert!(record.capture.is_some());
        }
    }

    #[test]
    fn images_get_perceptual_codes() {
        let temp_dir = TempDir::new().unwrap();
        write_png(&temp_dir.path().join("photo.png"), 50);
        fs::write(temp_dir.path().join("notes.txt"), b"text").unwrap();

        let result = scanner().scan(temp_dir.path(), ScanNeeds::deduplicate()).unwrap();
        let photo = result.records.iter().find(|r| r.is_image).unwrap();
        let notes = result.records.iter().find(|r| !r.is_image).unwrap();
        assert!(photo.perceptual.is_some());
        assert!(notes.perceptual.is_none());
    }

    #[test]
    fn corrupt_image_degrades_to_no_perceptual_code() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("broken.jpg"), b"definitely not a jpeg").unwrap();

        let result = scanner().scan(temp_dir.path(), ScanNeeds::deduplicate()).unwrap();
        assert_eq!(result.records.len(), 1);
        assert!(result.records[0].perceptual.is_none());
        assert!(result.issues.is_empty());
    }

    #[test]
    fn records_are_absolute_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("z")).unwrap();
        fs::write(temp_dir.path().join("z/1.bin"), b"1").unwrap();
        fs::write(temp_dir.path().join("a.bin"), b"2").unwrap();

        let result = scanner().scan(temp_dir.path(), ScanNeeds::deduplicate()).unwrap();
        assert!(result.root.is_absolute());
        let paths: Vec<_> = result.records.iter().map(|r| r.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
        assert!(paths.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn unreadable_file_becomes_an_issue_without_stopping_others() {
        let temp_dir = TempDir::new().unwrap();
        let gone = temp_dir.path().join("gone.bin");
        let kept = temp_dir.path().join("kept.bin");
        fs::write(&gone, b"data").unwrap();
        fs::write(&kept, b"data").unwrap();

        let scanner = scanner();
        let walked = walk(temp_dir.path(), &scanner.filter, false, true);
        assert_eq!(walked.files.len(), 2);
        fs::remove_file(&gone).unwrap();

        let tasks: Vec<_> = walked.files.into_iter().map(|file| (file, true)).collect();
        let outcomes = scanner.pool.run(tasks, |(file, hash_content)| {
            scanner.fingerprint(file, hash_content, ScanNeeds::deduplicate())
        });

        let issue = outcomes[0].as_ref().unwrap_err();
        assert_eq!(issue.path, gone);
        assert!(!issue.reason.is_empty());
        let record = outcomes[1].as_ref().unwrap();
        assert_eq!(record.path, kept);
        assert!(record.content.is_some());
    }

    #[test]
    fn empty_images_are_still_organized() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("empty.jpg"), b"").unwrap();

        let organize = scanner().scan(temp_dir.path(), ScanNeeds::organize()).unwrap();
        assert_eq!(organize.records.len(), 1);
        assert!(organize.records[0].capture.is_some());

        let dedupe = scanner().scan(temp_dir.path(), ScanNeeds::deduplicate()).unwrap();
        assert!(dedupe.records.is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let result = scanner().scan(Path::new("/nonexistent/path/12345"), ScanNeeds::both());
        assert!(matches!(result, Err(ScanError::RootNotFound { .. })));
    }
}

//! Directory walking implementation using walkdir.

use super::filter::FileFilter;
use super::FileIssue;
use crate::error::ScanError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A regular file found under the root, before any fingerprinting
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub size: u64,
    pub created: SystemTime,
    pub modified: SystemTime,
    pub is_image: bool,
}

/// Everything the walk produced
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub files: Vec<DiscoveredFile>,
    pub issues: Vec<FileIssue>,
}

fn root_error(root: &Path, e: std::io::Error) -> ScanError {
    match e.kind() {
        ErrorKind::NotFound => ScanError::RootNotFound {
            path: root.to_path_buf(),
        },
        ErrorKind::PermissionDenied => ScanError::PermissionDenied {
            path: root.to_path_buf(),
        },
        _ => ScanError::ReadEntry {
            path: root.to_path_buf(),
            source: e,
        },
    }
}

/// Check that `root` is a readable directory, returning its absolute form
pub fn validate_root(root: &Path) -> Result<PathBuf, ScanError> {
    let metadata = fs::metadata(root).map_err(|e| root_error(root, e))?;

    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    // Existing but unlistable is as fatal as missing
    fs::read_dir(root).map_err(|e| root_error(root, e))?;

    std::path::absolute(root).map_err(|e| ScanError::ReadEntry {
        path: root.to_path_buf(),
        source: e,
    })
}

/// Walk `root` recursively. Symlinks are never followed and only regular
/// files are returned, sorted by path.
pub fn walk(
    root: &Path,
    filter: &FileFilter,
    images_only: bool,
    skip_empty: bool,
) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_type().is_dir() || filter.should_descend(entry.path())
        });

    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                let reason = if e.io_error().map(|io| io.kind()) == Some(ErrorKind::PermissionDenied) {
                    "permission denied".to_string()
                } else {
                    e.to_string()
                };
                warn!(path = %path.display(), %reason, "unreadable directory entry");
                outcome.issues.push(FileIssue::new(path, reason));
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !filter.should_include_file(path, images_only) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot stat file");
                outcome.issues.push(FileIssue::new(path, e.to_string()));
                continue;
            }
        };

        if skip_empty && metadata.len() == 0 {
            debug!(path = %path.display(), "skipping empty file");
            continue;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        outcome.files.push(DiscoveredFile {
            path: path.to_path_buf(),
            size: metadata.len(),
            // Not every filesystem records a birth time
            created: metadata.created().unwrap_or(modified),
            modified,
            is_image: filter.is_image(path),
        });
    }

    outcome.files.sort_by(|a, b| a.path.cmp(&b.path));
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn filter() -> FileFilter {
        FileFilter::new(EngineConfig::default().extension_set())
    }

    fn create_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let outcome = walk(temp_dir.path(), &filter(), false, true);
        assert!(outcome.files.is_empty());
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn traverses_nested_directories_in_path_order() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "b.jpg", b"b");
        create_file(temp_dir.path(), "a/nested.png", b"n");
        create_file(temp_dir.path(), "notes.txt", b"t");

        let outcome = walk(temp_dir.path(), &filter(), false, true);
        let names: Vec<_> = outcome
            .files
            .iter()
            .map(|f| f.path.strip_prefix(temp_dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            names,
            vec![
                PathBuf::from("a/nested.png"),
                PathBuf::from("b.jpg"),
                PathBuf::from("notes.txt"),
            ]
        );
        assert!(outcome.files[0].is_image);
        assert!(!outcome.files[2].is_image);
    }

    #[test]
    fn images_only_excludes_other_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "photo.jpg", b"p");
        create_file(temp_dir.path(), "document.pdf", b"d");

        let outcome = walk(temp_dir.path(), &filter(), true, true);
        assert_eq!(outcome.files.len(), 1);
        assert!(outcome.files[0].path.ends_with("photo.jpg"));
    }

    #[test]
    fn empty_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "empty.jpg", b"");
        create_file(temp_dir.path(), "full.jpg", b"x");

        let outcome = walk(temp_dir.path(), &filter(), false, true);
        assert_eq!(outcome.files.len(), 1);

        let outcome = walk(temp_dir.path(), &filter(), false, false);
        assert_eq!(outcome.files.len(), 2);
    }

    #[test]
    fn quarantine_folders_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "duplicates_20240101_120000/old.jpg", b"o");
        create_file(temp_dir.path(), "keep.jpg", b"k");

        let outcome = walk(temp_dir.path(), &filter(), false, true);
        assert_eq!(outcome.files.len(), 1);
        assert!(outcome.files[0].path.ends_with("keep.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_not_followed() {
        let temp_dir = TempDir::new().unwrap();
        let target = create_file(temp_dir.path(), "real.jpg", b"r");
        std::os::unix::fs::symlink(&target, temp_dir.path().join("link.jpg")).unwrap();
        std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("loop")).unwrap();

        let outcome = walk(temp_dir.path(), &filter(), false, true);
        assert_eq!(outcome.files.len(), 1);
    }

    #[test]
    fn missing_root_is_fatal() {
        let err = validate_root(Path::new("/nonexistent/path/12345")).unwrap_err();
        assert!(matches!(err, ScanError::RootNotFound { .. }));
    }

    #[test]
    fn file_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_file(temp_dir.path(), "file.jpg", b"x");
        let err = validate_root(&file).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_root_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        create_file(&locked, "photo.jpg", b"jpeg");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through mode bits
        let privileged = fs::read_dir(&locked).is_ok();
        let result = validate_root(&locked);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if privileged {
            return;
        }

        assert!(matches!(result, Err(ScanError::PermissionDenied { .. })));
    }

    #[test]
    fn valid_root_is_absolute() {
        let temp_dir = TempDir::new().unwrap();
        let root = validate_root(temp_dir.path()).unwrap();
        assert!(root.is_absolute());
    }
}

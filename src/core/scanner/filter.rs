//! File filtering logic for the scanner.

use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

/// Decides which directories are entered and which files count as images
#[derive(Debug, Clone)]
pub struct FileFilter {
    /// Image extensions, lowercase without the dot
    extensions: BTreeSet<String>,
    /// Whether to include hidden files and directories
    include_hidden: bool,
}

impl FileFilter {
    pub fn new(extensions: BTreeSet<String>) -> Self {
        Self {
            extensions,
            include_hidden: true,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Extension is in the configured image set (case-insensitive)
    pub fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Whether a file should become a scan candidate
    pub fn should_include_file(&self, path: &Path, images_only: bool) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return false;
        }
        !images_only || self.is_image(path)
    }

    /// Whether the walker should descend into a directory below the root
    pub fn should_descend(&self, dir: &Path) -> bool {
        if !self.include_hidden && is_hidden(dir) {
            return false;
        }
        !dir
            .file_name()
            .and_then(|n| n.to_str())
            .map(is_quarantine_dir_name)
            .unwrap_or(false)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Matches folder names produced for quarantine runs (`duplicates_YYYYMMDD_HHMMSS`)
pub fn is_quarantine_dir_name(name: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^duplicates_\d{8}_\d{6}$").expect("static pattern compiles"))
        .is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn default_filter() -> FileFilter {
        FileFilter::new(EngineConfig::default().extension_set())
    }

    #[test]
    fn filter_recognizes_images_case_insensitively() {
        let filter = default_filter();
        assert!(filter.is_image(Path::new("/photos/image.jpg")));
        assert!(filter.is_image(Path::new("/photos/image.JPEG")));
        assert!(filter.is_image(Path::new("/photos/scan.TIFF")));
    }

    #[test]
    fn filter_rejects_non_images() {
        let filter = default_filter();
        assert!(!filter.is_image(Path::new("/photos/document.pdf")));
        assert!(!filter.is_image(Path::new("/photos/no_extension")));
        assert!(!filter.is_image(Path::new("/photos/photo.heic")));
    }

    #[test]
    fn non_images_included_unless_images_only() {
        let filter = default_filter();
        assert!(filter.should_include_file(Path::new("/photos/notes.txt"), false));
        assert!(!filter.should_include_file(Path::new("/photos/notes.txt"), true));
    }

    #[test]
    fn hidden_files_included_by_default() {
        let filter = default_filter();
        assert!(filter.should_include_file(Path::new("/photos/.hidden.jpg"), true));
    }

    #[test]
    fn hidden_files_can_be_excluded() {
        let filter = default_filter().with_hidden(false);
        assert!(!filter.should_include_file(Path::new("/photos/.hidden.jpg"), true));
        assert!(!filter.should_descend(Path::new("/photos/.cache")));
    }

    #[test]
    fn quarantine_directories_are_not_entered() {
        let filter = default_filter();
        assert!(!filter.should_descend(Path::new("/photos/duplicates_20240315_101500")));
        assert!(filter.should_descend(Path::new("/photos/duplicates")));
        assert!(filter.should_descend(Path::new("/photos/duplicates_2024")));
    }

    #[test]
    fn quarantine_name_pattern() {
        assert!(is_quarantine_dir_name("duplicates_20240101_000000"));
        assert!(!is_quarantine_dir_name("duplicates_20240101_0000"));
        assert!(!is_quarantine_dir_name("old_duplicates_20240101_000000"));
    }
}

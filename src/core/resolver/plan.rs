//! Duplicate groups and the relocation plan built from them.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// How the members of a group were matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Byte-identical content
    Exact,
    /// Perceptual codes within the similarity threshold
    Similar,
}

/// Two or more files considered duplicates of each other
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// 1-based, in plan order
    pub id: usize,
    pub kind: GroupKind,
    /// File chosen by the retention policy
    pub survivor: PathBuf,
    /// All members including the survivor, in path order
    pub members: Vec<PathBuf>,
}

impl DuplicateGroup {
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    pub fn non_survivors(&self) -> impl Iterator<Item = &PathBuf> {
        self.members.iter().filter(move |p| **p != self.survivor)
    }
}

/// One non-survivor and where it goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub size: u64,
    /// Id of the group that produced this entry
    pub group: usize,
}

/// Every move of a deduplication run, computed before any filesystem change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelocationPlan {
    pub root: PathBuf,
    pub quarantine_dir: PathBuf,
    pub groups: Vec<DuplicateGroup>,
    pub entries: Vec<PlannedMove>,
}

impl RelocationPlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// `quarantine_dir / <source relative to root>`; a source outside the root
/// keeps only its file name
pub fn quarantine_destination(root: &Path, quarantine_dir: &Path, source: &Path) -> PathBuf {
    match source.strip_prefix(root) {
        Ok(relative) => quarantine_dir.join(relative),
        Err(_) => quarantine_dir.join(source.file_name().unwrap_or(source.as_os_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_preserves_relative_path() {
        let dest = quarantine_destination(
            Path::new("/photos"),
            Path::new("/q/duplicates_20240101_000000"),
            Path::new("/photos/2023/trip/img.jpg"),
        );
        assert_eq!(dest, PathBuf::from("/q/duplicates_20240101_000000/2023/trip/img.jpg"));
    }

    #[test]
    fn outside_root_keeps_file_name() {
        let dest = quarantine_destination(Path::new("/photos"), Path::new("/q"), Path::new("/other/img.jpg"));
        assert_eq!(dest, PathBuf::from("/q/img.jpg"));
    }

    #[test]
    fn non_survivors_exclude_survivor() {
        let group = DuplicateGroup {
            id: 1,
            kind: GroupKind::Exact,
            survivor: PathBuf::from("/b"),
            members: vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")],
        };
        let rest: Vec<_> = group.non_survivors().cloned().collect();
        assert_eq!(rest, vec![PathBuf::from("/a"), PathBuf::from("/c")]);
        assert_eq!(group.duplicate_count(), 2);
    }

    #[test]
    fn plan_serializes_kind_in_snake_case() {
        let plan = RelocationPlan {
            groups: vec![DuplicateGroup {
                id: 1,
                kind: GroupKind::Similar,
                survivor: PathBuf::from("/a"),
                members: vec![PathBuf::from("/a"), PathBuf::from("/b")],
            }],
            ..Default::default()
        };
        assert!(plan.to_json().unwrap().contains("\"similar\""));
    }
}

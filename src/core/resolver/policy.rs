//! Retention policies: which member of a duplicate group stays put.

use crate::core::scanner::FileRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Rule selecting exactly one survivor per group
///
/// Ties on the primary key always fall back to lexical path order, so the
/// choice is reproducible across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetentionPolicy {
    /// Oldest creation time (likely the original)
    #[default]
    EarliestCreated,
    /// Newest creation time
    LatestCreated,
    /// Biggest file (usually the least compressed)
    LargestSize,
    /// Smallest file
    SmallestSize,
    /// Fewest characters in the full path
    ShortestPath,
    /// Most characters in the full path
    LongestPath,
}

impl RetentionPolicy {
    pub const ALL: [RetentionPolicy; 6] = [
        RetentionPolicy::EarliestCreated,
        RetentionPolicy::LatestCreated,
        RetentionPolicy::LargestSize,
        RetentionPolicy::SmallestSize,
        RetentionPolicy::ShortestPath,
        RetentionPolicy::LongestPath,
    ];

    /// `Less` means `a` is preferred over `b`
    pub fn compare(&self, a: &FileRecord, b: &FileRecord) -> Ordering {
        let path_len = |r: &FileRecord| r.path.as_os_str().len();
        let primary = match self {
            RetentionPolicy::EarliestCreated => a.created.cmp(&b.created),
            RetentionPolicy::LatestCreated => b.created.cmp(&a.created),
            RetentionPolicy::LargestSize => b.size.cmp(&a.size),
            RetentionPolicy::SmallestSize => a.size.cmp(&b.size),
            RetentionPolicy::ShortestPath => path_len(a).cmp(&path_len(b)),
            RetentionPolicy::LongestPath => path_len(b).cmp(&path_len(a)),
        };
        primary.then_with(|| a.path.cmp(&b.path))
    }

    /// Pick the survivor; `None` only for an empty group
    pub fn select<'a>(&self, members: &[&'a FileRecord]) -> Option<&'a FileRecord> {
        members.iter().copied().min_by(|a, b| self.compare(a, b))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RetentionPolicy::EarliestCreated => "earliest-created",
            RetentionPolicy::LatestCreated => "latest-created",
            RetentionPolicy::LargestSize => "largest-size",
            RetentionPolicy::SmallestSize => "smallest-size",
            RetentionPolicy::ShortestPath => "shortest-path",
            RetentionPolicy::LongestPath => "longest-path",
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetentionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        let alias = match normalized.as_str() {
            "oldest" => "earliest-created",
            "newest" => "latest-created",
            "largest" => "largest-size",
            "smallest" => "smallest-size",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == alias)
            .ok_or_else(|| {
                format!(
                    "unknown retention policy '{s}' (expected one of: {})",
                    Self::ALL.map(|p| p.as_str()).join(", ")
                )
            })
    }
}

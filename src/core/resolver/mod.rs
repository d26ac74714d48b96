//! # Resolver Module
//!
//! Turns the scan index into duplicate groups and a relocation plan.
//!
//! ## How It Works
//! 1. Records sharing a content digest form **exact** groups
//! 2. Perceptual codes are clustered single-link: a record joins every
//!    cluster holding a member within the threshold, merging them
//! 3. The retention policy picks one survivor per group
//! 4. Every other member becomes a plan entry, destined for the same
//!    relative path inside the quarantine folder
//!
//! ## Determinism
//! Records are visited in path order, groups are emitted in order of their
//! first member and policy ties fall back to path order. The same file set
//! and policy always give the same plan.

mod cluster;
mod plan;
mod policy;

pub use cluster::{single_link_clusters, UnionFind};
pub use plan::{quarantine_destination, DuplicateGroup, GroupKind, PlannedMove, RelocationPlan};
pub use policy::RetentionPolicy;

use crate::config::{EngineConfig, PerceptualScope};
use crate::core::hasher::{ContentDigest, PerceptualCode};
use crate::core::scanner::FileRecord;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Groups duplicates and plans their relocation
#[derive(Debug, Clone, Copy)]
pub struct DuplicateResolver {
    threshold: u32,
    scope: PerceptualScope,
}

impl DuplicateResolver {
    pub fn new(threshold: u32, scope: PerceptualScope) -> Self {
        Self { threshold, scope }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.similarity_threshold, config.perceptual_scope)
    }

    /// Exact groups first, then perceptual clusters. Only groups of two or
    /// more are returned.
    pub fn find_groups(
        &self,
        records: &[FileRecord],
        policy: RetentionPolicy,
    ) -> Vec<DuplicateGroup> {
        let mut ordered: Vec<&FileRecord> = records.iter().collect();
        ordered.sort_by(|a, b| a.path.cmp(&b.path));

        let mut groups = Vec::new();

        let mut by_digest: BTreeMap<ContentDigest, Vec<&FileRecord>> = BTreeMap::new();
        for &record in &ordered {
            if let Some(digest) = record.content {
                by_digest.entry(digest).or_default().push(record);
            }
        }
        let mut exact: Vec<Vec<&FileRecord>> =
            by_digest.into_values().filter(|g| g.len() > 1).collect();
        exact.sort_by(|a, b| a[0].path.cmp(&b[0].path));

        let mut exact_non_survivors: HashSet<&Path> = HashSet::new();
        for members in exact {
            if let Some(group) = build_group(groups.len() + 1, GroupKind::Exact, &members, policy) {
                exact_non_survivors.extend(
                    members
                        .iter()
                        .filter(|m| m.path != group.survivor)
                        .map(|m| m.path.as_path()),
                );
                groups.push(group);
            }
        }

        let candidates: Vec<(&FileRecord, &PerceptualCode)> = ordered
            .iter()
            .filter(|r| r.is_image)
            .filter(|r| match self.scope {
                PerceptualScope::Independent => true,
                PerceptualScope::SurvivorsAndUnmatched => {
                    !exact_non_survivors.contains(r.path.as_path())
                }
            })
            .filter_map(|r| r.perceptual.as_ref().map(|code| (*r, code)))
            .collect();
        let codes: Vec<&PerceptualCode> = candidates.iter().map(|(_, code)| *code).collect();

        for cluster in single_link_clusters(&codes, self.threshold) {
            let members: Vec<&FileRecord> = cluster.iter().map(|&i| candidates[i].0).collect();
            if let Some(group) = build_group(groups.len() + 1, GroupKind::Similar, &members, policy) {
                debug!(id = group.id, members = group.members.len(), "perceptual cluster");
                groups.push(group);
            }
        }

        groups
    }

    /// Build the full plan. `root` is the scan root the records live under.
    pub fn resolve(
        &self,
        records: &[FileRecord],
        policy: RetentionPolicy,
        root: &Path,
        quarantine_dir: &Path,
    ) -> RelocationPlan {
        let groups = self.find_groups(records, policy);
        let sizes: BTreeMap<&Path, u64> =
            records.iter().map(|r| (r.path.as_path(), r.size)).collect();

        let mut planned: HashSet<PathBuf> = HashSet::new();
        let mut entries = Vec::new();
        for group in &groups {
            for source in group.non_survivors() {
                if !planned.insert(source.clone()) {
                    continue;
                }
                entries.push(PlannedMove {
                    source: source.clone(),
                    destination: quarantine_destination(root, quarantine_dir, source),
                    size: sizes.get(source.as_path()).copied().unwrap_or(0),
                    group: group.id,
                });
            }
        }

        info!(
            groups = groups.len(),
            entries = entries.len(),
            %policy,
            "relocation plan built"
        );

        RelocationPlan {
            root: root.to_path_buf(),
            quarantine_dir: quarantine_dir.to_path_buf(),
            groups,
            entries,
        }
    }
}

impl Default for DuplicateResolver {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

fn build_group(
    id: usize,
    kind: GroupKind,
    members: &[&FileRecord],
    policy: RetentionPolicy,
) -> Option<DuplicateGroup> {
    if members.len() < 2 {
        return None;
    }
    let survivor = policy.select(members)?;
    let mut paths: Vec<PathBuf> = members.iter().map(|m| m.path.clone()).collect();
    paths.sort();
    Some(DuplicateGroup {
        id,
        kind,
        survivor: survivor.path.clone(),
        members: paths,
    })
}

//! # Relocator Module
//!
//! Executes a relocation plan: every non-survivor goes into a quarantine
//! folder named after the run's start time, under the same relative path
//! it had below the scan root.
//!
//! ## Safety
//! - Nothing is ever deleted or overwritten
//! - A taken destination skips the entry and leaves the source in place
//! - Moves run sequentially; a failed move is recorded and the batch goes on
//!
//! ## Layout
//! ```text
//! <base>/duplicates_20240315_101500/
//!     relocation_manifest.json
//!     2023/trip/IMG_0001.jpg
//!     notes.txt
//! ```

use crate::config::EngineConfig;
use crate::core::mover::{MoveReport, Mover};
use crate::core::resolver::RelocationPlan;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File written into the quarantine folder after a run
pub const MANIFEST_FILE: &str = "relocation_manifest.json";

/// `duplicates_YYYYMMDD_HHMMSS` for the given run start
pub fn quarantine_dir_name(started: DateTime<Local>) -> String {
    format!("duplicates_{}", started.format("%Y%m%d_%H%M%S"))
}

/// Full quarantine path under `base`
pub fn quarantine_dir(base: &Path, started: DateTime<Local>) -> PathBuf {
    base.join(quarantine_dir_name(started))
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    root: &'a Path,
    quarantine_dir: &'a Path,
    moves: Vec<ManifestEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct ManifestEntry<'a> {
    source: &'a Path,
    destination: &'a Path,
    size: u64,
    group: usize,
    survivor: Option<&'a Path>,
}

/// Moves planned duplicates into quarantine
#[derive(Debug, Clone, Copy)]
pub struct Relocator {
    dry_run: bool,
    write_manifest: bool,
}

impl Relocator {
    pub fn new(dry_run: bool, write_manifest: bool) -> Self {
        Self {
            dry_run,
            write_manifest,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.dry_run, config.write_manifest)
    }

    /// Run every entry of `plan`. The quarantine folder is only created when
    /// there is something to put in it.
    pub fn execute(&self, plan: &RelocationPlan) -> MoveReport {
        let mut mover = Mover::new(self.dry_run);
        if plan.is_empty() {
            return mover.finish();
        }

        if !self.dry_run {
            if let Err(e) = fs::create_dir_all(&plan.quarantine_dir) {
                warn!(dir = %plan.quarantine_dir.display(), error = %e, "cannot create quarantine folder");
                let reason = format!(
                    "quarantine folder {} unavailable: {e}",
                    plan.quarantine_dir.display()
                );
                for entry in &plan.entries {
                    mover.fail(&entry.source, reason.clone());
                }
                return mover.finish();
            }
        }

        for entry in &plan.entries {
            mover.apply(&entry.source, &entry.destination, entry.size);
        }
        let mut report = mover.finish();

        if !self.dry_run && self.write_manifest && report.moved > 0 {
            if let Err(e) = write_manifest(plan, &report) {
                let path = plan.quarantine_dir.join(MANIFEST_FILE);
                warn!(path = %path.display(), error = %e, "manifest not written");
                report.record_error(&path, e.to_string());
            }
        }

        info!(
            quarantine = %plan.quarantine_dir.display(),
            moved = report.moved,
            skipped = report.skipped,
            errors = report.errors.len(),
            bytes = report.bytes_moved,
            dry_run = self.dry_run,
            "relocation finished"
        );
        report
    }
}

impl Default for Relocator {
    fn default() -> Self {
        Self::new(false, true)
    }
}

/// Lists completed moves only. An existing file of the same name is left
/// alone.
fn write_manifest(plan: &RelocationPlan, report: &MoveReport) -> std::io::Result<()> {
    let path = plan.quarantine_dir.join(MANIFEST_FILE);
    let survivors: HashMap<usize, &Path> = plan
        .groups
        .iter()
        .map(|g| (g.id, g.survivor.as_path()))
        .collect();
    let groups: HashMap<&Path, usize> = plan
        .entries
        .iter()
        .map(|e| (e.source.as_path(), e.group))
        .collect();

    let moves = report
        .moved_files
        .iter()
        .map(|m| {
            let group = groups.get(m.source.as_path()).copied().unwrap_or(0);
            ManifestEntry {
                source: &m.source,
                destination: &m.destination,
                size: m.size,
                group,
                survivor: survivors.get(&group).copied(),
            }
        })
        .collect();
    let manifest = Manifest {
        root: &plan.root,
        quarantine_dir: &plan.quarantine_dir,
        moves,
    };

    let json = serde_json::to_string_pretty(&manifest)?;
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            warn!(path = %path.display(), "manifest name taken, not writing");
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    file.write_all(json.as_bytes())
}

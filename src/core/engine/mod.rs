//! # Engine Module
//!
//! The invocation surface: `deduplicate`, `organize` and `both`.
//!
//! ## Stages
//! 1. **Scan** - index the root once, fingerprinting only what is needed
//! 2. **Resolve** - group duplicates and build the relocation plan
//! 3. **Relocate** - move non-survivors into quarantine
//! 4. **Classify** - move images into date folders
//!
//! Nothing touches the filesystem until the plan for the phase is complete,
//! so a run abandoned between stages leaves no half-applied state.
//!
//! ## Example
//! ```rust,ignore
//! use dedup_organizer::core::engine::{Engine, Operations};
//!
//! let engine = Engine::builder().workers(8).dry_run(true).build()?;
//! let report = engine.both(Path::new("/photos"), RetentionPolicy::EarliestCreated, Granularity::ByDay)?;
//! ```

mod report;

pub use report::{Operation, PhaseSummary, Report};

use crate::config::EngineConfig;
use crate::core::classifier::{ClassificationRule, Classifier, Granularity};
use crate::core::relocator::{quarantine_dir, Relocator};
use crate::core::resolver::{DuplicateResolver, RetentionPolicy};
use crate::core::scanner::{FileRecord, FileScanner, ParallelScanner, ScanNeeds, ScanResult};
use crate::error::Result;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// What front-ends call. Only an inaccessible root or a bad configuration
/// is an `Err`; per-file problems end up in the report.
pub trait Operations {
    fn deduplicate(&self, root: &Path, policy: RetentionPolicy) -> Result<Report>;

    fn organize(&self, root: &Path, granularity: Granularity) -> Result<Report>;

    fn both(
        &self,
        root: &Path,
        policy: RetentionPolicy,
        granularity: Granularity,
    ) -> Result<Report>;
}

/// Builder for engine configuration
pub struct EngineBuilder {
    config: EngineConfig,
    scanner: Option<Box<dyn FileScanner>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            scanner: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn similarity_threshold(mut self, threshold: u32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    pub fn quarantine_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.config.quarantine_base = Some(base.into());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.include_hidden = include;
        self
    }

    /// Use a custom scanner instead of the walkdir/rayon one
    pub fn scanner(mut self, scanner: Box<dyn FileScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Validate the configuration and build the engine
    pub fn build(self) -> Result<Engine> {
        self.config.validate()?;
        let scanner = match self.scanner {
            Some(scanner) => scanner,
            None => Box::new(ParallelScanner::new(&self.config)?),
        };
        Ok(Engine {
            resolver: DuplicateResolver::from_config(&self.config),
            relocator: Relocator::from_config(&self.config),
            scanner,
            config: self.config,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Deduplication and classification engine
pub struct Engine {
    config: EngineConfig,
    scanner: Box<dyn FileScanner>,
    resolver: DuplicateResolver,
    relocator: Relocator,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn new(config: EngineConfig) -> Result<Self> {
        EngineBuilder::new().config(config).build()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn scan(&self, root: &Path, needs: ScanNeeds) -> Result<ScanResult> {
        Ok(self.scanner.scan(root, needs)?)
    }

    fn quarantine_base(&self) -> PathBuf {
        let base = self.config.quarantine_base();
        std::path::absolute(&base).unwrap_or(base)
    }

    /// Resolve and relocate; returns the sources that left their place
    fn run_dedup(
        &self,
        scan: &ScanResult,
        policy: RetentionPolicy,
        run_start: DateTime<Local>,
        report: &mut Report,
    ) -> HashSet<PathBuf> {
        let quarantine = quarantine_dir(&self.quarantine_base(), run_start);
        let plan = self
            .resolver
            .resolve(&scan.records, policy, &scan.root, &quarantine);

        report.groups_found = plan.groups.len();
        if !plan.is_empty() {
            report.quarantine_dir = Some(plan.quarantine_dir.clone());
        }

        let moves = self.relocator.execute(&plan);
        let relocated = moves.moved_files.iter().map(|m| m.source.clone()).collect();
        report.dedup = Some(PhaseSummary::from(&moves));
        report.groups = plan.groups;
        report.absorb(moves);
        relocated
    }

    fn run_organize<'a>(
        &self,
        root: &Path,
        records: impl Iterator<Item = &'a FileRecord>,
        granularity: Granularity,
        report: &mut Report,
    ) {
        let records: Vec<FileRecord> = records.cloned().collect();
        let classifier = Classifier::new(ClassificationRule::new(granularity), self.config.dry_run);
        let moves = classifier.classify(root, &records);
        report.organize = Some(PhaseSummary::from(&moves));
        report.absorb(moves);
    }

    fn finish(&self, mut report: Report, started: Instant) -> Report {
        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            operation = %report.operation,
            scanned = report.files_scanned,
            groups = report.groups_found,
            moved = report.files_moved,
            skipped = report.files_skipped,
            errors = report.errors.len(),
            megabytes = report.megabytes_moved(),
            duration_ms = report.duration_ms,
            "run complete"
        );
        report
    }
}

impl Operations for Engine {
    fn deduplicate(&self, root: &Path, policy: RetentionPolicy) -> Result<Report> {
        let started = Instant::now();
        let run_start = Local::now();
        info!(root = %root.display(), %policy, dry_run = self.config.dry_run, "deduplicate");

        let scan = self.scan(root, ScanNeeds::deduplicate())?;
        let mut report = Report::new(Operation::Deduplicate, scan.root.clone(), self.config.dry_run);
        report.files_scanned = scan.records.len();
        report.add_scan_issues(scan.issues.clone());

        self.run_dedup(&scan, policy, run_start, &mut report);
        Ok(self.finish(report, started))
    }

    fn organize(&self, root: &Path, granularity: Granularity) -> Result<Report> {
        let started = Instant::now();
        info!(root = %root.display(), %granularity, dry_run = self.config.dry_run, "organize");

        let scan = self.scan(root, ScanNeeds::organize())?;
        let mut report = Report::new(Operation::Organize, scan.root.clone(), self.config.dry_run);
        report.files_scanned = scan.records.len();
        report.add_scan_issues(scan.issues.clone());

        self.run_organize(&scan.root, scan.records.iter(), granularity, &mut report);
        Ok(self.finish(report, started))
    }

    fn both(
        &self,
        root: &Path,
        policy: RetentionPolicy,
        granularity: Granularity,
    ) -> Result<Report> {
        let started = Instant::now();
        let run_start = Local::now();
        info!(
            root = %root.display(),
            %policy,
            %granularity,
            dry_run = self.config.dry_run,
            "deduplicate then organize"
        );

        let scan = self.scan(root, ScanNeeds::both())?;
        let mut report = Report::new(Operation::Both, scan.root.clone(), self.config.dry_run);
        report.files_scanned = scan.records.len();
        report.add_scan_issues(scan.issues.clone());

        let relocated = self.run_dedup(&scan, policy, run_start, &mut report);
        let remaining = scan.records.iter().filter(|r| !relocated.contains(&r.path));
        self.run_organize(&scan.root, remaining, granularity, &mut report);
        Ok(self.finish(report, started))
    }
}

//! # CLI Module
//!
//! Command-line interface for the dedup organizer.
//!
//! ## Usage
//! ```bash
//! # Quarantine duplicates, keeping the earliest-created copy
//! dedup-organizer dedupe ~/Photos
//!
//! # Sort images into quarter folders
//! dedup-organizer organize ~/Photos --granularity by-quarter
//!
//! # Both, previewing only
//! dedup-organizer both ~/Photos --dry-run
//!
//! # JSON output
//! dedup-organizer dedupe ~/Photos --output json
//! ```
//!
//! Settings are read from `--config`, or from
//! `<config dir>/dedup-organizer/config.toml` when that file exists.
//! Flags given on the command line win over the file.

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use dedup_organizer::core::engine::{Engine, Operations, Report};
use dedup_organizer::error::Result;
use dedup_organizer::{EngineConfig, Granularity, RetentionPolicy};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Dedup Organizer - quarantine duplicates, sort photos by date
#[derive(Parser, Debug)]
#[command(name = "dedup-organizer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Move duplicate files into a quarantine folder
    Dedupe {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        dedupe: DedupeArgs,
    },
    /// Move images into date folders
    Organize {
        #[command(flatten)]
        common: CommonArgs,

        /// Folder granularity (by-day, by-quarter)
        #[arg(short, long, default_value = "by-day")]
        granularity: Granularity,
    },
    /// Deduplicate, then organize what is left
    Both {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        dedupe: DedupeArgs,

        /// Folder granularity (by-day, by-quarter)
        #[arg(short, long, default_value = "by-day")]
        granularity: Granularity,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Directory to process
    root: PathBuf,

    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of scan workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Skip hidden files and directories
    #[arg(long)]
    skip_hidden: bool,

    /// Report what would be moved without moving anything
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct DedupeArgs {
    /// Which copy survives (earliest-created, latest-created, largest-size,
    /// smallest-size, shortest-path, longest-path)
    #[arg(short, long, default_value = "earliest-created")]
    policy: RetentionPolicy,

    /// Similarity threshold (Hamming distance, lower = stricter)
    #[arg(short, long)]
    threshold: Option<u32>,

    /// Where the quarantine folder is created (default: current directory)
    #[arg(short, long)]
    quarantine_base: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (one line per move)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    dedup_organizer::init_tracing();
    let cli = Cli::parse();

    let (common, report) = match cli.command {
        Commands::Dedupe { common, dedupe } => {
            let engine = build_engine(&common, Some(&dedupe))?;
            let report = with_spinner(&common, "Deduplicating", || {
                engine.deduplicate(&common.root, dedupe.policy)
            })?;
            (common, report)
        }
        Commands::Organize {
            common,
            granularity,
        } => {
            let engine = build_engine(&common, None)?;
            let report = with_spinner(&common, "Organizing", || {
                engine.organize(&common.root, granularity)
            })?;
            (common, report)
        }
        Commands::Both {
            common,
            dedupe,
            granularity,
        } => {
            let engine = build_engine(&common, Some(&dedupe))?;
            let report = with_spinner(&common, "Deduplicating and organizing", || {
                engine.both(&common.root, dedupe.policy, granularity)
            })?;
            (common, report)
        }
    };

    match common.output {
        OutputFormat::Pretty => print_pretty_report(&Term::stderr(), &report, common.verbose),
        OutputFormat::Json => print_json_report(&report)?,
        OutputFormat::Minimal => print_minimal_report(&report),
    }

    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    if let Some(path) = path {
        return Ok(EngineConfig::from_toml_file(path)?);
    }
    let default_path = dirs::config_dir()
        .map(|dir| dir.join("dedup-organizer").join("config.toml"))
        .filter(|path| path.is_file());
    match default_path {
        Some(path) => Ok(EngineConfig::from_toml_file(&path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn build_engine(common: &CommonArgs, dedupe: Option<&DedupeArgs>) -> Result<Engine> {
    let mut config = load_config(common.config.as_deref())?;
    if let Some(workers) = common.workers {
        config.workers = workers;
    }
    if common.skip_hidden {
        config.include_hidden = false;
    }
    config.dry_run |= common.dry_run;
    if let Some(dedupe) = dedupe {
        if let Some(threshold) = dedupe.threshold {
            config.similarity_threshold = threshold;
        }
        if let Some(base) = &dedupe.quarantine_base {
            config.quarantine_base = Some(base.clone());
        }
    }
    Engine::new(config)
}

fn with_spinner<F>(common: &CommonArgs, message: &'static str, run: F) -> Result<Report>
where
    F: FnOnce() -> Result<Report>,
{
    if !matches!(common.output, OutputFormat::Pretty) {
        return run();
    }

    let term = Term::stderr();
    term.write_line(&format!(
        "{} {}",
        style("Dedup Organizer").bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line("").ok();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("{} {}", message, common.root.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = run();
    spinner.finish_and_clear();
    result
}

fn print_pretty_report(term: &Term, report: &Report, verbose: bool) {
    let headline = if report.dry_run {
        format!("{} Dry run complete", style("✓").green().bold())
    } else {
        format!("{} {} complete", style("✓").green().bold(), capitalize(&report.operation.to_string()))
    };
    term.write_line(&headline).ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} files scanned in {:.1}s",
        style(report.files_scanned).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();

    if report.dedup.is_some() {
        term.write_line(&format!(
            "  {} duplicate groups found",
            style(report.groups_found).cyan()
        ))
        .ok();
    }

    let verb = if report.dry_run { "would be moved" } else { "moved" };
    term.write_line(&format!(
        "  {} files {} ({})",
        style(report.files_moved).cyan(),
        verb,
        style(format_bytes(report.bytes_moved)).yellow()
    ))
    .ok();

    term.write_line(&format!(
        "  {} files skipped",
        style(report.files_skipped).cyan()
    ))
    .ok();

    if !report.errors.is_empty() {
        term.write_line(&format!(
            "  {} errors",
            style(report.errors.len()).red().bold()
        ))
        .ok();
    }

    if let Some(dir) = &report.quarantine_dir {
        term.write_line(&format!(
            "  {} {}",
            style("Quarantine:").dim(),
            display_path(dir)
        ))
        .ok();
    }

    if verbose && !report.groups.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!("{}", style("Duplicate Groups:").bold().underlined()))
            .ok();
        term.write_line("").ok();

        for group in &report.groups {
            term.write_line(&format!(
                "  {} {} ({} files)",
                style(format!("Group {}:", group.id)).bold(),
                style(format!("{:?}", group.kind).to_lowercase()).yellow(),
                group.members.len()
            ))
            .ok();
            for member in &group.members {
                let marker = if member == &group.survivor {
                    style("★").green().to_string()
                } else {
                    style("○").dim().to_string()
                };
                term.write_line(&format!("    {} {}", marker, display_path(member)))
                    .ok();
            }
            term.write_line("").ok();
        }
    }

    if verbose && !report.skipped.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!("{}", style("Skipped:").bold().underlined()))
            .ok();
        for issue in &report.skipped {
            term.write_line(&format!(
                "  {} {}",
                display_path(&issue.path),
                style(&issue.reason).dim()
            ))
            .ok();
        }
    }

    if !report.errors.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!("{}", style("Errors:").bold().red()))
            .ok();
        for issue in &report.errors {
            term.write_line(&format!(
                "  {} {}",
                display_path(&issue.path),
                style(&issue.reason).red()
            ))
            .ok();
        }
    }

    term.write_line("").ok();
    term.write_line(&format!(
        "{}",
        style("Nothing was deleted. Quarantined files can be moved back at any time.").dim()
    ))
    .ok();
}

fn print_json_report(report: &Report) -> Result<()> {
    println!("{}", report.to_json()?);
    Ok(())
}

fn print_minimal_report(report: &Report) {
    for moved in &report.moves {
        println!("{}\t{}", moved.source.display(), moved.destination.display());
    }
}

fn display_path(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(rest) => format!("~/{}", rest.display()),
            Err(_) => path.display().to_string(),
        },
        None => path.display().to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

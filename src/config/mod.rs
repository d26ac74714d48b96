//! # Config Module
//!
//! Tunables for a run. Every field has a default, so an empty TOML file (or
//! no file at all) yields a working configuration.
//!
//! ```toml
//! extensions = ["jpg", "jpeg", "png"]
//! workers = 4
//! similarity_threshold = 6
//!
//! [perceptual]
//! resize = 32
//! coefficients = 8
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default image extensions used for perceptual hashing and classification
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff"];

/// Default Hamming distance at or below which two images are similar
pub const DEFAULT_SIMILARITY_THRESHOLD: u32 = 8;

/// Parameters of the DCT-based perceptual hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptualParams {
    /// Side of the square grayscale image fed to the transform
    pub resize: u32,
    /// Side of the low-frequency coefficient block that is kept
    pub coefficients: u32,
}

impl PerceptualParams {
    /// Number of bits in a code produced with these parameters (DC excluded)
    pub fn bit_count(&self) -> u32 {
        self.coefficients * self.coefficients - 1
    }
}

impl Default for PerceptualParams {
    fn default() -> Self {
        Self {
            resize: 32,
            coefficients: 8,
        }
    }
}

/// Which images take part in perceptual clustering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerceptualScope {
    /// Exact-group survivors plus images with no byte-identical twin
    #[default]
    SurvivorsAndUnmatched,
    /// Every image, regardless of exact grouping
    Independent,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Extensions (lowercase, no dot) treated as images
    pub extensions: Vec<String>,
    /// Size of the fingerprinting worker pool
    pub workers: usize,
    /// Whether hidden files and directories are scanned
    pub include_hidden: bool,
    /// Whether zero-byte files are ignored
    pub skip_empty_files: bool,
    /// Maximum Hamming distance for two images to be considered similar
    pub similarity_threshold: u32,
    /// Perceptual hash parameters
    pub perceptual: PerceptualParams,
    /// Which images are clustered perceptually
    pub perceptual_scope: PerceptualScope,
    /// Directory in which the quarantine folder is created (None = cwd)
    pub quarantine_base: Option<PathBuf>,
    /// Compute and report without touching the filesystem
    pub dry_run: bool,
    /// Write a JSON manifest of moves into the quarantine folder
    pub write_manifest: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            workers: default_workers(),
            include_hidden: true,
            skip_empty_files: true,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            perceptual: PerceptualParams::default(),
            perceptual_scope: PerceptualScope::default(),
            quarantine_base: None,
            dry_run: false,
            write_manifest: true,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a TOML file and validate it
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&text).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one image extension is required".into(),
            ));
        }
        let PerceptualParams {
            resize,
            coefficients,
        } = self.perceptual;
        if coefficients < 2 {
            return Err(ConfigError::Invalid(format!(
                "perceptual.coefficients must be at least 2 (got {coefficients})"
            )));
        }
        if resize < coefficients {
            return Err(ConfigError::Invalid(format!(
                "perceptual.resize ({resize}) must not be smaller than perceptual.coefficients ({coefficients})"
            )));
        }
        if self.similarity_threshold > self.perceptual.bit_count() {
            return Err(ConfigError::Invalid(format!(
                "similarity_threshold {} exceeds the {}-bit code length",
                self.similarity_threshold,
                self.perceptual.bit_count()
            )));
        }
        Ok(())
    }

    /// Normalized extension set (lowercase, leading dots stripped)
    pub fn extension_set(&self) -> BTreeSet<String> {
        self.extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect()
    }

    /// Base directory for quarantine folders
    pub fn quarantine_base(&self) -> PathBuf {
        self.quarantine_base
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Two workers per hardware thread, since the scan is I/O bound; capped at 16
fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .saturating_mul(2)
        .clamp(1, 16)
}

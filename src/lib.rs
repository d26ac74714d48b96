//! # Dedup Organizer
//!
//! Finds duplicate files under a directory, moves the redundant copies into
//! a timestamped quarantine folder, and sorts images into date folders.
//!
//! ## Core Philosophy
//! - **Never delete** - Redundant copies are moved, never removed
//! - **Never overwrite** - A taken destination means the file stays put
//! - **Deterministic** - The same tree and options always give the same plan
//!
//! ## Architecture
//! - `core` - Scanner, hashers, resolver, relocator, classifier and engine
//! - `config` - Tunables, loadable from TOML
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod config;
pub mod core;
pub mod error;

// Re-export commonly used types at the crate root
pub use crate::config::EngineConfig;
pub use crate::core::classifier::Granularity;
pub use crate::core::engine::{Engine, EngineBuilder, Operations, Report};
pub use crate::core::resolver::RetentionPolicy;
pub use crate::error::{DedupError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}

//! # Core Module
//!
//! The front-end agnostic deduplication and organizing engine.
//!
//! ## Modules
//! - `scanner` - Walks the tree and fingerprints files on a worker pool
//! - `hasher` - Content digests and DCT perceptual codes
//! - `metadata` - Capture time from EXIF, falling back to mtime
//! - `resolver` - Groups duplicates and builds the relocation plan
//! - `mover` - Collision-safe moves shared by the two movers below
//! - `relocator` - Moves non-survivors into a quarantine folder
//! - `classifier` - Moves images into date folders
//! - `engine` - `deduplicate`, `organize` and `both`

pub mod classifier;
pub mod engine;
pub mod hasher;
pub mod metadata;
pub mod mover;
pub mod relocator;
pub mod resolver;
pub mod scanner;

// Re-export commonly used types
pub use classifier::{ClassificationRule, Granularity};
pub use engine::{Engine, EngineBuilder, Operations, Report};
pub use metadata::{CaptureSource, CaptureTime};
pub use resolver::{DuplicateGroup, RelocationPlan, RetentionPolicy};
pub use scanner::{FileRecord, ScanResult};

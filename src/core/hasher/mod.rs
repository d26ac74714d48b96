//! # Hasher Module
//!
//! Produces the two fingerprints the resolver groups on.
//!
//! ## Fingerprints
//! - **Content** - BLAKE3 over the whole byte stream, read in 64 KiB chunks.
//!   Equal digests mean byte-identical files.
//! - **Perceptual** - DCT-based pHash of a downsampled grayscale image.
//!   A small Hamming distance means the pictures look the same, even when
//!   their bytes differ (re-saved at another quality, resized, re-encoded).
//!
//! ## Performance
//! - `zune-jpeg` decodes JPEGs 1.5-2x faster than the image crate
//! - `fast_image_resize` downsamples with SIMD
//! - The DCT only computes the low-frequency corner it needs
//!
//! ## Example
//! ```rust,ignore
//! use dedup_organizer::core::hasher::{content_fingerprint, PerceptualHasher};
//!
//! let digest = content_fingerprint(&path)?;
//! let code = PerceptualHasher::default().fingerprint(&path);
//! ```

mod content;
mod dct;
pub mod fast_decode;
pub mod fast_resize;
mod perceptual;

pub use content::{content_fingerprint, ContentDigest, CHUNK_SIZE};
pub use dct::LowFrequencyDct;
pub use perceptual::{PerceptualCode, PerceptualHasher};

//! DCT-based perceptual hash (pHash).
//!
//! 1. Decode and convert to grayscale
//! 2. Area-average down to a small square (32x32 by default)
//! 3. Apply a 2-D DCT and keep the low-frequency corner (8x8 by default)
//! 4. Drop the DC term, which only encodes overall brightness
//! 5. Set one bit per remaining coefficient: above the block mean or not
//!
//! Low frequencies survive recompression, rescaling and mild colour shifts,
//! so two encodings of the same picture land a few bits apart while unrelated
//! pictures differ in roughly half of the bits.

use super::dct::LowFrequencyDct;
use super::fast_decode::FastDecoder;
use super::fast_resize::grayscale_square;
use crate::config::PerceptualParams;
use crate::error::HashError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Fixed-length bit code; compare with [`PerceptualCode::distance`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerceptualCode {
    bytes: Vec<u8>,
    bits: u32,
}

impl PerceptualCode {
    /// Pack bits MSB-first
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut bytes = vec![0u8; bits.len().div_ceil(8)];
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                bytes[i / 8] |= 1 << (7 - (i % 8));
            }
        }
        Self {
            bytes,
            bits: bits.len() as u32,
        }
    }

    /// Hamming distance. Codes of different lengths never come from the same
    /// parameters, so the shorter length is used and the surplus counts as
    /// differing bits.
    pub fn distance(&self, other: &Self) -> u32 {
        let shared: u32 = self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        shared + self.bits.abs_diff(other.bits)
    }

    pub fn is_similar(&self, other: &Self, threshold: u32) -> bool {
        self.distance(other) <= threshold
    }

    pub fn bit_count(&self) -> u32 {
        self.bits
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for PerceptualCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Computes perceptual codes with fixed parameters
#[derive(Debug, Clone)]
pub struct PerceptualHasher {
    params: PerceptualParams,
    dct: LowFrequencyDct,
}

impl PerceptualHasher {
    pub fn new(params: PerceptualParams) -> Result<Self, HashError> {
        if params.coefficients < 2 || params.resize < params.coefficients {
            return Err(HashError::InvalidParameters(format!(
                "resize {} / coefficients {}",
                params.resize, params.coefficients
            )));
        }
        Ok(Self {
            params,
            dct: LowFrequencyDct::new(params.resize as usize, params.coefficients as usize),
        })
    }

    /// Hash an already-decoded image
    pub fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualCode, HashError> {
        let side = self.params.resize;
        let gray = grayscale_square(image, side)?;
        let pixels: Vec<f64> = gray.as_raw().iter().map(|&p| f64::from(p)).collect();

        let coefficients = self.dct.transform(&pixels);
        let ac = &coefficients[1..];
        let mean = ac.iter().sum::<f64>() / ac.len() as f64;
        let bits: Vec<bool> = ac.iter().map(|&c| c > mean).collect();

        Ok(PerceptualCode::from_bits(&bits))
    }

    /// Decode and hash a file
    pub fn hash_file(&self, path: &Path) -> Result<PerceptualCode, HashError> {
        let image = FastDecoder::decode(path)?;
        self.hash_image(&image).map_err(|e| match e {
            HashError::EmptyImage { .. } => HashError::EmptyImage {
                path: path.to_path_buf(),
            },
            HashError::DecodeError { reason, .. } => HashError::DecodeError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// `None` stands for "not applicable": the file is left out of
    /// perceptual grouping but stays in every other pipeline.
    pub fn fingerprint(&self, path: &Path) -> Option<PerceptualCode> {
        match self.hash_file(path) {
            Ok(code) => Some(code),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "perceptual hash not applicable");
                None
            }
        }
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        let params = PerceptualParams::default();
        Self {
            params,
            dct: LowFrequencyDct::new(params.resize as usize, params.coefficients as usize),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::{ImageBuffer, Rgb, RgbImage};

    /// Coarse 8x8 grid of pseudo-random gray levels, upscaled to 256x256
    fn block_pattern(seed: u32) -> RgbImage {
        let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
        let mut cells = [0u8; 64];
        for cell in cells.iter_mut() {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            *cell = (state >> 24) as u8;
        }
        ImageBuffer::from_fn(256, 256, |x, y| {
            let v = cells[(y / 32 * 8 + x / 32) as usize];
            Rgb([v, v / 2 + 40, 255 - v])
        })
    }

    fn reencode(image: &RgbImage, quality: u8) -> DynamicImage {
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, quality)
            .encode_image(image)
            .unwrap();
        image::load_from_memory(&bytes).unwrap()
    }

    #[test]
    fn code_has_block_minus_dc_bits() {
        let hasher = PerceptualHasher::default();
        let code = hasher
            .hash_image(&DynamicImage::ImageRgb8(block_pattern(1)))
            .unwrap();
        assert_eq!(code.bit_count(), 63);
        assert_eq!(code.as_bytes().len(), 8);
    }

    #[test]
    fn hashing_is_deterministic() {
        let hasher = PerceptualHasher::default();
        let image = DynamicImage::ImageRgb8(block_pattern(7));
        assert_eq!(
            hasher.hash_image(&image).unwrap(),
            hasher.hash_image(&image).unwrap()
        );
    }

    #[test]
    fn recompressed_image_stays_within_threshold() {
        let hasher = PerceptualHasher::default();
        let original = block_pattern(42);
        let high = hasher.hash_image(&reencode(&original, 95)).unwrap();
        let low = hasher.hash_image(&reencode(&original, 40)).unwrap();

        assert!(high.distance(&low) <= crate::config::DEFAULT_SIMILARITY_THRESHOLD);
    }

    #[test]
    fn unrelated_images_are_far_apart() {
        let hasher = PerceptualHasher::default();
        let a = hasher
            .hash_image(&DynamicImage::ImageRgb8(block_pattern(1)))
            .unwrap();
        let b = hasher
            .hash_image(&DynamicImage::ImageRgb8(block_pattern(2)))
            .unwrap();

        assert!(a.distance(&b) > crate::config::DEFAULT_SIMILARITY_THRESHOLD);
    }

    #[test]
    fn resized_copy_is_similar() {
        let hasher = PerceptualHasher::default();
        let original = block_pattern(9);
        let smaller = image::imageops::resize(
            &original,
            128,
            128,
            image::imageops::FilterType::Triangle,
        );
        let a = hasher.hash_image(&DynamicImage::ImageRgb8(original)).unwrap();
        let b = hasher.hash_image(&DynamicImage::ImageRgb8(smaller)).unwrap();

        assert!(a.is_similar(&b, crate::config::DEFAULT_SIMILARITY_THRESHOLD));
    }

    #[test]
    fn invalid_params_rejected() {
        let result = PerceptualHasher::new(PerceptualParams {
            resize: 4,
            coefficients: 8,
        });
        assert!(matches!(result, Err(HashError::InvalidParameters(_))));
    }

    #[test]
    fn distance_counts_differing_bits() {
        let a = PerceptualCode::from_bits(&[true; 10]);
        let b = PerceptualCode::from_bits(&[false; 10]);
        assert_eq!(a.distance(&b), 10);
        assert_eq!(a.distance(&a), 0);
        assert_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn bits_pack_msb_first() {
        let code = PerceptualCode::from_bits(&[true, false, false, false, false, false, false, true, true]);
        assert_eq!(code.as_bytes(), &[0b1000_0001, 0b1000_0000]);
        assert_eq!(code.to_hex(), "8180");
    }

    #[test]
    fn unreadable_file_is_not_applicable() {
        let hasher = PerceptualHasher::default();
        assert!(hasher.fingerprint(Path::new("/nonexistent/a.png")).is_none());
    }
}

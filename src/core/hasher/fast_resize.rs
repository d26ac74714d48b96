//! Grayscale box downsampling for the perceptual hash.
//!
//! fast_image_resize picks AVX2/NEON kernels at runtime. A box kernel
//! averages every source pixel that lands in a destination cell, which
//! flattens JPEG block noise before the DCT sees it.

use crate::error::HashError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage};
use std::path::PathBuf;

fn resize_failure(stage: &str, detail: impl std::fmt::Display) -> HashError {
    HashError::DecodeError {
        path: PathBuf::new(),
        reason: format!("{stage}: {detail}"),
    }
}

/// Luma of `image`, area-averaged into a `side` x `side` square
pub fn grayscale_square(image: &DynamicImage, side: u32) -> Result<GrayImage, HashError> {
    if side == 0 {
        return Err(HashError::InvalidParameters(
            "target side must be positive".into(),
        ));
    }
    let luma = image.to_luma8();
    let (width, height) = luma.dimensions();
    if width == 0 || height == 0 {
        return Err(HashError::EmptyImage {
            path: PathBuf::new(),
        });
    }

    let source = Image::from_vec_u8(width, height, luma.into_raw(), PixelType::U8)
        .map_err(|e| resize_failure("source buffer", e))?;
    let mut target = Image::new(side, side, PixelType::U8);
    let box_filter = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Box));
    Resizer::new()
        .resize(&source, &mut target, &box_filter)
        .map_err(|e| resize_failure("downsample", e))?;

    GrayImage::from_raw(side, side, target.into_vec())
        .ok_or_else(|| resize_failure("target buffer", "length mismatch"))
}

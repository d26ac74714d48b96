//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use chrono::{Local, TimeZone};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, Rgb, RgbImage};
use std::fs::{self, File, FileTimes};
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Coarse 8x8 grid of pseudo-random colors, upscaled to 256x256
pub fn block_pattern(seed: u32) -> RgbImage {
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

pub fn jpeg_bytes(image: &RgbImage, quality: u8) -> Vec<u8> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(image)
        .unwrap();
    bytes
}

/// Splice an APP1 segment carrying `DateTimeOriginal` right after SOI.
/// `datetime` must be in `YYYY:MM:DD HH:MM:SS` form.
pub fn with_exif_datetime(jpeg: &[u8], datetime: &str) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");
    assert_eq!(datetime.len(), 19);

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II\x2A\x00");
    tiff.extend_from_slice(&8u32.to_le_bytes());
    // IFD0: one entry pointing at the Exif IFD
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x8769u16.to_le_bytes());
    tiff.extend_from_slice(&4u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&26u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    // Exif IFD: DateTimeOriginal
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x9003u16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&20u32.to_le_bytes());
    tiff.extend_from_slice(&44u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(datetime.as_bytes());
    tiff.push(0);

    let length = (2 + 6 + tiff.len()) as u16;
    let mut out = Vec::with_capacity(jpeg.len() + length as usize + 2);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

pub fn write_png(path: &Path, seed: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    block_pattern(seed).save(path).unwrap();
}

pub fn set_mtime(path: &Path, year: i32, month: u32, day: u32) {
    let when = Local.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap();
    let file = File::options().write(true).open(path).unwrap();
    file.set_times(FileTimes::new().set_modified(when.into()))
        .unwrap();
}

/// Keeps creation times of consecutive fixtures apart
pub fn tick() {
    thread::sleep(Duration::from_millis(20));
}

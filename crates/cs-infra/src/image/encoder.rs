use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GenericImageView};

use cs_core::ports::{CaptureImageEncoderPort, EncodedCapture};

/// Longest edge kept for the main payload; larger captures are scaled down.
const MAX_CAPTURE_EDGE: u32 = 2048;
const CAPTURE_JPEG_QUALITY: u8 = 85;

const THUMBNAIL_EDGE: u32 = 120;
const THUMBNAIL_JPEG_QUALITY: u8 = 70;

/// Re-encodes raw clipboard images into a bounded JPEG payload plus a
/// square thumbnail. The payload bytes are what gets hashed and stored,
/// so the same source pixels always produce the same blob.
pub struct CaptureImageEncoder {
    max_edge: u32,
}

impl CaptureImageEncoder {
    pub fn new() -> Self {
        Self {
            max_edge: MAX_CAPTURE_EDGE,
        }
    }
}

impl Default for CaptureImageEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureImageEncoderPort for CaptureImageEncoder {
    fn encode_capture(&self, image_bytes: &[u8]) -> Result<EncodedCapture> {
        let decoded =
            image::load_from_memory(image_bytes).context("decode captured image bytes")?;
        let (original_width, original_height) = decoded.dimensions();
        let (target_width, target_height) =
            calculate_target_size(original_width, original_height, self.max_edge);

        let resized = if target_width == original_width && target_height == original_height {
            decoded
        } else {
            decoded.resize_exact(target_width, target_height, FilterType::Triangle)
        };

        let blob_bytes = encode_jpeg(&resized, CAPTURE_JPEG_QUALITY)?;

        let thumbnail = resized.resize_to_fill(THUMBNAIL_EDGE, THUMBNAIL_EDGE, FilterType::Triangle);
        let thumbnail_bytes = encode_jpeg(&thumbnail, THUMBNAIL_JPEG_QUALITY)?;

        Ok(EncodedCapture {
            blob_bytes,
            thumbnail_bytes,
            width: target_width,
            height: target_height,
        })
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder
        .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .context("encode image to jpeg")?;
    Ok(bytes)
}

fn calculate_target_size(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width <= max_edge && height <= max_edge {
        return (width, height);
    }

    if width >= height {
        let scaled_height = ((height as f64) * (max_edge as f64) / (width as f64)).round() as u32;
        (max_edge, scaled_height.max(1))
    } else {
        let scaled_width = ((width as f64) * (max_edge as f64) / (height as f64)).round() as u32;
        (scaled_width.max(1), max_edge)
    }
}

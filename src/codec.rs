// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Image container decode/encode.
//!
//! The descrambler itself only sees [`PixelGrid`]s. Turning bytes into a
//! grid and back goes through an [`ImageCodec`], so tests and embedders can
//! swap in their own implementation. [`ImageRsCodec`] is the default and is
//! backed by the `image` crate.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageReader};
use serde::Deserialize;

use crate::error::{DescrambleError, Result};
use crate::pixels::PixelGrid;

/// Default JPEG quality for re-encoded output.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Converts between encoded image bytes and RGB pixel grids.
pub trait ImageCodec: Send + Sync {
    /// Read `(width, height)` from the container header without decoding
    /// the pixel data.
    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32)>;

    /// Decode any supported container into an 8-bit RGB grid.
    fn decode(&self, bytes: &[u8]) -> Result<PixelGrid>;

    /// Encode a grid into the codec's output container.
    fn encode(&self, grid: &PixelGrid) -> Result<Vec<u8>>;
}

/// Container written by [`ImageRsCodec::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// [`ImageCodec`] backed by the `image` crate.
///
/// Decoding accepts JPEG, PNG, GIF, WebP and BMP and drops any alpha channel.
#[derive(Debug, Clone, Copy)]
pub struct ImageRsCodec {
    format: OutputFormat,
    jpeg_quality: u8,
}

impl Default for ImageRsCodec {
    fn default() -> Self {
        Self::jpeg(DEFAULT_JPEG_QUALITY)
    }
}

impl ImageRsCodec {
    /// JPEG output at the given quality (clamped to 1..=100).
    pub fn jpeg(quality: u8) -> Self {
        Self {
            format: OutputFormat::Jpeg,
            jpeg_quality: quality.clamp(1, 100),
        }
    }

    /// Lossless PNG output.
    pub fn png() -> Self {
        Self {
            format: OutputFormat::Png,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

impl ImageCodec for ImageRsCodec {
    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32)> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|err| DescrambleError::Decode(err.to_string()))?
            .into_dimensions()
            .map_err(|err| DescrambleError::Decode(err.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<PixelGrid> {
        let img = image::load_from_memory(bytes).map_err(|err| DescrambleError::Decode(err.to_string()))?;
        Ok(PixelGrid::from_rgb_image(&img.to_rgb8()))
    }

    fn encode(&self, grid: &PixelGrid) -> Result<Vec<u8>> {
        let rgb = grid.to_rgb_image();
        let mut out = Cursor::new(Vec::new());
        match self.format {
            OutputFormat::Jpeg => {
                let mut encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
                encoder
                    .encode_image(&rgb)
                    .map_err(|err| DescrambleError::Encode(err.to_string()))?;
            }
            OutputFormat::Png => {
                PngEncoder::new(&mut out)
                    .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
                    .map_err(|err| DescrambleError::Encode(err.to_string()))?;
            }
        }
        Ok(out.into_inner())
    }
}

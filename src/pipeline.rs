// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Bytes-in, bytes-out descrambling for single images and batches.
//!
//! A batch is a list of image sources. Each source is fetched, decoded,
//! descrambled and re-encoded on its own; the result is one
//! [`ImageOutcome`] per source, in input order. A failing source never
//! stops the others.
//!
//! With the `parallel` feature, sources are processed concurrently on the
//! rayon pool.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::codec::ImageCodec;
use crate::curve::gilbert2d;
use crate::det_math::golden_offset;
use crate::error::{DescrambleError, Result};
use crate::fetch::{FetchError, ImageFetcher};
use crate::permute;
use crate::pixels::PixelGrid;

/// Maximum pixel dimension (width or height) accepted for descrambling.
pub const MAX_DIMENSION: u32 = 65_535;

/// Maximum total pixel count (width × height).
pub const MAX_PIXELS: u64 = 50_000_000;

/// Size limits checked before the curve is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_dimension: u32,
    pub max_pixels: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            max_pixels: MAX_PIXELS,
        }
    }
}

impl Limits {
    /// Validate image dimensions.
    ///
    /// # Errors
    /// - [`DescrambleError::EmptyImage`] if either dimension is 0.
    /// - [`DescrambleError::ImageTooLarge`] if a side exceeds `max_dimension`
    ///   or the area exceeds `max_pixels`.
    pub fn check(&self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(DescrambleError::EmptyImage);
        }
        if width > self.max_dimension
            || height > self.max_dimension
            || width as u64 * height as u64 > self.max_pixels
        {
            return Err(DescrambleError::ImageTooLarge { width, height });
        }
        Ok(())
    }
}

/// Descramble a decoded grid after checking it against `limits`.
pub fn descramble_grid(grid: &PixelGrid, limits: &Limits) -> Result<PixelGrid> {
    let (width, height) = (grid.width(), grid.height());
    limits.check(width, height)?;
    let curve = gilbert2d(width, height);
    tracing::debug!(width, height, offset = golden_offset(width, height), "descrambling grid");
    Ok(permute::descramble(grid, &curve))
}

/// Decode `bytes` once the header dimensions have passed `limits`.
///
/// Oversized images are rejected without allocating their pixel buffer.
pub fn decode_within(bytes: &[u8], codec: &dyn ImageCodec, limits: &Limits) -> Result<PixelGrid> {
    let (width, height) = codec.dimensions(bytes)?;
    limits.check(width, height)?;
    codec.decode(bytes)
}

/// Decode, descramble and re-encode one image.
pub fn descramble_bytes(bytes: &[u8], codec: &dyn ImageCodec, limits: &Limits) -> Result<Vec<u8>> {
    let grid = decode_within(bytes, codec, limits)?;
    let restored = descramble_grid(&grid, limits)?;
    codec.encode(&restored)
}

/// Decode, scramble and re-encode one image. Inverse of [`descramble_bytes`]
/// up to codec loss.
pub fn scramble_bytes(bytes: &[u8], codec: &dyn ImageCodec, limits: &Limits) -> Result<Vec<u8>> {
    let grid = decode_within(bytes, codec, limits)?;
    limits.check(grid.width(), grid.height())?;
    let curve = gilbert2d(grid.width(), grid.height());
    codec.encode(&permute::scramble(&grid, &curve))
}

/// Where a batch item failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Decode,
    Encode,
}

/// Why a batch item failed.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Descramble(#[from] DescrambleError),
    /// A collaborator panicked while handling this item.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Run one stage of an item, turning a panic into [`ItemError::Panicked`].
fn guarded<T, E>(f: impl FnOnce() -> std::result::Result<T, E>) -> std::result::Result<T, ItemError>
where
    E: Into<ItemError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(Into::into),
        Err(payload) => Err(ItemError::Panicked(panic_message(payload.as_ref()))),
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Result of processing one batch source.
#[derive(Debug)]
pub enum ImageOutcome {
    Descrambled { source: String, bytes: Vec<u8> },
    Failed { source: String, stage: Stage, error: ItemError },
}

impl ImageOutcome {
    pub fn source(&self) -> &str {
        match self {
            Self::Descrambled { source, .. } | Self::Failed { source, .. } => source.as_str(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Descrambled { .. })
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Descrambled { bytes, .. } => Some(bytes.as_slice()),
            Self::Failed { .. } => None,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Descrambled { .. } => None,
            Self::Failed { stage, .. } => Some(*stage),
        }
    }
}

/// Fetch and descramble one source, tagging any failure with its stage.
///
/// A panic inside the fetcher or codec is caught and reported as a failure
/// of the stage it happened in.
pub fn process_source(
    source: &str,
    fetcher: &dyn ImageFetcher,
    codec: &dyn ImageCodec,
    limits: &Limits,
) -> ImageOutcome {
    let failed = |stage: Stage, error: ItemError| {
        tracing::warn!(source, ?stage, %error, "skipping image");
        ImageOutcome::Failed { source: source.to_string(), stage, error }
    };

    let bytes = match guarded(|| fetcher.fetch(source)) {
        Ok(bytes) => bytes,
        Err(err) => return failed(Stage::Download, err),
    };
    let restored = match guarded(|| {
        decode_within(&bytes, codec, limits).and_then(|grid| descramble_grid(&grid, limits))
    }) {
        Ok(grid) => grid,
        Err(err) => return failed(Stage::Decode, err),
    };
    match guarded(|| codec.encode(&restored)) {
        Ok(bytes) => ImageOutcome::Descrambled { source: source.to_string(), bytes },
        Err(err) => failed(Stage::Encode, err),
    }
}

/// Process every source independently. Outcomes keep the input order.
#[cfg(feature = "parallel")]
pub fn process_batch(
    sources: &[String],
    fetcher: &dyn ImageFetcher,
    codec: &dyn ImageCodec,
    limits: &Limits,
) -> Vec<ImageOutcome> {
    use rayon::prelude::*;

    sources
        .par_iter()
        .map(|source| process_source(source, fetcher, codec, limits))
        .collect()
}

/// Process every source independently. Outcomes keep the input order.
#[cfg(not(feature = "parallel"))]
pub fn process_batch(
    sources: &[String],
    fetcher: &dyn ImageFetcher,
    codec: &dyn ImageCodec,
    limits: &Limits,
) -> Vec<ImageOutcome> {
    sources
        .iter()
        .map(|source| process_source(source, fetcher, codec, limits))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::codec::ImageRsCodec;

    /// PNG codec that counts full decodes and panics on a marker body.
    #[derive(Default)]
    struct CountingCodec {
        decodes: AtomicUsize,
    }

    impl ImageCodec for CountingCodec {
        fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32)> {
            ImageRsCodec::png().dimensions(bytes)
        }

        fn decode(&self, bytes: &[u8]) -> Result<PixelGrid> {
            self.decodes.fetch_add(1, Ordering::SeqCst);
            ImageRsCodec::png().decode(bytes)
        }

        fn encode(&self, grid: &PixelGrid) -> Result<Vec<u8>> {
            if grid.width() == 13 {
                panic!("encoder blew up on a 13 px wide grid");
            }
            ImageRsCodec::png().encode(grid)
        }
    }

    struct StaticFetcher(Vec<u8>);

    impl ImageFetcher for StaticFetcher {
        fn fetch(&self, _url: &str) -> std::result::Result<Vec<u8>, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn limits_boundaries() {
        let limits = Limits::default();
        assert!(limits.check(1, 1).is_ok());
        assert!(limits.check(MAX_DIMENSION, 10).is_ok());
        assert!(matches!(limits.check(0, 10), Err(DescrambleError::EmptyImage)));
        assert!(matches!(limits.check(10, 0), Err(DescrambleError::EmptyImage)));
        assert!(matches!(
            limits.check(MAX_DIMENSION + 1, 1),
            Err(DescrambleError::ImageTooLarge { .. })
        ));
        // 10_000 * 5_001 = 50_010_000 > 50M
        assert!(limits.check(10_000, 5_001).is_err());
        assert!(limits.check(10_000, 5_000).is_ok());
    }

    #[test]
    fn custom_limits() {
        let limits = Limits { max_dimension: 100, max_pixels: 1_000 };
        assert!(limits.check(100, 10).is_ok());
        assert!(limits.check(100, 11).is_err());
        assert!(limits.check(101, 1).is_err());
    }

    #[test]
    fn png_bytes_roundtrip() {
        let codec = ImageRsCodec::png();
        let limits = Limits::default();
        let grid = PixelGrid::from_fn(23, 11, |x, y| [(x * 11) as u8, (y * 23) as u8, (x ^ y) as u8]);
        let original = codec.encode(&grid).unwrap();
        let scrambled = scramble_bytes(&original, &codec, &limits).unwrap();
        assert_ne!(codec.decode(&scrambled).unwrap(), grid);
        let restored = descramble_bytes(&scrambled, &codec, &limits).unwrap();
        assert_eq!(codec.decode(&restored).unwrap(), grid);
    }

    #[test]
    fn oversized_grid_is_rejected_before_curve() {
        let limits = Limits { max_dimension: 8, max_pixels: 64 };
        let grid = PixelGrid::new(9, 2);
        assert!(matches!(
            descramble_grid(&grid, &limits),
            Err(DescrambleError::ImageTooLarge { width: 9, height: 2 })
        ));
    }

    #[test]
    fn oversized_header_is_rejected_without_decoding() {
        let codec = CountingCodec::default();
        let bytes = ImageRsCodec::png().encode(&PixelGrid::new(200, 150)).unwrap();
        let limits = Limits { max_dimension: 100, max_pixels: 1_000 };
        assert!(matches!(
            descramble_bytes(&bytes, &codec, &limits),
            Err(DescrambleError::ImageTooLarge { width: 200, height: 150 })
        ));
        assert!(scramble_bytes(&bytes, &codec, &limits).is_err());
        assert_eq!(codec.decodes.load(Ordering::SeqCst), 0);

        let outcome = process_source("big", &StaticFetcher(bytes), &codec, &limits);
        assert_eq!(outcome.stage(), Some(Stage::Decode));
        assert_eq!(codec.decodes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn codec_panic_becomes_failed_outcome() {
        let codec = CountingCodec::default();
        let bytes = ImageRsCodec::png().encode(&PixelGrid::new(13, 4)).unwrap();
        let outcome = process_source("wide13", &StaticFetcher(bytes), &codec, &Limits::default());
        match outcome {
            ImageOutcome::Failed { stage, error: ItemError::Panicked(msg), .. } => {
                assert_eq!(stage, Stage::Encode);
                assert!(msg.contains("13 px"), "{msg}");
            }
            other => panic!("expected a caught panic, got {other:?}"),
        }
    }
}

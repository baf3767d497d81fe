// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the decode → descramble → encode pipeline.

/// Errors that can occur while turning scrambled image bytes into
/// descrambled image bytes.
#[derive(Debug, thiserror::Error)]
pub enum DescrambleError {
    /// The input could not be decoded as a supported image container.
    #[error("image decode failed: {0}")]
    Decode(String),
    /// The descrambled grid could not be re-encoded.
    #[error("image encode failed: {0}")]
    Encode(String),
    /// The image has zero width or height.
    #[error("image has no pixels")]
    EmptyImage,
    /// The image exceeds the configured dimension or pixel-count limits.
    #[error("image too large: {width}x{height}")]
    ImageTooLarge { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, DescrambleError>;

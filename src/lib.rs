// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # gilbert-descramble
//!
//! Pure-Rust reversal of a pixel-scrambling scheme used by image hosts to
//! obfuscate pictures. The scrambler orders all pixels along a Gilbert
//! (generalized Hilbert) space-filling curve and rotates them
//! `round(φ · W · H)` positions along it, φ being the fractional golden
//! ratio. Descrambling walks the same curve and rotates back.
//!
//! - **Core**: [`curve`] (curve generation), [`permute`] (the rotation) and
//!   [`det_math`] (the bit-exact offset). No I/O, no logging, no shared state.
//! - **Around it**: an image codec ([`codec`]), URL fetching ([`fetch`]),
//!   batch processing ([`pipeline`]), and a chat command handler
//!   ([`command`]) that forwards results to the requester.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use gilbert_descramble::{descramble_bytes, ImageRsCodec, Limits};
//!
//! let scrambled = std::fs::read("scrambled.jpg").unwrap();
//! let restored = descramble_bytes(&scrambled, &ImageRsCodec::default(), &Limits::default()).unwrap();
//! std::fs::write("restored.jpg", restored).unwrap();
//! ```

pub mod codec;
pub mod command;
pub mod config;
pub mod curve;
pub mod det_math;
pub mod error;
pub mod fetch;
pub mod permute;
pub mod pipeline;
pub mod pixels;
pub mod telemetry;

pub use codec::{ImageCodec, ImageRsCodec, OutputFormat};
pub use command::{ChatPlatform, CommandSpec, DescrambleCommand, ForwardNode, IncomingMessage, Reply, Segment};
pub use config::{Config, ConfigError};
pub use curve::{gilbert2d, Coord, Curve, GilbertWalk};
pub use det_math::golden_offset;
pub use error::{DescrambleError, Result};
pub use fetch::{FetchError, ImageFetcher};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use permute::{descramble, rotate_along, rotation_indices, scramble};
pub use pipeline::{descramble_bytes, process_batch, scramble_bytes, ImageOutcome, Limits, Stage, MAX_DIMENSION, MAX_PIXELS};
pub use pixels::PixelGrid;

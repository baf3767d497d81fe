// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Deterministic arithmetic for the golden-ratio rotation.
//!
//! The scrambling party derives its rotation from `(sqrt(5) - 1) / 2` in
//! IEEE 754 double precision. Decoding only works if we land on the very
//! same integer, so the constant is pinned by its bit pattern and the
//! product is evaluated in the same order: `(φ · width) · height`.
//!
//! Rounding is half-to-even. No image size below 300×300 produces an exact
//! `.5` product, but the rule keeps the result well defined for all inputs.

// ──────────────────────────────────────────────────────────────────────────
// Golden ratio, fractional part.
// ──────────────────────────────────────────────────────────────────────────

/// `(sqrt(5) - 1) / 2` as the exact f64 produced by the correctly rounded
/// `sqrt` followed by subtraction and halving.
pub const GOLDEN_FRACTION: f64 = f64::from_bits(0x3FE3C6EF372FE950); // 0.6180339887498949

/// Round to the nearest integer, ties to even.
#[inline]
pub fn round_half_even(x: f64) -> f64 {
    x.round_ties_even()
}

/// Rotation offset along the curve for a `width × height` image.
///
/// May equal `width * height` (e.g. for a 1×1 image); callers reduce it
/// modulo the curve length.
pub fn golden_offset(width: u32, height: u32) -> usize {
    let product = GOLDEN_FRACTION * width as f64 * height as f64;
    round_half_even(product) as usize
}

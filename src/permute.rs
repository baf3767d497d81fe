// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Curve-rotation permutation of a pixel grid.
//!
//! The scrambler walks the Gilbert curve and moves every pixel a fixed
//! number of curve positions along it. The amount is
//! [`golden_offset`](crate::det_math::golden_offset), i.e.
//! `round(φ · width · height)`. Descrambling reads each destination cell
//! from `offset` positions further along the curve:
//!
//! ```text
//! out[curve[i]] = in[curve[(i + offset) mod N]]
//! ```
//!
//! Both the curve and the index rotation are bijections, so every pixel is
//! moved exactly once and nothing is blended or dropped.

use crate::curve::Curve;
use crate::det_math::golden_offset;
use crate::pixels::PixelGrid;

/// Rotated curve positions: entry `i` is `(i + offset) mod n`.
pub fn rotation_indices(n: usize, offset: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let shift = offset % n;
    (0..n).map(|i| (i + shift) % n).collect()
}

/// Rotation amount that undoes `offset` on a curve of length `n`.
pub fn inverse_shift(n: usize, offset: usize) -> usize {
    if n == 0 {
        return 0;
    }
    (n - offset % n) % n
}

/// Move pixels along the curve: `out[curve[i]] = grid[curve[(i + shift) mod N]]`.
///
/// Allocates a fresh grid; `grid` is left untouched.
///
/// # Panics
/// If the curve was generated for different dimensions than the grid.
pub fn rotate_along(grid: &PixelGrid, curve: &Curve, shift: usize) -> PixelGrid {
    assert_eq!(
        (curve.width(), curve.height()),
        (grid.width(), grid.height()),
        "curve and grid dimensions differ"
    );
    let width = grid.width();
    let n = curve.len();
    if n == 0 {
        return grid.clone();
    }

    let coords = curve.coords();
    let src = grid.pixels();
    let mut out = PixelGrid::new(width, grid.height());
    let dst = out.pixels_mut();
    let shift = shift % n;
    for (i, to) in coords.iter().enumerate() {
        let from = coords[(i + shift) % n];
        dst[to.flat_index(width)] = src[from.flat_index(width)];
    }
    out
}

/// Undo the golden-ratio curve rotation.
pub fn descramble(grid: &PixelGrid, curve: &Curve) -> PixelGrid {
    let offset = golden_offset(grid.width(), grid.height());
    rotate_along(grid, curve, offset)
}

/// Apply the golden-ratio curve rotation (the scrambler's direction).
pub fn scramble(grid: &PixelGrid, curve: &Curve) -> PixelGrid {
    let offset = golden_offset(grid.width(), grid.height());
    rotate_along(grid, curve, inverse_shift(curve.len(), offset))
}

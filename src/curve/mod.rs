// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Gilbert space-filling curve over arbitrary rectangles.
//!
//! The Gilbert curve generalizes the Hilbert curve to any `W × H` grid,
//! not just powers of two. Consecutive positions stay spatially close,
//! which is what the scrambling scheme relies on. The sequence must match
//! the scrambler's curve exactly; see `tests/curve_pinned.rs`.

mod walk;

pub use walk::GilbertWalk;

/// A grid coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: u32,
    pub y: u32,
}

impl Coord {
    /// Row-major flat index for a grid of the given width.
    #[inline]
    pub fn flat_index(self, width: u32) -> usize {
        self.y as usize * width as usize + self.x as usize
    }
}

/// A complete curve: every cell of the rectangle, each exactly once, in
/// visiting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curve {
    width: u32,
    height: u32,
    coords: Vec<Coord>,
}

impl Curve {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of positions (`width × height`).
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Coordinate at curve position `i`.
    #[inline]
    pub fn get(&self, i: usize) -> Option<Coord> {
        self.coords.get(i).copied()
    }

    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Coord> {
        self.coords.iter()
    }
}

impl<'a> IntoIterator for &'a Curve {
    type Item = &'a Coord;
    type IntoIter = std::slice::Iter<'a, Coord>;

    fn into_iter(self) -> Self::IntoIter {
        self.coords.iter()
    }
}

/// Generate the Gilbert curve for a `width × height` rectangle.
///
/// Returns `width * height` coordinates. A zero dimension yields an empty
/// curve.
pub fn gilbert2d(width: u32, height: u32) -> Curve {
    let walk = GilbertWalk::new(width, height);
    let mut coords = Vec::with_capacity(walk.len());
    coords.extend(walk);
    Curve { width, height, coords }
}

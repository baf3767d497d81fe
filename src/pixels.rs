// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Pixel-domain grid for 8-bit RGB images.
//!
//! Row-major storage, indexed `[y][x]`. Conversion to and from
//! `image::RgbImage` is a plain copy of the interleaved channel bytes.

use image::RgbImage;

use crate::curve::Coord;

/// One RGB pixel.
pub type Rgb = [u8; 3];

/// A `width × height` grid of RGB pixels in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl PixelGrid {
    /// Create a grid filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 3]; width as usize * height as usize],
        }
    }

    /// Build a grid from a per-coordinate function.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Rgb) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[Coord { x, y }.flat_index(self.width)])
    }

    /// Convert from an `image` RGB buffer.
    pub fn from_rgb_image(img: &RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.as_raw().chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect();
        Self { width, height, pixels }
    }

    /// Convert into an `image` RGB buffer.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            image::Rgb(self.pixels[Coord { x, y }.flat_index(self.width)])
        })
    }
}

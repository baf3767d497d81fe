// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Stack-driven traversal of the generalized Hilbert (Gilbert) curve.
//!
//! The curve is defined recursively: a rectangle spanned by a major axis
//! `a` and a minor axis `b` is either a straight run (one of the legs has
//! length 1) or is split into two or three smaller rectangles whose curves
//! join end to start. Instead of recursing, the walk keeps the pending
//! rectangles on an explicit stack and pushes children in reverse so they
//! pop in visiting order. Stack depth stays logarithmic in the image size.
//!
//! Halving uses floor division (toward −∞). Axes point in negative
//! directions inside mirrored sub-rectangles, and truncating division would
//! produce a different curve there.

use super::Coord;

/// A pending sub-rectangle: origin plus the two leg vectors.
#[derive(Debug, Clone, Copy)]
struct Span {
    x: i64,
    y: i64,
    ax: i64,
    ay: i64,
    bx: i64,
    by: i64,
}

/// A straight run being emitted (base case of the subdivision).
#[derive(Debug, Clone, Copy)]
struct Run {
    x: i64,
    y: i64,
    dx: i64,
    dy: i64,
    remaining: i64,
}

/// Iterator over the curve coordinates in visiting order.
///
/// Produces exactly the same sequence as [`gilbert2d`](super::gilbert2d),
/// without materializing it.
#[derive(Debug, Clone)]
pub struct GilbertWalk {
    stack: Vec<Span>,
    run: Option<Run>,
    remaining: usize,
}

impl GilbertWalk {
    /// Start a walk over a `width × height` rectangle.
    ///
    /// The major axis follows the longer side; on ties it is horizontal.
    /// A zero-sized rectangle yields an empty walk.
    pub fn new(width: u32, height: u32) -> Self {
        let mut stack = Vec::new();
        if width > 0 && height > 0 {
            let (w, h) = (width as i64, height as i64);
            let root = if width >= height {
                Span { x: 0, y: 0, ax: w, ay: 0, bx: 0, by: h }
            } else {
                Span { x: 0, y: 0, ax: 0, ay: h, bx: w, by: 0 }
            };
            stack.push(root);
        }
        Self {
            stack,
            run: None,
            remaining: width as usize * height as usize,
        }
    }

    /// Split `span` into a run or push its children. Returns the run for
    /// base cases.
    fn expand(&mut self, span: Span) -> Option<Run> {
        let Span { x, y, ax, ay, bx, by } = span;
        let w = (ax + ay).abs();
        let h = (bx + by).abs();
        let (dax, day) = (ax.signum(), ay.signum());
        let (dbx, dby) = (bx.signum(), by.signum());

        if h == 1 {
            return Some(Run { x, y, dx: dax, dy: day, remaining: w });
        }
        if w == 1 {
            return Some(Run { x, y, dx: dbx, dy: dby, remaining: h });
        }

        let (mut ax2, mut ay2) = (ax.div_euclid(2), ay.div_euclid(2));
        let (mut bx2, mut by2) = (bx.div_euclid(2), by.div_euclid(2));
        let w2 = (ax2 + ay2).abs();
        let h2 = (bx2 + by2).abs();

        if 2 * w > 3 * h {
            if w2 % 2 != 0 && w > 2 {
                ax2 += dax;
                ay2 += day;
            }
            // Children pushed last-first.
            self.stack.push(Span { x: x + ax2, y: y + ay2, ax: ax - ax2, ay: ay - ay2, bx, by });
            self.stack.push(Span { x, y, ax: ax2, ay: ay2, bx, by });
        } else {
            if h2 % 2 != 0 && h > 2 {
                bx2 += dbx;
                by2 += dby;
            }
            self.stack.push(Span {
                x: x + (ax - dax) + (bx2 - dbx),
                y: y + (ay - day) + (by2 - dby),
                ax: -bx2,
                ay: -by2,
                bx: -(ax - ax2),
                by: -(ay - ay2),
            });
            self.stack.push(Span { x: x + bx2, y: y + by2, ax, ay, bx: bx - bx2, by: by - by2 });
            self.stack.push(Span { x, y, ax: bx2, ay: by2, bx: ax2, by: ay2 });
        }
        None
    }
}

impl Iterator for GilbertWalk {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        loop {
            if let Some(run) = self.run.as_mut() {
                if run.remaining > 0 {
                    let coord = Coord { x: run.x as u32, y: run.y as u32 };
                    run.x += run.dx;
                    run.y += run.dy;
                    run.remaining -= 1;
                    self.remaining = self.remaining.saturating_sub(1);
                    return Some(coord);
                }
                self.run = None;
            }
            let span = self.stack.pop()?;
            self.run = self.expand(span);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for GilbertWalk {}

impl std::iter::FusedIterator for GilbertWalk {}

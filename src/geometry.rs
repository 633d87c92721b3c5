//! Geometry primitives
//!
//! Plain value types shared by the parser, the probe grid and the rewriter.

use std::fmt;

/// A 3-D coordinate.
///
/// Equality is exact floating-point equality. Grid interpolation relies on
/// it to detect degenerate (zero-width) cells.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x = {} y = {} z = {}", self.x, self.y, self.z)
    }
}

/// Axis-aligned rectangle.
///
/// `width` and `height` may be negative deltas; every containment test
/// normalises each axis with min/max first.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero-sized rectangle at a point.
    pub const fn at(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 0.0)
    }

    /// Rectangle with `a` and `b` as opposite corners, anchored at the
    /// lower corner so the size is never negative.
    pub fn spanning(a: Point3, b: Point3) -> Self {
        Self::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (b.x - a.x).abs(),
            (b.y - a.y).abs(),
        )
    }

    pub fn min_x(&self) -> f64 {
        self.x.min(self.x + self.width)
    }

    pub fn max_x(&self) -> f64 {
        self.x.max(self.x + self.width)
    }

    pub fn min_y(&self) -> f64 {
        self.y.min(self.y + self.height)
    }

    pub fn max_y(&self) -> f64 {
        self.y.max(self.y + self.height)
    }

    /// Grow to include `(x, y)`. The result is normalised.
    pub fn add(&mut self, x: f64, y: f64) {
        let min_x = self.min_x().min(x);
        let min_y = self.min_y().min(y);
        let max_x = self.max_x().max(x);
        let max_y = self.max_y().max(y);
        *self = Self::new(min_x, min_y, max_x - min_x, max_y - min_y);
    }

    /// Closed-interval containment; boundary points are inside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        is_between(self.x, self.x + self.width, x) && is_between(self.y, self.y + self.height, y)
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.contains(other.min_x(), other.min_y()) && self.contains(other.max_x(), other.max_y())
    }
}

fn is_between(first: f64, second: f64, value: f64) -> bool {
    let smallest = first.min(second);
    let biggest = first.max(second);
    value >= smallest && value <= biggest
}

//! Points and block rectangles in canvas space.
//!
//! The canvas is unbounded and scrollable: coordinates grow right and down
//! from the top-left origin, and only the lower bounds are enforced.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MIN_BLOCK_HEIGHT, MIN_BLOCK_WIDTH};

/// A pointer position in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Position and size of a block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Copy with the position clamped to the origin and the size clamped to
    /// the block minimums.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            x: clamp_position(self.x),
            y: clamp_position(self.y),
            width: clamp_width(self.width),
            height: clamp_height(self.height),
        }
    }

    /// Whether every component is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Whether `pt` lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x <= self.x + self.width && pt.y >= self.y && pt.y <= self.y + self.height
    }

    /// Top-left corner.
    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Positions never go negative.
#[must_use]
pub fn clamp_position(v: f64) -> f64 {
    v.max(0.0)
}

#[must_use]
pub fn clamp_width(w: f64) -> f64 {
    w.max(MIN_BLOCK_WIDTH)
}

#[must_use]
pub fn clamp_height(h: f64) -> f64 {
    h.max(MIN_BLOCK_HEIGHT)
}

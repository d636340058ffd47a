//! Foundation types and constants.
//!
//! Geometry shared by every stage of the stencil pipeline: container bounds,
//! screen-space rectangles, and the 8-bit coverage scale used by the
//! rasterizer and the surface.

use serde::{Deserialize, Serialize};

// ============================================================================
// Rounding helpers
// ============================================================================

/// Round a double to the nearest unsigned integer (round half up).
#[inline]
pub fn uround(v: f64) -> u32 {
    (v + 0.5) as u32
}

/// Floor a double to the nearest integer toward negative infinity.
#[inline]
pub fn ifloor(v: f64) -> i32 {
    let i = v as i32;
    i - (i as f64 > v) as i32
}

/// Ceiling of a double as a signed integer.
#[inline]
pub fn iceil(v: f64) -> i32 {
    v.ceil() as i32
}

// ============================================================================
// Cover (anti-aliasing) constants
// ============================================================================

/// The type used for anti-aliasing coverage values.
pub type CoverType = u8;

pub const COVER_SHIFT: u32 = 8;
pub const COVER_SIZE: u32 = 1 << COVER_SHIFT;
pub const COVER_MASK: u32 = COVER_SIZE - 1;
pub const COVER_NONE: CoverType = 0;
pub const COVER_FULL: CoverType = COVER_MASK as CoverType;

// ============================================================================
// Bounds
// ============================================================================

/// Size of the text container in pixels.
///
/// Layout engines report fractional sizes; [`Bounds::pixel_size`] rounds
/// them up so the surface always covers the whole container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whole-pixel surface size for these bounds. Negative or non-finite
    /// dimensions collapse to zero.
    pub fn pixel_size(&self) -> (u32, u32) {
        fn px(v: f64) -> u32 {
            if v.is_finite() && v > 0.0 {
                v.ceil() as u32
            } else {
                0
            }
        }
        (px(self.width), px(self.height))
    }

    pub fn is_empty(&self) -> bool {
        let (w, h) = self.pixel_size();
        w == 0 || h == 0
    }
}

// ============================================================================
// Rect
// ============================================================================

/// An axis-aligned rectangle given by origin and extent, in the coordinate
/// space of the text container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corner points (order independent).
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// True when every component is finite and the area is positive.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Translate into the coordinate space whose origin is `(ox, oy)`.
    pub fn relative_to(&self, ox: f64, oy: f64) -> Self {
        Self::new(self.x - ox, self.y - oy, self.width, self.height)
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Self {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = self.right().max(other.right());
        let y2 = self.bottom().max(other.bottom());
        Self::from_corners(x1, y1, x2, y2)
    }

    /// Snap outward to whole pixels: floor the origin, ceil the far edge.
    ///
    /// Returns `(x1, y1, x2, y2)` with `x2`/`y2` exclusive.
    pub fn pixel_span(&self) -> (i32, i32, i32, i32) {
        (
            ifloor(self.x),
            ifloor(self.y),
            iceil(self.right()),
            iceil(self.bottom()),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

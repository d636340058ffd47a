//! Anti-aliased polygon rasterizer.
//!
//! Accepts polygon contours (`move_to_d` / `line_to_d` / `close_polygon`, or
//! whole [`Outline`]s), accumulates exact signed-area coverage per pixel, and
//! sweeps the result row by row into a [`StencilSurface`].
//!
//! Every edge deposits its signed area into a dense accumulation buffer: the
//! pixel it crosses receives the fractional part and the pixel to its right
//! receives the remainder, so a running sum along a row yields the winding
//! coverage of each pixel. Edges are clipped to the surface before they are
//! accumulated: parts left of the surface collapse onto `x = 0` and parts to
//! the right collapse onto `x = width`, which preserves the winding of every
//! visible pixel.

use crate::basics::{uround, CoverType, COVER_FULL, COVER_NONE};
use crate::color::Rgba8;
use crate::path::Outline;
use crate::surface::StencilSurface;

/// Edges shorter than this in y carry no coverage.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Initial,
    MoveTo,
    LineTo,
}

/// Polygon rasterizer producing anti-aliased coverage for one surface size.
///
/// Overlapping contours combine with the non-zero winding rule.
///
/// Usage:
/// 1. Define contours with `move_to_d()` / `line_to_d()` or `add_outline()`
/// 2. Call [`render`](Self::render) to stamp the coverage as ink
pub struct CoverageRasterizer {
    width: u32,
    height: u32,
    /// Row stride of `acc`: two guard columns on the right collect the
    /// contributions of edges clamped onto `x = width`.
    stride: usize,
    acc: Vec<f64>,
    start_x: f64,
    start_y: f64,
    last_x: f64,
    last_y: f64,
    status: Status,
    min_y: u32,
    max_y: u32,
}

impl CoverageRasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width as usize + 2;
        Self {
            width,
            height,
            stride,
            acc: vec![0.0; stride * height as usize],
            start_x: 0.0,
            start_y: 0.0,
            last_x: 0.0,
            last_y: 0.0,
            status: Status::Initial,
            min_y: u32::MAX,
            max_y: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Discard all polygon data, keeping the surface size.
    pub fn reset(&mut self) {
        if self.min_y <= self.max_y {
            let from = self.min_y as usize * self.stride;
            let to = (self.max_y as usize + 1) * self.stride;
            self.acc[from..to].fill(0.0);
        }
        self.status = Status::Initial;
        self.min_y = u32::MAX;
        self.max_y = 0;
    }

    /// Reset and resize the accumulation buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.stride = width as usize + 2;
        self.acc.clear();
        self.acc.resize(self.stride * height as usize, 0.0);
        self.status = Status::Initial;
        self.min_y = u32::MAX;
        self.max_y = 0;
    }

    // ========================================================================
    // Path building
    // ========================================================================

    /// Close the current polygon contour.
    pub fn close_polygon(&mut self) {
        if self.status == Status::LineTo {
            self.edge_d(self.last_x, self.last_y, self.start_x, self.start_y);
        }
        self.status = Status::Initial;
    }

    /// Start a new contour, closing the current one.
    pub fn move_to_d(&mut self, x: f64, y: f64) {
        self.close_polygon();
        self.start_x = x;
        self.start_y = y;
        self.last_x = x;
        self.last_y = y;
        self.status = Status::MoveTo;
    }

    pub fn line_to_d(&mut self, x: f64, y: f64) {
        if self.status == Status::Initial {
            self.move_to_d(x, y);
            return;
        }
        self.edge_d(self.last_x, self.last_y, x, y);
        self.last_x = x;
        self.last_y = y;
        self.status = Status::LineTo;
    }

    /// Add every contour of an outline. Contours are closed implicitly.
    pub fn add_outline(&mut self, outline: &Outline) {
        for contour in outline.contours() {
            let mut points = contour.iter();
            if let Some(&(x, y)) = points.next() {
                self.move_to_d(x, y);
                for &(x, y) in points {
                    self.line_to_d(x, y);
                }
                self.close_polygon();
            }
        }
    }

    /// Add a single edge in floating-point coordinates.
    pub fn edge_d(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        if !(x1.is_finite() && y1.is_finite() && x2.is_finite() && y2.is_finite()) {
            return;
        }
        let w = self.width as f64;
        // Split at the vertical surface borders, then clamp each piece.
        let mut ts = [0.0, 1.0, 1.0, 1.0];
        let mut n = 1;
        let dx = x2 - x1;
        if dx.abs() > EPSILON {
            for border in [0.0, w] {
                let t = (border - x1) / dx;
                if t > 0.0 && t < 1.0 {
                    ts[n] = t;
                    n += 1;
                }
            }
        }
        ts[n] = 1.0;
        ts[1..n].sort_by(|a, b| a.total_cmp(b));
        for i in 0..n {
            let (ta, tb) = (ts[i], ts[i + 1]);
            let ax = (x1 + dx * ta).clamp(0.0, w);
            let bx = (x1 + dx * tb).clamp(0.0, w);
            let ay = y1 + (y2 - y1) * ta;
            let by = y1 + (y2 - y1) * tb;
            self.accumulate_line(ax, ay, bx, by);
        }
    }

    /// Deposit the signed area of one edge, already clamped to `[0, width]`
    /// horizontally, into the accumulation rows it spans.
    fn accumulate_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        if (y1 - y0).abs() <= EPSILON || self.height == 0 {
            return;
        }
        let (dir, x0, y0, x1, y1) = if y0 < y1 {
            (1.0, x0, y0, x1, y1)
        } else {
            (-1.0, x1, y1, x0, y0)
        };
        let w = self.width as f64;
        let dxdy = (x1 - x0) / (y1 - y0);
        let mut x = x0;
        if y0 < 0.0 {
            x = (x - y0 * dxdy).clamp(0.0, w);
        }
        let row_from = y0.max(0.0) as u32;
        let row_to = (y1.ceil().max(0.0) as u32).min(self.height);
        if row_from >= row_to {
            return;
        }
        self.min_y = self.min_y.min(row_from);
        self.max_y = self.max_y.max(row_to - 1);

        for y in row_from..row_to {
            let line = y as usize * self.stride;
            let dy = ((y + 1) as f64).min(y1) - (y as f64).max(y0);
            let xnext = (x + dxdy * dy).clamp(0.0, w);
            let d = dy * dir;
            let (xa, xb) = if x < xnext { (x, xnext) } else { (xnext, x) };
            let xa_floor = xa.floor();
            let xai = xa_floor as usize;
            let xb_ceil = xb.ceil();
            let xbi = xb_ceil as usize;
            if xbi <= xai + 1 {
                // Edge stays within one pixel column on this row.
                let xmf = 0.5 * (x + xnext) - xa_floor;
                self.acc[line + xai] += d - d * xmf;
                self.acc[line + xai + 1] += d * xmf;
            } else {
                let s = (xb - xa).recip();
                let xaf = xa - xa_floor;
                let a0 = 0.5 * s * (1.0 - xaf) * (1.0 - xaf);
                let xbf = xb - xb_ceil + 1.0;
                let am = 0.5 * s * xbf * xbf;
                self.acc[line + xai] += d * a0;
                if xbi == xai + 2 {
                    self.acc[line + xai + 1] += d * (1.0 - a0 - am);
                } else {
                    let a1 = s * (1.5 - xaf);
                    self.acc[line + xai + 1] += d * (a1 - a0);
                    for xi in xai + 2..xbi - 1 {
                        self.acc[line + xi] += d * s;
                    }
                    let a2 = a1 + (xbi - xai - 3) as f64 * s;
                    self.acc[line + xbi - 1] += d * (1.0 - a2 - am);
                }
                self.acc[line + xbi] += d * am;
            }
            x = xnext;
        }
    }

    // ========================================================================
    // Scanline sweeping
    // ========================================================================

    /// Convert an accumulated winding value into 8-bit coverage.
    #[inline]
    pub fn calculate_alpha(&self, winding: f64) -> CoverType {
        let cover = winding.abs();
        if cover >= 1.0 {
            return COVER_FULL;
        }
        uround(cover * COVER_FULL as f64) as CoverType
    }

    /// Coverage of every pixel on row `y`, left to right.
    pub fn sweep_scanline(&self, y: u32) -> Vec<CoverType> {
        let mut covers = vec![COVER_NONE; self.width as usize];
        if y >= self.height || self.min_y > y || y > self.max_y {
            return covers;
        }
        let line = y as usize * self.stride;
        let mut winding = 0.0;
        for (x, cover) in covers.iter_mut().enumerate() {
            winding += self.acc[line + x];
            *cover = self.calculate_alpha(winding);
        }
        covers
    }

    /// Stamp the accumulated coverage into `surface` as ink of color `c`,
    /// then reset for the next polygon set. Returns the number of rows that
    /// received ink.
    pub fn render(&mut self, surface: &mut StencilSurface, c: &Rgba8) -> u32 {
        self.close_polygon();
        let mut rows = 0;
        if self.min_y <= self.max_y {
            for y in self.min_y..=self.max_y {
                let covers = self.sweep_scanline(y);
                let first = covers.iter().position(|&v| v != COVER_NONE);
                let last = covers.iter().rposition(|&v| v != COVER_NONE);
                if let (Some(first), Some(last)) = (first, last) {
                    surface.blend_ink_hspan(first as i32, y as i32, c, &covers[first..=last]);
                    rows += 1;
                }
            }
        }
        self.reset();
        rows
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Stencil surface: an offscreen RGBA8 pixel buffer.
//!
//! Row-major, top-down, 4 bytes per pixel in R, G, B, A order, which is the
//! layout a browser `ImageData` expects. The stencil is written only by the
//! rasterizer and read by highlight evaluators through an `Rc`, so the
//! surface itself carries no interior mutability.

use crate::basics::{Bounds, CoverType};
use crate::color::Rgba8;

const BPP: usize = 4; // bytes per pixel

/// Offscreen pixel buffer holding the rendered label.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StencilSurface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl StencilSurface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * BPP],
        }
    }

    /// Create a transparent surface covering `bounds`.
    pub fn for_bounds(bounds: &Bounds) -> Self {
        let (w, h) = bounds.pixel_size();
        Self::new(w, h)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether this surface has exactly the pixel size of `bounds`.
    pub fn matches(&self, bounds: &Bounds) -> bool {
        bounds.pixel_size() == (self.width, self.height)
    }

    /// Resize to `width` × `height`. Contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(width as usize * height as usize * BPP, 0);
    }

    /// Fill every pixel with `c`.
    pub fn clear(&mut self, c: &Rgba8) {
        for px in self.data.chunks_exact_mut(BPP) {
            px.copy_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }

    /// Raw RGBA bytes, `width * height * 4` long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// One row of RGBA bytes.
    pub fn row_slice(&self, y: u32) -> &[u8] {
        assert!(
            y < self.height,
            "row {} out of bounds (height={})",
            y,
            self.height
        );
        let stride = self.width as usize * BPP;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    fn row_slice_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.width as usize * BPP;
        let start = y as usize * stride;
        &mut self.data[start..start + stride]
    }

    /// Pixel at `(x, y)`; transparent outside the surface.
    pub fn pixel(&self, x: i32, y: i32) -> Rgba8 {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return Rgba8::TRANSPARENT;
        }
        let off = (y as usize * self.width as usize + x as usize) * BPP;
        let p = &self.data[off..off + BPP];
        Rgba8 {
            r: p[0],
            g: p[1],
            b: p[2],
            a: p[3],
        }
    }

    #[inline]
    pub fn alpha(&self, x: i32, y: i32) -> u8 {
        self.pixel(x, y).a
    }

    /// Stamp a horizontal run of coverage values as ink of color `c`.
    ///
    /// The stencil is a mask, not a picture: where two glyph parts overlap
    /// the alpha is the maximum of the existing and the new coverage rather
    /// than an over-composite, so repeated ink never exceeds full coverage.
    /// Pixels outside the surface are ignored.
    pub fn blend_ink_hspan(&mut self, x: i32, y: i32, c: &Rgba8, covers: &[CoverType]) {
        if y < 0 || y as u32 >= self.height {
            return;
        }
        let width = self.width as i32;
        let row = self.row_slice_mut(y as u32);
        for (i, &cov) in covers.iter().enumerate() {
            let px = x + i as i32;
            if px < 0 || px >= width || cov == 0 {
                continue;
            }
            let off = px as usize * BPP;
            let alpha = ((c.a as u32 * cov as u32 + 127) / 255) as u8;
            if alpha > row[off + 3] {
                row[off] = c.r;
                row[off + 1] = c.g;
                row[off + 2] = c.b;
                row[off + 3] = alpha;
            }
        }
    }

    /// Sum of the alpha channel over the half-open pixel box
    /// `[x1, x2) × [y1, y2)`, clipped to the surface.
    pub fn alpha_sum(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> u64 {
        let cx1 = x1.max(0);
        let cy1 = y1.max(0);
        let cx2 = x2.min(self.width as i32);
        let cy2 = y2.min(self.height as i32);
        if cx1 >= cx2 || cy1 >= cy2 {
            return 0;
        }
        let mut sum = 0u64;
        for y in cy1..cy2 {
            let row = self.row_slice(y as u32);
            sum += row[cx1 as usize * BPP..cx2 as usize * BPP]
                .chunks_exact(BPP)
                .map(|p| p[3] as u64)
                .sum::<u64>();
        }
        sum
    }

    /// Bounding box `(x1, y1, x2, y2)` (exclusive far edge) of all pixels
    /// with non-zero alpha inside the given columns, or `None` if blank.
    #[cfg(test)]
    pub fn ink_bounds_in_columns(&self, x1: u32, x2: u32) -> Option<(u32, u32, u32, u32)> {
        let x2 = x2.min(self.width);
        let mut found: Option<(u32, u32, u32, u32)> = None;
        for y in 0..self.height {
            let row = self.row_slice(y);
            for x in x1..x2 {
                if row[x as usize * BPP + 3] != 0 {
                    found = Some(match found {
                        None => (x, y, x + 1, y + 1),
                        Some((a, b, c, d)) => (a.min(x), b.min(y), c.max(x + 1), d.max(y + 1)),
                    });
                }
            }
        }
        found
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_transparent() {
        let s = StencilSurface::new(4, 3);
        assert_eq!(s.as_bytes().len(), 4 * 3 * 4);
        assert!(s.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_for_bounds_matches() {
        let b = Bounds::new(199.5, 150.0);
        let s = StencilSurface::for_bounds(&b);
        assert_eq!((s.width(), s.height()), (200, 150));
        assert!(s.matches(&b));
        assert!(!s.matches(&Bounds::new(201.0, 150.0)));
    }

    #[test]
    fn test_blend_ink_hspan_takes_max_alpha() {
        let mut s = StencilSurface::new(4, 1);
        s.blend_ink_hspan(0, 0, &Rgba8::WHITE, &[255, 128, 0, 64]);
        s.blend_ink_hspan(1, 0, &Rgba8::WHITE, &[64, 200]);
        assert_eq!(s.alpha(0, 0), 255);
        assert_eq!(s.alpha(1, 0), 128);
        assert_eq!(s.alpha(2, 0), 200);
        assert_eq!(s.alpha(3, 0), 64);
    }

    #[test]
    fn test_blend_ink_hspan_clips() {
        let mut s = StencilSurface::new(2, 2);
        s.blend_ink_hspan(-1, 0, &Rgba8::WHITE, &[255, 255, 255, 255]);
        s.blend_ink_hspan(0, 5, &Rgba8::WHITE, &[255]);
        assert_eq!(s.alpha(0, 0), 255);
        assert_eq!(s.alpha(1, 0), 255);
        assert_eq!(s.alpha(0, 1), 0);
    }

    #[test]
    fn test_alpha_sum_clipped() {
        let mut s = StencilSurface::new(3, 3);
        s.clear(&Rgba8::WHITE);
        assert_eq!(s.alpha_sum(0, 0, 3, 3), 9 * 255);
        assert_eq!(s.alpha_sum(-5, -5, 1, 1), 255);
        assert_eq!(s.alpha_sum(2, 2, 2, 9), 0);
    }

    #[test]
    fn test_pixel_outside_is_transparent() {
        let mut s = StencilSurface::new(1, 1);
        s.clear(&Rgba8::WHITE);
        assert_eq!(s.pixel(1, 0), Rgba8::TRANSPARENT);
        assert_eq!(s.pixel(0, -1), Rgba8::TRANSPARENT);
    }

    #[test]
    fn test_resize_discards() {
        let mut s = StencilSurface::new(2, 2);
        s.clear(&Rgba8::WHITE);
        s.resize(3, 1);
        assert_eq!(s.as_bytes().len(), 12);
        assert_eq!(s.alpha_sum(0, 0, 3, 1), 0);
    }

    #[test]
    fn test_ink_bounds_in_columns() {
        let mut s = StencilSurface::new(5, 4);
        s.blend_ink_hspan(1, 1, &Rgba8::WHITE, &[10, 10]);
        s.blend_ink_hspan(4, 3, &Rgba8::WHITE, &[10]);
        assert_eq!(s.ink_bounds_in_columns(0, 3), Some((1, 1, 3, 2)));
        assert_eq!(s.ink_bounds_in_columns(0, 5), Some((1, 1, 5, 4)));
        assert_eq!(s.ink_bounds_in_columns(3, 4), None);
    }
}

//! TrueType glyph source using `ttf-parser`.
//!
//! Loads a TTF/OTF face from raw bytes (the host fetches the sans-serif it
//! wants the label drawn in) and extracts glyph outlines scaled to pixels,
//! flipped so y grows downward.

use super::{Glyph, GlyphSource};
use crate::error::{Error, Result};
use crate::path::Outline;

/// Advance used for characters the face has no mapping for, in ems.
const MISSING_ADVANCE_EM: f64 = 0.5;

/// TrueType/OpenType glyph source.
pub struct TrueTypeFont {
    /// Owned font data bytes.
    face_data: Vec<u8>,
    /// Font face index (for font collections).
    face_index: u32,
    name: String,
}

impl TrueTypeFont {
    /// Create a glyph source from raw TTF/OTF data.
    ///
    /// `face_index` selects the face in a font collection (use 0 for single fonts).
    pub fn from_data(data: Vec<u8>, face_index: u32) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, face_index)
            .map_err(|e| Error::Font(format!("{:?}", e)))?;
        let name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::FULL_NAME && n.is_unicode())
            .and_then(|n| n.to_string())
            .unwrap_or_else(|| "truetype".to_string());
        log::debug!("loaded font face {:?} ({} bytes)", name, data.len());
        Ok(Self {
            face_data: data,
            face_index,
            name,
        })
    }
}

impl GlyphSource for TrueTypeFont {
    fn glyph(&self, ch: char, size: f64) -> Glyph {
        let missing = Glyph {
            outline: Outline::new(),
            advance: size * MISSING_ADVANCE_EM,
        };
        let Ok(face) = ttf_parser::Face::parse(&self.face_data, self.face_index) else {
            return missing;
        };
        let Some(glyph_id) = face.glyph_index(ch) else {
            return missing;
        };
        let scale = size / face.units_per_em() as f64;
        let advance = face
            .glyph_hor_advance(glyph_id)
            .map(|a| a as f64 * scale)
            .unwrap_or(0.0);
        let mut collector = OutlineCollector {
            outline: Outline::new(),
            scale,
        };
        // Glyphs without contours (space, tab) still advance.
        face.outline_glyph(glyph_id, &mut collector);
        Glyph {
            outline: collector.outline,
            advance,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// OutlineCollector: implements ttf_parser::OutlineBuilder
// ============================================================================

/// Collects glyph outline commands into an [`Outline`] in pixel space.
struct OutlineCollector {
    outline: Outline,
    scale: f64,
}

impl OutlineCollector {
    #[inline]
    fn sx(&self, v: f32) -> f64 {
        v as f64 * self.scale
    }

    #[inline]
    fn sy(&self, v: f32) -> f64 {
        -(v as f64 * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for OutlineCollector {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.sx(x), self.sy(y));
        self.outline.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.sx(x), self.sy(y));
        self.outline.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (cx, cy) = (self.sx(x1), self.sy(y1));
        let (x, y) = (self.sx(x), self.sy(y));
        self.outline.quad_to(cx, cy, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (c1x, c1y) = (self.sx(x1), self.sy(y1));
        let (c2x, c2y) = (self.sx(x2), self.sy(y2));
        let (x, y) = (self.sx(x), self.sy(y));
        self.outline.curve_to(c1x, c1y, c2x, c2y, x, y);
    }

    // Contours are closed implicitly by the rasterizer.
    fn close(&mut self) {}
}

// ============================================================================
// Tests
// ============================================================================

//! Glyph sources and single-line text layout.
//!
//! A [`GlyphSource`] turns a character at a pixel size into an outline
//! positioned relative to the pen: origin on the baseline, x to the right,
//! y down (screen convention). [`layout_line`] strings glyphs together and
//! records where each one landed, which the stencil uses both to fill the
//! label and to report glyph ink boxes.

mod block;
#[cfg(feature = "font")]
mod truetype;

pub use block::BlockFont;
#[cfg(feature = "font")]
pub use truetype::TrueTypeFont;

use crate::basics::Rect;
use crate::path::Outline;

/// Outline and advance of one character at one size.
#[derive(Debug, Clone, Default)]
pub struct Glyph {
    /// Contours relative to the pen position on the baseline.
    pub outline: Outline,
    /// Horizontal pen advance in pixels.
    pub advance: f64,
}

/// Anything that can produce glyph outlines.
pub trait GlyphSource {
    /// Outline and advance of `ch` at an em size of `size` pixels.
    fn glyph(&self, ch: char, size: f64) -> Glyph;

    /// Short human-readable name for logs.
    fn name(&self) -> &str;
}

/// A glyph placed on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedGlyph {
    pub ch: char,
    /// Pen x position before this glyph.
    pub x: f64,
    pub advance: f64,
    /// Bounding box of the glyph's ink, if it has any.
    pub ink: Option<Rect>,
}

/// One laid-out line of text.
#[derive(Debug, Clone, Default)]
pub struct LineLayout {
    pub glyphs: Vec<PlacedGlyph>,
    /// All glyph contours, already positioned.
    pub outline: Outline,
    /// Total advance of the line.
    pub width: f64,
}

/// Lay out `text` left-anchored at `x` on the baseline `baseline`.
pub fn layout_line(
    source: &dyn GlyphSource,
    text: &str,
    size: f64,
    x: f64,
    baseline: f64,
) -> LineLayout {
    let mut line = LineLayout::default();
    let mut pen = x;
    for ch in text.chars() {
        let glyph = source.glyph(ch, size);
        let ink = glyph.outline.bounding_rect().map(|(x1, y1, x2, y2)| {
            Rect::from_corners(x1 + pen, y1 + baseline, x2 + pen, y2 + baseline)
        });
        line.outline.append_translated(&glyph.outline, pen, baseline);
        line.glyphs.push(PlacedGlyph {
            ch,
            x: pen,
            advance: glyph.advance,
            ink,
        });
        pen += glyph.advance;
    }
    line.width = pen - x;
    line
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_line_advances_pen() {
        let font = BlockFont::new();
        let line = layout_line(&font, "AB", 100.0, 10.0, 125.0);
        assert_eq!(line.glyphs.len(), 2);
        assert_eq!(line.glyphs[0].x, 10.0);
        assert_eq!(line.glyphs[1].x, 70.0);
        assert_eq!(line.width, 120.0);
    }

    #[test]
    fn test_layout_line_ink_boxes() {
        let font = BlockFont::new();
        let line = layout_line(&font, "A B", 100.0, 0.0, 125.0);
        assert_eq!(line.glyphs[0].ink, Some(Rect::new(0.0, 55.0, 50.0, 70.0)));
        assert_eq!(line.glyphs[1].ink, None);
        assert!(line.glyphs[2].ink.is_some());
    }

    #[test]
    fn test_layout_empty_line() {
        let font = BlockFont::new();
        let line = layout_line(&font, "", 100.0, 0.0, 0.0);
        assert!(line.glyphs.is_empty());
        assert!(line.outline.is_empty());
        assert_eq!(line.width, 0.0);
    }
}

//! Stencil rasterizer: draws the label into the offscreen surface.
//!
//! The label text is split on spaces into lines. Each line is drawn
//! left-anchored at `offset_x`; the stack of lines, each `font_size_px`
//! tall, is centered vertically in the container and `offset_y` places the
//! baseline inside each line box:
//!
//! ```text
//! baseline(i) = (height - lines * size) / 2 + offset_y + i * size
//! ```
//!
//! With `offset_y == size` the block sits exactly centered.

use serde::{Deserialize, Serialize};

use crate::basics::{Bounds, Rect};
use crate::color::Rgba8;
use crate::font::{layout_line, BlockFont, GlyphSource, LineLayout};
use crate::rasterizer::CoverageRasterizer;
use crate::surface::StencilSurface;

/// Parameters of one stencil pass. Replaced wholesale on every edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelConfig {
    /// Label text; spaces separate lines.
    pub text: String,
    pub font_size_px: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Coverage ratio a character must exceed to be highlighted, in `[0, 1]`.
    pub highlight_threshold: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            text: "SOURCE CODE".to_string(),
            font_size_px: 110.0,
            offset_x: 30.0,
            offset_y: 60.0,
            highlight_threshold: 0.4,
        }
    }
}

impl LabelConfig {
    /// Defaults for narrow (phone-sized) containers.
    pub fn compact() -> Self {
        Self {
            font_size_px: 70.0,
            offset_x: 20.0,
            offset_y: 50.0,
            ..Self::default()
        }
    }

    /// Label lines, split on every space. Consecutive spaces give empty
    /// lines, which take up room but draw nothing.
    pub fn lines(&self) -> Vec<&str> {
        self.text.split(' ').collect()
    }

    /// Font size usable for drawing: non-finite or negative sizes draw nothing.
    pub fn effective_font_size(&self) -> f64 {
        if self.font_size_px.is_finite() && self.font_size_px > 0.0 {
            self.font_size_px
        } else {
            0.0
        }
    }

    /// Threshold clamped into `[0, 1]`; NaN is treated as 1 (never highlight).
    pub fn effective_threshold(&self) -> f64 {
        if self.highlight_threshold.is_nan() {
            1.0
        } else {
            self.highlight_threshold.clamp(0.0, 1.0)
        }
    }

    /// Baseline of line `index` inside a container of height `height`.
    pub fn baseline(&self, index: usize, line_count: usize, height: f64) -> f64 {
        let size = self.effective_font_size();
        (height - line_count as f64 * size) / 2.0 + self.offset_y + index as f64 * size
    }
}

/// Where the last pass put its glyphs.
#[derive(Debug, Clone, Default)]
pub struct StencilLayout {
    pub lines: Vec<LineLayout>,
}

impl StencilLayout {
    /// Ink box of the `n`-th glyph counting across all lines.
    pub fn glyph_ink(&self, n: usize) -> Option<Rect> {
        self.lines
            .iter()
            .flat_map(|l| l.glyphs.iter())
            .nth(n)
            .and_then(|g| g.ink)
    }

    /// Box around all label ink, if any glyph has ink.
    pub fn ink_bounds(&self) -> Option<Rect> {
        self.lines
            .iter()
            .flat_map(|l| l.glyphs.iter())
            .filter_map(|g| g.ink)
            .reduce(|a, b| a.union(&b))
    }
}

/// Draws label text into a [`StencilSurface`].
pub struct StencilRasterizer {
    source: Box<dyn GlyphSource>,
    ras: CoverageRasterizer,
    ink: Rgba8,
}

impl Default for StencilRasterizer {
    fn default() -> Self {
        Self::new(Box::new(BlockFont::new()))
    }
}

impl StencilRasterizer {
    pub fn new(source: Box<dyn GlyphSource>) -> Self {
        Self {
            source,
            ras: CoverageRasterizer::new(0, 0),
            ink: Rgba8::WHITE,
        }
    }

    /// Replace the glyph source used by later passes.
    pub fn set_glyph_source(&mut self, source: Box<dyn GlyphSource>) {
        log::debug!("stencil glyph source: {}", source.name());
        self.source = source;
    }

    pub fn glyph_source(&self) -> &dyn GlyphSource {
        self.source.as_ref()
    }

    /// Clear `surface`, size it to `bounds`, and draw `config`'s label.
    ///
    /// Always runs to completion; empty text or a zero-size container
    /// leave a blank (possibly zero-size) surface.
    pub fn rasterize(
        &mut self,
        surface: &mut StencilSurface,
        bounds: &Bounds,
        config: &LabelConfig,
    ) -> StencilLayout {
        let (w, h) = bounds.pixel_size();
        if surface.width() != w || surface.height() != h {
            surface.resize(w, h);
        } else {
            surface.clear(&Rgba8::TRANSPARENT);
        }
        if self.ras.width() != w || self.ras.height() != h {
            self.ras.resize(w, h);
        } else {
            self.ras.reset();
        }

        let size = config.effective_font_size();
        let lines = config.lines();
        let mut layout = StencilLayout::default();
        for (i, text) in lines.iter().enumerate() {
            let baseline = config.baseline(i, lines.len(), h as f64);
            let line = layout_line(self.source.as_ref(), text, size, config.offset_x, baseline);
            self.ras.add_outline(&line.outline);
            layout.lines.push(line);
        }
        let rows = if surface.is_empty() {
            0
        } else {
            self.ras.render(surface, &self.ink)
        };
        log::debug!(
            "rasterized label {:?} at {}px into {}x{} ({} lines, {} inked rows)",
            config.text,
            size,
            w,
            h,
            lines.len(),
            rows
        );
        layout
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> (LabelConfig, Bounds) {
        let config = LabelConfig {
            text: "AB".to_string(),
            font_size_px: 100.0,
            offset_x: 0.0,
            offset_y: 100.0,
            highlight_threshold: 0.4,
        };
        (config, Bounds::new(200.0, 150.0))
    }

    #[test]
    fn test_surface_matches_bounds() {
        let (config, bounds) = scenario();
        let mut surface = StencilSurface::new(3, 3);
        StencilRasterizer::default().rasterize(&mut surface, &bounds, &config);
        assert!(surface.matches(&bounds));
    }

    #[test]
    fn test_single_line_is_centered() {
        let (config, bounds) = scenario();
        let mut surface = StencilSurface::default();
        let layout = StencilRasterizer::default().rasterize(&mut surface, &bounds, &config);
        // Baseline (150 - 100) / 2 + 100 = 125, cap height 70.
        assert_eq!(layout.glyph_ink(0), Some(Rect::new(0.0, 55.0, 50.0, 70.0)));
        assert_eq!(layout.glyph_ink(1), Some(Rect::new(60.0, 55.0, 50.0, 70.0)));
        assert_eq!(surface.ink_bounds_in_columns(0, 55), Some((0, 55, 50, 125)));
        assert_eq!(surface.alpha_sum(0, 55, 50, 125), 18 * 100 * 255);
    }

    #[test]
    fn test_lines_stack_downwards() {
        let config = LabelConfig {
            text: "A A".to_string(),
            font_size_px: 20.0,
            offset_x: 5.0,
            offset_y: 20.0,
            highlight_threshold: 0.4,
        };
        let mut surface = StencilSurface::default();
        let layout = StencilRasterizer::default().rasterize(
            &mut surface,
            &Bounds::new(100.0, 100.0),
            &config,
        );
        assert_eq!(layout.lines.len(), 2);
        // Stack top at (100 - 40) / 2 = 30; baselines 50 and 70.
        assert_eq!(layout.glyph_ink(0), Some(Rect::new(5.0, 36.0, 10.0, 14.0)));
        assert_eq!(layout.glyph_ink(1), Some(Rect::new(5.0, 56.0, 10.0, 14.0)));
        assert_eq!(layout.ink_bounds(), Some(Rect::new(5.0, 36.0, 10.0, 34.0)));
    }

    #[test]
    fn test_empty_text_is_blank() {
        let config = LabelConfig {
            text: String::new(),
            ..LabelConfig::default()
        };
        let mut surface = StencilSurface::default();
        let bounds = Bounds::new(64.0, 32.0);
        StencilRasterizer::default().rasterize(&mut surface, &bounds, &config);
        assert!(surface.matches(&bounds));
        assert_eq!(surface.alpha_sum(0, 0, 64, 32), 0);
    }

    #[test]
    fn test_rerasterize_is_idempotent() {
        let (config, bounds) = scenario();
        let mut ras = StencilRasterizer::default();
        let mut a = StencilSurface::default();
        let mut b = StencilSurface::default();
        ras.rasterize(&mut a, &bounds, &config);
        ras.rasterize(&mut b, &bounds, &config);
        assert_eq!(a, b);
        // Redrawing into a dirty surface clears it first.
        ras.rasterize(&mut a, &bounds, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_label_outside_container_is_clipped() {
        let config = LabelConfig {
            text: "WIDE".to_string(),
            font_size_px: 100.0,
            offset_x: -30.0,
            offset_y: 100.0,
            highlight_threshold: 0.4,
        };
        let mut surface = StencilSurface::default();
        StencilRasterizer::default().rasterize(&mut surface, &Bounds::new(120.0, 150.0), &config);
        assert!(surface.alpha_sum(0, 0, 120, 150) > 0);
    }

    #[test]
    fn test_zero_bounds_and_bad_size() {
        let mut surface = StencilSurface::default();
        let config = LabelConfig {
            font_size_px: f64::NAN,
            ..LabelConfig::default()
        };
        StencilRasterizer::default().rasterize(&mut surface, &Bounds::new(0.0, 0.0), &config);
        assert!(surface.is_empty());
        StencilRasterizer::default().rasterize(&mut surface, &Bounds::new(10.0, 10.0), &config);
        assert_eq!(surface.alpha_sum(0, 0, 10, 10), 0);
    }

    #[test]
    fn test_config_json_round_trip_uses_camel_case() {
        let json = r#"{"text":"HI","fontSizePx":70,"highlightThreshold":0.25}"#;
        let config: LabelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.text, "HI");
        assert_eq!(config.font_size_px, 70.0);
        assert_eq!(config.offset_x, 30.0);
        assert_eq!(config.highlight_threshold, 0.25);
    }

    #[test]
    fn test_effective_threshold() {
        let mut c = LabelConfig::default();
        c.highlight_threshold = 1.5;
        assert_eq!(c.effective_threshold(), 1.0);
        c.highlight_threshold = f64::NAN;
        assert_eq!(c.effective_threshold(), 1.0);
        c.highlight_threshold = -0.5;
        assert_eq!(c.effective_threshold(), 0.0);
    }
}

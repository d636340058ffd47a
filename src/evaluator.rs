//! Highlight evaluator: coverage test of a rectangle against the stencil.
//!
//! An evaluator pairs one generation of the stencil surface with the
//! threshold it was built for. It never observes later rasterizations: the
//! controller hands out a new evaluator every time the stencil is redrawn,
//! and decisions made with an older one are stale.

use std::rc::Rc;

use crate::basics::Rect;
use crate::surface::StencilSurface;

/// Snapshot of one stencil generation plus the highlight threshold.
#[derive(Debug, Clone, Default)]
pub struct HighlightEvaluator {
    generation: u64,
    surface: Option<Rc<StencilSurface>>,
    threshold: f64,
    disabled: bool,
}

impl HighlightEvaluator {
    pub fn new(generation: u64, surface: Rc<StencilSurface>, threshold: f64) -> Self {
        Self {
            generation,
            surface: Some(surface),
            threshold,
            disabled: false,
        }
    }

    /// An evaluator with no surface yet; it never highlights.
    pub fn unready(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    /// Same surface, but every query answers `false`.
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_ready(&self) -> bool {
        self.surface.is_some() && !self.disabled
    }

    pub fn surface(&self) -> Option<&StencilSurface> {
        self.surface.as_deref()
    }

    /// Average alpha over `rect` in `[0, 1]`.
    ///
    /// The rectangle is snapped outward to whole pixels; pixels outside the
    /// surface count as transparent. Degenerate input yields `0.0`.
    pub fn coverage(&self, rect: &Rect) -> f64 {
        let Some(surface) = self.surface.as_deref() else {
            return 0.0;
        };
        if !rect.is_valid() {
            return 0.0;
        }
        let (x1, y1, x2, y2) = rect.pixel_span();
        let pixels = (x2 as i64 - x1 as i64) * (y2 as i64 - y1 as i64);
        if pixels <= 0 {
            return 0.0;
        }
        let sum = surface.alpha_sum(x1, y1, x2, y2);
        sum as f64 / (pixels as f64 * 255.0)
    }

    /// Whether the coverage of `rect` exceeds the threshold.
    pub fn evaluate(&self, rect: &Rect) -> bool {
        if self.disabled {
            return false;
        }
        self.coverage(rect) > self.threshold
    }

    /// [`evaluate`](Self::evaluate) for a rectangle the layout may not have.
    pub fn evaluate_opt(&self, rect: Option<&Rect>) -> bool {
        rect.is_some_and(|r| self.evaluate(r))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba8;

    fn half_inked() -> Rc<StencilSurface> {
        // Left half opaque, right half transparent.
        let mut s = StencilSurface::new(10, 10);
        for y in 0..10 {
            s.blend_ink_hspan(0, y, &Rgba8::WHITE, &[255; 5]);
        }
        Rc::new(s)
    }

    #[test]
    fn test_coverage_ratio() {
        let ev = HighlightEvaluator::new(1, half_inked(), 0.4);
        assert_eq!(ev.coverage(&Rect::new(0.0, 0.0, 10.0, 10.0)), 0.5);
        assert_eq!(ev.coverage(&Rect::new(0.0, 0.0, 5.0, 5.0)), 1.0);
        assert_eq!(ev.coverage(&Rect::new(5.0, 0.0, 5.0, 10.0)), 0.0);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let ev = HighlightEvaluator::new(1, half_inked(), 0.5);
        assert!(!ev.evaluate(&Rect::new(0.0, 0.0, 10.0, 10.0)));
        let ev = HighlightEvaluator::new(1, half_inked(), 0.49);
        assert!(ev.evaluate(&Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_fully_inside_true_up_to_threshold_below_one() {
        let ev = HighlightEvaluator::new(1, half_inked(), 0.99);
        assert!(ev.evaluate(&Rect::new(1.0, 1.0, 3.0, 3.0)));
        let ev = HighlightEvaluator::new(1, half_inked(), 1.0);
        assert!(!ev.evaluate(&Rect::new(1.0, 1.0, 3.0, 3.0)));
    }

    #[test]
    fn test_fractional_rect_snaps_outward() {
        let ev = HighlightEvaluator::new(1, half_inked(), 0.0);
        // Covers columns 4 and 5 entirely after snapping.
        assert_eq!(ev.coverage(&Rect::new(4.5, 0.0, 1.0, 1.0)), 0.5);
    }

    #[test]
    fn test_outside_pixels_count_as_transparent() {
        let ev = HighlightEvaluator::new(1, half_inked(), 0.0);
        assert_eq!(ev.coverage(&Rect::new(-5.0, 0.0, 10.0, 1.0)), 0.5);
        assert_eq!(ev.coverage(&Rect::new(100.0, 100.0, 4.0, 4.0)), 0.0);
    }

    #[test]
    fn test_degenerate_inputs_are_false() {
        let ev = HighlightEvaluator::new(1, half_inked(), 0.0);
        assert!(!ev.evaluate_opt(None));
        assert!(!ev.evaluate(&Rect::new(0.0, 0.0, 0.0, 5.0)));
        assert!(!ev.evaluate(&Rect::new(0.0, 0.0, 5.0, -1.0)));
        assert!(!ev.evaluate(&Rect::new(f64::NAN, 0.0, 5.0, 5.0)));
        assert!(!ev.evaluate(&Rect::new(0.0, 0.0, f64::INFINITY, 5.0)));
    }

    #[test]
    fn test_unready_and_disabled_are_false() {
        let full = Rect::new(0.0, 0.0, 5.0, 5.0);
        let unready = HighlightEvaluator::unready(3);
        assert_eq!(unready.generation(), 3);
        assert!(!unready.is_ready());
        assert!(!unready.evaluate(&full));

        let disabled = HighlightEvaluator::new(4, half_inked(), 0.0).disabled();
        assert!(!disabled.is_ready());
        assert!(!disabled.evaluate(&full));
        assert_eq!(disabled.coverage(&full), 1.0);
    }

    #[test]
    fn test_evaluator_keeps_its_snapshot() {
        let surface = half_inked();
        let ev = HighlightEvaluator::new(1, Rc::clone(&surface), 0.4);
        let mut next = (*surface).clone();
        next.clear(&Rgba8::TRANSPARENT);
        drop(surface);
        // A newer surface does not leak into the old evaluator.
        assert!(ev.evaluate(&Rect::new(0.0, 0.0, 5.0, 5.0)));
        assert_eq!(next.alpha_sum(0, 0, 10, 10), 0);
    }
}

//! Polygon outlines with curve flattening.
//!
//! Glyph sources emit their shapes into an [`Outline`]: a list of closed
//! contours made of straight segments. Quadratic and cubic Bézier segments
//! are flattened on insertion, so the rasterizer only ever sees lines.

/// Maximum distance in pixels between a flattened curve and its chord
/// subdivision, used to pick the number of segments.
const FLATTEN_TOLERANCE: f64 = 0.25;
const MAX_CURVE_STEPS: usize = 64;

/// A set of closed polygon contours in pixel space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    contours: Vec<Vec<(f64, f64)>>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new contour at `(x, y)`, closing the current one.
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.contours.push(vec![(x, y)]);
    }

    /// Straight segment to `(x, y)`. Starts a contour if there is none.
    pub fn line_to(&mut self, x: f64, y: f64) {
        match self.contours.last_mut() {
            Some(c) => c.push((x, y)),
            None => self.move_to(x, y),
        }
    }

    /// Quadratic Bézier to `(x, y)` with control point `(cx, cy)`.
    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        let (x0, y0) = self.last_point();
        let steps = curve_steps(&[(x0, y0), (cx, cy), (x, y)]);
        for i in 1..=steps {
            let t = i as f64 / steps as f64;
            let mt = 1.0 - t;
            let px = mt * mt * x0 + 2.0 * mt * t * cx + t * t * x;
            let py = mt * mt * y0 + 2.0 * mt * t * cy + t * t * y;
            self.line_to(px, py);
        }
    }

    /// Cubic Bézier to `(x, y)` with control points `(c1x, c1y)`, `(c2x, c2y)`.
    pub fn curve_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        let (x0, y0) = self.last_point();
        let steps = curve_steps(&[(x0, y0), (c1x, c1y), (c2x, c2y), (x, y)]);
        for i in 1..=steps {
            let t = i as f64 / steps as f64;
            let mt = 1.0 - t;
            let a = mt * mt * mt;
            let b = 3.0 * mt * mt * t;
            let c = 3.0 * mt * t * t;
            let d = t * t * t;
            self.line_to(
                a * x0 + b * c1x + c * c2x + d * x,
                a * y0 + b * c1y + c * c2y + d * y,
            );
        }
    }

    /// Axis-aligned rectangle as its own clockwise contour.
    pub fn rect(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.move_to(x1, y1);
        self.line_to(x2, y1);
        self.line_to(x2, y2);
        self.line_to(x1, y2);
    }

    /// Append every contour of `other`, shifted by `(dx, dy)`.
    pub fn append_translated(&mut self, other: &Outline, dx: f64, dy: f64) {
        for c in &other.contours {
            self.contours
                .push(c.iter().map(|&(x, y)| (x + dx, y + dy)).collect());
        }
    }

    pub fn contours(&self) -> &[Vec<(f64, f64)>] {
        &self.contours
    }

    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(|c| c.len() < 3)
    }

    /// Bounding box `(x1, y1, x2, y2)` of all vertices.
    pub fn bounding_rect(&self) -> Option<(f64, f64, f64, f64)> {
        let mut pts = self.contours.iter().flatten();
        let &(x, y) = pts.next()?;
        Some(pts.fold((x, y, x, y), |(x1, y1, x2, y2), &(px, py)| {
            (x1.min(px), y1.min(py), x2.max(px), y2.max(py))
        }))
    }

    fn last_point(&self) -> (f64, f64) {
        self.contours
            .last()
            .and_then(|c| c.last().copied())
            .unwrap_or((0.0, 0.0))
    }
}

/// Number of line segments for a Bézier with the given control polygon.
fn curve_steps(ctrl: &[(f64, f64)]) -> usize {
    let len: f64 = ctrl
        .windows(2)
        .map(|w| ((w[1].0 - w[0].0).powi(2) + (w[1].1 - w[0].1).powi(2)).sqrt())
        .sum();
    let steps = (len / FLATTEN_TOLERANCE).sqrt().ceil();
    if steps.is_finite() {
        (steps as usize).clamp(1, MAX_CURVE_STEPS)
    } else {
        1
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contour() {
        let mut o = Outline::new();
        o.rect(1.0, 2.0, 3.0, 4.0);
        assert_eq!(o.contours().len(), 1);
        assert_eq!(o.contours()[0].len(), 4);
        assert_eq!(o.bounding_rect(), Some((1.0, 2.0, 3.0, 4.0)));
    }

    #[test]
    fn test_quad_ends_on_target() {
        let mut o = Outline::new();
        o.move_to(0.0, 0.0);
        o.quad_to(50.0, 100.0, 100.0, 0.0);
        let last = *o.contours()[0].last().unwrap();
        assert!((last.0 - 100.0).abs() < 1e-9);
        assert!(last.1.abs() < 1e-9);
        assert!(o.contours()[0].len() > 3);
        let (_, _, _, y2) = o.bounding_rect().unwrap();
        // Peak of the quadratic is half the control height.
        assert!((y2 - 50.0).abs() < 1.0);
    }

    #[test]
    fn test_cubic_step_count_is_bounded() {
        let mut o = Outline::new();
        o.move_to(0.0, 0.0);
        o.curve_to(1e6, 0.0, 0.0, 1e6, 1e6, 1e6);
        assert_eq!(o.contours()[0].len(), 1 + MAX_CURVE_STEPS);
    }

    #[test]
    fn test_append_translated() {
        let mut glyph = Outline::new();
        glyph.rect(0.0, 0.0, 1.0, 1.0);
        let mut line = Outline::new();
        line.append_translated(&glyph, 10.0, 20.0);
        assert_eq!(line.bounding_rect(), Some((10.0, 20.0, 11.0, 21.0)));
    }

    #[test]
    fn test_empty_outline() {
        let o = Outline::new();
        assert!(o.is_empty());
        assert_eq!(o.bounding_rect(), None);
    }
}

//! Character grid: per-character highlight decisions over laid-out text.
//!
//! The displayed text is split into grapheme clusters, one independently
//! stylable cell each. A highlight pass asks the layout boundary for every
//! cell's current rectangle and the evaluator whether that rectangle sits on
//! the stencil. Nothing is cached between passes: rectangles are re-measured
//! and decisions recomputed each time.

use unicode_segmentation::UnicodeSegmentation;

use crate::basics::Rect;
use crate::evaluator::HighlightEvaluator;

/// One grapheme of the displayed text.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterCell {
    pub index: usize,
    pub source_char: String,
    /// Rectangle measured during the last pass, if the layout had one.
    pub screen_rect: Option<Rect>,
}

/// The host's text-layout engine.
///
/// Rectangles are in the coordinate space of the text container (origin at
/// its top-left corner), the same space the stencil surface uses.
pub trait LayoutProbe {
    /// Current rectangle of cell `index`, or `None` if it is not laid out.
    fn measure_rect(&self, index: usize) -> Option<Rect>;
}

impl<F> LayoutProbe for F
where
    F: Fn(usize) -> Option<Rect>,
{
    fn measure_rect(&self, index: usize) -> Option<Rect> {
        self(index)
    }
}

/// Fixed-pitch layout: cells of `cell_width` × `line_height` flowing left
/// to right and wrapping at `container_width`, breaking anywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceLayout {
    pub cell_width: f64,
    pub line_height: f64,
    pub container_width: f64,
    pub len: usize,
}

impl MonospaceLayout {
    pub fn new(cell_width: f64, line_height: f64, container_width: f64, len: usize) -> Self {
        Self {
            cell_width,
            line_height,
            container_width,
            len,
        }
    }

    /// Cells per row; at least one so narrow containers still lay out.
    pub fn columns(&self) -> usize {
        if self.cell_width <= 0.0 || !self.cell_width.is_finite() {
            return 1;
        }
        ((self.container_width / self.cell_width).floor() as usize).max(1)
    }

    pub fn rows(&self) -> usize {
        let cols = self.columns();
        (self.len + cols - 1) / cols
    }

    /// Height of the laid-out block.
    pub fn height(&self) -> f64 {
        self.rows() as f64 * self.line_height
    }
}

impl LayoutProbe for MonospaceLayout {
    fn measure_rect(&self, index: usize) -> Option<Rect> {
        if index >= self.len {
            return None;
        }
        let cols = self.columns();
        Some(Rect::new(
            (index % cols) as f64 * self.cell_width,
            (index / cols) as f64 * self.line_height,
            self.cell_width,
            self.line_height,
        ))
    }
}

/// Highlight decisions for one evaluator generation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HighlightPass {
    generation: u64,
    highlighted: Vec<bool>,
}

impl HighlightPass {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this pass was computed against generation `current`.
    pub fn is_current(&self, current: u64) -> bool {
        self.generation == current
    }

    pub fn is_highlighted(&self, index: usize) -> bool {
        self.highlighted.get(index).copied().unwrap_or(false)
    }

    pub fn flags(&self) -> &[bool] {
        &self.highlighted
    }

    pub fn count(&self) -> usize {
        self.highlighted.iter().filter(|&&h| h).count()
    }
}

/// The displayed text split into stylable cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CharacterGrid {
    cells: Vec<CharacterCell>,
}

impl CharacterGrid {
    pub fn new(text: &str) -> Self {
        let cells = text
            .graphemes(true)
            .enumerate()
            .map(|(index, g)| CharacterCell {
                index,
                source_char: g.to_string(),
                screen_rect: None,
            })
            .collect();
        Self { cells }
    }

    pub fn cells(&self) -> &[CharacterCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Re-measure every cell and decide its highlight with `evaluator`.
    pub fn highlight(
        &mut self,
        evaluator: &HighlightEvaluator,
        layout: &dyn LayoutProbe,
    ) -> HighlightPass {
        let mut highlighted = Vec::with_capacity(self.cells.len());
        for cell in &mut self.cells {
            cell.screen_rect = layout.measure_rect(cell.index);
            highlighted.push(evaluator.evaluate_opt(cell.screen_rect.as_ref()));
        }
        let pass = HighlightPass {
            generation: evaluator.generation(),
            highlighted,
        };
        log::trace!(
            "highlight pass gen {}: {}/{} cells",
            pass.generation,
            pass.count(),
            self.cells.len()
        );
        pass
    }
}

// ============================================================================
// Tests
// ============================================================================

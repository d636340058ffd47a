//! Label widget controller.
//!
//! Funnels every invalidation into one path: bump the generation, redraw the
//! stencil, and hand out a fresh evaluator. Container resizes go through a
//! 500 ms debounce; label parameter edits take effect at once. Edits that do
//! not touch the stencil (displayed text, colors) never redraw it.

use std::rc::Rc;
use std::time::Duration;

use crate::basics::Bounds;
use crate::evaluator::HighlightEvaluator;
use crate::font::GlyphSource;
use crate::grid::{CharacterGrid, HighlightPass, LayoutProbe};
use crate::panel::{ControlPanel, ParamChange};
use crate::stencil::{LabelConfig, StencilLayout, StencilRasterizer};
use crate::surface::StencilSurface;
use crate::timer::{Debouncer, RESIZE_DEBOUNCE};

pub struct LabelController {
    config: LabelConfig,
    bounds: Bounds,
    generation: u64,
    surface: Rc<StencilSurface>,
    rasterizer: StencilRasterizer,
    layout: StencilLayout,
    evaluator: HighlightEvaluator,
    resize: Debouncer<Bounds>,
    grid: CharacterGrid,
    disabled: bool,
    rasterize_count: u64,
}

impl LabelController {
    /// Build the widget and draw the first stencil right away.
    pub fn new(config: LabelConfig, bounds: Bounds, text: &str) -> Self {
        let mut c = Self {
            config,
            bounds,
            generation: 0,
            surface: Rc::new(StencilSurface::for_bounds(&bounds)),
            rasterizer: StencilRasterizer::default(),
            layout: StencilLayout::default(),
            evaluator: HighlightEvaluator::unready(0),
            resize: Debouncer::new(RESIZE_DEBOUNCE),
            grid: CharacterGrid::new(text),
            disabled: false,
            rasterize_count: 0,
        };
        c.invalidate();
        c
    }

    /// Controller configured from a panel's current values.
    pub fn from_panel(panel: &ControlPanel, bounds: Bounds) -> Self {
        let mut c = Self::new(panel.label_config(), bounds, panel.displayed_text());
        c.set_disabled(panel.for_console());
        c
    }

    // ------------------------------------------------------------------------
    // Invalidation
    // ------------------------------------------------------------------------

    /// Record a container resize. Nothing is redrawn until the container has
    /// kept still for the debounce window; see [`tick`](Self::tick).
    pub fn on_resize(&mut self, bounds: Bounds, now: Duration) {
        self.resize.trigger(bounds, now);
    }

    /// Advance the clock. Applies a settled resize and returns whether it
    /// redrew the stencil.
    pub fn tick(&mut self, now: Duration) -> bool {
        match self.resize.poll(now) {
            Some(bounds) => {
                log::debug!("resize settled at {}x{}", bounds.width, bounds.height);
                self.bounds = bounds;
                self.invalidate();
                true
            }
            None => false,
        }
    }

    /// When the host should call [`tick`](Self::tick) next.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.resize.next_deadline()
    }

    pub fn has_pending_resize(&self) -> bool {
        self.resize.is_pending()
    }

    /// Replace the label parameters. Redraws immediately when they differ.
    pub fn set_config(&mut self, config: LabelConfig) -> bool {
        if config == self.config {
            return false;
        }
        self.config = config;
        self.invalidate();
        true
    }

    /// Replace the displayed text. The stencil stays, but the generation
    /// moves on so passes over the old cells read as stale.
    pub fn set_text(&mut self, text: &str) {
        self.grid = CharacterGrid::new(text);
        self.reissue();
        log::debug!("generation {}: {} cells", self.generation, self.grid.len());
    }

    /// Turn highlighting off (console mode) or back on. Issues a new
    /// evaluator over the current stencil without redrawing it.
    pub fn set_disabled(&mut self, disabled: bool) -> bool {
        if disabled == self.disabled {
            return false;
        }
        self.disabled = disabled;
        self.reissue();
        log::debug!(
            "generation {}: highlighting {}",
            self.generation,
            if disabled { "off" } else { "on" }
        );
        true
    }

    /// Route a panel edit to the matching invalidation path.
    pub fn apply_panel(&mut self, panel: &ControlPanel, change: ParamChange) {
        match change {
            ParamChange::Label => {
                self.set_config(panel.label_config());
                self.set_disabled(panel.for_console());
            }
            ParamChange::Text => self.set_text(panel.displayed_text()),
            ParamChange::Display => {}
        }
    }

    pub fn set_glyph_source(&mut self, source: Box<dyn GlyphSource>) {
        self.rasterizer.set_glyph_source(source);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        // Release our handle on the old surface before writing. Evaluators
        // still held elsewhere keep the previous generation intact.
        self.evaluator = HighlightEvaluator::unready(self.generation);
        if Rc::strong_count(&self.surface) > 1 || Rc::weak_count(&self.surface) > 0 {
            self.surface = Rc::new(StencilSurface::default());
        }
        let surface = Rc::make_mut(&mut self.surface);
        self.layout = self
            .rasterizer
            .rasterize(surface, &self.bounds, &self.config);
        self.rasterize_count += 1;
        self.evaluator = self.build_evaluator();
        log::debug!(
            "generation {}: stencil {}x{}",
            self.generation,
            self.surface.width(),
            self.surface.height()
        );
    }

    /// New generation over the current stencil, without redrawing it.
    fn reissue(&mut self) {
        self.generation += 1;
        self.evaluator = self.build_evaluator();
    }

    fn build_evaluator(&self) -> HighlightEvaluator {
        let ev = HighlightEvaluator::new(
            self.generation,
            Rc::clone(&self.surface),
            self.config.effective_threshold(),
        );
        if self.disabled {
            ev.disabled()
        } else {
            ev
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Decide every cell's highlight against the current evaluator.
    pub fn highlight(&mut self, layout: &dyn LayoutProbe) -> HighlightPass {
        self.grid.highlight(&self.evaluator, layout)
    }

    pub fn evaluator(&self) -> &HighlightEvaluator {
        &self.evaluator
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn surface(&self) -> &StencilSurface {
        &self.surface
    }

    pub fn stencil_layout(&self) -> &StencilLayout {
        &self.layout
    }

    pub fn grid(&self) -> &CharacterGrid {
        &self.grid
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Number of stencil redraws so far.
    pub fn rasterize_count(&self) -> u64 {
        self.rasterize_count
    }
}

// ============================================================================
// Tests
// ============================================================================

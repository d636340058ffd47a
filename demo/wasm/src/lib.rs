use js_sys::Float64Array;
use label_stencil::font::TrueTypeFont;
use label_stencil::{
    Bounds, ControlPanel, ControlValue, HighlightPass, LabelController, LayoutProbe, Rect,
};
use std::time::Duration;
use wasm_bindgen::prelude::*;

mod console;

/// Route `log` records to the browser console.
///
/// `level` is one of "error", "warn", "info", "debug", "trace"; anything
/// else turns logging off.
#[wasm_bindgen]
pub fn init_logging(level: &str) {
    let filter = level.parse().unwrap_or(log::LevelFilter::Off);
    console::init(filter);
}

/// Get the library version string.
#[wasm_bindgen]
pub fn version() -> String {
    concat!("label-stencil ", env!("CARGO_PKG_VERSION")).to_string()
}

fn millis(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::from_secs_f64(ms / 1000.0)
    } else {
        Duration::ZERO
    }
}

fn control_value(value: &JsValue) -> Option<ControlValue> {
    if let Some(b) = value.as_bool() {
        Some(ControlValue::Bool(b))
    } else if let Some(n) = value.as_f64() {
        Some(ControlValue::Number(n))
    } else {
        value.as_string().map(ControlValue::Text)
    }
}

/// Character rectangles measured by the page, `x, y, w, h` per character
/// in page coordinates. NaN marks a character with no box.
struct MeasuredRects<'a> {
    rects: &'a [f64],
    origin: (f64, f64),
}

impl LayoutProbe for MeasuredRects<'_> {
    fn measure_rect(&self, index: usize) -> Option<Rect> {
        let r = self.rects.get(index * 4..index * 4 + 4)?;
        let rect = Rect::new(r[0], r[1], r[2], r[3]).relative_to(self.origin.0, self.origin.1);
        rect.is_valid().then_some(rect)
    }
}

// ============================================================================
// LabelWidget
// ============================================================================

/// The source-code label generator.
///
/// The page owns the DOM: it renders the control panel from
/// [`panel_json`](Self::panel_json), lays out the characters, and styles the
/// ones [`highlight`](Self::highlight) flags.
#[wasm_bindgen]
pub struct LabelWidget {
    panel: ControlPanel,
    controller: LabelController,
    last_pass: HighlightPass,
}

#[wasm_bindgen]
impl LabelWidget {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, compact: bool) -> LabelWidget {
        let panel = ControlPanel::label_generator(compact);
        let controller = LabelController::from_panel(&panel, Bounds::new(width, height));
        LabelWidget {
            panel,
            controller,
            last_pass: HighlightPass::default(),
        }
    }

    /// Draw the label with a TrueType face instead of the block font.
    pub fn load_font(&mut self, data: Vec<u8>) -> Result<(), JsError> {
        let font = TrueTypeFont::from_data(data, 0)?;
        self.controller.set_glyph_source(Box::new(font));
        Ok(())
    }

    /// Control panel schema and current values as JSON.
    pub fn panel_json(&self) -> String {
        self.panel.to_json()
    }

    /// Apply a control edit. Returns the invalidation class: "label",
    /// "text" or "display".
    pub fn set_control(&mut self, name: &str, value: JsValue) -> Result<String, JsError> {
        let value = control_value(&value)
            .ok_or_else(|| JsError::new(&format!("unsupported value for {:?}", name)))?;
        let change = self.panel.set(name, value)?;
        self.controller.apply_panel(&self.panel, change);
        Ok(serde_json::to_string(&change)
            .unwrap_or_default()
            .trim_matches('"')
            .to_string())
    }

    /// Text the page should lay out.
    pub fn text(&self) -> String {
        self.panel.displayed_text().to_string()
    }

    /// Theme colors as JSON (`background`, `text`, `highlight`).
    pub fn theme_json(&self) -> String {
        serde_json::to_string(&self.panel.theme()).unwrap_or_default()
    }

    pub fn show_canvas(&self) -> bool {
        self.panel.show_surface()
    }

    /// Number of characters (grapheme clusters) the page must lay out.
    pub fn char_count(&self) -> usize {
        self.controller.grid().len()
    }

    /// The characters, in order, joined by NUL so the page can split them.
    pub fn chars(&self) -> String {
        self.controller
            .grid()
            .cells()
            .iter()
            .map(|c| c.source_char.as_str())
            .collect::<Vec<_>>()
            .join("\0")
    }

    /// Container resized; `now_ms` is the page clock (`performance.now()`).
    pub fn resize(&mut self, width: f64, height: f64, now_ms: f64) {
        self.controller
            .on_resize(Bounds::new(width, height), millis(now_ms));
    }

    /// Advance the clock. Returns true when a settled resize redrew the
    /// stencil and the page should measure and highlight again.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.controller.tick(millis(now_ms))
    }

    /// Milliseconds until the next `tick` is due, or -1 when idle.
    pub fn next_tick_ms(&self, now_ms: f64) -> f64 {
        match self.controller.next_deadline() {
            Some(d) => (d.as_secs_f64() * 1000.0 - now_ms).max(0.0),
            None => -1.0,
        }
    }

    pub fn generation(&self) -> f64 {
        self.controller.generation() as f64
    }

    /// Highlight flags (1 or 0 per character) for the measured rectangles.
    /// `origin_x`/`origin_y` is the text container's page position.
    pub fn highlight(&mut self, rects: &Float64Array, origin_x: f64, origin_y: f64) -> Vec<u8> {
        self.highlight_rects(&rects.to_vec(), origin_x, origin_y)
    }

    /// Whether the last highlight pass still matches the current stencil.
    pub fn highlight_is_current(&self) -> bool {
        self.last_pass.is_current(self.controller.generation())
    }

    pub fn stencil_width(&self) -> u32 {
        self.controller.surface().width()
    }

    pub fn stencil_height(&self) -> u32 {
        self.controller.surface().height()
    }

    /// Stencil pixels (RGBA) for the debug canvas.
    pub fn stencil_rgba(&self) -> Vec<u8> {
        self.controller.surface().as_bytes().to_vec()
    }
}

// ============================================================================
// SliderDemo
// ============================================================================

/// A single stepped slider with a note and a link.
#[wasm_bindgen]
pub struct SliderDemo {
    panel: ControlPanel,
}

#[wasm_bindgen]
impl SliderDemo {
    #[wasm_bindgen(constructor)]
    pub fn new() -> SliderDemo {
        SliderDemo {
            panel: ControlPanel::slider_demo(),
        }
    }

    pub fn panel_json(&self) -> String {
        self.panel.to_json()
    }

    /// Set the slider; returns the stored (clamped and snapped) value.
    pub fn set_param(&mut self, value: f64) -> Result<f64, JsError> {
        self.panel.set("param", ControlValue::Number(value))?;
        Ok(self.param())
    }

    pub fn param(&self) -> f64 {
        self.panel.number("param").unwrap_or(0.0)
    }

    /// Current value with one decimal, as the slider displays it.
    pub fn display_value(&self) -> String {
        format!("{:.1}", self.param())
    }
}

impl LabelWidget {
    fn highlight_rects(&mut self, rects: &[f64], origin_x: f64, origin_y: f64) -> Vec<u8> {
        let probe = MeasuredRects {
            rects,
            origin: (origin_x, origin_y),
        };
        self.last_pass = self.controller.highlight(&probe);
        self.last_pass.flags().iter().map(|&h| h as u8).collect()
    }
}

impl Default for SliderDemo {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measured_rects() {
        let flat = [100.0, 50.0, 10.0, 20.0, f64::NAN, 0.0, 10.0, 20.0];
        let probe = MeasuredRects {
            rects: &flat,
            origin: (100.0, 40.0),
        };
        assert_eq!(probe.measure_rect(0), Some(Rect::new(0.0, 10.0, 10.0, 20.0)));
        assert_eq!(probe.measure_rect(1), None);
        assert_eq!(probe.measure_rect(2), None);
    }

    #[test]
    fn test_millis() {
        assert_eq!(millis(1500.0), Duration::from_millis(1500));
        assert_eq!(millis(-3.0), Duration::ZERO);
        assert_eq!(millis(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn test_slider_demo() {
        let mut demo = SliderDemo::new();
        assert_eq!(demo.display_value(), "10.0");
        demo.panel.set("param", ControlValue::Number(250.0)).unwrap();
        assert_eq!(demo.param(), 100.0);
    }

    #[test]
    fn test_widget_highlight_and_resize() {
        let mut w = LabelWidget::new(400.0, 300.0, true);
        assert_eq!(w.char_count(), 7);
        assert_eq!(w.stencil_width(), 400);
        let rects: Vec<f64> = (0..7)
            .flat_map(|i| [i as f64 * 20.0, 0.0, 20.0, 20.0])
            .collect();
        assert_eq!(w.highlight_rects(&rects, 0.0, 0.0).len(), 7);
        assert!(w.highlight_is_current());

        w.resize(320.0, 200.0, 0.0);
        assert_eq!(w.next_tick_ms(100.0), 400.0);
        assert!(!w.tick(499.0));
        assert!(w.tick(500.0));
        assert_eq!(w.stencil_width(), 320);
        assert!(!w.highlight_is_current());
        assert_eq!(w.next_tick_ms(600.0), -1.0);
    }

    #[test]
    fn test_widget_text_change_stales_last_pass() {
        let mut w = LabelWidget::new(400.0, 300.0, true);
        let rects: Vec<f64> = (0..7)
            .flat_map(|i| [i as f64 * 20.0, 0.0, 20.0, 20.0])
            .collect();
        w.highlight_rects(&rects, 0.0, 0.0);
        assert!(w.highlight_is_current());

        let change = w.panel.set("text", "abcdefghij".into()).unwrap();
        w.controller.apply_panel(&w.panel, change);
        assert_eq!(w.char_count(), 10);
        assert!(!w.highlight_is_current());
    }
}

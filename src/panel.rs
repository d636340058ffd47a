//! Control panel: declarative, user-adjustable widget parameters.
//!
//! A panel is an ordered list of named controls. The host renders it from
//! its JSON form, sends edits back through [`ControlPanel::set`], and learns
//! from the returned [`ParamChange`] how much of the pipeline the edit
//! invalidates.
//!
//! Range controls behave like a stepped slider: input is clamped into
//! `[min, max]` and snapped to the nearest step.

use serde::{Deserialize, Serialize};

use crate::color::Rgba8;
use crate::error::{Error, Result};
use crate::stencil::LabelConfig;

// ============================================================================
// Controls
// ============================================================================

/// An action link shown as a button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

impl Link {
    pub fn new(label: &str, url: &str) -> Self {
        Self {
            label: label.to_string(),
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Control {
    Range {
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    },
    Text {
        value: String,
    },
    Color {
        value: Rgba8,
    },
    Toggle {
        value: bool,
    },
    /// Read-only text.
    Note {
        text: String,
    },
    Buttons {
        links: Vec<Link>,
    },
}

impl Control {
    /// A range control; `value` is normalized like any later input.
    pub fn range(value: f64, min: f64, max: f64, step: f64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Control::Range {
            value: snap_to_step(value, min, max, step),
            min,
            max,
            step,
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            Control::Range { .. } => "number",
            Control::Text { .. } => "string",
            Control::Color { .. } => "color",
            Control::Toggle { .. } => "boolean",
            Control::Note { .. } | Control::Buttons { .. } => "read-only",
        }
    }
}

/// Clamp `v` into `[min, max]` and snap it to the step grid anchored at
/// `min`. A non-positive step means continuous; NaN resolves to `min`.
pub fn snap_to_step(v: f64, min: f64, max: f64, step: f64) -> f64 {
    if v.is_nan() {
        return min;
    }
    let v = v.clamp(min, max);
    if step.is_nan() || step <= 0.0 || step.is_infinite() || max <= min {
        return v;
    }
    let num_steps = ((max - min) / step).round();
    let k = ((v - min) / step + 0.5).floor().min(num_steps);
    let snapped = (min + k * step).clamp(min, max);
    // Keep inputs already on the grid bit-exact.
    if (snapped - v).abs() <= step * 1e-9 {
        v
    } else {
        snapped
    }
}

/// Input for [`ControlPanel::set`], as it arrives from a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<f64> for ControlValue {
    fn from(v: f64) -> Self {
        ControlValue::Number(v)
    }
}

impl From<bool> for ControlValue {
    fn from(v: bool) -> Self {
        ControlValue::Bool(v)
    }
}

impl From<&str> for ControlValue {
    fn from(v: &str) -> Self {
        ControlValue::Text(v.to_string())
    }
}

/// How far an edit reaches into the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamChange {
    /// Label parameters: re-rasterize the stencil now.
    Label,
    /// The displayed text: re-run the highlight pass.
    Text,
    /// Colors and toggles with no effect on the stencil or highlights.
    #[default]
    Display,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlEntry {
    pub name: String,
    #[serde(flatten)]
    pub control: Control,
    pub effect: ParamChange,
}

/// Colors the host styles the character grid with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub background: Rgba8,
    pub text: Rgba8,
    pub highlight: Rgba8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Rgba8::BLACK,
            text: Rgba8::new_opaque(0, 255, 0),
            highlight: Rgba8::WHITE,
        }
    }
}

// ============================================================================
// ControlPanel
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlPanel {
    title: String,
    controls: Vec<ControlEntry>,
}

const LABEL_NOTE: &str = "Generates a sake label made of source code. Copy the text \
with forConsole checked to recover the hidden message; the related link has more.";
const LABEL_LINK: &str = "https://kurand.jp/products/sourcecode";

impl ControlPanel {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            controls: Vec::new(),
        }
    }

    /// Append a control. A later control with the same name replaces the
    /// earlier one in place.
    pub fn with(mut self, name: &str, control: Control, effect: ParamChange) -> Self {
        let entry = ControlEntry {
            name: name.to_string(),
            control,
            effect,
        };
        match self.controls.iter_mut().find(|e| e.name == name) {
            Some(existing) => *existing = entry,
            None => self.controls.push(entry),
        }
        self
    }

    /// Parameters of the label generator widget.
    pub fn label_generator(compact: bool) -> Self {
        let label = if compact {
            LabelConfig::compact()
        } else {
            LabelConfig::default()
        };
        let theme = Theme::default();
        Self::new("Source code label")
            .with(
                "text",
                Control::Text {
                    value: "ヒミツのことば".to_string(),
                },
                ParamChange::Text,
            )
            .with(
                "labelText",
                Control::Text { value: label.text },
                ParamChange::Label,
            )
            .with(
                "labelSize",
                Control::range(label.font_size_px, 0.0, 300.0, 1.0),
                ParamChange::Label,
            )
            .with(
                "labelThreshold",
                Control::range(label.highlight_threshold, 0.0, 1.0, 0.01),
                ParamChange::Label,
            )
            .with(
                "labelOffsetX",
                Control::range(label.offset_x, 0.0, 300.0, 1.0),
                ParamChange::Label,
            )
            .with(
                "labelOffsetY",
                Control::range(label.offset_y, 0.0, 300.0, 1.0),
                ParamChange::Label,
            )
            .with(
                "bgColor",
                Control::Color {
                    value: theme.background,
                },
                ParamChange::Display,
            )
            .with(
                "textColor",
                Control::Color { value: theme.text },
                ParamChange::Display,
            )
            .with(
                "labelTextColor",
                Control::Color {
                    value: theme.highlight,
                },
                ParamChange::Display,
            )
            // Turns highlighting off, which needs a new evaluator.
            .with(
                "forConsole",
                Control::Toggle { value: false },
                ParamChange::Label,
            )
            .with(
                "showCanvas",
                Control::Toggle { value: false },
                ParamChange::Display,
            )
            .with(
                "note",
                Control::Note {
                    text: LABEL_NOTE.to_string(),
                },
                ParamChange::Display,
            )
            .with(
                "links",
                Control::Buttons {
                    links: vec![Link::new("Related link", LABEL_LINK)],
                },
                ParamChange::Display,
            )
    }

    /// The generic slider widget.
    pub fn slider_demo() -> Self {
        Self::new("Slider")
            .with(
                "param",
                Control::range(10.0, 0.0, 100.0, 0.1),
                ParamChange::Display,
            )
            .with(
                "note",
                Control::Note {
                    text: "Description goes here.".to_string(),
                },
                ParamChange::Display,
            )
            .with(
                "links",
                Control::Buttons {
                    links: vec![Link::new("Related link", "https://example.com/")],
                },
                ParamChange::Display,
            )
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn controls(&self) -> &[ControlEntry] {
        &self.controls
    }

    pub fn get(&self, name: &str) -> Option<&Control> {
        self.controls
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.control)
    }

    /// Apply a host edit.
    ///
    /// Returns the invalidation class of the control on success. Rejected
    /// edits leave the panel unchanged.
    pub fn set(&mut self, name: &str, value: ControlValue) -> Result<ParamChange> {
        let result = self.apply(name, value);
        if let Err(ref e) = result {
            log::warn!("rejected control input: {}", e);
        }
        result
    }

    fn apply(&mut self, name: &str, value: ControlValue) -> Result<ParamChange> {
        let entry = self
            .controls
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::UnknownControl(name.to_string()))?;
        match (&mut entry.control, value) {
            (Control::Range { value, min, max, step }, ControlValue::Number(v)) => {
                *value = snap_to_step(v, *min, *max, *step);
            }
            (Control::Text { value }, ControlValue::Text(v)) => *value = v,
            (Control::Color { value }, ControlValue::Text(v)) => *value = v.parse()?,
            (Control::Toggle { value }, ControlValue::Bool(v)) => *value = v,
            (Control::Note { .. } | Control::Buttons { .. }, _) => {
                return Err(Error::ReadOnly(name.to_string()));
            }
            (c, _) => {
                return Err(Error::ControlType {
                    name: name.to_string(),
                    expected: c.expected(),
                });
            }
        }
        Ok(entry.effect)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Control::Range { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Control::Text { value } => Some(value),
            _ => None,
        }
    }

    pub fn color(&self, name: &str) -> Option<Rgba8> {
        match self.get(name)? {
            Control::Color { value } => Some(*value),
            _ => None,
        }
    }

    pub fn toggle(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            Control::Toggle { value } => Some(*value),
            _ => None,
        }
    }

    /// Label parameters; controls this panel lacks keep their defaults.
    pub fn label_config(&self) -> LabelConfig {
        let d = LabelConfig::default();
        LabelConfig {
            text: self.text("labelText").map_or(d.text, str::to_string),
            font_size_px: self.number("labelSize").unwrap_or(d.font_size_px),
            offset_x: self.number("labelOffsetX").unwrap_or(d.offset_x),
            offset_y: self.number("labelOffsetY").unwrap_or(d.offset_y),
            highlight_threshold: self
                .number("labelThreshold")
                .unwrap_or(d.highlight_threshold),
        }
    }

    pub fn theme(&self) -> Theme {
        let d = Theme::default();
        Theme {
            background: self.color("bgColor").unwrap_or(d.background),
            text: self.color("textColor").unwrap_or(d.text),
            highlight: self.color("labelTextColor").unwrap_or(d.highlight),
        }
    }

    /// The text the character grid displays.
    pub fn displayed_text(&self) -> &str {
        self.text("text").unwrap_or("")
    }

    /// Whether the host should show the stencil surface for debugging.
    pub fn show_surface(&self) -> bool {
        self.toggle("showCanvas").unwrap_or(false)
    }

    /// Console mode: the text is meant for copying, so nothing highlights.
    pub fn for_console(&self) -> bool {
        self.toggle("forConsole").unwrap_or(false)
    }

    pub fn to_json(&self) -> String {
        // Every field serializes infallibly; an empty object is unreachable.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse a panel, clamping and snapping every range value the same way
    /// [`set`](Self::set) would.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut panel: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        for entry in &mut panel.controls {
            if let Control::Range { value, min, max, step } = entry.control {
                entry.control = Control::range(value, min, max, step);
            }
        }
        Ok(panel)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_step() {
        assert_eq!(snap_to_step(12.4, 0.0, 300.0, 1.0), 12.0);
        assert_eq!(snap_to_step(12.5, 0.0, 300.0, 1.0), 13.0);
        assert_eq!(snap_to_step(-4.0, 0.0, 300.0, 1.0), 0.0);
        assert_eq!(snap_to_step(999.0, 0.0, 300.0, 1.0), 300.0);
        assert_eq!(snap_to_step(f64::NAN, 5.0, 10.0, 1.0), 5.0);
        assert_eq!(snap_to_step(0.333, 0.0, 1.0, 0.0), 0.333);
        assert!((snap_to_step(0.456, 0.0, 1.0, 0.01) - 0.46).abs() < 1e-9);
    }

    #[test]
    fn test_label_generator_defaults() {
        let panel = ControlPanel::label_generator(false);
        assert_eq!(panel.label_config(), LabelConfig::default());
        let compact = ControlPanel::label_generator(true).label_config();
        assert_eq!(compact.font_size_px, 70.0);
        assert_eq!(compact.offset_x, 20.0);
        assert_eq!(compact.offset_y, 50.0);
        assert_eq!(panel.theme(), Theme::default());
        assert_eq!(panel.displayed_text(), "ヒミツのことば");
        assert!(!panel.for_console());
        assert!(!panel.show_surface());
    }

    #[test]
    fn test_set_reports_invalidation_class() {
        let mut panel = ControlPanel::label_generator(false);
        assert_eq!(panel.set("labelSize", 70.0.into()), Ok(ParamChange::Label));
        assert_eq!(panel.label_config().font_size_px, 70.0);
        assert_eq!(panel.set("text", "hello".into()), Ok(ParamChange::Text));
        assert_eq!(panel.displayed_text(), "hello");
        assert_eq!(panel.set("bgColor", "#123".into()), Ok(ParamChange::Display));
        assert_eq!(panel.theme().background, Rgba8::new_opaque(0x11, 0x22, 0x33));
        assert_eq!(panel.set("forConsole", true.into()), Ok(ParamChange::Label));
        assert!(panel.for_console());
    }

    #[test]
    fn test_range_input_is_clamped_and_snapped() {
        let mut panel = ControlPanel::label_generator(false);
        panel.set("labelSize", 1000.0.into()).unwrap();
        assert_eq!(panel.number("labelSize"), Some(300.0));
        panel.set("labelOffsetX", 41.6.into()).unwrap();
        assert_eq!(panel.number("labelOffsetX"), Some(42.0));
    }

    #[test]
    fn test_rejected_input_leaves_panel_unchanged() {
        let mut panel = ControlPanel::label_generator(false);
        let before = panel.clone();
        assert!(matches!(
            panel.set("labelSize", "big".into()),
            Err(Error::ControlType { expected: "number", .. })
        ));
        assert!(matches!(
            panel.set("textColor", "green".into()),
            Err(Error::InvalidColor(_))
        ));
        assert!(matches!(
            panel.set("note", "x".into()),
            Err(Error::ReadOnly(_))
        ));
        assert!(matches!(
            panel.set("nope", 1.0.into()),
            Err(Error::UnknownControl(_))
        ));
        assert_eq!(panel, before);
    }

    #[test]
    fn test_slider_demo() {
        let mut panel = ControlPanel::slider_demo();
        assert_eq!(panel.number("param"), Some(10.0));
        panel.set("param", 33.33.into()).unwrap();
        let v = panel.number("param").unwrap();
        assert!((v - 33.3).abs() < 1e-9);
        // Non-label panels fall back to the default label config.
        assert_eq!(panel.label_config(), LabelConfig::default());
    }

    #[test]
    fn test_json_schema() {
        let panel = ControlPanel::slider_demo();
        let json = panel.to_json();
        assert!(json.contains(r#""type":"range""#));
        assert!(json.contains(r#""name":"param""#));
        assert!(json.contains(r#""effect":"display""#));
        assert_eq!(ControlPanel::from_json(&json).unwrap(), panel);
        assert!(ControlPanel::from_json("[").is_err());
    }

    #[test]
    fn test_from_json_normalizes_ranges() {
        let json = r#"{"title":"t","controls":[
            {"name":"high","type":"range","value":999.0,"min":0.0,"max":100.0,"step":0.1,"effect":"display"},
            {"name":"off","type":"range","value":12.34,"min":0.0,"max":100.0,"step":0.1,"effect":"display"},
            {"name":"flipped","type":"range","value":-3.0,"min":10.0,"max":0.0,"step":1.0,"effect":"display"}
        ]}"#;
        let panel = ControlPanel::from_json(json).unwrap();
        assert_eq!(panel.number("high"), Some(100.0));
        assert!((panel.number("off").unwrap() - 12.3).abs() < 1e-9);
        assert_eq!(panel.number("flipped"), Some(0.0));
        match panel.get("flipped").unwrap() {
            Control::Range { min, max, .. } => assert_eq!((*min, *max), (0.0, 10.0)),
            other => panic!("unexpected control {:?}", other),
        }
    }

    #[test]
    fn test_control_value_from_json() {
        let v: ControlValue = serde_json::from_str("12.5").unwrap();
        assert_eq!(v, ControlValue::Number(12.5));
        let v: ControlValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, ControlValue::Bool(true));
        let v: ControlValue = serde_json::from_str(r##""#fff""##).unwrap();
        assert_eq!(v, ControlValue::Text("#fff".to_string()));
    }
}

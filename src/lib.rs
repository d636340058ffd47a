//! # label-stencil
//!
//! Highlights the characters of a block of text that fall on a label drawn
//! "through" it, as if the label were a stencil laid over the page.
//!
//! The label is rasterized into an offscreen RGBA surface the size of the
//! text container. Every character whose on-screen rectangle covers enough
//! stencil ink (average alpha above a threshold) gets the highlight style.
//!
//! ## Pipeline
//!
//! 1. **Control panel** ([`panel`]): user-adjustable parameters
//! 2. **Stencil rasterizer** ([`stencil`]): draws the label text into the surface
//! 3. **Highlight evaluator** ([`evaluator`]): coverage test of one rectangle
//! 4. **Character grid** ([`grid`]): asks the evaluator about every character
//!
//! [`controller::LabelController`] ties these together and decides when the
//! stencil must be redrawn.

// Foundation
pub mod basics;
pub mod color;
pub mod error;

// Rendering
pub mod font;
pub mod path;
pub mod rasterizer;
pub mod stencil;
pub mod surface;

// Highlighting
pub mod evaluator;
pub mod grid;

// Widget
pub mod controller;
pub mod panel;
pub mod timer;

pub use basics::{Bounds, Rect};
pub use color::Rgba8;
pub use controller::LabelController;
pub use error::{Error, Result};
pub use evaluator::HighlightEvaluator;
pub use grid::{CharacterGrid, HighlightPass, LayoutProbe, MonospaceLayout};
pub use panel::{ControlPanel, ControlValue, ParamChange, Theme};
pub use stencil::{LabelConfig, StencilRasterizer};
pub use surface::StencilSurface;

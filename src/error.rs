//! Error type for the fallible configuration surfaces.
//!
//! The render path itself never fails: missing surfaces and degenerate
//! rectangles resolve to "no highlight". Errors only come from parsing
//! host input (colors, control values) and loading font data.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("invalid color {0:?}, expected #rgb, #rrggbb or #rrggbbaa")]
    InvalidColor(String),

    #[error("unknown control {0:?}")]
    UnknownControl(String),

    #[error("control {name:?} expects a {expected} value")]
    ControlType { name: String, expected: &'static str },

    #[error("control {0:?} is read-only")]
    ReadOnly(String),

    #[error("failed to parse font: {0}")]
    Font(String),

    #[error("invalid label config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

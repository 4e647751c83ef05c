//! Watermark configuration.
//!
//! A [`WatermarkConfig`] is a plain value recreated by the caller on every
//! settings change. It deserializes from the same camelCase object the web
//! front-end keeps in its state, with the color as a `#RRGGBB` string.

use std::fmt;
use std::ops::{Range, RangeInclusive};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Text used when the caller has not chosen one.
pub const DEFAULT_WATERMARK_TEXT: &str = "僅供公司設立使用";

/// Usage-restriction phrases offered as one-click choices.
pub const PRESET_TEXTS: [&str; 6] = [
    "僅供公司設立使用",
    "僅供公司變更登記使用",
    "僅供公司設立及變更登記使用",
    "僅供銀行開戶使用",
    "僅供電信申辦使用",
    "僅供房屋租賃簽約使用",
];

/// Range offered by the font size slider (reference-resolution units).
pub const FONT_SIZE_RANGE: RangeInclusive<f32> = 12.0..=64.0;
/// Range offered by the opacity slider.
pub const OPACITY_RANGE: RangeInclusive<f32> = 0.0..=0.9;
/// Range offered by the angle slider (degrees).
pub const ANGLE_RANGE: RangeInclusive<f32> = -90.0..=90.0;
/// Range offered by the density slider.
pub const DENSITY_RANGE: RangeInclusive<f32> = 0.0..=0.9;

/// Errors for invalid configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Color string is not `#RGB` or `#RRGGBB`.
    #[error("Invalid color {0:?}: expected #RGB or #RRGGBB")]
    InvalidColor(String),

    /// A numeric field is NaN, infinite or outside its accepted range.
    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: f32 },
}

/// An opaque RGB paint color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as an array, red first.
    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    /// Parse `#RGB` or `#RRGGBB` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());

        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let component = |range: Range<usize>| u8::from_str_radix(&hex[range], 16).map_err(|_| invalid());

        match hex.len() {
            // Short form doubles each digit: #F80 == #FF8800
            3 => Ok(Color::new(
                component(0..1)? * 17,
                component(1..2)? * 17,
                component(2..3)? * 17,
            )),
            6 => Ok(Color::new(component(0..2)?, component(2..4)?, component(4..6)?)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Parameters for one watermark render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatermarkConfig {
    /// Literal text drawn at every tile. Newlines are not interpreted.
    pub text: String,
    /// Font size tuned for an 800px wide image; scaled with the image width.
    pub font_size: f32,
    /// Global alpha applied to the text (0.0 to 1.0).
    pub opacity: f32,
    /// Fill color of the text.
    pub color: Color,
    /// Rotation of each tile in degrees.
    pub angle: f32,
    /// Inverse tile spacing (0.0 to 1.0); higher packs tiles closer together.
    pub density: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: DEFAULT_WATERMARK_TEXT.to_string(),
            font_size: 26.0,
            opacity: 0.3,
            color: Color::new(0xFF, 0x00, 0x00),
            angle: -30.0,
            density: 0.15,
        }
    }
}

impl WatermarkConfig {
    /// Check that every numeric field can be rendered.
    ///
    /// Font size must be positive, opacity and density must lie in 0..=1 and
    /// nothing may be NaN or infinite. The slider ranges are narrower; values
    /// outside them are still accepted here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let check = |field: &'static str, value: f32, ok: bool| {
            if value.is_finite() && ok {
                Ok(())
            } else {
                Err(ConfigError::OutOfRange { field, value })
            }
        };

        check("fontSize", self.font_size, self.font_size > 0.0)?;
        check("opacity", self.opacity, (0.0..=1.0).contains(&self.opacity))?;
        check("angle", self.angle, true)?;
        check("density", self.density, (0.0..=1.0).contains(&self.density))?;
        Ok(())
    }

    /// Copy of this configuration with every numeric field pulled into the
    /// range its slider offers.
    pub fn clamped(&self) -> Self {
        let clamp = |value: f32, range: &RangeInclusive<f32>| value.clamp(*range.start(), *range.end());
        Self {
            text: self.text.clone(),
            font_size: clamp(self.font_size, &FONT_SIZE_RANGE),
            opacity: clamp(self.opacity, &OPACITY_RANGE),
            color: self.color,
            angle: clamp(self.angle, &ANGLE_RANGE),
            density: clamp(self.density, &DENSITY_RANGE),
        }
    }
}

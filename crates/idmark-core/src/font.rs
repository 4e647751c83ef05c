//! Typeface used to paint watermark text.
//!
//! DejaVu Sans is embedded so rendering never depends on what fonts the host
//! has installed. It has no CJK coverage, so hosts rendering the default
//! Chinese phrases should supply a CJK face with [`WatermarkFont::from_bytes`].

use std::sync::OnceLock;

use ab_glyph::{Font, FontArc, InvalidFont, PxScale};
use thiserror::Error;

const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

static EMBEDDED_FONT: OnceLock<Result<FontArc, InvalidFont>> = OnceLock::new();

/// Errors for unusable font data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontError {
    #[error("Invalid font data: {0}")]
    InvalidFont(String),
}

impl From<InvalidFont> for FontError {
    fn from(e: InvalidFont) -> Self {
        FontError::InvalidFont(e.to_string())
    }
}

/// A parsed TrueType/OpenType face. Cheap to clone.
#[derive(Clone)]
pub struct WatermarkFont {
    font: FontArc,
}

impl std::fmt::Debug for WatermarkFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkFont")
            .field("glyph_count", &self.font.glyph_count())
            .finish()
    }
}

impl WatermarkFont {
    /// The embedded sans-serif face, parsed on first use.
    pub fn embedded() -> Result<Self, FontError> {
        let font = EMBEDDED_FONT
            .get_or_init(|| FontArc::try_from_slice(EMBEDDED_FONT_DATA))
            .clone()?;
        Ok(Self { font })
    }

    /// Parse caller-supplied TrueType/OpenType bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, FontError> {
        let font = FontArc::try_from_vec(bytes)?;
        Ok(Self { font })
    }

    /// Whether the face has an outline for `c` (rather than `.notdef`).
    pub fn has_glyph(&self, c: char) -> bool {
        self.font.glyph_id(c).0 != 0
    }

    /// Scale that makes the em square `size` pixels tall, the way a CSS
    /// `px` font size does.
    pub(crate) fn px_scale(&self, size: f32) -> PxScale {
        let height = self.font.height_unscaled();
        let scale = match self.font.units_per_em() {
            Some(upem) if upem > 0.0 => size * height / upem,
            _ => size,
        };
        PxScale::from(scale)
    }

    pub(crate) fn face(&self) -> &FontArc {
        &self.font
    }
}

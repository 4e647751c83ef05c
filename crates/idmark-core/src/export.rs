//! Export naming for watermarked card images.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compositor::CompositeResult;
use crate::encode::{EncodeError, ExportFormat};

/// Which face of the identity card an image shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Front,
    Back,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Front, Side::Back];

    /// Label shown to the user and used in file names.
    pub fn label(self) -> &'static str {
        match self {
            Side::Front => "正面",
            Side::Back => "反面",
        }
    }

    /// Deterministic download name, e.g. `身分證正面_已加浮水印.png`.
    pub fn file_name(self, format: ExportFormat) -> String {
        format!("身分證{}_已加浮水印.{}", self.label(), format.extension())
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Front => "front",
            Side::Back => "back",
        })
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(Side::Front),
            "back" => Ok(Side::Back),
            _ => match s.trim() {
                "正面" => Ok(Side::Front),
                "反面" => Ok(Side::Back),
                other => Err(format!("Unknown side {other:?}: expected front or back")),
            },
        }
    }
}

/// An encoded image ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Encode one side's result under its deterministic name.
pub fn export_side(
    side: Side,
    result: &CompositeResult,
    format: ExportFormat,
) -> Result<ExportedFile, EncodeError> {
    Ok(ExportedFile {
        file_name: side.file_name(format),
        mime_type: format.mime_type(),
        bytes: result.encode(format)?,
    })
}

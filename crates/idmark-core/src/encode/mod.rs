//! Image encoding for idmark.
//!
//! This module provides functionality for:
//! - Encoding watermarked rasters as PNG (lossless, default) or JPEG
//! - Describing the export container ([`ExportFormat`]) for naming files
//!
//! All operations are synchronous.

mod raster;

pub use raster::{
    encode_jpeg, encode_png, encode_rgb, EncodeError, ExportFormat, DEFAULT_JPEG_QUALITY,
};

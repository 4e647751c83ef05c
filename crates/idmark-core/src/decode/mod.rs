//! Image decoding for idmark.
//!
//! This module provides functionality for:
//! - Decoding PNG and JPEG bytes into RGBA rasters
//! - Applying EXIF orientation so camera photos come out upright
//! - The [`ImageSource`] trait the compositor and assembler await
//!
//! # Architecture
//!
//! Decoding itself is synchronous. Sources are asynchronous so a host can
//! read a file or browser blob without blocking; the decode runs once the
//! bytes are available.

mod raster;
mod source;
mod types;

pub use raster::decode_image;
pub use source::{EncodedImage, ImageSource};
pub use types::{DecodeError, DecodedImage, Orientation};

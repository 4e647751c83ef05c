//! idmark core - watermark compositing and document assembly
//!
//! This crate holds all computational logic for idmark: decoding uploaded
//! card photos, burning a tiled text watermark into them, encoding the
//! result for download and stacking several results into an A4 PDF.
//!
//! Everything runs locally and nothing is cached between calls; each
//! composite or assemble call works on fresh buffers.

pub mod compositor;
pub mod config;
pub mod decode;
pub mod document;
pub mod encode;
pub mod export;
pub mod font;
pub mod layout;
pub mod surface;
pub mod text;

#[cfg(test)]
mod test_support;

pub use compositor::{
    composite, composite_sides, effective_font_size, render_watermark, tile_steps,
    CompositeError, CompositeResult, SideResults, TileGrid,
};
pub use config::{Color, ConfigError, WatermarkConfig, DEFAULT_WATERMARK_TEXT, PRESET_TEXTS};
pub use decode::{decode_image, DecodeError, DecodedImage, EncodedImage, ImageSource};
pub use document::{assemble, assemble_with, AssembleError, Document};
pub use encode::{EncodeError, ExportFormat};
pub use export::{export_side, ExportedFile, Side};
pub use font::{FontError, WatermarkFont};
pub use layout::{layout_pages, PageGeometry, Placement};
pub use surface::RenderSurfaceError;

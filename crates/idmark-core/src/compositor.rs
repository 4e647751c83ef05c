//! Watermark compositing.
//!
//! Burns a repeating, rotated, semi-transparent line of text into a copy of
//! the source raster. The tile grid covers three times the image extent in
//! each direction so rotated rows still reach every corner.

use std::f32::consts::PI;

use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, WatermarkConfig};
use crate::decode::{DecodeError, DecodedImage, ImageSource};
use crate::encode::{encode_rgb, EncodeError, ExportFormat};
use crate::font::{FontError, WatermarkFont};
use crate::surface::{Paint, RenderSurfaceError, Surface};
use crate::text::TextMask;

/// Image width the configured font size is tuned for.
pub const REFERENCE_WIDTH: f32 = 800.0;
/// Smallest font size painted, whatever the image width.
pub const MIN_FONT_SIZE: f32 = 12.0;
/// Horizontal tile step in multiples of the effective font size.
pub const TILE_SPACING_X: f32 = 10.0;
/// Vertical tile step in multiples of the effective font size.
pub const TILE_SPACING_Y: f32 = 4.0;
/// Spacing left over at full density.
pub const DENSITY_FLOOR: f32 = 0.1;

/// Errors from a composite call.
#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] DecodeError),

    #[error("Failed to acquire render surface: {0}")]
    RenderSurface(#[from] RenderSurfaceError),

    #[error(transparent)]
    Font(#[from] FontError),

    #[error("Invalid watermark configuration: {0}")]
    Config(#[from] ConfigError),
}

/// A watermarked raster, same dimensions as its source.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeResult {
    pub width: u32,
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl CompositeResult {
    /// Encode for export.
    pub fn encode(&self, format: ExportFormat) -> Result<Vec<u8>, EncodeError> {
        encode_rgb(&self.pixels, self.width, self.height, format)
    }

    /// The raster as an opaque RGBA image.
    pub fn to_decoded(&self) -> DecodedImage {
        let pixels = self
            .pixels
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect();
        DecodedImage::new(self.width, self.height, pixels)
    }
}

impl ImageSource for CompositeResult {
    async fn load(&self) -> Result<DecodedImage, DecodeError> {
        Ok(self.to_decoded())
    }
}

/// Font size actually painted on an image `image_width` pixels wide.
pub fn effective_font_size(image_width: u32, font_size: f32) -> f32 {
    (image_width as f32 / REFERENCE_WIDTH * font_size).max(MIN_FONT_SIZE)
}

/// Horizontal and vertical distance between tile anchors.
///
/// Density is clamped to 0..=1, so steps stay positive.
pub fn tile_steps(effective_size: f32, density: f32) -> (f32, f32) {
    let spread = 1.0 - density.clamp(0.0, 1.0) + DENSITY_FLOOR;
    (
        effective_size * TILE_SPACING_X * spread,
        effective_size * TILE_SPACING_Y * spread,
    )
}

/// Anchor points tiling `[-w, 2w) x [-h, 2h)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid {
    pub width: f32,
    pub height: f32,
    pub step_x: f32,
    pub step_y: f32,
}

impl TileGrid {
    pub fn new(width: u32, height: u32, (step_x, step_y): (f32, f32)) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            step_x,
            step_y,
        }
    }

    /// Anchors column by column, top to bottom within a column.
    pub fn anchors(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        axis(self.width, self.step_x)
            .flat_map(move |x| axis(self.height, self.step_y).map(move |y| (x, y)))
    }

    pub fn len(&self) -> usize {
        axis(self.width, self.step_x).count() * axis(self.height, self.step_y).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn axis(extent: f32, step: f32) -> impl Iterator<Item = f32> {
    std::iter::successors(Some(-extent), move |v| Some(v + step))
        .take_while(move |v| step > 0.0 && *v < 2.0 * extent)
}

/// Paint the watermark onto a copy of `image`.
pub fn render_watermark(
    image: &DecodedImage,
    config: &WatermarkConfig,
    font: &WatermarkFont,
) -> Result<CompositeResult, CompositeError> {
    config.validate()?;
    let mut surface = Surface::acquire(image)?;

    let size = effective_font_size(image.width, config.font_size);
    let grid = TileGrid::new(image.width, image.height, tile_steps(size, config.density));
    let mask = TextMask::render(font, &config.text, size);
    let paint = Paint {
        color: config.color,
        opacity: config.opacity,
    };
    let radians = config.angle * PI / 180.0;

    debug!(
        width = image.width,
        height = image.height,
        effective_size = size,
        step_x = grid.step_x,
        step_y = grid.step_y,
        tiles = grid.len(),
        "rendering watermark"
    );

    for (x, y) in grid.anchors() {
        let mut tile = surface.save();
        tile.translate(x, y);
        tile.rotate(radians);
        tile.fill_mask(&mask, paint);
    }

    let rgb = surface
        .into_pixels()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    Ok(CompositeResult {
        width: image.width,
        height: image.height,
        pixels: rgb,
    })
}

/// Decode `source` and paint the watermark onto it.
///
/// Decoding completes before any painting starts. Each call works on its
/// own surface, so calls for different images may run concurrently.
pub async fn composite<S: ImageSource + ?Sized>(
    source: &S,
    config: &WatermarkConfig,
    font: &WatermarkFont,
) -> Result<CompositeResult, CompositeError> {
    let image = source.load().await?;
    render_watermark(&image, config, font)
}

/// Per-side results of [`composite_sides`]; `None` where no image was given.
pub type SideResults = (
    Option<Result<CompositeResult, CompositeError>>,
    Option<Result<CompositeResult, CompositeError>>,
);

/// Composite the front and back images concurrently.
///
/// The two sides are independent: one failing leaves the other's result
/// intact.
pub async fn composite_sides<F, B>(
    front: Option<&F>,
    back: Option<&B>,
    config: &WatermarkConfig,
    font: &WatermarkFont,
) -> SideResults
where
    F: ImageSource + ?Sized,
    B: ImageSource + ?Sized,
{
    let front = async {
        match front {
            Some(source) => Some(composite(source, config, font).await),
            None => None,
        }
    };
    let back = async {
        match back {
            Some(source) => Some(composite(source, config, font).await),
            None => None,
        }
    };
    futures::join!(front, back)
}

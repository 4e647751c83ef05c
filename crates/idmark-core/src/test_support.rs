//! Fixtures shared by the unit tests.

use std::io::Cursor;

use image::ImageFormat;

use crate::decode::DecodedImage;

/// An image filled with one RGBA color.
pub fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> DecodedImage {
    let pixels = rgba
        .iter()
        .copied()
        .cycle()
        .take(width as usize * height as usize * 4)
        .collect();
    DecodedImage::new(width, height, pixels)
}

/// An opaque image whose red and green channels ramp across x and y.
pub fn gradient_image(width: u32, height: u32) -> DecodedImage {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
            255,
        ])
    });
    DecodedImage::from_rgba_image(img)
}

/// Encode a fixture as PNG bytes.
pub fn png_bytes(image: &DecodedImage) -> Vec<u8> {
    encode(image, ImageFormat::Png)
}

/// Encode a fixture as JPEG bytes (alpha dropped).
pub fn jpeg_bytes(image: &DecodedImage) -> Vec<u8> {
    encode(image, ImageFormat::Jpeg)
}

fn encode(image: &DecodedImage, format: ImageFormat) -> Vec<u8> {
    let rgba = image::RgbaImage::from_raw(image.width, image.height, image.pixels.clone()).unwrap();
    let dynamic = match format {
        ImageFormat::Jpeg => image::DynamicImage::ImageRgb8(image::DynamicImage::ImageRgba8(rgba).into_rgb8()),
        _ => image::DynamicImage::ImageRgba8(rgba),
    };
    let mut out = Cursor::new(Vec::new());
    dynamic.write_to(&mut out, format).unwrap();
    out.into_inner()
}

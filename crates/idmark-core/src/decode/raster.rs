//! PNG/JPEG decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageError, ImageReader};

use super::{DecodeError, DecodedImage, Orientation};

/// Decode PNG or JPEG bytes into an upright RGBA image.
///
/// The format is sniffed from the leading bytes, so the file name or MIME
/// type the bytes arrived with does not matter. EXIF orientation is applied
/// so phone photos come out the way they were held.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes are not a recognised
/// image. Returns `DecodeError::CorruptedFile` if the image is truncated or
/// otherwise undecodable.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::Io(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader.decode().map_err(|e| match e {
        ImageError::Unsupported(_) => DecodeError::InvalidFormat,
        other => DecodeError::CorruptedFile(other.to_string()),
    })?;

    tracing::debug!(
        width = img.width(),
        height = img.height(),
        ?orientation,
        "decoded image"
    );

    let oriented = apply_orientation(img, orientation);
    Ok(DecodedImage::from_rgba_image(oriented.into_rgba8()))
}

/// EXIF orientation of `bytes`; `Orientation::Normal` when there is no EXIF
/// block.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{gradient_image, jpeg_bytes, png_bytes, solid_image};

    #[test]
    fn test_decode_png_preserves_pixels() {
        let source = gradient_image(7, 5);
        let decoded = decode_image(&png_bytes(&source)).unwrap();

        assert_eq!((decoded.width, decoded.height), (7, 5));
        assert_eq!(decoded.pixels, source.pixels);
    }

    #[test]
    fn test_decode_jpeg() {
        let source = solid_image(16, 8, [40, 120, 200, 255]);
        let decoded = decode_image(&jpeg_bytes(&source)).unwrap();

        assert_eq!((decoded.width, decoded.height), (16, 8));
        assert_eq!(decoded.pixels.len(), 16 * 8 * 4);
        // Lossy, but a flat color survives closely and alpha is opaque
        let px = &decoded.pixels[0..4];
        assert!((px[0] as i32 - 40).abs() <= 4);
        assert!((px[2] as i32 - 200).abs() <= 4);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_decode_unknown_bytes() {
        let result = decode_image(&[0x00, 0x01, 0x02, 0x03]);
        assert_eq!(result, Err(DecodeError::InvalidFormat));
    }

    #[test]
    fn test_decode_empty_bytes() {
        assert!(decode_image(&[]).is_err());
    }

    #[test]
    fn test_decode_truncated_png() {
        let bytes = png_bytes(&gradient_image(32, 32));
        let result = decode_image(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))));
    }

    #[test]
    fn test_orientation_without_exif() {
        let bytes = jpeg_bytes(&solid_image(4, 4, [0, 0, 0, 255]));
        assert_eq!(extract_orientation(&bytes), Orientation::Normal);
        assert_eq!(extract_orientation(&[0x00, 0x01]), Orientation::Normal);
    }

    #[test]
    fn test_apply_orientation_rotate90() {
        let rgb = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]).unwrap();
        let rotated = apply_orientation(DynamicImage::ImageRgba8(rgb), Orientation::Rotate90CW);
        assert_eq!((rotated.width(), rotated.height()), (1, 2));
    }

    #[test]
    fn test_apply_orientation_rotate180() {
        let rgb = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]).unwrap();
        let rotated = apply_orientation(DynamicImage::ImageRgba8(rgb), Orientation::Rotate180).into_rgba8();
        assert_eq!(rotated.get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(rotated.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_apply_orientation_flip_horizontal() {
        let rgb = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]).unwrap();
        let flipped =
            apply_orientation(DynamicImage::ImageRgba8(rgb), Orientation::FlipHorizontal).into_rgba8();
        assert_eq!(flipped.get_pixel(0, 0).0, [0, 255, 0, 255]);
    }
}

//! Drawing surface with a canvas-style transform stack.
//!
//! A [`Surface`] owns an RGBA copy of the source raster. Painting goes
//! through the current affine transform; [`Surface::save`] pushes the
//! transform and returns a guard that pops it again when dropped, so
//! per-tile transforms never accumulate.

use std::ops::{Deref, DerefMut};

use thiserror::Error;

use crate::config::Color;
use crate::decode::DecodedImage;
use crate::text::TextMask;

/// Errors acquiring a drawable surface for an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderSurfaceError {
    /// Width or height is zero.
    #[error("Cannot draw on a {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },

    /// Pixel buffer does not hold width * height * 4 bytes.
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    BufferMismatch { expected: usize, actual: usize },
}

/// 2D affine transform [a b c d e f]
/// where: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Apply a translation in the current (pre-transform) coordinate space.
    pub fn translate(self, tx: f32, ty: f32) -> Self {
        Self {
            e: self.a * tx + self.c * ty + self.e,
            f: self.b * tx + self.d * ty + self.f,
            ..self
        }
    }

    /// Apply a rotation by `radians`, clockwise on screen (y grows downward).
    pub fn rotate(self, radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: self.a * cos + self.c * sin,
            b: self.b * cos + self.d * sin,
            c: self.c * cos - self.a * sin,
            d: self.d * cos - self.b * sin,
            ..self
        }
    }

    /// Map a point through the transform.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// The inverse transform, or `None` for a singular matrix.
    pub fn inverse(&self) -> Option<Self> {
        // | a  c  e |^-1    | d/det   -c/det   (c*f - d*e)/det |
        // | b  d  f |    =  | -b/det   a/det   (b*e - a*f)/det |
        // | 0  0  1 |       |   0       0            1         |
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-10 {
            return None;
        }

        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

/// Fill color and global alpha for painting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub opacity: f32,
}

/// An RGBA raster being painted on.
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    transform: Transform,
    saved: Vec<Transform>,
}

impl Surface {
    /// Copy `image` into a new surface of the same dimensions.
    pub fn acquire(image: &DecodedImage) -> Result<Self, RenderSurfaceError> {
        if image.width == 0 || image.height == 0 {
            return Err(RenderSurfaceError::EmptyImage {
                width: image.width,
                height: image.height,
            });
        }
        let expected = image.expected_len();
        if image.pixels.len() != expected {
            return Err(RenderSurfaceError::BufferMismatch {
                expected,
                actual: image.pixels.len(),
            });
        }

        Ok(Self {
            width: image.width,
            height: image.height,
            pixels: image.pixels.clone(),
            transform: Transform::identity(),
            saved: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Number of transforms currently saved.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Push the current transform; it is restored when the guard drops.
    pub fn save(&mut self) -> SavedState<'_> {
        self.saved.push(self.transform);
        SavedState { surface: self }
    }

    fn restore(&mut self) {
        if let Some(transform) = self.saved.pop() {
            self.transform = transform;
        }
    }

    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.transform = self.transform.translate(tx, ty);
    }

    pub fn rotate(&mut self, radians: f32) {
        self.transform = self.transform.rotate(radians);
    }

    /// Paint `mask` with its anchor at the current origin.
    ///
    /// Each covered device pixel is mapped back into mask space and sampled
    /// bilinearly, then blended source-over with alpha
    /// `paint.opacity * coverage`.
    pub fn fill_mask(&mut self, mask: &TextMask, paint: Paint) {
        if mask.is_empty() || paint.opacity <= 0.0 {
            return;
        }
        let Some(inverse) = self.transform.inverse() else {
            return;
        };

        let (ax, ay) = mask.anchor();
        let (mw, mh) = (mask.width() as f32, mask.height() as f32);
        let corners = [
            self.transform.apply(-ax, -ay),
            self.transform.apply(mw - ax, -ay),
            self.transform.apply(-ax, mh - ay),
            self.transform.apply(mw - ax, mh - ay),
        ];

        let min_x = corners.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);

        // Clip the tile's bounding box, padded for the bilinear fringe, to
        // the surface
        let x0 = (min_x - 2.0).floor().max(0.0) as u32;
        let y0 = (min_y - 2.0).floor().max(0.0) as u32;
        let x1 = ((max_x + 2.0).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((max_y + 2.0).ceil().max(0.0) as u32).min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let opacity = paint.opacity.min(1.0);
        let src = paint.color.channels().map(f32::from);
        let stride = self.width as usize * 4;

        // Bilinear samples reach half a texel past the mask edge
        let (lo_x, hi_x) = (-ax - 0.5, mw - ax + 0.5);
        let (lo_y, hi_y) = (-ay - 0.5, mh - ay + 0.5);

        for py in y0..y1 {
            let cy = py as f32 + 0.5;
            // Mask-space x and y are linear in the device x along a row
            let row_x = inverse.c * cy + inverse.e;
            let row_y = inverse.d * cy + inverse.f;
            let Some((from, to)) = interval(inverse.a, row_x, lo_x, hi_x)
                .zip(interval(inverse.b, row_y, lo_y, hi_y))
                .and_then(|((a0, a1), (b0, b1))| {
                    let (from, to) = (a0.max(b0), a1.min(b1));
                    (from <= to).then_some((from, to))
                })
            else {
                continue;
            };

            let start = (from - 0.5).floor().max(x0 as f32) as u32;
            let end = ((to - 0.5).ceil() + 1.0).clamp(x0 as f32, x1 as f32) as u32;
            let row = py as usize * stride;
            for px in start..end {
                let (ux, uy) = inverse.apply(px as f32 + 0.5, cy);
                let alpha = opacity * mask.sample(ux + ax, uy + ay);
                if alpha <= 0.0 {
                    continue;
                }

                let idx = row + px as usize * 4;
                let dst = &mut self.pixels[idx..idx + 4];
                for (channel, s) in dst.iter_mut().zip(src) {
                    *channel = blend(s, f32::from(*channel), alpha);
                }
                dst[3] = blend(255.0, f32::from(dst[3]), alpha);
            }
        }
    }

    /// Consume the surface, returning its RGBA pixels.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Range of `t` for which `lo <= k * t + c <= hi`; unbounded when `k` is
/// zero and `c` already lies in range.
fn interval(k: f32, c: f32, lo: f32, hi: f32) -> Option<(f32, f32)> {
    if k.abs() < 1e-9 {
        return (lo..=hi)
            .contains(&c)
            .then_some((f32::NEG_INFINITY, f32::INFINITY));
    }
    let (t0, t1) = ((lo - c) / k, (hi - c) / k);
    Some((t0.min(t1), t0.max(t1)))
}

#[inline]
fn blend(src: f32, dst: f32, alpha: f32) -> u8 {
    (src * alpha + dst * (1.0 - alpha)).round().clamp(0.0, 255.0) as u8
}

/// Scope guard returned by [`Surface::save`].
pub struct SavedState<'a> {
    surface: &'a mut Surface,
}

impl Deref for SavedState<'_> {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        self.surface
    }
}

impl DerefMut for SavedState<'_> {
    fn deref_mut(&mut self) -> &mut Surface {
        self.surface
    }
}

impl Drop for SavedState<'_> {
    fn drop(&mut self) {
        self.surface.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::WatermarkFont;
    use crate::test_support::solid_image;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-4 && (a.1 - b.1).abs() < 1e-4
    }

    fn red() -> Paint {
        Paint {
            color: Color::new(255, 0, 0),
            opacity: 1.0,
        }
    }

    #[test]
    fn test_translate_then_rotate() {
        let t = Transform::identity().translate(10.0, 20.0).rotate(FRAC_PI_2);
        // +x in local space points down the screen after a quarter turn
        assert!(approx(t.apply(1.0, 0.0), (10.0, 21.0)));
        assert!(approx(t.apply(0.0, 1.0), (9.0, 20.0)));
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = Transform::identity().translate(-30.0, 12.5).rotate(-0.52);
        let inv = t.inverse().unwrap();
        let (x, y) = t.apply(3.0, -7.0);
        assert!(approx(inv.apply(x, y), (3.0, -7.0)));
    }

    #[test]
    fn test_inverse_singular() {
        let t = Transform {
            a: 0.0,
            d: 0.0,
            ..Transform::identity()
        };
        assert!(t.inverse().is_none());
    }

    #[test]
    fn test_acquire_rejects_empty_image() {
        let img = DecodedImage::new(0, 5, Vec::new());
        assert!(matches!(
            Surface::acquire(&img),
            Err(RenderSurfaceError::EmptyImage { width: 0, height: 5 })
        ));
    }

    #[test]
    fn test_acquire_rejects_short_buffer() {
        let img = DecodedImage::new(4, 4, vec![0u8; 10]);
        assert_eq!(
            Surface::acquire(&img).unwrap_err(),
            RenderSurfaceError::BufferMismatch {
                expected: 64,
                actual: 10
            }
        );
    }

    #[test]
    fn test_save_guard_restores_transform() {
        let mut surface = Surface::acquire(&solid_image(4, 4, [0, 0, 0, 255])).unwrap();
        surface.translate(1.0, 1.0);
        let before = surface.transform();

        {
            let mut tile = surface.save();
            tile.translate(50.0, 50.0);
            tile.rotate(1.0);
            assert_eq!(tile.depth(), 1);
            {
                let mut inner = tile.save();
                inner.rotate(0.5);
                assert_eq!(inner.depth(), 2);
            }
            assert_eq!(tile.depth(), 1);
        }

        assert_eq!(surface.transform(), before);
        assert_eq!(surface.depth(), 0);
    }

    #[test]
    fn test_fill_mask_zero_opacity_is_noop() {
        let image = solid_image(64, 32, [10, 20, 30, 255]);
        let mut surface = Surface::acquire(&image).unwrap();
        let mask = TextMask::render(&WatermarkFont::embedded().unwrap(), "X", 24.0);

        surface.translate(32.0, 16.0);
        surface.fill_mask(
            &mask,
            Paint {
                opacity: 0.0,
                ..red()
            },
        );
        assert_eq!(surface.into_pixels(), image.pixels);
    }

    #[test]
    fn test_fill_mask_paints_at_anchor() {
        let image = solid_image(64, 64, [255, 255, 255, 255]);
        let mut surface = Surface::acquire(&image).unwrap();
        let mask = TextMask::render(&WatermarkFont::embedded().unwrap(), "I", 80.0);

        surface.translate(32.0, 32.0);
        surface.fill_mask(&mask, red());

        // The stem of a capital I crosses the centre; corners stay untouched
        let centre = (32 * 64 + 32) * 4;
        let pixels = surface.into_pixels();
        assert_eq!(&pixels[centre..centre + 4], &[255, 0, 0, 255]);
        assert_eq!(&pixels[0..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_fill_mask_half_opacity_blends() {
        let image = solid_image(64, 64, [0, 0, 255, 255]);
        let mut surface = Surface::acquire(&image).unwrap();
        let mask = TextMask::render(&WatermarkFont::embedded().unwrap(), "I", 80.0);

        surface.translate(32.0, 32.0);
        surface.fill_mask(
            &mask,
            Paint {
                opacity: 0.5,
                ..red()
            },
        );

        let centre = (32 * 64 + 32) * 4;
        let pixels = surface.into_pixels();
        let px = &pixels[centre..centre + 4];
        assert!((px[0] as i32 - 128).abs() <= 1, "red {}", px[0]);
        assert_eq!(px[1], 0);
        assert!((px[2] as i32 - 128).abs() <= 1, "blue {}", px[2]);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_fill_mask_off_surface_is_clipped() {
        let image = solid_image(16, 16, [0, 0, 0, 255]);
        let mut surface = Surface::acquire(&image).unwrap();
        let mask = TextMask::render(&WatermarkFont::embedded().unwrap(), "WATERMARK", 20.0);

        surface.translate(-500.0, -500.0);
        surface.fill_mask(&mask, red());
        assert_eq!(surface.into_pixels(), image.pixels);
    }

    /// Every pixel of the surface mapped back into the mask, no clipping.
    fn fill_every_pixel(surface: &mut Surface, mask: &TextMask, paint: Paint) {
        let inverse = surface.transform().inverse().unwrap();
        let (ax, ay) = mask.anchor();
        let src = paint.color.channels().map(f32::from);
        for py in 0..surface.height() {
            for px in 0..surface.width() {
                let (ux, uy) = inverse.apply(px as f32 + 0.5, py as f32 + 0.5);
                let alpha = paint.opacity * mask.sample(ux + ax, uy + ay);
                if alpha <= 0.0 {
                    continue;
                }
                let idx = (py * surface.width() + px) as usize * 4;
                let dst = &mut surface.pixels[idx..idx + 4];
                for (channel, s) in dst.iter_mut().zip(src) {
                    *channel = blend(s, f32::from(*channel), alpha);
                }
                dst[3] = blend(255.0, f32::from(dst[3]), alpha);
            }
        }
    }

    #[test]
    fn test_fill_mask_row_spans_cover_every_painted_pixel() {
        let image = solid_image(96, 72, [240, 240, 240, 255]);
        let mask = TextMask::render(&WatermarkFont::embedded().unwrap(), "COPY ONLY", 22.0);
        let paint = Paint {
            opacity: 0.6,
            ..red()
        };

        for (x, y, degrees) in [
            (48.0, 36.0, 0.0f32),
            (48.0, 36.0, -30.0),
            (20.0, 60.0, 45.0),
            (90.0, 10.0, 90.0),
            (48.0, 36.0, -90.0),
            (-10.0, 36.0, 137.0),
        ] {
            let mut clipped = Surface::acquire(&image).unwrap();
            clipped.translate(x, y);
            clipped.rotate(degrees.to_radians());
            let mut full = clipped.clone();

            clipped.fill_mask(&mask, paint);
            fill_every_pixel(&mut full, &mask, paint);
            assert_eq!(
                clipped.pixels(),
                full.pixels(),
                "mismatch at ({x}, {y}) rotated {degrees} degrees"
            );
        }
    }
}

//! Text layout and rasterisation into a coverage mask.
//!
//! The watermark text is the same on every tile, so it is shaped and
//! rasterised once per render. Each tile then paints this mask through its
//! own transform.

use ab_glyph::{point, Font, GlyphId, OutlinedGlyph, ScaleFont};

use crate::font::WatermarkFont;

/// Anti-aliased coverage (0.0 to 1.0) of a rendered line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMask {
    width: u32,
    height: u32,
    coverage: Vec<f32>,
    /// Mask-space point placed on the draw anchor: the horizontal centre of
    /// the advance box and the vertical middle of the em box.
    anchor: (f32, f32),
}

impl TextMask {
    /// Shape `text` left to right and rasterise it at `px_size`.
    ///
    /// ASCII whitespace, newlines included, is drawn as a plain space so the
    /// text stays on one line. Other characters the face lacks render as its
    /// `.notdef` glyph. Text with no visible outlines (empty or whitespace)
    /// yields an empty mask.
    pub fn render(font: &WatermarkFont, text: &str, px_size: f32) -> Self {
        let face = font.face();
        let scaled = face.as_scaled(font.px_scale(px_size));

        let mut caret = 0.0f32;
        let mut previous: Option<GlyphId> = None;
        let mut outlines: Vec<OutlinedGlyph> = Vec::new();

        for c in text.chars() {
            let c = if c.is_ascii_whitespace() { ' ' } else { c };
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scaled.scale(), point(caret, 0.0));
            caret += scaled.h_advance(id);
            previous = Some(id);

            if let Some(outlined) = face.outline_glyph(glyph) {
                outlines.push(outlined);
            }
        }

        let Some(first) = outlines.first() else {
            return Self::empty();
        };

        let mut min = first.px_bounds().min;
        let mut max = first.px_bounds().max;
        for outlined in &outlines[1..] {
            let bounds = outlined.px_bounds();
            min.x = min.x.min(bounds.min.x);
            min.y = min.y.min(bounds.min.y);
            max.x = max.x.max(bounds.max.x);
            max.y = max.y.max(bounds.max.y);
        }

        let width = (max.x - min.x).ceil().max(0.0) as u32;
        let height = (max.y - min.y).ceil().max(0.0) as u32;
        let mut coverage = vec![0.0f32; width as usize * height as usize];

        for outlined in &outlines {
            let bounds = outlined.px_bounds();
            let off_x = (bounds.min.x - min.x) as u32;
            let off_y = (bounds.min.y - min.y) as u32;
            outlined.draw(|gx, gy, c| {
                let x = gx + off_x;
                let y = gy + off_y;
                if x < width && y < height {
                    let idx = (y * width + x) as usize;
                    coverage[idx] = (coverage[idx] + c).min(1.0);
                }
            });
        }

        // Baseline sits at y = 0 with y growing downwards.
        let middle = -(scaled.ascent() + scaled.descent()) / 2.0;
        let anchor = (caret / 2.0 - min.x, middle - min.y);

        Self {
            width,
            height,
            coverage,
            anchor,
        }
    }

    /// A mask with nothing in it.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            coverage: Vec::new(),
            anchor: (0.0, 0.0),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn anchor(&self) -> (f32, f32) {
        self.anchor
    }

    /// True if painting this mask cannot change any pixel.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.coverage.iter().all(|&c| c <= 0.0)
    }

    /// Coverage of the texel at integer coordinates, zero outside the mask.
    pub fn at(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0.0;
        }
        self.coverage[y as usize * self.width as usize + x as usize]
    }

    /// Bilinearly interpolated coverage at a continuous mask-space point.
    ///
    /// Texel centres sit at half-integer coordinates.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let u = x - 0.5;
        let v = y - 0.5;
        let x0 = u.floor();
        let y0 = v.floor();
        let fx = u - x0;
        let fy = v - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.at(x0, y0) * (1.0 - fx) + self.at(x0 + 1, y0) * fx;
        let bottom = self.at(x0, y0 + 1) * (1.0 - fx) + self.at(x0 + 1, y0 + 1) * fx;
        top * (1.0 - fy) + bottom * fy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> WatermarkFont {
        WatermarkFont::embedded().unwrap()
    }

    #[test]
    fn test_empty_text_gives_empty_mask() {
        let mask = TextMask::render(&font(), "", 24.0);
        assert!(mask.is_empty());
        assert_eq!(mask.width(), 0);
    }

    #[test]
    fn test_whitespace_gives_empty_mask() {
        assert!(TextMask::render(&font(), "   ", 24.0).is_empty());
    }

    #[test]
    fn test_newlines_render_as_spaces() {
        let font = font();
        let spaced = TextMask::render(&font, "A B", 24.0);
        assert_eq!(TextMask::render(&font, "A\nB", 24.0), spaced);
        assert_eq!(TextMask::render(&font, "A\tB", 24.0), spaced);
        assert!(TextMask::render(&font, "\n\r\n", 24.0).is_empty());
    }

    #[test]
    fn test_text_has_coverage() {
        let mask = TextMask::render(&font(), "SAMPLE", 24.0);
        assert!(!mask.is_empty());
        assert!(mask.width() > mask.height());
        assert!(mask.height() <= 30);
    }

    #[test]
    fn test_mask_grows_with_size() {
        let small = TextMask::render(&font(), "COPY", 12.0);
        let large = TextMask::render(&font(), "COPY", 48.0);
        assert!(large.width() > small.width() * 3);
        assert!(large.height() > small.height() * 3);
    }

    #[test]
    fn test_longer_text_is_wider() {
        let short = TextMask::render(&font(), "ID", 20.0);
        let long = TextMask::render(&font(), "ID CARD COPY", 20.0);
        assert!(long.width() > short.width());
    }

    #[test]
    fn test_anchor_is_near_centre() {
        let mask = TextMask::render(&font(), "HHHH", 40.0);
        let (ax, ay) = mask.anchor();
        let (w, h) = (mask.width() as f32, mask.height() as f32);
        assert!((ax - w / 2.0).abs() < w * 0.1, "anchor x {ax} for width {w}");
        assert!(ay > 0.0 && ay < h, "anchor y {ay} for height {h}");
    }

    #[test]
    fn test_missing_glyphs_still_render() {
        // The embedded face has no CJK outlines; .notdef boxes are drawn
        let mask = TextMask::render(&font(), "僅供", 24.0);
        assert!(!mask.is_empty());
    }

    #[test]
    fn test_coverage_is_bounded() {
        let mask = TextMask::render(&font(), "WW//\\\\", 32.0);
        for y in 0..mask.height() as i64 {
            for x in 0..mask.width() as i64 {
                let c = mask.at(x, y);
                assert!((0.0..=1.0).contains(&c));
            }
        }
    }

    #[test]
    fn test_sample_matches_texel_centres() {
        let mask = TextMask::render(&font(), "M", 30.0);
        for (x, y) in [(1, 1), (mask.width() as i64 / 2, mask.height() as i64 / 2)] {
            let sampled = mask.sample(x as f32 + 0.5, y as f32 + 0.5);
            assert!((sampled - mask.at(x, y)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sample_outside_is_zero() {
        let mask = TextMask::render(&font(), "M", 30.0);
        assert_eq!(mask.sample(-5.0, -5.0), 0.0);
        assert_eq!(mask.sample(mask.width() as f32 + 5.0, 2.0), 0.0);
    }
}

//! Page layout for assembled documents.
//!
//! Images are stacked top to bottom at full content width. All lengths are
//! millimetres measured from the top-left corner of the page.

use tracing::{debug, warn};

/// Convert millimetres to PDF points (1/72 inch).
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// Page size and spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    /// Same value on all four sides.
    pub margin: f32,
    /// Vertical space between stacked images.
    pub gap: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    /// A4 portrait (210mm x 297mm) with 10mm margins and gap.
    pub fn a4() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin: 10.0,
            gap: 10.0,
        }
    }

    /// Width available to each image.
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }
}

/// Where one image lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Zero-based page index.
    pub page: usize,
    pub x: f32,
    /// Distance from the top edge of the page to the top of the image.
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Placement {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Place images with the given aspect ratios (height / width), in order.
///
/// An image starts a new page only when it would cross the bottom edge and
/// is not the first on its page. A lone image taller than the page keeps
/// its size and runs off the bottom.
pub fn layout_pages(geometry: &PageGeometry, aspects: &[f32]) -> Vec<Placement> {
    let width = geometry.content_width();
    let mut page = 0;
    let mut y = geometry.margin;
    let mut first_on_page = true;
    let mut placements = Vec::with_capacity(aspects.len());

    for (index, &aspect) in aspects.iter().enumerate() {
        let height = width * aspect;

        if !first_on_page && y + height > geometry.height {
            page += 1;
            y = geometry.margin;
        }

        if y + height > geometry.height {
            warn!(
                index,
                page,
                height,
                page_height = geometry.height,
                "image taller than page, overflowing bottom edge"
            );
        }

        let placement = Placement {
            page,
            x: geometry.margin,
            y,
            width,
            height,
        };
        debug!(index, ?placement, "placed image");
        placements.push(placement);

        y += height + geometry.gap;
        first_on_page = false;
    }

    placements
}

/// Number of pages a layout occupies.
pub fn page_count(placements: &[Placement]) -> usize {
    placements.last().map_or(0, |p| p.page + 1)
}

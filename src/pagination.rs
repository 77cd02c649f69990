//! Pagination – slices one tall raster across fixed-size pages.
//!
//! The raster is scaled so its width matches the page width. Every page
//! shows the *same* full image, shifted upward by the height already
//! consumed; the page boundary clips each placement to a different slice.
//!
//! This module is pure: it works on image dimensions only and never touches
//! pixels or PDF objects.

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

/// A4 width in millimetres.
pub const A4_WIDTH_MM: f32 = 210.0;

/// A4 height in millimetres.
pub const A4_HEIGHT_MM: f32 = 297.0;

/// Remaining heights within this many millimetres of zero count as zero.
const HEIGHT_EPSILON_MM: f32 = 1e-3;

/// Physical page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    pub fn a4() -> Self {
        Self {
            width_mm: A4_WIDTH_MM,
            height_mm: A4_HEIGHT_MM,
        }
    }

    fn validate(&self) -> Result<()> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        if ok(self.width_mm) && ok(self.height_mm) {
            Ok(())
        } else {
            Err(ExportError::Config(format!(
                "page size must be positive, got {}x{} mm",
                self.width_mm, self.height_mm
            )))
        }
    }
}

/// What to do when the image height is an exact multiple of the page height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingPage {
    /// Stop once the image is covered: exactly ⌈H / P⌉ pages.
    #[default]
    Trim,
    /// Keep paginating while the remaining height is still ≥ 0, which adds a
    /// blank page after an image whose height is an exact multiple of the
    /// page height.
    Preserve,
}

/// Where the full image sits on one page, in millimetres from the page's
/// top-left corner. `y_mm` is zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePlacement {
    pub page_index: usize,
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// Height of the image on the page once its width is scaled to the page width.
pub fn scaled_image_height(image_width_px: u32, image_height_px: u32, geometry: &PageGeometry) -> Result<f32> {
    if image_width_px == 0 {
        return Err(ExportError::Raster("raster has zero width".to_string()));
    }
    geometry.validate()?;
    Ok(image_height_px as f32 * geometry.width_mm / image_width_px as f32)
}

/// Compute one placement per page.
pub fn paginate(
    image_width_px: u32,
    image_height_px: u32,
    geometry: &PageGeometry,
    trailing: TrailingPage,
) -> Result<Vec<PagePlacement>> {
    let image_height = scaled_image_height(image_width_px, image_height_px, geometry)?;
    let page_height = geometry.height_mm;

    let place = |page_index: usize, consumed: f32| PagePlacement {
        page_index,
        x_mm: 0.0,
        y_mm: -consumed,
        width_mm: geometry.width_mm,
        height_mm: image_height,
    };

    let mut placements = vec![place(0, 0.0)];
    let mut remaining = image_height - page_height;
    let mut consumed = 0.0f32;

    let more = |remaining: f32| match trailing {
        TrailingPage::Trim => remaining > HEIGHT_EPSILON_MM,
        TrailingPage::Preserve => remaining >= -HEIGHT_EPSILON_MM,
    };

    while more(remaining) {
        consumed += page_height;
        placements.push(place(placements.len(), consumed));
        remaining -= page_height;
    }

    log::debug!(
        "paginated {image_width_px}x{image_height_px} px raster ({image_height:.1} mm tall) onto {} page(s)",
        placements.len()
    );
    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(width_px: u32, height_px: u32, trailing: TrailingPage) -> Vec<PagePlacement> {
        paginate(width_px, height_px, &PageGeometry::a4(), trailing).unwrap()
    }

    #[test]
    fn short_image_fits_one_page() {
        let p = pages(1588, 1200, TrailingPage::Trim);
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].y_mm, 0.0);
        assert!((p[0].width_mm - 210.0).abs() < f32::EPSILON);
    }

    #[test]
    fn image_exactly_one_page_tall() {
        // 210 px wide → 1 px per mm.
        assert_eq!(pages(210, 297, TrailingPage::Trim).len(), 1);
    }

    #[test]
    fn page_count_is_ceiling() {
        // 1 px per mm: heights in mm equal heights in px.
        for (height, expected) in [(1, 1), (296, 1), (298, 2), (500, 2), (594, 2), (595, 3), (1000, 4)] {
            assert_eq!(
                pages(210, height, TrailingPage::Trim).len(),
                expected,
                "height {height}"
            );
        }
    }

    #[test]
    fn offsets_shift_by_page_height() {
        let p = pages(210, 800, TrailingPage::Trim);
        assert_eq!(p.len(), 3);
        for (i, placement) in p.iter().enumerate() {
            assert_eq!(placement.page_index, i);
            assert!((placement.y_mm + 297.0 * i as f32).abs() < 1e-3);
            assert!((placement.height_mm - 800.0).abs() < 1e-3);
        }
    }

    #[test]
    fn preserve_adds_trailing_page_on_exact_multiple() {
        assert_eq!(pages(210, 594, TrailingPage::Preserve).len(), 3);
        assert_eq!(pages(210, 297, TrailingPage::Preserve).len(), 2);
        // Non-multiples behave the same under both policies.
        assert_eq!(pages(210, 500, TrailingPage::Preserve).len(), 2);
        assert_eq!(pages(210, 100, TrailingPage::Preserve).len(), 1);
    }

    #[test]
    fn zero_height_is_one_page() {
        assert_eq!(pages(100, 0, TrailingPage::Trim).len(), 1);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(matches!(
            paginate(0, 100, &PageGeometry::a4(), TrailingPage::Trim),
            Err(ExportError::Raster(_))
        ));
        let bad = PageGeometry {
            width_mm: 210.0,
            height_mm: 0.0,
        };
        assert!(matches!(
            paginate(100, 100, &bad, TrailingPage::Trim),
            Err(ExportError::Config(_))
        ));
    }
}

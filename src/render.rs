//! PDF renderer – places one raster on every page using `printpdf`
//! (v0.8 ops-based API).

use printpdf::*;

use crate::error::{ExportError, Result};
use crate::pagination::{PageGeometry, PagePlacement};
use crate::raster::RasterImage;

/// Points per millimetre (72 pt per inch, 25.4 mm per inch).
const PT_PER_MM: f32 = 72.0 / 25.4;

/// Render the paginated raster into PDF bytes.
///
/// The image is registered once as an XObject and reused by every page; only
/// the placement offset differs between pages.
pub fn render_pdf(
    raster: &RasterImage,
    placements: &[PagePlacement],
    geometry: &PageGeometry,
    title: &str,
) -> Result<Vec<u8>> {
    if raster.width_px == 0 || raster.height_px == 0 {
        return Err(ExportError::Raster(format!(
            "cannot embed a {}x{} px raster",
            raster.width_px, raster.height_px
        )));
    }

    let mut doc = PdfDocument::new(title);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let image = RawImage::decode_from_bytes(&raster.jpeg, &mut warnings)
        .map_err(|e| ExportError::Pdf(format!("image encode error: {e}")))?;
    if !warnings.is_empty() {
        log::debug!("printpdf reported {} warning(s) decoding the raster", warnings.len());
    }
    let xobj_id = doc.add_image(&image);

    let page_w = Mm(geometry.width_mm);
    let page_h = Mm(geometry.height_mm);
    let page_height_pt = geometry.height_mm * PT_PER_MM;

    let mut pages = Vec::with_capacity(placements.len());
    for placement in placements {
        let width_pt = placement.width_mm * PT_PER_MM;
        let height_pt = placement.height_mm * PT_PER_MM;

        // PDF origin is bottom-left; placements are measured from the top-left.
        // translate_y = bottom edge of the image in PDF coordinates.
        let top_pt = placement.y_mm * PT_PER_MM;
        let bottom_y = page_height_pt - top_pt - height_pt;

        // At dpi=72 printpdf renders 1 px = 1 pt, so
        // scale = desired_pt / px_dim.
        let ops = vec![Op::UseXobject {
            id: xobj_id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(placement.x_mm * PT_PER_MM)),
                translate_y: Some(Pt(bottom_y)),
                dpi: Some(72.0),
                scale_x: Some(width_pt / raster.width_px as f32),
                scale_y: Some(height_pt / raster.height_px as f32),
                rotate: None,
            },
        }];
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let bytes = doc.save(&save_options(raster.quality), &mut Vec::new());
    log::debug!("rendered {} page(s), {} bytes", placements.len().max(1), bytes.len());
    Ok(bytes)
}

/// Save options that embed the raster at its own size and JPEG quality.
///
/// printpdf re-encodes image XObjects on save; its defaults would drop to
/// quality 85 and downsample anything estimated above 2MB.
fn save_options(quality: u8) -> PdfSaveOptions {
    PdfSaveOptions {
        image_optimization: Some(ImageOptimizationOptions {
            // printpdf scales this by 100 before handing it to the encoder.
            quality: Some(f32::from(quality) / 100.0),
            max_image_size: None,
            dither_greyscale: Some(false),
            convert_to_greyscale: Some(false),
            auto_optimize: Some(false),
            format: Some(ImageCompression::Jpeg),
        }),
        ..PdfSaveOptions::default()
    }
}

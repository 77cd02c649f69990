//! Export – ties together view refresh, layout, rasterization, pagination,
//! and PDF rendering into a single call.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};
use crate::fonts::FontManager;
use crate::layout::{BusinessProfile, LayoutPresenter, DEFAULT_REGION_WIDTH};
use crate::pagination::{paginate, PageGeometry, PagePlacement, TrailingPage};
use crate::preview::Presenter;
use crate::raster::{encode_jpeg, Rasterizer};
use crate::region::InvoiceLayout;
use crate::render::render_pdf;
use crate::session::InvoiceSession;
use crate::view::InvoiceView;

/// Used in the filename when the customer name has nothing printable.
pub const DEFAULT_FILENAME_TOKEN: &str = "Customer";

/// Configuration for the export pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Document title embedded in the PDF metadata (default: the filename stem).
    pub title: Option<String>,
    /// Page size (default: A4, 210 × 297 mm).
    pub page: PageGeometry,
    /// Device pixels per CSS px when rasterizing (default: 2.0).
    pub scale: f32,
    /// JPEG quality of the embedded raster, 1–100 (default: 98).
    pub jpeg_quality: u8,
    /// Handling of an image whose height is an exact multiple of the page height.
    pub trailing_page: TrailingPage,
    /// Width of the invoice region in CSS px (default: 794).
    pub region_width_px: f32,
    pub business: BusinessProfile,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            title: None,
            page: PageGeometry::a4(),
            scale: 2.0,
            jpeg_quality: 98,
            trailing_page: TrailingPage::Trim,
            region_width_px: DEFAULT_REGION_WIDTH,
            business: BusinessProfile::default(),
        }
    }
}

impl ExportConfig {
    /// Parse a JSON config; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ExportError::Config(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// A finished export, ready to be saved under its filename.
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub placements: Vec<PagePlacement>,
    pub raster_width_px: u32,
    pub raster_height_px: u32,
}

impl ExportedPdf {
    pub fn page_count(&self) -> usize {
        self.placements.len()
    }

    /// Write `<dir>/<filename>`, creating `dir` if necessary.
    pub fn save_into(&self, dir: &Path) -> Result<PathBuf> {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Derive `Invoice_<name>.pdf` from the customer name.
///
/// Everything outside ASCII letters, digits, `_`, `-` and space is removed
/// (nothing is replaced or collapsed), then the result is trimmed.
pub fn export_filename(customer_name: &str) -> String {
    let kept: String = customer_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
        .collect();
    let name = kept.trim();
    let name = if name.is_empty() { DEFAULT_FILENAME_TOKEN } else { name };
    format!("Invoice_{name}.pdf")
}

/// Lay out the invoice region for a view.
pub fn compute_region(view: &InvoiceView, fonts: &FontManager, config: &ExportConfig) -> Result<InvoiceLayout> {
    LayoutPresenter {
        fonts,
        profile: &config.business,
        region_width: config.region_width_px,
    }
    .present(view)
}

/// Full pipeline: current form state → PDF bytes and filename.
///
/// The session is re-rendered first so the export always reflects the latest
/// state, then the region is laid out, rasterized (the one await point),
/// JPEG-encoded, paginated and rendered.
pub async fn export_pdf<R: Rasterizer>(
    session: &mut InvoiceSession,
    fonts: &FontManager,
    rasterizer: &R,
    config: &ExportConfig,
) -> Result<ExportedPdf> {
    let filename = export_filename(&session.state().customer_name);
    let view = session.refresh().clone();

    let region = compute_region(&view, fonts, config)?;
    let canvas = rasterizer.rasterize(&region, config.scale).await?;
    let raster = encode_jpeg(&canvas, config.jpeg_quality)?;

    let placements = paginate(
        raster.width_px,
        raster.height_px,
        &config.page,
        config.trailing_page,
    )?;

    let title = config
        .title
        .clone()
        .unwrap_or_else(|| filename.trim_end_matches(".pdf").to_string());
    let bytes = render_pdf(&raster, &placements, &config.page, &title)?;

    log::info!(
        "exported {} ({} page(s), {}x{} px raster, {} bytes)",
        filename,
        placements.len(),
        raster.width_px,
        raster.height_px,
        bytes.len()
    );

    Ok(ExportedPdf {
        filename,
        bytes,
        placements,
        raster_width_px: raster.width_px,
        raster_height_px: raster.height_px,
    })
}

/// Drive [`export_pdf`] to completion on the current thread.
pub fn export_pdf_blocking<R: Rasterizer>(
    session: &mut InvoiceSession,
    fonts: &FontManager,
    rasterizer: &R,
    config: &ExportConfig,
) -> Result<ExportedPdf> {
    futures::executor::block_on(export_pdf(session, fonts, rasterizer, config))
}

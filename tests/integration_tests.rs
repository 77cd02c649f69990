//! Integration tests for the invoice preview and export pipeline.
//!
//! These tests validate:
//! - View derivation (titles, badge, hidden rows, clamping)
//! - Filename sanitization
//! - Layout contains exactly the visible rows
//! - Pagination page counts for real rasters
//! - PDF output exists and has valid format

use std::io::Cursor;

use cleaner_invoice::export::{
    compute_region, export_filename, export_pdf_blocking, ExportConfig,
};
use cleaner_invoice::fonts::FontManager;
use cleaner_invoice::form::{InvoiceFormState, CUSTOM_SERVICE, DEPOSIT_ONLY_SERVICE};
use cleaner_invoice::pagination::TrailingPage;
use cleaner_invoice::raster::{LayoutRasterizer, Rasterizer, StaticRasterizer};
use cleaner_invoice::region::InvoiceLayout;
use cleaner_invoice::samples;
use cleaner_invoice::session::InvoiceSession;
use cleaner_invoice::view::render_view;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};

// =====================================================================
// Helper
// =====================================================================

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([250, 250, 250]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Integer value following every `key` token in a PDF.
fn pdf_ints(bytes: &[u8], key: &[u8]) -> Vec<u32> {
    let mut values = Vec::new();
    let mut i = 0;
    while let Some(pos) = bytes[i..].windows(key.len()).position(|w| w == key) {
        let mut j = i + pos + key.len();
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if let Ok(value) = std::str::from_utf8(&bytes[start..j]).unwrap().parse() {
            values.push(value);
        }
        i = j.max(i + pos + 1);
    }
    values
}

fn export_with_layout(state: InvoiceFormState, config: &ExportConfig) -> cleaner_invoice::ExportedPdf {
    let fonts = FontManager::default();
    let mut session = InvoiceSession::new(state);
    export_pdf_blocking(&mut session, &fonts, &LayoutRasterizer::new(&fonts), config).unwrap()
}

// =====================================================================
// View derivation
// =====================================================================

#[test]
fn base_title_follows_selection() {
    let mut state = InvoiceFormState {
        base_service: "Windows".to_string(),
        ..Default::default()
    };
    assert_eq!(render_view(&state).base.description, "Windows");

    state.base_service = CUSTOM_SERVICE.to_string();
    state.custom_service = "   ".to_string();
    assert_eq!(render_view(&state).base.description, "Custom Service");

    state.base_service = DEPOSIT_ONLY_SERVICE.to_string();
    assert_eq!(render_view(&state).base.description, "Deposit");
}

#[test]
fn badge_is_paid_only_for_exact_value() {
    for (status, expected) in [("PAID", "PAID"), ("paid", "UNPAID"), (" PAID", "UNPAID"), ("", "UNPAID")] {
        let state = InvoiceFormState {
            status: status.to_string(),
            ..Default::default()
        };
        assert_eq!(render_view(&state).badge.text, expected, "status {status:?}");
    }
}

#[test]
fn disabled_flags_hide_rows_and_negatives_render_zero() {
    let mut state = InvoiceFormState {
        base_amount: "abc".to_string(),
        gst_amount: "-5".to_string(),
        discount_amount: "20".to_string(),
        deposit_amount: "-1".to_string(),
        total_override: "".to_string(),
        ..Default::default()
    };
    let view = render_view(&state);
    assert_eq!(view.base.amount, "$0.00");
    assert!(!view.gst.visible && !view.discount.visible && !view.deposit.visible);
    assert_eq!(view.total, "$0.00");

    state.gst_included = true;
    state.deposit_shown = true;
    let view = render_view(&state);
    assert_eq!(view.gst.amount, "$0.00");
    assert_eq!(view.deposit.amount, "-0.00");
}

#[test]
fn session_render_is_idempotent() {
    let mut session = InvoiceSession::new(samples::custom_paid());
    let first = session.view().clone();
    assert_eq!(session.refresh(), &first);
    assert_eq!(render_view(session.state()), first);
}

#[test]
fn set_field_recomputes_view() {
    let mut session = InvoiceSession::new(samples::regular_clean());
    let view = session.set_field("status", "PAID").unwrap();
    assert_eq!(view.badge.text, "PAID");
    assert!(session.set_field("notAField", "x").is_err());
    assert_eq!(session.view().badge.text, "PAID");
}

// =====================================================================
// Filename
// =====================================================================

#[test]
fn filename_examples() {
    assert_eq!(export_filename("John/Doe!!"), "Invoice_JohnDoe.pdf");
    assert_eq!(export_filename(""), "Invoice_Customer.pdf");
    assert_eq!(export_filename("Harbour View Realty"), "Invoice_Harbour View Realty.pdf");
}

// =====================================================================
// Layout
// =====================================================================

#[test]
fn layout_contains_visible_rows_only() {
    let fonts = FontManager::default();
    let config = ExportConfig::default();
    let view = render_view(&samples::regular_clean());
    let region = compute_region(&view, &fonts, &config).unwrap();
    let texts = region.texts();

    assert!(texts.iter().any(|t| t == "Regular Clean"));
    assert!(texts.iter().any(|t| t == "GST"));
    assert!(!texts.iter().any(|t| t == "Discount"));
    assert!(!texts.iter().any(|t| t == "Deposit"));
    assert!((region.width - 794.0).abs() < 0.5);
}

#[test]
fn layout_json_roundtrip() {
    let fonts = FontManager::default();
    let view = render_view(&samples::custom_paid());
    let region = compute_region(&view, &fonts, &ExportConfig::default()).unwrap();
    let parsed = InvoiceLayout::from_json(&region.to_json()).unwrap();
    assert_eq!(parsed.boxes.len(), region.boxes.len());
    assert!((parsed.height - region.height).abs() < 0.01);
    assert_eq!(parsed.texts(), region.texts());
}

// =====================================================================
// Rasterization
// =====================================================================

#[test]
fn raster_dimensions_scale_with_factor() {
    let fonts = FontManager::default();
    let view = render_view(&samples::regular_clean());
    let region = compute_region(&view, &fonts, &ExportConfig::default()).unwrap();
    let rasterizer = LayoutRasterizer::new(&fonts);

    let one = futures::executor::block_on(rasterizer.rasterize(&region, 1.0)).unwrap();
    let two = futures::executor::block_on(rasterizer.rasterize(&region, 2.0)).unwrap();
    assert_eq!(two.width(), 2 * one.width());
    assert!(two.height().abs_diff(2 * one.height()) <= 1);
}

#[test]
fn raster_is_deterministic() {
    let fonts = FontManager::default();
    let view = render_view(&samples::deposit_only());
    let region = compute_region(&view, &fonts, &ExportConfig::default()).unwrap();
    let rasterizer = LayoutRasterizer::new(&fonts);

    let digest = || {
        let canvas = futures::executor::block_on(rasterizer.rasterize(&region, 2.0)).unwrap();
        Sha256::digest(canvas.as_raw())
    };
    assert_eq!(digest(), digest());
}

// =====================================================================
// Export
// =====================================================================

#[test]
fn export_single_page_invoice() {
    let exported = export_with_layout(samples::regular_clean(), &ExportConfig::default());
    assert_valid_pdf(&exported.bytes);
    assert_eq!(exported.filename, "Invoice_Priya Natarajan.pdf");
    assert_eq!(exported.page_count(), 1);
    assert_eq!(exported.raster_width_px, 1588);
}

#[test]
fn embedded_image_keeps_raster_size() {
    let exported = export_with_layout(samples::regular_clean(), &ExportConfig::default());
    assert_eq!(pdf_ints(&exported.bytes, b"/Width"), vec![exported.raster_width_px]);
    assert_eq!(pdf_ints(&exported.bytes, b"/Height"), vec![exported.raster_height_px]);
    assert!(exported.bytes.windows(10).any(|w| w == b"/DCTDecode"));

    // The long invoice embeds one tall image shared by every page.
    let long = export_with_layout(samples::itemised(), &ExportConfig::default());
    assert!(long.page_count() >= 2);
    assert_eq!(pdf_ints(&long.bytes, b"/Width"), vec![long.raster_width_px]);
    assert_eq!(pdf_ints(&long.bytes, b"/Height"), vec![long.raster_height_px]);
}

#[test]
fn export_long_invoice_spans_pages() {
    let exported = export_with_layout(samples::itemised(), &ExportConfig::default());
    assert_valid_pdf(&exported.bytes);
    assert!(exported.page_count() >= 2, "got {} page(s)", exported.page_count());
    for (i, placement) in exported.placements.iter().enumerate() {
        assert!((placement.y_mm + 297.0 * i as f32).abs() < 1e-2);
    }
}

#[test]
fn export_static_raster_pages_by_ceiling() {
    // 210 px wide: one pixel per millimetre on A4.
    let rasterizer = StaticRasterizer::from_bytes(&png_bytes(210, 700)).unwrap();
    let fonts = FontManager::default();
    let mut session = InvoiceSession::new(samples::blank());
    let exported =
        export_pdf_blocking(&mut session, &fonts, &rasterizer, &ExportConfig::default()).unwrap();
    assert_valid_pdf(&exported.bytes);
    assert_eq!(exported.page_count(), 3);
    assert_eq!(exported.filename, "Invoice_Customer.pdf");
}

#[test]
fn trailing_page_policy_on_exact_multiple() {
    let rasterizer = StaticRasterizer::from_bytes(&png_bytes(210, 594)).unwrap();
    let fonts = FontManager::default();
    let mut session = InvoiceSession::default();

    let trim = export_pdf_blocking(&mut session, &fonts, &rasterizer, &ExportConfig::default()).unwrap();
    assert_eq!(trim.page_count(), 2);

    let config = ExportConfig {
        trailing_page: TrailingPage::Preserve,
        ..ExportConfig::default()
    };
    let preserve = export_pdf_blocking(&mut session, &fonts, &rasterizer, &config).unwrap();
    assert_eq!(preserve.page_count(), 3);
}

#[test]
fn export_reflects_latest_state() {
    let fonts = FontManager::default();
    let mut session = InvoiceSession::new(samples::regular_clean());
    session.update(|state| state.customer_name = "Ana/Lopez".to_string());
    let exported = export_pdf_blocking(
        &mut session,
        &fonts,
        &LayoutRasterizer::new(&fonts),
        &ExportConfig::default(),
    )
    .unwrap();
    assert_eq!(exported.filename, "Invoice_AnaLopez.pdf");
    assert_eq!(session.view().customer.name, "Ana/Lopez");
}

#[test]
fn exported_pdf_saves_under_its_filename() {
    let exported = export_with_layout(samples::deposit_only(), &ExportConfig::default());
    let dir = std::env::temp_dir().join(format!("cleaner-invoice-test-{}", std::process::id()));
    let path = exported.save_into(&dir).unwrap();
    assert_eq!(path.file_name().unwrap(), "Invoice_Mei Chen.pdf");
    assert_eq!(std::fs::read(&path).unwrap(), exported.bytes);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn pdf_output_is_stable_in_size() {
    let a = export_with_layout(samples::custom_paid(), &ExportConfig::default());
    let b = export_with_layout(samples::custom_paid(), &ExportConfig::default());

    // printpdf embeds timestamps, so byte-exact equality isn't guaranteed.
    let diff = (a.bytes.len() as i64 - b.bytes.len() as i64).unsigned_abs();
    assert!(diff < 200, "PDF outputs differ: {} vs {} bytes", a.bytes.len(), b.bytes.len());
}

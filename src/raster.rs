//! Rasterization – turns the invoice region into a single RGB image.
//!
//! [`Rasterizer`] is the asynchronous boundary of the export pipeline. The
//! built-in [`LayoutRasterizer`] paints the laid-out region itself; a
//! [`StaticRasterizer`] wraps a screenshot captured elsewhere (for example by
//! a browser host) so it can go through the same pagination and PDF path.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tiny_skia::{FillRule, Paint, Pixmap, Rect, Transform};

use crate::error::{ExportError, Result};
use crate::fonts::FontManager;
use crate::region::{InvoiceLayout, LayoutBox, Rgba, TextContent};

/// A rasterized region, JPEG-encoded for embedding.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width_px: u32,
    pub height_px: u32,
    pub jpeg: Vec<u8>,
    /// Quality `jpeg` was encoded at; the PDF writer re-encodes at the same.
    pub quality: u8,
}

/// Encode a canvas as a JPEG at the given quality (1–100).
pub fn encode_jpeg(canvas: &RgbImage, quality: u8) -> Result<RasterImage> {
    if !(1..=100).contains(&quality) {
        return Err(ExportError::Config(format!(
            "JPEG quality must be between 1 and 100, got {quality}"
        )));
    }
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality).encode_image(canvas)?;
    Ok(RasterImage {
        width_px: canvas.width(),
        height_px: canvas.height(),
        jpeg,
        quality,
    })
}

/// Produces a raster of the invoice region.
#[allow(async_fn_in_trait)]
pub trait Rasterizer {
    /// Rasterize `region` with every CSS px mapped to `scale` device pixels.
    async fn rasterize(&self, region: &InvoiceLayout, scale: f32) -> Result<RgbImage>;
}

/// Paints an [`InvoiceLayout`] onto an RGB canvas.
pub struct LayoutRasterizer<'a> {
    pub fonts: &'a FontManager,
}

impl<'a> LayoutRasterizer<'a> {
    pub fn new(fonts: &'a FontManager) -> Self {
        Self { fonts }
    }

    /// Synchronous painting; the async trait method delegates here.
    pub fn paint(&self, region: &InvoiceLayout, scale: f32) -> Result<RgbImage> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ExportError::Config(format!("raster scale must be positive, got {scale}")));
        }
        let width = (region.width * scale).ceil().max(1.0) as u32;
        let height = (region.height * scale).ceil().max(1.0) as u32;
        let mut canvas = Pixmap::new(width, height).ok_or_else(|| {
            ExportError::Raster(format!("cannot allocate a {width}x{height} px canvas"))
        })?;
        canvas.fill(tiny_skia::Color::WHITE);
        fill_rect(&mut canvas, 0.0, 0.0, width as f32, height as f32, region.background_color);

        for lbox in &region.boxes {
            self.paint_box(&mut canvas, lbox, scale);
        }
        log::debug!("rasterized region at {scale}x into {width}x{height} px");
        into_rgb(&canvas)
    }

    fn paint_box(&self, canvas: &mut Pixmap, lbox: &LayoutBox, scale: f32) {
        let (x, y) = (lbox.x * scale, lbox.y * scale);
        let (w, h) = (lbox.width * scale, lbox.height * scale);

        if let Some(bg) = lbox.background_color {
            fill_rect(canvas, x, y, w, h, bg);
        }

        if let Some(border) = &lbox.border {
            let t = (border.width * scale).max(1.0);
            fill_rect(canvas, x, y, w, t, border.color);
            fill_rect(canvas, x, y + h - t, w, t, border.color);
            fill_rect(canvas, x, y, t, h, border.color);
            fill_rect(canvas, x + w - t, y, t, h, border.color);
        }

        if let Some(text) = &lbox.text {
            self.paint_text(canvas, lbox, text, scale);
        }

        for child in &lbox.children {
            self.paint_box(canvas, child, scale);
        }
    }

    fn paint_text(&self, canvas: &mut Pixmap, lbox: &LayoutBox, text: &TextContent, scale: f32) {
        let ascender = self.fonts.ascender_px(text.font_size, text.bold);
        let descender = self.fonts.descender_px(text.font_size, text.bold);
        // Centre the glyph box inside the line box, like CSS half-leading.
        let baseline_in_line = (text.line_height - (ascender + descender)) / 2.0 + ascender;
        let paint = paint_for(text.color);

        for line in &text.lines {
            if line.text.trim().is_empty() {
                continue;
            }
            let origin_x = (lbox.x + line.x_offset) * scale;
            let baseline = (lbox.y + line.y_offset + baseline_in_line) * scale;

            match self.fonts.outline_text(&line.text, text.font_size * scale, text.bold) {
                Some(outline) => {
                    let Some(path) = outline.path else {
                        continue;
                    };
                    let at = Transform::from_translate(origin_x, baseline);
                    canvas.fill_path(&path, &paint, FillRule::Winding, at, None);
                    if outline.synthetic_bold {
                        let shift = (0.04 * text.font_size * scale).max(1.0);
                        let at = Transform::from_translate(origin_x + shift, baseline);
                        canvas.fill_path(&path, &paint, FillRule::Winding, at, None);
                    }
                }
                None => {
                    // No outlines: mark the run's extent so the layout stays legible.
                    let bar_top = baseline - ascender * 0.7 * scale;
                    let bar_height = ascender * 0.7 * scale;
                    let mut color = text.color;
                    color[3] *= 0.35;
                    fill_rect(canvas, origin_x, bar_top, line.width * scale, bar_height, color);
                }
            }
        }
    }
}

impl Rasterizer for LayoutRasterizer<'_> {
    async fn rasterize(&self, region: &InvoiceLayout, scale: f32) -> Result<RgbImage> {
        self.paint(region, scale)
    }
}

/// A pre-captured screenshot of the invoice region.
pub struct StaticRasterizer {
    image: RgbImage,
}

impl StaticRasterizer {
    /// Decode PNG or JPEG bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?.to_rgb8();
        Ok(Self { image })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Decode a `data:image/...;base64,...` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let bytes = parse_data_uri(uri).map_err(ExportError::Raster)?;
        Self::from_bytes(&bytes)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl Rasterizer for StaticRasterizer {
    async fn rasterize(&self, _region: &InvoiceLayout, _scale: f32) -> Result<RgbImage> {
        log::debug!(
            "using pre-captured raster {}x{} px",
            self.image.width(),
            self.image.height()
        );
        Ok(self.image.clone())
    }
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
///
/// Returns `Err` if `src` is not a data URI or does not use base64 encoding.
fn parse_data_uri(src: &str) -> std::result::Result<Vec<u8>, String> {
    let rest = src.strip_prefix("data:").ok_or_else(|| {
        let preview: String = src.chars().take(80).collect();
        format!("screenshot must be a base64 data URI (e.g. `data:image/png;base64,...`), got {preview:?}")
    })?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| "invalid data URI: missing `,` separator between header and data".to_string())?;
    if !header.contains(";base64") {
        return Err("only base64-encoded data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(data.trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn paint_for(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(channel(color[0]), channel(color[1]), channel(color[2]), channel(color[3]));
    paint.anti_alias = true;
    paint
}

/// Fill an axis-aligned rectangle, clipped to the canvas.
fn fill_rect(canvas: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
    if let Some(rect) = Rect::from_xywh(x, y, w, h) {
        canvas.fill_rect(rect, &paint_for(color), Transform::identity(), None);
    }
}

/// Drop the alpha channel. The canvas starts opaque white, so premultiplied
/// and straight colour agree.
fn into_rgb(canvas: &Pixmap) -> Result<RgbImage> {
    let rgb: Vec<u8> = canvas
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(canvas.width(), canvas.height(), rgb)
        .ok_or_else(|| ExportError::Raster("canvas size does not match its pixels".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use image::Rgb;
    use crate::region::WHITE;

    fn region_with_box(lbox: LayoutBox) -> InvoiceLayout {
        InvoiceLayout {
            width: 100.0,
            height: 50.0,
            background_color: WHITE,
            boxes: vec![lbox],
        }
    }

    #[test]
    fn canvas_scales_with_factor() {
        let fonts = FontManager::default();
        let region = region_with_box(LayoutBox::new(0.0, 0.0, 10.0, 10.0));
        let canvas = LayoutRasterizer::new(&fonts).paint(&region, 2.0).unwrap();
        assert_eq!(canvas.dimensions(), (200, 100));
    }

    #[test]
    fn rejects_non_positive_scale() {
        let fonts = FontManager::default();
        let region = region_with_box(LayoutBox::new(0.0, 0.0, 10.0, 10.0));
        assert!(LayoutRasterizer::new(&fonts).paint(&region, 0.0).is_err());
    }

    #[test]
    fn backgrounds_are_painted() {
        let fonts = FontManager::default();
        let mut lbox = LayoutBox::new(10.0, 10.0, 20.0, 20.0);
        lbox.background_color = Some([1.0, 0.0, 0.0, 1.0]);
        let canvas = LayoutRasterizer::new(&fonts)
            .paint(&region_with_box(lbox), 2.0)
            .unwrap();
        assert_eq!(*canvas.get_pixel(40, 40), Rgb([255, 0, 0]));
        assert_eq!(*canvas.get_pixel(5, 5), Rgb([255, 255, 255]));
    }

    #[test]
    fn path_fill_covers_interior() {
        let mut canvas = Pixmap::new(20, 20).unwrap();
        canvas.fill(tiny_skia::Color::WHITE);
        let square = tiny_skia::PathBuilder::from_rect(Rect::from_xywh(2.0, 2.0, 10.0, 10.0).unwrap());
        let paint = paint_for([0.0, 0.0, 0.0, 1.0]);
        canvas.fill_path(&square, &paint, FillRule::Winding, Transform::identity(), None);
        let rgb = into_rgb(&canvas).unwrap();
        assert_eq!(*rgb.get_pixel(6, 6), Rgb([0, 0, 0]));
        assert_eq!(*rgb.get_pixel(15, 15), Rgb([255, 255, 255]));
    }

    #[test]
    fn translucent_fill_blends_over_background() {
        let fonts = FontManager::default();
        let mut lbox = LayoutBox::new(0.0, 0.0, 10.0, 10.0);
        lbox.background_color = Some([0.0, 0.0, 0.0, 0.5]);
        let canvas = LayoutRasterizer::new(&fonts)
            .paint(&region_with_box(lbox), 1.0)
            .unwrap();
        let px = canvas.get_pixel(5, 5);
        assert!(px[0].abs_diff(128) <= 1, "got {px:?}");
    }

    #[test]
    fn jpeg_encoding_keeps_dimensions() {
        let canvas = RgbImage::from_pixel(30, 70, Rgb([200, 200, 200]));
        let raster = encode_jpeg(&canvas, 98).unwrap();
        assert_eq!((raster.width_px, raster.height_px), (30, 70));
        assert_eq!(&raster.jpeg[0..2], &[0xFF, 0xD8]);
        assert!(encode_jpeg(&canvas, 0).is_err());
    }

    #[test]
    fn data_uri_screenshot() {
        let canvas = RgbImage::from_pixel(4, 6, Rgb([0, 128, 0]));
        let raster = encode_jpeg(&canvas, 90).unwrap();
        let uri = format!("data:image/jpeg;base64,{}", BASE64_STD.encode(&raster.jpeg));
        let rasterizer = StaticRasterizer::from_data_uri(&uri).unwrap();
        assert_eq!(rasterizer.dimensions(), (4, 6));

        assert!(StaticRasterizer::from_data_uri("shot.png").is_err());
        assert!(StaticRasterizer::from_data_uri("data:image/png,abc").is_err());
    }
}

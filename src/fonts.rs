//! Font loading, text measurement and glyph outlines using `ttf-parser`.
//! Installed faces are found through `fontdb`; outlines are handed to the
//! rasterizer as `tiny-skia` paths.
//!
//! Without a TrueType file the manager falls back to Helvetica-like synthetic
//! metrics: layout still works, but the rasterizer has no outlines to fill
//! and draws text runs as bars instead.

use std::collections::HashMap;
use std::path::Path;

use tiny_skia::PathBuilder;
use ttf_parser::OutlineBuilder;

use crate::error::{ExportError, Result};

/// Family name used by the invoice layout.
pub const SANS: &str = "Sans";

/// Families tried, in order, when picking system faces.
const PREFERRED_FAMILIES: &[fontdb::Family<'static>] = &[
    fontdb::Family::Name("Helvetica"),
    fontdb::Family::Name("Arial"),
    fontdb::Family::Name("Liberation Sans"),
    fontdb::Family::Name("DejaVu Sans"),
    fontdb::Family::Name("Noto Sans"),
    fontdb::Family::SansSerif,
];

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes; empty for synthetic metrics.
    pub bytes: Vec<u8>,
    /// Face index inside a collection file.
    pub index: u32,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
}

impl FontData {
    fn synthetic() -> Self {
        Self {
            bytes: Vec::new(),
            index: 0,
            units_per_em: 1000.0,
            ascender: 750.0,
            descender: -250.0,
        }
    }

    fn is_synthetic(&self) -> bool {
        self.bytes.is_empty()
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.bytes, self.index).ok()
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
}

/// Glyph outlines of a text run, in px relative to the run's left baseline
/// origin (y grows downward).
#[derive(Debug, Clone)]
pub struct TextOutline {
    /// `None` when no glyph in the run has an outline (spaces only).
    pub path: Option<tiny_skia::Path>,
    /// Bold was requested but only a regular face is loaded.
    pub synthetic_bold: bool,
}

/// Manages loaded fonts.
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    default_key: FontKey,
    fallback: FontData,
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            default_key: FontKey {
                family: SANS.to_string(),
                bold: false,
            },
            fallback: FontData::synthetic(),
        }
    }

    /// Load a TTF/OTF font from bytes.
    pub fn load_font(&mut self, family: &str, bold: bool, bytes: Vec<u8>) -> Result<()> {
        self.load_face(family, bold, bytes, 0)
    }

    /// Load face `index` of a TTF/OTF/TTC file from bytes.
    pub fn load_face(&mut self, family: &str, bold: bool, bytes: Vec<u8>, index: u32) -> Result<()> {
        let face = ttf_parser::Face::parse(&bytes, index)
            .map_err(|e| ExportError::Font(format!("failed to parse font: {e}")))?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            index,
            bytes,
        };

        let key = FontKey {
            family: family.to_string(),
            bold,
        };
        if !bold && self.get(&self.default_key).is_synthetic() {
            self.default_key = key.clone();
        }
        self.fonts.insert(key, data);
        Ok(())
    }

    /// Load a font file into the [`SANS`] family.
    pub fn load_font_file(&mut self, path: &Path, bold: bool) -> Result<()> {
        let bytes = std::fs::read(path).map_err(|e| {
            ExportError::Font(format!("cannot read '{}': {e}", path.display()))
        })?;
        self.load_font(SANS, bold, bytes)?;
        log::debug!("loaded {} font from {}", if bold { "bold" } else { "regular" }, path.display());
        Ok(())
    }

    /// Query the installed fonts for a sans-serif regular/bold pair.
    /// Falls back to synthetic metrics when nothing usable is found.
    pub fn discover_system_fonts() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        log::debug!("font database holds {} face(s)", db.len());
        Self::from_database(&db)
    }

    /// Pick the [`SANS`] regular and bold faces from a font database.
    ///
    /// A bold query that only resolves to a lighter face is skipped, so bold
    /// text falls back to faux bold instead of silently rendering regular.
    pub fn from_database(db: &fontdb::Database) -> Self {
        let mut mgr = Self::new();
        for bold in [false, true] {
            let query = fontdb::Query {
                families: PREFERRED_FAMILIES,
                weight: if bold { fontdb::Weight::BOLD } else { fontdb::Weight::NORMAL },
                stretch: fontdb::Stretch::Normal,
                style: fontdb::Style::Normal,
            };
            let Some(id) = db.query(&query) else {
                continue;
            };
            let Some(info) = db.face(id) else {
                continue;
            };
            if bold && info.weight < fontdb::Weight::SEMIBOLD {
                log::debug!("no bold face for '{}'; using faux bold", info.post_script_name);
                continue;
            }
            let loaded = db.with_face_data(id, |data, index| {
                mgr.load_face(SANS, bold, data.to_vec(), index)
            });
            match loaded {
                Some(Ok(())) => log::debug!(
                    "using '{}' for {} text",
                    info.post_script_name,
                    if bold { "bold" } else { "regular" }
                ),
                Some(Err(e)) => log::debug!("ignoring face '{}': {e}", info.post_script_name),
                None => log::debug!("face '{}' has no readable data", info.post_script_name),
            }
        }
        if !mgr.has_real_fonts() {
            log::warn!("no system TrueType font found; text will be rasterized as placeholder bars");
        }
        mgr
    }

    /// Get font data for a key, falling back to the regular face and then to
    /// synthetic metrics.
    pub fn get(&self, key: &FontKey) -> &FontData {
        self.fonts
            .get(key)
            .or_else(|| self.fonts.get(&self.default_key))
            .unwrap_or(&self.fallback)
    }

    fn key(bold: bool) -> FontKey {
        FontKey {
            family: SANS.to_string(),
            bold,
        }
    }

    /// Measure the width of a string at a given font size (in px).
    /// With real font bytes we sum glyph advances, otherwise we use an
    /// average character width heuristic (0.5 × font_size per char).
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        let data = self.get(&Self::key(bold));

        if data.is_synthetic() {
            // Bold is ~10 % wider.
            let avg = if bold { 0.55 } else { 0.5 };
            return text.chars().count() as f32 * font_size * avg;
        }

        match data.face() {
            Some(face) => {
                let scale = font_size / data.units_per_em;
                text.chars()
                    .map(|ch| match face.glyph_index(ch) {
                        Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        None => font_size * 0.5,
                    })
                    .sum()
            }
            None => text.chars().count() as f32 * font_size * 0.5,
        }
    }

    /// Line height in px.
    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    /// Ascender in px for the given weight.
    pub fn ascender_px(&self, font_size: f32, bold: bool) -> f32 {
        let data = self.get(&Self::key(bold));
        data.ascender * font_size / data.units_per_em
    }

    /// Descender depth in px (positive).
    pub fn descender_px(&self, font_size: f32, bold: bool) -> f32 {
        let data = self.get(&Self::key(bold));
        -data.descender * font_size / data.units_per_em
    }

    /// Check if real font bytes are loaded for the default font.
    pub fn has_real_fonts(&self) -> bool {
        !self.get(&self.default_key).is_synthetic()
    }

    /// Glyph outlines for a run of text, or `None` when only synthetic
    /// metrics are available.
    pub fn outline_text(&self, text: &str, font_size: f32, bold: bool) -> Option<TextOutline> {
        let key = Self::key(bold);
        let synthetic_bold = bold && !self.fonts.contains_key(&key);
        let data = self.get(&key);
        if data.is_synthetic() {
            return None;
        }
        let face = data.face()?;
        let mut sink = GlyphPath::new(font_size / data.units_per_em);
        for ch in text.chars() {
            match face.glyph_index(ch) {
                Some(gid) => {
                    face.outline_glyph(gid, &mut sink);
                    sink.origin_x += face.glyph_hor_advance(gid).unwrap_or(0) as f32 * sink.scale;
                }
                None => sink.origin_x += font_size * 0.5,
            }
        }

        Some(TextOutline {
            path: sink.builder.finish(),
            synthetic_bold,
        })
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Feeds `ttf-parser` glyph outlines into a `tiny-skia` path, scaled to px
/// and flipped so y grows downward.
struct GlyphPath {
    scale: f32,
    origin_x: f32,
    builder: PathBuilder,
}

impl GlyphPath {
    fn new(scale: f32) -> Self {
        Self {
            scale,
            origin_x: 0.0,
            builder: PathBuilder::new(),
        }
    }

    fn x(&self, x: f32) -> f32 {
        self.origin_x + x * self.scale
    }

    fn y(&self, y: f32) -> f32 {
        -y * self.scale
    }
}

impl OutlineBuilder for GlyphPath {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(self.x(x), self.y(y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(self.x(x), self.y(y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(self.x(x1), self.y(y1), self.x(x), self.y(y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(
            self.x(x1),
            self.y(y1),
            self.x(x2),
            self.y(y2),
            self.x(x),
            self.y(y),
        );
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Word-wrap text to fit within `max_width` pixels. Returns a vec of lines.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in &words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current_line, word)
            };
            let w = fonts.measure_text_width(&candidate, font_size, bold);
            if w > max_width && !current_line.is_empty() {
                lines.push(current_line);
                current_line = word.to_string();
            } else {
                current_line = candidate;
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::default();
        let w = mgr.measure_text_width("Hello", 16.0, false);
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
        assert!(mgr.measure_text_width("Hello", 16.0, true) > w);
    }

    #[test]
    fn synthetic_fonts_have_no_outlines() {
        let mgr = FontManager::default();
        assert!(!mgr.has_real_fonts());
        assert!(mgr.outline_text("Total", 14.0, false).is_none());
        assert!((mgr.ascender_px(20.0, false) - 15.0).abs() < 0.01);
        assert!((mgr.descender_px(20.0, false) - 5.0).abs() < 0.01);
    }

    #[test]
    fn garbage_font_bytes_are_rejected() {
        let mut mgr = FontManager::new();
        let err = mgr.load_font(SANS, false, vec![0u8; 16]).unwrap_err();
        assert!(matches!(err, ExportError::Font(_)));
        assert!(!mgr.has_real_fonts());
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::default();
        let lines = wrap_text("Hello world foo bar", 16.0, false, 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
    }

    #[test]
    fn glyph_path_flips_and_scales() {
        let mut sink = GlyphPath::new(0.01);
        sink.origin_x = 5.0;
        sink.move_to(0.0, 0.0);
        sink.line_to(100.0, 0.0);
        sink.quad_to(100.0, 100.0, 0.0, 100.0);
        sink.close();
        let bounds = sink.builder.finish().unwrap().bounds();
        assert!((bounds.left() - 5.0).abs() < 1e-4);
        assert!((bounds.right() - 6.0).abs() < 1e-4);
        // y axis is flipped
        assert!((bounds.top() + 1.0).abs() < 1e-4);
        assert!(bounds.bottom().abs() < 1e-4);
    }

    #[test]
    fn empty_database_falls_back_to_synthetic() {
        let db = fontdb::Database::new();
        let mgr = FontManager::from_database(&db);
        assert!(!mgr.has_real_fonts());
        assert!(mgr.outline_text("Total", 14.0, false).is_none());
    }

    #[test]
    fn system_faces_have_outlines_when_installed() {
        let mgr = FontManager::discover_system_fonts();
        if !mgr.has_real_fonts() {
            return;
        }
        let outline = mgr.outline_text("Total", 28.0, false).unwrap();
        let bounds = outline.path.as_ref().unwrap().bounds();
        assert!(bounds.width() > 10.0);
        // Glyphs sit above the baseline.
        assert!(bounds.top() < 0.0);

        // Reloading the chosen face through the database keeps metrics.
        let mut db = fontdb::Database::new();
        db.load_font_data(mgr.get(&FontManager::key(false)).bytes.clone());
        assert!(FontManager::from_database(&db).has_real_fonts());
        assert!(mgr.outline_text("   ", 28.0, false).unwrap().path.is_none());
    }
}

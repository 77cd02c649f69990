//! Invoice region – the laid-out, render-ready form of an invoice view.
//!
//! This is the "frozen" structure between layout and rasterization: a tree
//! of positioned boxes in CSS px at 1x, with origin at the top-left corner
//! of the region.

use serde::{Deserialize, Serialize};

/// RGBA colour (0.0 – 1.0).
pub type Rgba = [f32; 4];

pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];

/// A complete laid-out invoice region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLayout {
    pub width: f32,
    pub height: f32,
    pub background_color: Rgba,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    /// Position relative to the region's top-left corner, in px.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<Rgba>,
    pub border: Option<BorderStyle>,
    pub text: Option<TextContent>,

    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderStyle {
    pub width: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// Pre-wrapped lines of text.
    pub lines: Vec<TextLine>,
    pub font_size: f32,
    pub bold: bool,
    pub color: Rgba,
    pub line_height: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// X offset within the layout box (for alignment)
    pub x_offset: f32,
    /// Y offset from the top of the text content area
    pub y_offset: f32,
    /// Measured advance width in px.
    pub width: f32,
}

impl InvoiceLayout {
    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }

    /// Depth-first visit of every box.
    pub fn visit<F: FnMut(&LayoutBox)>(&self, mut f: F) {
        fn walk<F: FnMut(&LayoutBox)>(lbox: &LayoutBox, f: &mut F) {
            f(lbox);
            for child in &lbox.children {
                walk(child, f);
            }
        }
        for lbox in &self.boxes {
            walk(lbox, &mut f);
        }
    }

    /// All text lines in paint order, joined per box.
    pub fn texts(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.visit(|b| {
            if let Some(text) = &b.text {
                let joined: Vec<&str> = text.lines.iter().map(|l| l.text.as_str()).collect();
                out.push(joined.join(" "));
            }
        });
        out
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            text: None,
            children: Vec::new(),
        }
    }
}

/// Parse `#rrggbb` or `#rgb` into an opaque colour.
pub fn color_from_hex(hex: &str) -> Option<Rgba> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
    match hex.len() {
        6 => Some([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            1.0,
        ]),
        3 => Some([
            channel(&hex[0..1].repeat(2))?,
            channel(&hex[1..2].repeat(2))?,
            channel(&hex[2..3].repeat(2))?,
            1.0,
        ]),
        _ => None,
    }
}

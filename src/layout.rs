//! Invoice layout – uses Taffy to arrange an [`InvoiceView`] into the
//! invoice region, then converts the result into a tree of positioned boxes.
//!
//! Only visible rows enter the tree, so a hidden row takes no space in the
//! region (the equivalent of `display: none` on the preview).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use taffy::prelude::*;

use crate::error::Result;
use crate::fonts::{wrap_text, FontManager};
use crate::preview::Presenter;
use crate::region::{
    color_from_hex, BorderStyle, InvoiceLayout, LayoutBox, Rgba, TextContent, TextLine, WHITE,
};
use crate::view::InvoiceView;

/// Default region width in CSS px (A4 width at 96 dpi).
pub const DEFAULT_REGION_WIDTH: f32 = 794.0;

const REGION_PADDING: f32 = 40.0;
const AMOUNT_COLUMN: f32 = 150.0;
const LABEL_COLUMN: f32 = 110.0;
const CELL_PAD_X: f32 = 12.0;
const CELL_PAD_Y: f32 = 9.0;
const LINE_HEIGHT: f32 = 1.35;

const INK: Rgba = [0.067, 0.094, 0.153, 1.0];
const MUTED: Rgba = [0.42, 0.447, 0.502, 1.0];
const ACCENT: Rgba = [0.055, 0.416, 0.643, 1.0];
const RULE: Rgba = [0.898, 0.906, 0.922, 1.0];
const HEADER_FILL: Rgba = [0.953, 0.957, 0.965, 1.0];

/// Business details printed in the invoice header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessProfile {
    pub name: String,
    /// Lines under the business name (tagline, ABN, phone, ...).
    pub details: Vec<String>,
    pub footer: String,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        Self {
            name: "247 Victoria Cleaners".to_string(),
            details: vec!["Professional Cleaning Services".to_string()],
            footer: "Thank you for your business!".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Align {
    Left,
    Right,
}

/// Paint attributes attached to a taffy node.
#[derive(Debug, Clone, Default)]
struct Decoration {
    background: Option<Rgba>,
    border: Option<BorderStyle>,
    text: Option<TextSpec>,
}

#[derive(Debug, Clone)]
struct TextSpec {
    lines: Vec<(String, f32)>,
    font_size: f32,
    bold: bool,
    color: Rgba,
    line_height: f32,
    align: Align,
}

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    decorations: HashMap<NodeId, Decoration>,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            decorations: HashMap::new(),
        }
    }

    /// A wrapped text leaf sized to its widest line.
    fn text(
        &mut self,
        text: &str,
        font_size: f32,
        bold: bool,
        color: Rgba,
        align: Align,
        max_width: f32,
    ) -> Result<NodeId> {
        let line_height = self.fonts.line_height_px(font_size, LINE_HEIGHT);
        let lines: Vec<(String, f32)> = wrap_text(text.trim(), font_size, bold, max_width, self.fonts)
            .into_iter()
            .map(|line| {
                let w = self.fonts.measure_text_width(&line, font_size, bold);
                (line, w)
            })
            .collect();
        let text_width = lines.iter().map(|(_, w)| *w).fold(0.0f32, f32::max);
        let text_height = lines.len() as f32 * line_height;

        let node = self.taffy.new_leaf(Style {
            size: Size {
                width: Dimension::Length(text_width),
                height: Dimension::Length(text_height),
            },
            flex_shrink: 0.0,
            ..Default::default()
        })?;
        self.decorations.insert(
            node,
            Decoration {
                text: Some(TextSpec {
                    lines,
                    font_size,
                    bold,
                    color,
                    line_height,
                    align,
                }),
                ..Default::default()
            },
        );
        Ok(node)
    }

    fn container(&mut self, style: Style, children: &[NodeId]) -> Result<NodeId> {
        Ok(self.taffy.new_with_children(style, children)?)
    }

    fn decorate(&mut self, node: NodeId, background: Option<Rgba>, border: Option<BorderStyle>) {
        let entry = self.decorations.entry(node).or_default();
        entry.background = background;
        entry.border = border;
    }

    /// A full-width horizontal rule.
    fn rule(&mut self, thickness: f32, color: Rgba, margin_y: f32) -> Result<NodeId> {
        let node = self.taffy.new_leaf(Style {
            size: Size {
                width: Dimension::Percent(1.0),
                height: Dimension::Length(thickness),
            },
            margin: Rect {
                top: LengthPercentageAuto::Length(margin_y),
                right: LengthPercentageAuto::Length(0.0),
                bottom: LengthPercentageAuto::Length(margin_y),
                left: LengthPercentageAuto::Length(0.0),
            },
            flex_shrink: 0.0,
            ..Default::default()
        })?;
        self.decorate(node, Some(color), None);
        Ok(node)
    }

    fn header(&mut self, view: &InvoiceView, profile: &BusinessProfile, inner: f32) -> Result<NodeId> {
        let left_width = inner * 0.6;
        let mut left = vec![self.text(&profile.name, 24.0, true, INK, Align::Left, left_width)?];
        for detail in &profile.details {
            left.push(self.text(detail, 12.0, false, MUTED, Align::Left, left_width)?);
        }
        let left = self.container(column(4.0), &left)?;

        let title = self.text("INVOICE", 26.0, true, ACCENT, Align::Right, inner * 0.4)?;
        let badge_text = self.text(&view.badge.text, 12.0, true, WHITE, Align::Left, inner * 0.4)?;
        let badge = self.container(
            Style {
                padding: padding(4.0, 12.0),
                ..row(0.0)
            },
            &[badge_text],
        )?;
        self.decorate(badge, Some(color_from_hex(&view.badge.color).unwrap_or(INK)), None);
        let right = self.container(
            Style {
                align_items: Some(AlignItems::End),
                ..column(8.0)
            },
            &[title, badge],
        )?;

        self.container(
            Style {
                justify_content: Some(JustifyContent::SpaceBetween),
                align_items: Some(AlignItems::Start),
                ..row(0.0)
            },
            &[left, right],
        )
    }

    fn customer(&mut self, view: &InvoiceView, inner: f32) -> Result<NodeId> {
        let value_width = inner - LABEL_COLUMN;
        let mut rows = Vec::new();
        for (label, value) in [
            ("Customer", &view.customer.name),
            ("Date", &view.customer.date),
            ("Location", &view.customer.location),
        ] {
            let label = self.text(label, 12.0, true, MUTED, Align::Left, LABEL_COLUMN)?;
            let label_cell = self.container(
                Style {
                    size: Size {
                        width: Dimension::Length(LABEL_COLUMN),
                        height: Dimension::Auto,
                    },
                    flex_shrink: 0.0,
                    ..column(0.0)
                },
                &[label],
            )?;
            let value = self.text(value, 13.0, false, INK, Align::Left, value_width)?;
            rows.push(self.container(row(0.0), &[label_cell, value])?);
        }
        self.container(column(6.0), &rows)
    }

    /// One table row: description cell growing to fill, fixed amount cell.
    fn table_row(
        &mut self,
        description: &str,
        amount: &str,
        font_size: f32,
        bold: bool,
        color: Rgba,
        inner: f32,
    ) -> Result<NodeId> {
        let desc_width = inner - AMOUNT_COLUMN - 4.0 * CELL_PAD_X;
        let desc = self.text(description, font_size, bold, color, Align::Left, desc_width)?;
        let desc_cell = self.container(
            Style {
                flex_grow: 1.0,
                flex_shrink: 1.0,
                flex_basis: Dimension::Length(0.0),
                min_size: Size {
                    width: Dimension::Length(0.0),
                    height: Dimension::Auto,
                },
                ..column(0.0)
            },
            &[desc],
        )?;
        let amount = self.text(amount, font_size, bold, color, Align::Right, AMOUNT_COLUMN)?;
        let amount_cell = self.container(
            Style {
                size: Size {
                    width: Dimension::Length(AMOUNT_COLUMN),
                    height: Dimension::Auto,
                },
                flex_shrink: 0.0,
                align_items: Some(AlignItems::End),
                ..column(0.0)
            },
            &[amount],
        )?;
        self.container(
            Style {
                padding: padding(CELL_PAD_Y, CELL_PAD_X),
                ..row(0.0)
            },
            &[desc_cell, amount_cell],
        )
    }

    fn table(&mut self, view: &InvoiceView, inner: f32) -> Result<NodeId> {
        let head = self.table_row("Description", "Amount", 12.0, true, MUTED, inner)?;
        self.decorate(head, Some(HEADER_FILL), None);

        let mut children = vec![head];
        for line in view.visible_rows() {
            children.push(self.rule(1.0, RULE, 0.0)?);
            children.push(self.table_row(&line.description, &line.amount, 13.0, false, INK, inner)?);
        }
        children.push(self.rule(2.0, INK, 0.0)?);
        children.push(self.table_row("Total", &view.total, 16.0, true, INK, inner)?);

        let table = self.container(
            Style {
                border: uniform(1.0),
                ..column(0.0)
            },
            &children,
        )?;
        self.decorate(
            table,
            None,
            Some(BorderStyle {
                width: 1.0,
                color: RULE,
            }),
        );
        Ok(table)
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<LayoutBox> {
        let layout = self.taffy.layout(node)?;
        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;
        let mut lbox = LayoutBox::new(x, y, layout.size.width, layout.size.height);

        if let Some(deco) = self.decorations.get(&node) {
            lbox.background_color = deco.background;
            lbox.border = deco.border.clone();
            lbox.text = deco.text.as_ref().map(|spec| to_text_content(spec, lbox.width));
        }

        for child in self.taffy.children(node)? {
            lbox.children.push(self.extract(child, x, y)?);
        }
        Ok(lbox)
    }
}

fn to_text_content(spec: &TextSpec, box_width: f32) -> TextContent {
    let lines = spec
        .lines
        .iter()
        .enumerate()
        .map(|(i, (text, width))| TextLine {
            text: text.clone(),
            x_offset: match spec.align {
                Align::Left => 0.0,
                Align::Right => (box_width - width).max(0.0),
            },
            y_offset: i as f32 * spec.line_height,
            width: *width,
        })
        .collect();
    TextContent {
        lines,
        font_size: spec.font_size,
        bold: spec.bold,
        color: spec.color,
        line_height: spec.line_height,
    }
}

fn column(gap: f32) -> Style {
    Style {
        display: Display::Flex,
        flex_direction: FlexDirection::Column,
        gap: Size {
            width: LengthPercentage::Length(gap),
            height: LengthPercentage::Length(gap),
        },
        ..Default::default()
    }
}

fn row(gap: f32) -> Style {
    Style {
        flex_direction: FlexDirection::Row,
        ..column(gap)
    }
}

fn padding(vertical: f32, horizontal: f32) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(vertical),
        right: LengthPercentage::Length(horizontal),
        bottom: LengthPercentage::Length(vertical),
        left: LengthPercentage::Length(horizontal),
    }
}

fn uniform(width: f32) -> Rect<LengthPercentage> {
    padding(width, width)
}

/// Lay out the invoice region for a view.
pub fn layout_invoice(
    view: &InvoiceView,
    profile: &BusinessProfile,
    region_width: f32,
    fonts: &FontManager,
) -> Result<InvoiceLayout> {
    let inner = region_width - 2.0 * REGION_PADDING;
    let mut builder = LayoutBuilder::new(fonts);

    let header = builder.header(view, profile, inner)?;
    let divider = builder.rule(2.0, ACCENT, 20.0)?;
    let customer = builder.customer(view, inner)?;
    let spacer = builder.rule(0.0, WHITE, 12.0)?;
    let table = builder.table(view, inner)?;
    let mut sections = vec![header, divider, customer, spacer, table];
    if !profile.footer.trim().is_empty() {
        sections.push(builder.rule(0.0, WHITE, 16.0)?);
        sections.push(builder.text(&profile.footer, 12.0, false, MUTED, Align::Left, inner)?);
    }

    let root = builder.container(
        Style {
            size: Size {
                width: Dimension::Length(region_width),
                height: Dimension::Auto,
            },
            padding: uniform(REGION_PADDING),
            ..column(0.0)
        },
        &sections,
    )?;

    builder.taffy.compute_layout(
        root,
        Size {
            width: AvailableSpace::Definite(region_width),
            height: AvailableSpace::MaxContent,
        },
    )?;

    let root_box = builder.extract(root, 0.0, 0.0)?;
    log::debug!(
        "laid out invoice region {:.0}x{:.0} px ({} rows)",
        root_box.width,
        root_box.height,
        view.visible_rows().len()
    );
    Ok(InvoiceLayout {
        width: root_box.width,
        height: root_box.height,
        background_color: WHITE,
        boxes: vec![root_box],
    })
}

/// Presents a view as a laid-out invoice region.
pub struct LayoutPresenter<'a> {
    pub fonts: &'a FontManager,
    pub profile: &'a BusinessProfile,
    pub region_width: f32,
}

impl Presenter for LayoutPresenter<'_> {
    type Output = Result<InvoiceLayout>;

    fn present(&self, view: &InvoiceView) -> Result<InvoiceLayout> {
        layout_invoice(view, self.profile, self.region_width, self.fonts)
    }
}

//! Presenters apply an [`InvoiceView`] to a presentation target.
//!
//! The view is target-agnostic; each presenter decides how to show it. The
//! laid-out invoice region used for export is produced by
//! [`crate::layout::LayoutPresenter`]; this module holds the plain-text one.

use std::fmt::Write as _;

use crate::view::InvoiceView;

pub trait Presenter {
    type Output;

    fn present(&self, view: &InvoiceView) -> Self::Output;
}

/// Fixed-width text rendering of the invoice, for terminals and logs.
#[derive(Debug, Clone)]
pub struct TextPresenter {
    /// Total line width in characters.
    pub width: usize,
    pub business_name: String,
}

impl Default for TextPresenter {
    fn default() -> Self {
        Self {
            width: 48,
            business_name: crate::layout::BusinessProfile::default().name,
        }
    }
}

impl Presenter for TextPresenter {
    type Output = String;

    fn present(&self, view: &InvoiceView) -> String {
        let mut out = String::new();
        let rule = "-".repeat(self.width);

        let _ = writeln!(out, "{}", self.row(&self.business_name, &format!("[{}]", view.badge.text)));
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Customer: {}", view.customer.name);
        let _ = writeln!(out, "Date:     {}", view.customer.date);
        let _ = writeln!(out, "Location: {}", view.customer.location);
        let _ = writeln!(out, "{rule}");
        for line in view.visible_rows() {
            let _ = writeln!(out, "{}", self.row(&line.description, &line.amount));
        }
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{}", self.row("Total", &view.total));
        out
    }
}

impl TextPresenter {
    /// Left label, right-aligned amount; long labels push the amount along.
    fn row(&self, label: &str, amount: &str) -> String {
        let used = label.chars().count() + amount.chars().count();
        let pad = self.width.saturating_sub(used).max(1);
        format!("{label}{}{amount}", " ".repeat(pad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::InvoiceFormState;
    use crate::view::render_view;

    #[test]
    fn text_preview_lists_visible_rows_only() {
        let state = InvoiceFormState {
            base_service: "Carpet Steam Clean".to_string(),
            base_amount: "220".to_string(),
            gst_included: true,
            gst_amount: "22".to_string(),
            total_override: "242".to_string(),
            status: "PAID".to_string(),
            ..Default::default()
        };
        let text = TextPresenter::default().present(&render_view(&state));
        assert!(text.contains("[PAID]"));
        assert!(text.contains("Carpet Steam Clean"));
        assert!(text.contains("GST"));
        assert!(!text.contains("Deposit"));
        assert!(!text.contains("Discount"));
        assert!(text.lines().last().unwrap().ends_with("$242.00"));
    }

    #[test]
    fn rows_are_padded_to_width() {
        let presenter = TextPresenter {
            width: 20,
            business_name: "X".to_string(),
        };
        assert_eq!(presenter.row("GST", "$1.00").len(), 20);
    }
}

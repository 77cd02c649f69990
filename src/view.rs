//! Invoice view – the render-only projection of an [`InvoiceFormState`].
//!
//! [`render_view`] is the preview renderer: it reads every field, derives row
//! visibility and display strings, and returns a fresh [`InvoiceView`]. The
//! result depends on nothing but its argument, so presenters can apply it to
//! any target and re-render whenever they like.

use serde::{Deserialize, Serialize};

use crate::currency::{format_aud, format_deduction};
use crate::form::{parse_amount, BaseService, InvoiceFormState, PaymentStatus};

/// Shown in place of an empty customer field.
pub const EMPTY_PLACEHOLDER: &str = "\u{2014}";

/// Title used when "Custom" is selected but no override text was entered.
pub const CUSTOM_SERVICE_FALLBACK: &str = "Custom Service";

/// Badge colour for a paid invoice.
pub const PAID_COLOR: &str = "#16a34a";

/// Badge colour for an unpaid invoice.
pub const UNPAID_COLOR: &str = "#dc2626";

/// One line of the invoice table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineRow {
    pub visible: bool,
    pub description: String,
    pub amount: String,
}

impl LineRow {
    fn shown(description: impl Into<String>, amount: String) -> Self {
        Self {
            visible: true,
            description: description.into(),
            amount,
        }
    }

    fn hidden() -> Self {
        Self::default()
    }
}

/// The PAID / UNPAID badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusBadge {
    pub status: PaymentStatus,
    pub text: String,
    /// `#rrggbb` background colour.
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub date: String,
    pub location: String,
}

/// Visibility of the form's conditional input regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlVisibility {
    pub custom_service_input: bool,
    pub discount_fields: bool,
}

/// Everything the invoice preview displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceView {
    pub base: LineRow,
    pub addons: LineRow,
    pub discount: LineRow,
    pub gst: LineRow,
    pub deposit: LineRow,
    pub total: String,
    pub badge: StatusBadge,
    pub customer: CustomerDetails,
    pub controls: ControlVisibility,
}

impl InvoiceView {
    /// Visible line rows in table order (the total is separate).
    pub fn visible_rows(&self) -> Vec<&LineRow> {
        [
            &self.base,
            &self.addons,
            &self.discount,
            &self.gst,
            &self.deposit,
        ]
        .into_iter()
        .filter(|row| row.visible)
        .collect()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Title of the base row.
pub fn base_title(state: &InvoiceFormState) -> String {
    match state.base_service() {
        BaseService::Custom => {
            let custom = state.custom_service.trim();
            if custom.is_empty() {
                CUSTOM_SERVICE_FALLBACK.to_string()
            } else {
                custom.to_string()
            }
        }
        BaseService::DepositOnly => "Deposit".to_string(),
        BaseService::Named(name) => name,
    }
}

/// Render the full view from the current form state.
pub fn render_view(state: &InvoiceFormState) -> InvoiceView {
    let base_amount = parse_amount(&state.base_amount);
    let base = LineRow::shown(base_title(state), format_aud(base_amount));

    let addons_amount = parse_amount(&state.addons_amount);
    let addons = if addons_amount > 0.0 {
        let label = state.addons_text.trim();
        let description = if label.is_empty() {
            "Addons".to_string()
        } else {
            format!("Addons: {label}")
        };
        LineRow::shown(description, format_aud(addons_amount))
    } else {
        LineRow::hidden()
    };

    let discount = if state.discount_enabled {
        let amount = clamped(&state.discount_amount);
        if amount > 0.0 {
            LineRow::shown("Discount", format_deduction(amount))
        } else {
            LineRow::hidden()
        }
    } else {
        LineRow::hidden()
    };

    let gst = if state.gst_included {
        LineRow::shown("GST", format_aud(clamped(&state.gst_amount)))
    } else {
        LineRow::hidden()
    };

    let deposit = if state.deposit_shown {
        LineRow::shown("Deposit", format_deduction(clamped(&state.deposit_amount)))
    } else {
        LineRow::hidden()
    };

    let status = state.payment_status();
    let badge = StatusBadge {
        status,
        text: status.label().to_string(),
        color: match status {
            PaymentStatus::Paid => PAID_COLOR,
            PaymentStatus::Unpaid => UNPAID_COLOR,
        }
        .to_string(),
    };

    let view = InvoiceView {
        base,
        addons,
        discount,
        gst,
        deposit,
        total: format_aud(clamped(&state.total_override)),
        badge,
        customer: CustomerDetails {
            name: or_placeholder(&state.customer_name),
            date: or_placeholder(&state.clean_date),
            location: or_placeholder(&state.clean_location),
        },
        controls: ControlVisibility {
            custom_service_input: state.base_service() == BaseService::Custom,
            discount_fields: state.discount_enabled,
        },
    };
    log::debug!(
        "rendered view: {} visible rows, total {}, {}",
        view.visible_rows().len(),
        view.total,
        view.badge.text
    );
    view
}

/// Parsed amount with negatives clamped to zero.
fn clamped(text: &str) -> f64 {
    parse_amount(text).max(0.0)
}

fn or_placeholder(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        EMPTY_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

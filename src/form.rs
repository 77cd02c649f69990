//! Invoice form state – the raw values of the named input fields.
//!
//! Values are kept exactly as the user typed them. Interpretation (numeric
//! parsing, clamping, title derivation) happens in [`crate::view`], so a form
//! can be stored, edited field by field, and re-rendered at any time.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FormError;

/// Selection value that switches the base row to the free-text override.
pub const CUSTOM_SERVICE: &str = "Custom";

/// Selection value for an invoice that bills a deposit only.
pub const DEPOSIT_ONLY_SERVICE: &str = "Deposit (Invoice for Deposit Only)";

/// Every accepted field name, in form order.
pub const FIELD_NAMES: &[&str] = &[
    "baseService",
    "customService",
    "baseAmount",
    "addonsText",
    "addonsAmount",
    "gstIncluded",
    "gstAmount",
    "discountEnabled",
    "discountAmountInput",
    "depositShown",
    "depositAmount",
    "totalOverride",
    "status",
    "custName",
    "cleanDate",
    "cleanLoc",
];

/// Snapshot of every invoice input field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceFormState {
    #[serde(rename = "baseService", deserialize_with = "field_text")]
    pub base_service: String,
    #[serde(rename = "customService", deserialize_with = "field_text")]
    pub custom_service: String,
    #[serde(rename = "baseAmount", deserialize_with = "field_text")]
    pub base_amount: String,

    #[serde(rename = "addonsText", deserialize_with = "field_text")]
    pub addons_text: String,
    #[serde(rename = "addonsAmount", deserialize_with = "field_text")]
    pub addons_amount: String,

    #[serde(rename = "gstIncluded", deserialize_with = "field_flag")]
    pub gst_included: bool,
    #[serde(rename = "gstAmount", deserialize_with = "field_text")]
    pub gst_amount: String,

    #[serde(rename = "discountEnabled", deserialize_with = "field_flag")]
    pub discount_enabled: bool,
    #[serde(rename = "discountAmountInput", deserialize_with = "field_text")]
    pub discount_amount: String,

    #[serde(rename = "depositShown", deserialize_with = "field_flag")]
    pub deposit_shown: bool,
    #[serde(rename = "depositAmount", deserialize_with = "field_text")]
    pub deposit_amount: String,

    #[serde(rename = "totalOverride", deserialize_with = "field_text")]
    pub total_override: String,

    #[serde(deserialize_with = "field_text")]
    pub status: String,

    #[serde(rename = "custName", deserialize_with = "field_text")]
    pub customer_name: String,
    #[serde(rename = "cleanDate", deserialize_with = "field_text")]
    pub clean_date: String,
    #[serde(rename = "cleanLoc", deserialize_with = "field_text")]
    pub clean_location: String,
}

/// The billed item category, derived from the base-service selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseService {
    /// Free-text service named by the `customService` field.
    Custom,
    /// Invoice for a deposit payment only.
    DepositOnly,
    /// Any other selection, used verbatim as the row title.
    Named(String),
}

impl BaseService {
    pub fn from_selection(selection: &str) -> Self {
        match selection {
            CUSTOM_SERVICE => BaseService::Custom,
            DEPOSIT_ONLY_SERVICE => BaseService::DepositOnly,
            other => BaseService::Named(other.to_string()),
        }
    }
}

/// Payment state shown on the invoice badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl PaymentStatus {
    /// Exact match only: `"paid"`, `" PAID"` and the empty string are all unpaid.
    pub fn from_field(value: &str) -> Self {
        if value == "PAID" {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Unpaid
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Unpaid => "UNPAID",
        }
    }
}

impl InvoiceFormState {
    /// Parse a form from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, FormError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn base_service(&self) -> BaseService {
        BaseService::from_selection(&self.base_service)
    }

    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::from_field(&self.status)
    }

    /// Read a field by its form name. Checkboxes read back as `"true"`/`"false"`.
    pub fn field(&self, name: &str) -> Result<String, FormError> {
        let value = match name {
            "gstIncluded" => return Ok(self.gst_included.to_string()),
            "discountEnabled" => return Ok(self.discount_enabled.to_string()),
            "depositShown" => return Ok(self.deposit_shown.to_string()),
            _ => self.text_field(name)?,
        };
        Ok(value.clone())
    }

    /// Assign a field by its form name, as an input event would.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        match name {
            "gstIncluded" => self.gst_included = parse_flag(value),
            "discountEnabled" => self.discount_enabled = parse_flag(value),
            "depositShown" => self.deposit_shown = parse_flag(value),
            _ => *self.text_field_mut(name)? = value.to_string(),
        }
        Ok(())
    }

    /// Apply a `name=value` assignment (the CLI's `--set` syntax).
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), FormError> {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| FormError::Assignment(assignment.to_string()))?;
        self.set_field(name.trim(), value)
    }

    fn text_field(&self, name: &str) -> Result<&String, FormError> {
        Ok(match name {
            "baseService" => &self.base_service,
            "customService" => &self.custom_service,
            "baseAmount" => &self.base_amount,
            "addonsText" => &self.addons_text,
            "addonsAmount" => &self.addons_amount,
            "gstAmount" => &self.gst_amount,
            "discountAmountInput" => &self.discount_amount,
            "depositAmount" => &self.deposit_amount,
            "totalOverride" => &self.total_override,
            "status" => &self.status,
            "custName" => &self.customer_name,
            "cleanDate" => &self.clean_date,
            "cleanLoc" => &self.clean_location,
            other => return Err(FormError::UnknownField(other.to_string())),
        })
    }

    fn text_field_mut(&mut self, name: &str) -> Result<&mut String, FormError> {
        Ok(match name {
            "baseService" => &mut self.base_service,
            "customService" => &mut self.custom_service,
            "baseAmount" => &mut self.base_amount,
            "addonsText" => &mut self.addons_text,
            "addonsAmount" => &mut self.addons_amount,
            "gstAmount" => &mut self.gst_amount,
            "discountAmountInput" => &mut self.discount_amount,
            "depositAmount" => &mut self.deposit_amount,
            "totalOverride" => &mut self.total_override,
            "status" => &mut self.status,
            "custName" => &mut self.customer_name,
            "cleanDate" => &mut self.clean_date,
            "cleanLoc" => &mut self.clean_location,
            other => return Err(FormError::UnknownField(other.to_string())),
        })
    }
}

/// Interpret a checkbox value. Anything unrecognised is unchecked.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes" | "checked"
    )
}

/// Parse the leading numeric prefix of a field value.
///
/// Leading whitespace is skipped, then an optional sign, digits, an optional
/// fraction and an optional exponent are consumed; trailing text is ignored
/// (`"12.5kg"` is 12.5). Text without a numeric prefix, and any result that
/// is not finite, is 0.
pub fn parse_amount(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0usize;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return 0.0;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    match s[..end].parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Form inputs arrive as text, but JSON producers often send numbers and
/// booleans; accept all of them and keep the text form.
fn field_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawField::deserialize(deserializer)? {
        RawField::Text(s) => s,
        RawField::Number(n) => n.to_string(),
        RawField::Flag(b) => b.to_string(),
        RawField::Missing => String::new(),
    })
}

fn field_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawField::deserialize(deserializer)? {
        RawField::Flag(b) => b,
        RawField::Text(s) => parse_flag(&s),
        RawField::Number(n) => n != 0.0,
        RawField::Missing => false,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Flag(bool),
    Number(f64),
    Text(String),
    Missing,
}

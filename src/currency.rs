//! Australian-dollar display strings.

/// Format an amount the way an en-AU AUD locale does: `$1,234.56`,
/// negatives as `-$1,234.56`.
pub fn format_aud(amount: f64) -> String {
    let (negative, dollars, cents) = split_cents(amount);
    let sign = if negative { "-" } else { "" };
    format!("{sign}${}.{cents:02}", group_thousands(&dollars))
}

/// Format a deducted amount: a leading minus and no currency symbol
/// (`-1,234.56`). Callers pass the clamped, non-negative amount.
pub fn format_deduction(amount: f64) -> String {
    format!("-{}", format_aud(amount).replacen('$', "", 1))
}

/// Round half away from zero to whole cents and split into the sign, the
/// whole-dollar digits and the cents. Stays in `f64` so amounts beyond the
/// `i64` range keep their digits.
fn split_cents(amount: f64) -> (bool, String, u8) {
    if !amount.is_finite() {
        return (false, "0".to_string(), 0);
    }
    let cents = (amount.abs() * 100.0).round();
    let dollars = (cents / 100.0).trunc();
    let remainder = (cents - dollars * 100.0).clamp(0.0, 99.0) as u8;
    (amount < 0.0 && cents > 0.0, format!("{dollars:.0}"), remainder)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

//! Sample invoice forms for demonstration and testing.
//!
//! Each sample exercises a different combination of rows and flags.

use crate::form::{InvoiceFormState, CUSTOM_SERVICE, DEPOSIT_ONLY_SERVICE};

/// Names accepted by [`by_name`], in listing order.
pub const SAMPLE_NAMES: &[&str] = &["regular", "custom", "deposit", "itemised", "blank"];

/// A fortnightly clean with GST, unpaid.
pub fn regular_clean() -> InvoiceFormState {
    InvoiceFormState {
        base_service: "Regular Clean".to_string(),
        base_amount: "180".to_string(),
        gst_included: true,
        gst_amount: "18".to_string(),
        total_override: "198".to_string(),
        status: "UNPAID".to_string(),
        customer_name: "Priya Natarajan".to_string(),
        clean_date: "2024-03-14".to_string(),
        clean_location: "12 Chapel St, Windsor VIC".to_string(),
        ..Default::default()
    }
}

/// A paid custom service with add-ons and a discount.
pub fn custom_paid() -> InvoiceFormState {
    InvoiceFormState {
        base_service: CUSTOM_SERVICE.to_string(),
        custom_service: "Post-renovation dust removal".to_string(),
        base_amount: "420".to_string(),
        addons_text: "Oven, fridge interior".to_string(),
        addons_amount: "85".to_string(),
        discount_enabled: true,
        discount_amount: "50".to_string(),
        total_override: "455".to_string(),
        status: "PAID".to_string(),
        customer_name: "Tom O'Brien".to_string(),
        clean_date: "2024-04-02".to_string(),
        clean_location: "3/88 Lygon St, Carlton VIC".to_string(),
        ..Default::default()
    }
}

/// An invoice for a booking deposit only.
pub fn deposit_only() -> InvoiceFormState {
    InvoiceFormState {
        base_service: DEPOSIT_ONLY_SERVICE.to_string(),
        base_amount: "100".to_string(),
        deposit_amount: "100".to_string(),
        total_override: "100".to_string(),
        status: "PAID".to_string(),
        customer_name: "Mei Chen".to_string(),
        clean_date: "2024-05-20".to_string(),
        clean_location: "Unit 7, 401 St Kilda Rd, Melbourne VIC".to_string(),
        ..Default::default()
    }
}

/// End-of-lease clean with a long itemised add-on list; lays out taller
/// than one A4 page.
pub fn itemised() -> InvoiceFormState {
    let items: Vec<String> = (1..=80)
        .map(|i| format!("Room {i}: skirting boards, light switches, window tracks"))
        .collect();
    InvoiceFormState {
        base_service: "End of Lease Clean".to_string(),
        base_amount: "650".to_string(),
        addons_text: items.join("\n"),
        addons_amount: "900".to_string(),
        gst_included: true,
        gst_amount: "155".to_string(),
        discount_enabled: true,
        discount_amount: "75".to_string(),
        deposit_shown: true,
        deposit_amount: "200".to_string(),
        total_override: "1430".to_string(),
        status: "UNPAID".to_string(),
        customer_name: "Harbour View Realty".to_string(),
        clean_date: "2024-06-30".to_string(),
        clean_location: "21 Beach Rd, Brighton VIC".to_string(),
        ..Default::default()
    }
}

/// Every field empty.
pub fn blank() -> InvoiceFormState {
    InvoiceFormState::default()
}

/// Look up a sample by its listing name.
pub fn by_name(name: &str) -> Option<InvoiceFormState> {
    match name {
        "regular" => Some(regular_clean()),
        "custom" => Some(custom_paid()),
        "deposit" => Some(deposit_only()),
        "itemised" => Some(itemised()),
        "blank" => Some(blank()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::render_view;

    #[test]
    fn every_listed_sample_resolves() {
        for name in SAMPLE_NAMES {
            assert!(by_name(name).is_some(), "missing sample {name}");
        }
        assert!(by_name("nope").is_none());
    }

    #[test]
    fn samples_show_the_expected_rows() {
        assert_eq!(render_view(&regular_clean()).visible_rows().len(), 2);
        assert_eq!(render_view(&custom_paid()).visible_rows().len(), 3);
        assert_eq!(render_view(&deposit_only()).visible_rows().len(), 1);
        assert_eq!(render_view(&itemised()).visible_rows().len(), 5);
        assert_eq!(render_view(&blank()).visible_rows().len(), 1);
    }

    #[test]
    fn deposit_sample_is_titled_deposit() {
        let view = render_view(&deposit_only());
        assert_eq!(view.base.description, "Deposit");
        assert!(!view.deposit.visible);
        assert_eq!(view.total, "$100.00");
    }
}

//! Purchase order extraction, the mirror image of the invoice extractor:
//! vendor instead of supplier, buyer instead of customer, order and
//! delivery dates instead of invoice and due dates.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::extraction::invoice::{count_line_items, extract_address, extract_company_name};
use crate::models::{ExtractedField, FieldMap};

const SOURCE: &str = "PO_OCR";

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

lazy_static! {
    static ref PO_NUMBER: Regex =
        ci(r"(?:p\.?o\.?\s*(?:no|number|#)|purchase\s*order\s*(?:no|number|#)?)[:\s#]*([A-Z0-9\-/]{4,20})");
    static ref PO_DATE: Regex =
        ci(r"(?:p\.?o\.?\s*date|order\s*date)[:\s]*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}[/-]\d{1,2}[/-]\d{1,2})");
    static ref DELIVERY_DATE: Regex =
        ci(r"(?:delivery\s*date|ship\s*date|expected\s*delivery)[:\s]*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}[/-]\d{1,2}[/-]\d{1,2})");
    static ref REFERENCE_NUMBER: Regex =
        ci(r"(?:ref(?:erence)?\s*(?:no|number|#))[:\s]*([A-Z0-9\-/]{3,20})");
    static ref SUBTOTAL: Regex = ci(r"(?:subtotal|sub\s*total)[:\s]*([₹$€£¥]?\s*[\d,]+\.?\d*)");
    static ref TAX_AMOUNT: Regex = ci(r"(?:tax|vat|gst)[:\s]*([₹$€£¥]?\s*[\d,]+\.?\d*)");
    static ref DISCOUNT: Regex = ci(r"discount[:\s]*([₹$€£¥]?\s*[\d,]+\.?\d*)");
    static ref TOTAL_AMOUNT: Regex =
        ci(r"(?:grand\s*total|total\s*amount|net\s*total|total)[:\s]*(?:[A-Z]{3})?\s*([\d,]+\.?\d*)");
    static ref CURRENCY: Regex =
        Regex::new(r"\b(USD|EUR|GBP|INR|AUD|CAD|SGD|JPY|CNY|AED)\b").unwrap();
    static ref PAYMENT_TERMS: Regex =
        ci(r"(?:payment\s*terms|terms)[:\s]*(net\s*\d+|due\s*on\s*receipt|[^.\n]{5,50})");
}

const BUYER_MARKERS: [&str; 5] = ["ship to", "bill to", "deliver to", "buyer", "ordered by"];
const VENDOR_MARKERS: [&str; 4] = ["vendor", "supplier", "seller", "to:"];

pub fn extract(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();

    let mut capture = |name: &str, pattern: &Regex, confidence: f64| {
        if let Some(caps) = pattern.captures(text) {
            fields.insert(
                name.to_string(),
                ExtractedField::new(caps[1].trim(), confidence, SOURCE),
            );
        }
    };

    capture("po_number", &PO_NUMBER, 90.0);
    capture("po_date", &PO_DATE, 88.0);
    capture("delivery_date", &DELIVERY_DATE, 88.0);
    capture("reference_number", &REFERENCE_NUMBER, 85.0);
    capture("subtotal", &SUBTOTAL, 88.0);
    capture("tax_amount", &TAX_AMOUNT, 88.0);
    capture("discount", &DISCOUNT, 88.0);
    capture("total_amount", &TOTAL_AMOUNT, 90.0);
    capture("currency", &CURRENCY, 95.0);
    capture("payment_terms", &PAYMENT_TERMS, 80.0);

    let (vendor_section, buyer_section) = split_sections(text);

    if let Some(name) = extract_company_name(&vendor_section) {
        fields.insert(
            "vendor_name".to_string(),
            ExtractedField::new(name, 80.0, SOURCE),
        );
    }
    if let Some(name) = extract_company_name(&buyer_section) {
        fields.insert(
            "buyer_company".to_string(),
            ExtractedField::new(name, 80.0, SOURCE),
        );
    }
    if let Some(address) = extract_address(&vendor_section) {
        fields.insert(
            "vendor_address".to_string(),
            ExtractedField::new(address, 75.0, SOURCE),
        );
    }
    if let Some(address) = extract_address(&buyer_section) {
        fields.insert(
            "buyer_address".to_string(),
            ExtractedField::new(address, 75.0, SOURCE),
        );
    }

    let items = count_line_items(text);
    if items > 0 {
        fields.insert(
            "item_description".to_string(),
            ExtractedField::new(format!("{} items", items), 70.0, SOURCE),
        );
    }

    fields
}

/// Vendor text is whatever precedes the buyer/ship-to block; the same
/// flag-flip walk the invoice splitter uses.
fn split_sections(text: &str) -> (String, String) {
    let mut vendor = String::new();
    let mut buyer = String::new();
    let mut in_buyer = false;

    for line in text.lines() {
        let lower = line.to_lowercase();
        if BUYER_MARKERS.iter().any(|m| lower.contains(m)) {
            in_buyer = true;
        } else if VENDOR_MARKERS.iter().any(|m| lower.contains(m)) {
            in_buyer = false;
        }

        if in_buyer {
            buyer.push_str(line);
            buyer.push('\n');
        } else {
            vendor.push_str(line);
            vendor.push('\n');
        }
    }

    (vendor, buyer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "FALCON BUILDING MATERIALS LLC\n45 Trade Centre Road, Dubai\nPurchase Order\nP.O. No: PO-2024-118\nOrder Date: 02/05/2024\nDelivery Date: 16/05/2024\nShip To\nDESERT CONSTRUCTION CO\nPlot 7, Industrial Area 3, Sharjah\nItem Description Qty Rate Amount\nCement bags 200 12.50 2500.00\nGravel loads 4 150.00 600.00\nSub Total: 3100.00\nVAT: 155.00\nGrand Total: AED 3255.00\nPayment Terms: Net 45";

    #[test]
    fn test_extract_purchase_order_fields() {
        let fields = extract(SAMPLE);

        assert_eq!(fields["po_number"].value.as_deref(), Some("PO-2024-118"));
        assert_eq!(fields["po_date"].value.as_deref(), Some("02/05/2024"));
        assert_eq!(fields["delivery_date"].value.as_deref(), Some("16/05/2024"));
        assert_eq!(fields["currency"].value.as_deref(), Some("AED"));
        assert_eq!(fields["payment_terms"].value.as_deref(), Some("Net 45"));
        assert_eq!(
            fields["vendor_name"].value.as_deref(),
            Some("FALCON BUILDING MATERIALS LLC")
        );
        assert_eq!(
            fields["buyer_company"].value.as_deref(),
            Some("DESERT CONSTRUCTION CO")
        );
        assert_eq!(fields["item_description"].value.as_deref(), Some("2 items"));
    }

    #[test]
    fn test_total_amount_skips_currency_code() {
        let fields = extract("Grand Total: AED 3255.00");
        assert_eq!(fields["total_amount"].value.as_deref(), Some("3255.00"));
    }

    #[test]
    fn test_garbage_yields_empty_map() {
        assert!(extract("++++").is_empty());
    }
}

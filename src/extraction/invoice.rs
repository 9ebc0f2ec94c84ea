//! Invoice extraction: labeled header fields, a supplier/customer split
//! driven by role keywords, bank details folded into one JSON blob, and a
//! line-item count rather than parsed line items.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::extraction::text::{is_title_cased, is_upper_cased};
use crate::models::{ExtractedField, FieldMap};

const SOURCE: &str = "INVOICE_OCR";

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

lazy_static! {
    static ref INVOICE_NUMBER: Regex =
        ci(r"(?:invoice\s*(?:number|no|#)|inv\s*(?:no|#))[:\s]*([A-Z0-9\-/]+)");
    static ref INVOICE_DATE: Regex =
        ci(r"(?:invoice\s*date|date)[:\s]*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}[/-]\d{1,2}[/-]\d{1,2})");
    static ref DUE_DATE: Regex =
        ci(r"(?:due\s*date|payment\s*due)[:\s]*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}[/-]\d{1,2}[/-]\d{1,2})");
    static ref INVOICE_TYPE: Regex =
        ci(r"(tax\s*invoice|proforma\s*invoice|credit\s*note|debit\s*note|commercial\s*invoice)");
    static ref TAX_ID: Regex = ci(r"(?:GST|VAT|TIN|TAX\s*ID)[:\s]*([A-Z0-9]{8,15})");
    static ref EMAIL: Regex =
        Regex::new(r"\b([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})\b").unwrap();
    static ref PHONE: Regex = ci(r"(?:phone|tel|mobile|contact)[:\s]*([+\d\s\-()]{10,20})");
    static ref CURRENCY: Regex =
        Regex::new(r"\b(USD|EUR|GBP|INR|AUD|CAD|SGD|JPY|CNY|AED)\b").unwrap();
    static ref SUBTOTAL: Regex = ci(r"(?:subtotal|sub\s*total)[:\s]*([₹$€£¥]?\s*[\d,]+\.?\d*)");
    static ref TAX_AMOUNT: Regex = ci(r"(?:tax|vat|gst)[:\s]*([₹$€£¥]?\s*[\d,]+\.?\d*)");
    static ref TAX_RATE: Regex = ci(r"(?:tax|vat|gst).*?(\d+(?:\.\d+)?)\s*%");
    static ref GRAND_TOTAL: Regex =
        ci(r"(?:grand\s*total|total\s*amount|net\s*total|total)[:\s]*([₹$€£¥]?\s*[\d,]+\.?\d*)");
    static ref PAYMENT_TERMS: Regex =
        ci(r"(?:payment\s*terms|terms)[:\s]*(net\s*\d+|due\s*on\s*receipt|[^.\n]{5,50})");
    static ref PO_NUMBER: Regex = ci(r"(?:PO|purchase\s*order)[:\s#]*([A-Z0-9\-/]+)");
    static ref NOTES: Regex = ci(r"(?:notes?|remarks?|comments?)[:\s]*([^\n]{10,200})");
    static ref IBAN: Regex = ci(r"IBAN[:\s]*([A-Z0-9]{15,34})");
    static ref SWIFT: Regex = ci(r"SWIFT[:\s]*([A-Z0-9]{8,11})");
    static ref ACCOUNT_NUMBER: Regex = ci(r"(?:account|acc)(?:\s*no|\s*number)[:\s]*(\d{8,18})");
    static ref ADDRESS_HINT: Regex = ci(r"\d+|,|street|road|avenue|city|state|zip|pincode");
    static ref HAS_DIGITS: Regex = Regex::new(r"\d+").unwrap();
}

const CUSTOMER_MARKERS: [&str; 5] = ["bill to", "customer", "client", "buyer", "billed to"];
const SUPPLIER_MARKERS: [&str; 5] = ["seller", "vendor", "from", "supplier", "invoice from"];

/// Role-marker lines from either party block; never company names.
pub(crate) const SECTION_MARKERS: [&str; 12] = [
    "bill to",
    "billed to",
    "customer",
    "client",
    "buyer",
    "seller",
    "vendor",
    "from",
    "supplier",
    "ship to",
    "deliver to",
    "ordered by",
];

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

    capture("invoice_number", &INVOICE_NUMBER, 90.0);
    capture("invoice_date", &INVOICE_DATE, 88.0);
    capture("due_date", &DUE_DATE, 88.0);
    capture("invoice_type", &INVOICE_TYPE, 92.0);
    capture("currency", &CURRENCY, 95.0);
    capture("subtotal", &SUBTOTAL, 88.0);
    capture("tax_amount", &TAX_AMOUNT, 88.0);
    capture("grand_total", &GRAND_TOTAL, 90.0);
    capture("payment_terms", &PAYMENT_TERMS, 80.0);
    capture("po_number", &PO_NUMBER, 88.0);
    capture("notes", &NOTES, 75.0);

    if let Some(caps) = TAX_RATE.captures(text) {
        fields.insert(
            "tax_rate".to_string(),
            ExtractedField::new(format!("{}%", &caps[1]), 90.0, SOURCE),
        );
    }

    // First tax id / email / phone belongs to the supplier block at the top,
    // the second to the customer.
    let tax_ids: Vec<String> = TAX_ID
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .collect();
    if let Some(id) = tax_ids.first() {
        fields.insert(
            "supplier_tax_id".to_string(),
            ExtractedField::new(id, 85.0, SOURCE),
        );
    }
    if let Some(id) = tax_ids.get(1) {
        fields.insert(
            "customer_tax_id".to_string(),
            ExtractedField::new(id, 85.0, SOURCE),
        );
    }

    let emails: Vec<String> = EMAIL
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect();
    if let Some(email) = emails.first() {
        fields.insert(
            "supplier_email".to_string(),
            ExtractedField::new(email, 90.0, SOURCE),
        );
    }
    if let Some(email) = emails.get(1) {
        fields.insert(
            "customer_email".to_string(),
            ExtractedField::new(email, 90.0, SOURCE),
        );
    }

    let phones: Vec<String> = PHONE
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .collect();
    if let Some(phone) = phones.first() {
        fields.insert(
            "supplier_phone".to_string(),
            ExtractedField::new(phone, 85.0, SOURCE),
        );
    }
    if let Some(phone) = phones.get(1) {
        fields.insert(
            "customer_phone".to_string(),
            ExtractedField::new(phone, 85.0, SOURCE),
        );
    }

    let (supplier_section, customer_section) = split_sections(text);

    if let Some(name) = extract_company_name(&supplier_section) {
        fields.insert(
            "supplier_name".to_string(),
            ExtractedField::new(name, 80.0, SOURCE),
        );
    }
    if let Some(name) = extract_company_name(&customer_section) {
        fields.insert(
            "customer_name".to_string(),
            ExtractedField::new(name, 80.0, SOURCE),
        );
    }

    if let Some(address) = extract_address(&supplier_section) {
        fields.insert(
            "supplier_address".to_string(),
            ExtractedField::new(address, 75.0, SOURCE),
        );
    }
    if let Some(address) = extract_address(&customer_section) {
        fields.insert(
            "customer_address".to_string(),
            ExtractedField::new(address, 75.0, SOURCE),
        );
    }

    if let Some(bank_json) = extract_bank_details(text) {
        fields.insert(
            "bank_details".to_string(),
            ExtractedField::new(bank_json, 85.0, SOURCE),
        );
    }

    let items = count_line_items(text);
    if items > 0 {
        fields.insert(
            "line_items".to_string(),
            ExtractedField::new(format!("{} items", items), 70.0, SOURCE),
        );
    }

    fields
}

/// Partition the text into supplier and customer sections by scanning for
/// role keywords line by line and flipping an in-customer flag.
pub(crate) fn split_sections(text: &str) -> (String, String) {
    let mut supplier = String::new();
    let mut customer = String::new();
    let mut in_customer = false;

    for line in text.lines() {
        let lower = line.to_lowercase();
        if CUSTOMER_MARKERS.iter().any(|m| lower.contains(m)) {
            in_customer = true;
        } else if SUPPLIER_MARKERS.iter().any(|m| lower.contains(m)) {
            in_customer = false;
        }

        if in_customer {
            customer.push_str(line);
            customer.push('\n');
        } else {
            supplier.push_str(line);
            supplier.push('\n');
        }
    }

    (supplier, customer)
}

/// First capitalized line near the top of a section that is not a contact
/// label.
pub(crate) fn extract_company_name(section: &str) -> Option<String> {
    let lines: Vec<&str> = section
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let is_marker = |line: &str| {
        let lower = line.to_lowercase();
        SECTION_MARKERS.iter().any(|m| lower.contains(m))
    };

    for line in lines.iter().take(10) {
        if line.chars().count() > 3
            && !is_marker(line)
            && !["Phone", "Email", "Address", "Tax", "GST", "VAT"]
                .iter()
                .any(|p| line.starts_with(p))
            && (is_upper_cased(line) || is_title_cased(line))
        {
            return Some(line.to_string());
        }
    }

    lines
        .first()
        .filter(|l| l.chars().any(|c| c.is_alphabetic()) && !is_marker(l))
        .map(|l| l.to_string())
}

/// Up to three address-shaped lines, joined.
pub(crate) fn extract_address(section: &str) -> Option<String> {
    let mut address_lines = Vec::new();
    for line in section.lines() {
        let line = line.trim();
        if !line.is_empty() && ADDRESS_HINT.is_match(line) {
            address_lines.push(line.to_string());
            if address_lines.len() >= 3 {
                break;
            }
        }
    }
    if address_lines.is_empty() {
        None
    } else {
        Some(address_lines.join(", "))
    }
}

fn extract_bank_details(text: &str) -> Option<String> {
    let mut details = serde_json::Map::new();

    if let Some(caps) = IBAN.captures(text) {
        details.insert("iban".to_string(), serde_json::Value::String(caps[1].to_string()));
    }
    if let Some(caps) = SWIFT.captures(text) {
        details.insert("swift".to_string(), serde_json::Value::String(caps[1].to_string()));
    }
    if let Some(caps) = ACCOUNT_NUMBER.captures(text) {
        details.insert(
            "account_number".to_string(),
            serde_json::Value::String(caps[1].to_string()),
        );
    }

    if details.is_empty() {
        None
    } else {
        serde_json::to_string(&serde_json::Value::Object(details)).ok()
    }
}

/// Line items are counted, not parsed: find the table header, then count
/// digit-bearing lines until a totals/tax row.
pub(crate) fn count_line_items(text: &str) -> usize {
    let lines: Vec<&str> = text.lines().collect();

    let header_idx = lines.iter().position(|line| {
        let lower = line.to_lowercase();
        (lower.contains("description") || lower.contains("item"))
            && (lower.contains("quantity") || lower.contains("qty"))
            && (lower.contains("price") || lower.contains("rate") || lower.contains("amount"))
    });

    let header_idx = match header_idx {
        Some(idx) => idx,
        None => return 0,
    };

    let mut count = 0;
    for line in &lines[header_idx + 1..] {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();
        if ["subtotal", "total", "tax", "discount", "grand"]
            .iter()
            .any(|w| lower.contains(w))
        {
            break;
        }
        if HAS_DIGITS.is_match(line) {
            count += 1;
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "ACME SUPPLIES LLC\n12 Industrial Road, Dubai\nTel: +971 4 123 4567\nsales@acmesupplies.ae\nTAX ID: AE123456789012\nTax Invoice\nInvoice No: INV-2024/0042\nInvoice Date: 15/03/2024\nDue Date: 14/04/2024\nBill To\nGULF TRADING COMPANY\n8 Harbour Street, Sharjah\nbilling@gulftrading.ae\nDescription Qty Unit Price Amount\nSteel rods 10 25.00 250.00\nCopper wire 5 80.00 400.00\nSubtotal: 650.00\nVAT 5%\nTax: 32.50\nGrand Total: 682.50 AED\nPayment Terms: Net 30\nIBAN: AE070331234567890123456\nNotes: Deliver to warehouse gate 3 before noon";

    #[test]
    fn test_extract_invoice_header_fields() {
        let fields = extract(SAMPLE);

        assert_eq!(
            fields["invoice_number"].value.as_deref(),
            Some("INV-2024/0042")
        );
        assert_eq!(fields["invoice_date"].value.as_deref(), Some("15/03/2024"));
        assert_eq!(fields["due_date"].value.as_deref(), Some("14/04/2024"));
        assert_eq!(fields["invoice_type"].value.as_deref(), Some("Tax Invoice"));
        assert_eq!(fields["currency"].value.as_deref(), Some("AED"));
        assert_eq!(fields["subtotal"].value.as_deref(), Some("650.00"));
        assert_eq!(fields["tax_rate"].value.as_deref(), Some("5%"));
        assert_eq!(fields["payment_terms"].value.as_deref(), Some("Net 30"));
    }

    #[test]
    fn test_grand_total_without_competing_labels() {
        let fields = extract("Grand Total: 682.50");
        assert_eq!(fields["grand_total"].value.as_deref(), Some("682.50"));
        assert_eq!(fields["grand_total"].confidence, 90.0);
    }

    #[test]
    fn test_supplier_customer_sections() {
        let fields = extract(SAMPLE);

        assert_eq!(
            fields["supplier_name"].value.as_deref(),
            Some("ACME SUPPLIES LLC")
        );
        assert_eq!(
            fields["customer_name"].value.as_deref(),
            Some("GULF TRADING COMPANY")
        );
        assert_eq!(
            fields["supplier_email"].value.as_deref(),
            Some("sales@acmesupplies.ae")
        );
        assert_eq!(
            fields["customer_email"].value.as_deref(),
            Some("billing@gulftrading.ae")
        );
        assert!(fields["supplier_address"]
            .value
            .as_deref()
            .unwrap()
            .contains("12 Industrial Road"));
        assert!(fields["customer_address"]
            .value
            .as_deref()
            .unwrap()
            .contains("8 Harbour Street"));
    }

    #[test]
    fn test_line_items_are_counted_not_parsed() {
        let fields = extract(SAMPLE);
        assert_eq!(fields["line_items"].value.as_deref(), Some("2 items"));
        assert_eq!(fields["line_items"].confidence, 70.0);
    }

    #[test]
    fn test_bank_details_serialized_as_json() {
        let fields = extract(SAMPLE);
        let blob = fields["bank_details"].value.clone().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(
            parsed["iban"].as_str(),
            Some("AE070331234567890123456")
        );
    }

    #[test]
    fn test_no_header_means_zero_line_items() {
        assert_eq!(count_line_items("no table in sight\n1 2 3"), 0);
    }

    #[test]
    fn test_garbage_yields_empty_map() {
        assert!(extract("^^^^").is_empty());
    }
}

//! Trade/commercial license extraction: labeled registry numbers, the
//! licensed company name with its legal-entity suffix, and the members and
//! partners tables read by one positional row regex each — fixed column
//! order (index, name, nationality, role, share), no header detection, so
//! reordered columns break the rows. That columnar contract is inherited
//! from the printed license layout.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::models::{ExtractedField, FieldMap};

const SOURCE: &str = "LICENSE_OCR";

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .unwrap()
}

lazy_static! {
    static ref LICENSE_TYPE: Regex =
        ci(r"((?:commercial|professional|industrial|trade|business)\s*licen[cs]e)");
    static ref LICENSE_NO: Regex = ci(r"licen[cs]e\s*no\.?\s*[:\-]?\s*(\d{4,10})");
    static ref MAIN_LICENSE_NO: Regex =
        ci(r"main\s*licen[cs]e\s*no\.?\s*[:\-]?\s*(\d{4,10})");
    static ref REGISTER_NO: Regex = ci(r"register\s*no\.?\s*[:\-]?\s*(\d{4,10})");
    static ref DCCI_NO: Regex = ci(r"dcci\s*no\.?\s*[:\-]?\s*(\d{4,10})");
    static ref DUNS_NO: Regex = ci(r"duns\s*(?:no|number)\.?\s*[:\-]?\s*([\d\-]{6,15})");
    static ref COMPANY_NAME: Regex =
        ci(r"([A-Z][A-Za-z\s&\-\.]+(?:L\.L\.C|LLC|LTD|LIMITED|EST))");
    static ref COMPANY_LABEL: Regex = ci(r"(?:company\s*name|trade\s*name|name)\s*[:\-]\s*");
    static ref LEGAL_TYPE: Regex = ci(r"legal\s*(?:form|type)\s*[:\-]?\s*([A-Za-z .]{3,40})");
    static ref ISSUE_DATE: Regex =
        ci(r"issue\s*date\s*[:\-]?\s*(\d{1,2}[/\-\.]\d{1,2}[/\-\.]\d{4})");
    static ref EXPIRY_DATE: Regex =
        ci(r"expiry\s*date\s*[:\-]?\s*(\d{1,2}[/\-\.]\d{1,2}[/\-\.]\d{4})");
    static ref ADDRESS: Regex = ci(r"address\s*[:\-]\s*([^\n]{5,120})");
    static ref PO_BOX: Regex = ci(r"p\.?o\.?\s*box\s*[:\-]?\s*(\d{2,8})");
    static ref PHONE: Regex = ci(r"(?:phone|tel)\s*(?:no)?\s*[:\-]?\s*([+\d\s\-]{7,18})");
    static ref FAX: Regex = ci(r"fax\s*(?:no)?\s*[:\-]?\s*([+\d\s\-]{7,18})");
    static ref MOBILE: Regex = ci(r"mobile\s*(?:no)?\s*[:\-]?\s*([+\d\s\-]{7,18})");
    static ref EMAIL: Regex =
        Regex::new(r"\b([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})\b").unwrap();
    // Table rows in fixed column order: index, name, nationality, role,
    // share percentage.
    static ref MEMBER_ROW: Regex = ci(
        r"(?m)^\s*(\d{1,2})[\.\)]?\s+([A-Z][A-Za-z\s\.]+?)\s+([A-Z][A-Za-z]+)\s+(MANAGER|DIRECTOR|SECRETARY|AGENT)\s+(\d{1,3}(?:\.\d+)?)\s*%?\s*$"
    );
    static ref PARTNER_ROW: Regex = ci(
        r"(?m)^\s*(\d{1,2})[\.\)]?\s+([A-Z][A-Za-z\s\.]+?)\s+([A-Z][A-Za-z]+)\s+(PARTNER|OWNER|SHAREHOLDER|SPONSOR)\s+(\d{1,3}(?:\.\d+)?)\s*%?\s*$"
    );
}

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

    capture("license_type", &LICENSE_TYPE, 90.0);
    capture("main_license_no", &MAIN_LICENSE_NO, 92.0);
    capture("register_no", &REGISTER_NO, 90.0);
    capture("dcci_no", &DCCI_NO, 90.0);
    capture("duns_no", &DUNS_NO, 88.0);
    capture("legal_type", &LEGAL_TYPE, 85.0);
    capture("issue_date", &ISSUE_DATE, 88.0);
    capture("expiry_date", &EXPIRY_DATE, 88.0);
    capture("address", &ADDRESS, 75.0);
    capture("po_box", &PO_BOX, 90.0);
    capture("phone", &PHONE, 85.0);
    capture("fax", &FAX, 85.0);
    capture("mobile", &MOBILE, 85.0);
    capture("email", &EMAIL, 90.0);

    // The plain license number: skip matches that belong to the main
    // license label.
    if let Some(caps) = LICENSE_NO
        .captures_iter(text)
        .find(|caps| !is_main_license_context(text, caps))
    {
        fields.insert(
            "license_no".to_string(),
            ExtractedField::new(caps[1].trim(), 92.0, SOURCE),
        );
    }

    if let Some(name) = extract_company_name(text) {
        fields.insert(
            "company_name".to_string(),
            ExtractedField::new(name, 85.0, SOURCE),
        );
    }

    if let Some(rows) = extract_table(text, &MEMBER_ROW) {
        fields.insert(
            "members_table".to_string(),
            ExtractedField::new(rows, 80.0, SOURCE),
        );
    }
    if let Some(rows) = extract_table(text, &PARTNER_ROW) {
        fields.insert(
            "partners_table".to_string(),
            ExtractedField::new(rows, 80.0, SOURCE),
        );
    }

    fields
}

fn is_main_license_context(text: &str, caps: &regex::Captures) -> bool {
    let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
    let prefix_start = start.saturating_sub(8);
    text.get(prefix_start..start)
        .map(|p| p.to_lowercase().contains("main"))
        .unwrap_or(false)
}

/// The licensed entity name: a capitalized phrase ending in a legal-entity
/// suffix, with any accidentally captured label stripped off the front.
fn extract_company_name(text: &str) -> Option<String> {
    let caps = COMPANY_NAME.captures(text)?;
    let name = COMPANY_LABEL.replace_all(caps[1].trim(), "");
    let name = name.trim().to_uppercase();
    if name.chars().count() >= 8 {
        Some(name)
    } else {
        None
    }
}

/// All rows matching the positional column regex, serialized as a JSON
/// array. None when the table is absent.
fn extract_table(text: &str, row_pattern: &Regex) -> Option<String> {
    let rows: Vec<serde_json::Value> = row_pattern
        .captures_iter(text)
        .map(|caps| {
            serde_json::json!({
                "index": caps[1].trim(),
                "name": caps[2].trim(),
                "nationality": caps[3].trim(),
                "role": caps[4].trim(),
                "share": caps[5].trim(),
            })
        })
        .collect();

    if rows.is_empty() {
        None
    } else {
        serde_json::to_string(&rows).ok()
    }
}

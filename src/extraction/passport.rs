//! Passport extraction: the MRZ carries almost everything; the visual page
//! only supplements issue date and issue place, which the zone does not
//! encode.

use chrono::{Datelike, Days, NaiveDate};
use lazy_static::lazy_static;
use regex::RegexBuilder;

use crate::extraction::mrz;
use crate::models::{ExtractedField, FieldMap};

const SOURCE_PAGE: &str = "PAGE_OCR";

lazy_static! {
    static ref LABELED_ISSUE_DATE: regex::Regex = RegexBuilder::new(
        r"issue.*?(\d{2}[/-]\d{2}[/-]\d{4})"
    )
    .case_insensitive(true)
    .dot_matches_new_line(true)
    .build()
    .unwrap();
    static ref RECENT_DATE: regex::Regex =
        regex::Regex::new(r"(\d{2}[/-]\d{2}[/-]20(?:1|2)\d)").unwrap();
}

const ISSUE_CITIES: [&str; 14] = [
    "Mumbai",
    "Delhi",
    "Bangalore",
    "Chennai",
    "Kolkata",
    "Hyderabad",
    "Pune",
    "Ahmedabad",
    "Madurai",
    "Kochi",
    "Trivandrum",
    "Kannanoor",
    "Coimbatore",
    "Vellore",
];

pub fn extract(text: &str) -> FieldMap {
    let mut fields = mrz::decode(text);
    if fields.is_empty() {
        return fields;
    }

    let expiry = fields
        .get("expiry_date")
        .and_then(|f| f.value.clone());
    if let Some(issue_date) = extract_issue_date(text, expiry.as_deref()) {
        fields.insert(
            "issue_date".to_string(),
            ExtractedField::new(issue_date, 80.0, SOURCE_PAGE),
        );
    }

    if let Some(place) = extract_issue_place(text) {
        fields.insert(
            "issue_place".to_string(),
            ExtractedField::new(place, 75.0, SOURCE_PAGE),
        );
    }

    // Schema-compatibility placeholders: the passport page carries none of
    // these, but downstream consumers expect the keys to exist.
    for name in ["address", "father_name", "mother_name"] {
        fields.insert(name.to_string(), ExtractedField::placeholder());
    }

    fields
}

/// Issue date from the page text; when absent, derived from the expiry date
/// assuming the standard ten-year validity window.
fn extract_issue_date(text: &str, expiry_date: Option<&str>) -> Option<String> {
    for pattern in [&*LABELED_ISSUE_DATE, &*RECENT_DATE] {
        if let Some(caps) = pattern.captures(text) {
            let raw = caps[1].to_string();
            let parsed = if raw.contains('/') {
                NaiveDate::parse_from_str(&raw, "%d/%m/%Y")
            } else {
                NaiveDate::parse_from_str(&raw, "%d-%m-%Y")
            };
            if let Ok(date) = parsed {
                return Some(date.format("%d-%b-%y").to_string());
            }
        }
    }

    let expiry = NaiveDate::parse_from_str(expiry_date?, "%d-%b-%y").ok()?;
    let issue = expiry
        .with_year(expiry.year() - 10)?
        .checked_add_days(Days::new(1))?;
    Some(issue.format("%d-%b-%y").to_string())
}

fn extract_issue_place(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    ISSUE_CITIES
        .iter()
        .find(|city| lower.contains(&city.to_lowercase()))
        .map(|city| city.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "REPUBLIC OF INDIA\nDate of Issue 20/09/2022\nMadurai\nP<INDSUNDAR<RAJ<MEKALA<<CHURCHIL<<<<<<<<<<<<<<\nW1403565<2IND9609211M3209192064574868122<36";

    #[test]
    fn test_extract_combines_mrz_and_page_fields() {
        let fields = extract(SAMPLE);

        assert_eq!(fields["passport_number"].value.as_deref(), Some("W1403565"));
        assert_eq!(fields["issue_date"].value.as_deref(), Some("20-Sep-22"));
        assert_eq!(fields["issue_date"].source, "PAGE_OCR");
        assert_eq!(fields["issue_place"].value.as_deref(), Some("Madurai"));
        assert_eq!(fields["issue_place"].confidence, 75.0);
    }

    #[test]
    fn test_issue_date_derived_from_expiry() {
        // No issue date on the page: fall back to expiry minus the ten-year
        // validity window, plus one day.
        let derived = extract_issue_date("no dates here", Some("19-Sep-32"));
        assert_eq!(derived.as_deref(), Some("20-Sep-22"));
    }

    #[test]
    fn test_placeholders_present_for_schema_compat() {
        let fields = extract(SAMPLE);
        for name in ["address", "father_name", "mother_name"] {
            assert!(fields[name].value.is_none());
            assert_eq!(fields[name].confidence, 0.0);
        }
    }

    #[test]
    fn test_no_mrz_means_no_fields() {
        assert!(extract("an unrelated shopping list").is_empty());
    }
}

//! Emirates ID extraction. The card number has a fixed 784-YYYY-NNNNNNN-C
//! shape; the three printed dates carry no labels and are assigned roles by
//! chronological order.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::extraction::text::{strip_arabic, title_case};
use crate::models::{ExtractedField, FieldMap};

const SOURCE: &str = "EMIRATES_OCR";

lazy_static! {
    static ref ID_FORMATTED: Regex = Regex::new(r"(\d{3}-\d{4}-\d{7}-\d)").unwrap();
    static ref ID_CONTINUOUS: Regex = Regex::new(r"(\d{15,})").unwrap();
    static ref NAME_SEQUENCE: Regex =
        Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+){2,})\b").unwrap();
    static ref CARD_DATE: Regex = Regex::new(r"\b(\d{2}/\d{2}/\d{4})\b").unwrap();
    static ref SEX_STANDALONE: Regex = Regex::new(r"\b([MF])\b").unwrap();
    static ref SEX_LABELED: Regex = RegexBuilder::new(r"(?:Sex|الجنس)[:\s]*([MFذكرأنثى]+)")
        .case_insensitive(true)
        .build()
        .unwrap();
}

const NAME_BLACKLIST: [&str; 16] = [
    "EMIRATES",
    "IDENTITY",
    "CARD",
    "RESIDENT",
    "NATIONALITY",
    "AUTHORITY",
    "CITIZENSHIP",
    "DATE",
    "BIRTH",
    "ISSUING",
    "EXPIRY",
    "NAME",
    "SEX",
    "SIGNATURE",
    "FEDERAL",
    "OCCUPATION",
];

const NATIONALITY_COUNTRIES: [&str; 13] = [
    "INDIA",
    "PAKISTAN",
    "BANGLADESH",
    "PHILIPPINES",
    "EGYPT",
    "JORDAN",
    "SYRIA",
    "LEBANON",
    "UNITED STATES",
    "UK",
    "CANADA",
    "NEPAL",
    "SRI LANKA",
];

pub fn extract(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();

    if let Some(caps) = ID_FORMATTED.captures(text) {
        fields.insert(
            "emirates_id_number".to_string(),
            ExtractedField::new(&caps[1], 95.0, SOURCE),
        );
    } else if let Some(caps) = ID_CONTINUOUS.captures(text) {
        let digits: String = caps[1].chars().take(15).collect();
        let formatted = format!(
            "{}-{}-{}-{}",
            &digits[0..3],
            &digits[3..7],
            &digits[7..14],
            &digits[14..15]
        );
        fields.insert(
            "emirates_id_number".to_string(),
            ExtractedField::new(formatted, 90.0, SOURCE),
        );
    }

    if let Some(name) = extract_name(text) {
        fields.insert(
            "name_on_emirates_id".to_string(),
            ExtractedField::new(name, 85.0, SOURCE),
        );
    }

    extract_dates(text, &mut fields);

    let upper = text.to_uppercase();
    if let Some(country) = NATIONALITY_COUNTRIES.iter().find(|c| upper.contains(*c)) {
        fields.insert(
            "nationality".to_string(),
            ExtractedField::new(title_case(country), 90.0, SOURCE),
        );
    }

    if let Some(gender) = extract_gender(text) {
        fields.insert(
            "gender".to_string(),
            ExtractedField::new(gender, 85.0, SOURCE),
        );
    }

    fields
}

/// Longest title-cased word sequence that avoids the card's boilerplate.
fn extract_name(text: &str) -> Option<String> {
    let mut potential = Vec::new();
    for caps in NAME_SEQUENCE.captures_iter(text) {
        let name = caps[1].to_string();
        if name.chars().count() < 15 {
            continue;
        }
        if NAME_BLACKLIST.iter().any(|k| name.to_uppercase().contains(k)) {
            continue;
        }
        let cleaned = strip_arabic(&name);
        if cleaned.chars().count() >= 15 {
            potential.push(cleaned);
        }
    }
    potential.into_iter().max_by_key(|n| n.chars().count())
}

/// Unlabeled DD/MM/YYYY dates, assigned to roles by numeric sort order:
/// earliest is taken as date of birth, latest as expiry, the middle one (if
/// all three printed) as the issue date. Layouts that violate that
/// chronological assumption get the roles wrong; this is a documented
/// limitation of the card format heuristics.
fn extract_dates(text: &str, fields: &mut FieldMap) {
    let mut dates: Vec<String> = CARD_DATE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect();

    let sort_key = |d: &String| -> (u32, u32, u32) {
        let parts: Vec<u32> = d.split('/').filter_map(|p| p.parse().ok()).collect();
        match parts.as_slice() {
            [dd, mm, yyyy] => (*yyyy, *mm, *dd),
            _ => (0, 0, 0),
        }
    };

    if dates.len() >= 3 {
        dates.sort_by_key(sort_key);
        fields.insert(
            "date_of_birth".to_string(),
            ExtractedField::new(dates[0].clone(), 90.0, SOURCE),
        );
        fields.insert(
            "issue_date".to_string(),
            ExtractedField::new(dates[1].clone(), 88.0, SOURCE),
        );
        fields.insert(
            "expiry_date".to_string(),
            ExtractedField::new(dates[2].clone(), 90.0, SOURCE),
        );
    } else if dates.len() == 2 {
        fields.insert(
            "date_of_birth".to_string(),
            ExtractedField::new(dates[0].clone(), 85.0, SOURCE),
        );
        fields.insert(
            "expiry_date".to_string(),
            ExtractedField::new(dates[1].clone(), 85.0, SOURCE),
        );
    } else if dates.len() == 1 {
        fields.insert(
            "date_of_birth".to_string(),
            ExtractedField::new(dates[0].clone(), 80.0, SOURCE),
        );
    }
}

fn extract_gender(text: &str) -> Option<String> {
    for pattern in [&*SEX_STANDALONE, &*SEX_LABELED] {
        if let Some(caps) = pattern.captures(text) {
            let value = caps[1].to_uppercase();
            if value.contains("ذكر") || value == "M" {
                return Some("Male".to_string());
            }
            if value.contains("أنثى") || value == "F" {
                return Some("Female".to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "UNITED ARAB EMIRATES\nFederal Authority For Identity and Citizenship\nID Number 784-1996-1234567-1\nMohammed Abdul Raheem Khan\nNationality: India\nDate of Birth 21/09/1996\n15/03/2021\n14/03/2026\nSex: M";

    #[test]
    fn test_extract_emirates_id_fields() {
        let fields = extract(SAMPLE);

        assert_eq!(
            fields["emirates_id_number"].value.as_deref(),
            Some("784-1996-1234567-1")
        );
        assert_eq!(fields["emirates_id_number"].confidence, 95.0);
        assert_eq!(
            fields["name_on_emirates_id"].value.as_deref(),
            Some("Mohammed Abdul Raheem Khan")
        );
        assert_eq!(fields["nationality"].value.as_deref(), Some("India"));
        assert_eq!(fields["gender"].value.as_deref(), Some("Male"));
    }

    #[test]
    fn test_three_dates_assigned_by_sort_order() {
        let fields = extract(SAMPLE);
        assert_eq!(fields["date_of_birth"].value.as_deref(), Some("21/09/1996"));
        assert_eq!(fields["issue_date"].value.as_deref(), Some("15/03/2021"));
        assert_eq!(fields["expiry_date"].value.as_deref(), Some("14/03/2026"));
    }

    #[test]
    fn test_two_dates_skip_issue_role() {
        let fields = extract("784-1996-1234567-1\n21/09/1996\n14/03/2026");
        assert_eq!(fields["date_of_birth"].value.as_deref(), Some("21/09/1996"));
        assert_eq!(fields["expiry_date"].value.as_deref(), Some("14/03/2026"));
        assert!(!fields.contains_key("issue_date"));
    }

    #[test]
    fn test_continuous_digits_get_formatted() {
        let fields = extract("ID 784199612345671 end");
        assert_eq!(
            fields["emirates_id_number"].value.as_deref(),
            Some("784-1996-1234567-1")
        );
        assert_eq!(fields["emirates_id_number"].confidence, 90.0);
    }

    #[test]
    fn test_garbage_yields_empty_map() {
        assert!(extract("????").is_empty());
    }
}

//! Entry permit extraction. Permits carry a long tail of administrative
//! fields, so the targeted label searches are topped up with the generic
//! key-value sweep for whatever else the form spells out as `Label : Value`.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::extraction::patterns::extract_key_value_pairs;
use crate::extraction::text::{colon_value, has_digit, next_textual_line};
use crate::models::{ExtractedField, FieldMap};

const SOURCE: &str = "ENTRY_PERMIT_OCR";

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

lazy_static! {
    static ref PERMIT_NUMBER: Regex =
        ci(r"(?:entry\s*)?permit\s*(?:no|number)\.?\s*[:\-]?\s*([A-Z0-9/\-]{6,18})");
    static ref UID_NUMBER: Regex = ci(r"(?:u\.?i\.?d|unified)\s*(?:no|number)?\.?\s*[:\-]?\s*(\d{9,15})");
    static ref FILE_NUMBER: Regex = ci(r"file\s*(?:no|number)?\.?\s*[:\-]?\s*(\d{2,3}/\d{4}/\d+)");
    static ref VISA_NUMBER: Regex =
        ci(r"visa\s*(?:no|number)\.?\s*[:\-]?\s*([A-Z0-9/\-]{6,20})");
    static ref APPLICATION_NUMBER: Regex =
        ci(r"application\s*(?:no|number)\.?\s*[:\-]?\s*([A-Z0-9/\-]{4,20})");
    static ref PASSPORT_NUMBER: Regex = Regex::new(r"\b([A-Z]{1,2}[0-9]{7,8})\b").unwrap();
    static ref SLASH_DATE: Regex = Regex::new(r"([0-3]?\d[/-][0-1]?\d[/-]\d{4})").unwrap();
    static ref VALID_FROM: Regex =
        ci(r"valid\s*from\s*[:\-]?\s*([0-3]?\d[/-][0-1]?\d[/-]\d{4})");
    static ref VALID_UNTIL: Regex =
        ci(r"valid\s*(?:until|to)\s*[:\-]?\s*([0-3]?\d[/-][0-1]?\d[/-]\d{4})");
}

pub fn extract(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    let lines: Vec<&str> = text.lines().collect();

    let mut capture = |name: &str, pattern: &Regex, confidence: f64| {
        if let Some(caps) = pattern.captures(text) {
            fields.insert(
                name.to_string(),
                ExtractedField::new(caps[1].trim(), confidence, SOURCE),
            );
        }
    };

    capture("permit_number", &PERMIT_NUMBER, 90.0);
    capture("uid_number", &UID_NUMBER, 92.0);
    capture("file_number", &FILE_NUMBER, 90.0);
    capture("visa_number", &VISA_NUMBER, 88.0);
    capture("application_number", &APPLICATION_NUMBER, 88.0);
    capture("valid_from", &VALID_FROM, 85.0);
    capture("valid_until", &VALID_UNTIL, 85.0);

    // Full name.
    for (i, line) in lines.iter().enumerate() {
        if line.to_uppercase().contains("NAME") {
            if let Some(name) = colon_value(line).filter(|n| !has_digit(n)) {
                fields.insert(
                    "full_name".to_string(),
                    ExtractedField::new(name, 88.0, SOURCE),
                );
                break;
            }
            if let Some(next) = next_textual_line(&lines, i) {
                fields.insert(
                    "full_name".to_string(),
                    ExtractedField::new(next, 85.0, SOURCE),
                );
                break;
            }
        }
    }

    // Nationality.
    for (i, line) in lines.iter().enumerate() {
        if line.to_uppercase().contains("NATIONALITY") {
            if let Some(value) = colon_value(line) {
                fields.insert(
                    "nationality".to_string(),
                    ExtractedField::new(value, 90.0, SOURCE),
                );
                break;
            }
            if let Some(next) = next_textual_line(&lines, i) {
                fields.insert(
                    "nationality".to_string(),
                    ExtractedField::new(next, 88.0, SOURCE),
                );
                break;
            }
        }
    }

    // Passport number near its label.
    for (i, line) in lines.iter().enumerate() {
        if line.to_uppercase().contains("PASSPORT") {
            if let Some(caps) = PASSPORT_NUMBER.captures(line) {
                fields.insert(
                    "passport_number".to_string(),
                    ExtractedField::new(&caps[1], 92.0, SOURCE),
                );
                break;
            }
            if let Some(next) = lines.get(i + 1) {
                if let Some(caps) = PASSPORT_NUMBER.captures(next) {
                    fields.insert(
                        "passport_number".to_string(),
                        ExtractedField::new(&caps[1], 90.0, SOURCE),
                    );
                    break;
                }
            }
        }
    }

    // Date of birth.
    for line in &lines {
        let upper = line.to_uppercase();
        if upper.contains("DOB") || (upper.contains("DATE") && upper.contains("BIRTH")) {
            if let Some(caps) = SLASH_DATE.captures(line) {
                fields.insert(
                    "date_of_birth".to_string(),
                    ExtractedField::new(caps[1].replace('-', "/"), 90.0, SOURCE),
                );
                break;
            }
        }
    }

    // Only top up with the generic sweep when the targeted passes found a
    // recognizable permit; sweeping arbitrary text would fabricate fields.
    if !fields.is_empty() {
        for (name, field) in extract_key_value_pairs(text) {
            fields.entry(name).or_insert(field);
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "UNITED ARAB EMIRATES\nENTRY PERMIT\nPermit No: 20240122334455\nU.I.D No: 123456789\nFile No: 101/2024/55667\nName : RAHUL KUMAR SHARMA\nNationality : INDIA\nPassport No K1234567\nDate of Birth 21/09/1996\nValid From: 01/07/2024\nValid Until: 29/08/2024\nSponsor Name : ACME TRADING LLC\nPort of Entry : DUBAI AIRPORT";

    #[test]
    fn test_extract_entry_permit_fields() {
        let fields = extract(SAMPLE);

        assert_eq!(
            fields["permit_number"].value.as_deref(),
            Some("20240122334455")
        );
        assert_eq!(fields["uid_number"].value.as_deref(), Some("123456789"));
        assert_eq!(
            fields["file_number"].value.as_deref(),
            Some("101/2024/55667")
        );
        assert_eq!(
            fields["full_name"].value.as_deref(),
            Some("RAHUL KUMAR SHARMA")
        );
        assert_eq!(fields["passport_number"].value.as_deref(), Some("K1234567"));
        assert_eq!(fields["valid_from"].value.as_deref(), Some("01/07/2024"));
        assert_eq!(fields["valid_until"].value.as_deref(), Some("29/08/2024"));
    }

    #[test]
    fn test_key_value_sweep_tops_up_long_tail_fields() {
        let fields = extract(SAMPLE);

        // Fields no targeted pass looks for, recovered by the sweep.
        assert_eq!(
            fields["sponsor_name"].value.as_deref(),
            Some("ACME TRADING LLC")
        );
        assert_eq!(fields["sponsor_name"].source, "KEY_VALUE");
        assert_eq!(
            fields["port_of_entry"].value.as_deref(),
            Some("DUBAI AIRPORT")
        );
        // Targeted results are never overwritten by the sweep.
        assert_eq!(fields["full_name"].source, "ENTRY_PERMIT_OCR");
    }

    #[test]
    fn test_garbage_yields_empty_map() {
        assert!(extract("||||").is_empty());
    }
}

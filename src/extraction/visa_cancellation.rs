//! Visa/residence cancellation form extraction: label-anchored fields off
//! the application layout.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::extraction::text::{colon_value, has_digit, next_textual_line};
use crate::models::{ExtractedField, FieldMap};

const SOURCE: &str = "CANCELLATION_OCR";

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

lazy_static! {
    static ref PASSPORT_NUMBER: Regex = Regex::new(r"\b([A-Z]{1,2}[0-9]{7,8})\b").unwrap();
    static ref SLASH_DATE: Regex = Regex::new(r"([0-3]?\d[/-][0-1]?\d[/-]\d{4})").unwrap();
    static ref CANCELLATION_DATE: Regex =
        ci(r"cancellation\s*date\s*[:\-]?\s*([0-3]?\d[/-][0-1]?\d[/-]\d{4})");
    static ref APPLICATION_NUMBER: Regex =
        ci(r"application\s*(?:no|number)\.?\s*[:\-]?\s*([A-Z0-9/\-]{4,20})");
    static ref CANCELLATION_REF: Regex =
        ci(r"cancellation\s*(?:transaction|ref(?:erence)?)\s*(?:no|number)?\.?\s*[:\-]?\s*([A-Z0-9/\-]{4,20})");
    static ref ESTABLISHMENT_NUMBER: Regex =
        ci(r"establishment\s*(?:no|number)\.?\s*[:\-]?\s*(\d{4,12})");
    static ref VISA_NUMBER: Regex =
        ci(r"visa\s*(?:no|number)\.?\s*[:\-]?\s*([A-Z0-9/\-]{6,20})");
    static ref SPONSOR_COMPANY: Regex = RegexBuilder::new(
        r"([A-Z][A-Za-z\s&\-]+(?:L\.L\.C|LLC|LTD|LIMITED))"
    )
    .case_insensitive(true)
    .build()
    .unwrap();
    static ref SPONSOR_LABEL: Regex = ci(r"\bsponsor\b\s*[:\-]?\s*");
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

    capture("cancellation_date", &CANCELLATION_DATE, 90.0);
    capture("application_number", &APPLICATION_NUMBER, 90.0);
    capture("cancellation_ref", &CANCELLATION_REF, 88.0);
    capture("establishment_number", &ESTABLISHMENT_NUMBER, 88.0);
    capture("visa_number", &VISA_NUMBER, 88.0);

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

    // Profession.
    for line in &lines {
        if line.to_uppercase().contains("PROFESSION") {
            if let Some(value) = colon_value(line) {
                fields.insert(
                    "profession".to_string(),
                    ExtractedField::new(value, 85.0, SOURCE),
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

    // Sponsoring establishment.
    if let Some(caps) = SPONSOR_COMPANY.captures(text) {
        let sponsor = SPONSOR_LABEL.replace_all(caps[1].trim(), "").trim().to_string();
        if sponsor.chars().count() >= 10 {
            fields.insert(
                "sponsor_name".to_string(),
                ExtractedField::new(sponsor, 80.0, SOURCE),
            );
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "APPLICATION FOR CANCELLATION\nResidence Cancellation\nApplication No: 2024/445566\nName : RAHUL KUMAR SHARMA\nNationality : INDIA\nProfession : ENGINEER\nPassport No K1234567\nDate of Birth 21/09/1996\nEstablishment No: 78901234\nSponsor ENGISOFT TECHNICAL SERVICES LLC\nCancellation Date: 12/06/2024";

    #[test]
    fn test_extract_cancellation_fields() {
        let fields = extract(SAMPLE);

        assert_eq!(
            fields["application_number"].value.as_deref(),
            Some("2024/445566")
        );
        assert_eq!(
            fields["cancellation_date"].value.as_deref(),
            Some("12/06/2024")
        );
        assert_eq!(
            fields["full_name"].value.as_deref(),
            Some("RAHUL KUMAR SHARMA")
        );
        assert_eq!(fields["nationality"].value.as_deref(), Some("INDIA"));
        assert_eq!(fields["profession"].value.as_deref(), Some("ENGINEER"));
        assert_eq!(fields["passport_number"].value.as_deref(), Some("K1234567"));
        assert_eq!(fields["date_of_birth"].value.as_deref(), Some("21/09/1996"));
        assert_eq!(
            fields["establishment_number"].value.as_deref(),
            Some("78901234")
        );
        assert!(fields["sponsor_name"]
            .value
            .as_deref()
            .unwrap()
            .contains("ENGISOFT"));
    }

    #[test]
    fn test_garbage_yields_empty_map() {
        assert!(extract("....").is_empty());
    }
}

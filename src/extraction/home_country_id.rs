//! Home-country ID extraction, shaped around the Indian Aadhaar card: a
//! 12-digit number that never starts 0 or 1, a DOB label, and name/address
//! blocks located relative to the government header.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::extraction::text::{has_digit, title_case};
use crate::models::{ExtractedField, FieldMap};

const SOURCE: &str = "AADHAAR_OCR";

lazy_static! {
    static ref AADHAAR_COMPACT: Regex = Regex::new(r"^[2-9]\d{11}$").unwrap();
    static ref AADHAAR_SPACED: Regex = Regex::new(r"^[2-9]\d{3}\s\d{4}\s\d{4}$").unwrap();
    static ref DOB_LINE: Regex = RegexBuilder::new(r"DOB[:\s]*([0-3]?\d[/\-][0-1]?\d[/\-]\d{4})")
        .case_insensitive(true)
        .build()
        .unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[\s-]").unwrap();
    static ref MULTI_SPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref EMPTY_LIST_ITEMS: Regex = Regex::new(r",\s*,").unwrap();
}

const NAME_SKIP_WORDS: [&str; 13] = [
    "GOVERNMENT",
    "INDIA",
    "UNIQUE",
    "IDENTIFICATION",
    "AUTHORITY",
    "AADHAAR",
    "DOB",
    "MALE",
    "FEMALE",
    "ADDRESS",
    "WWW",
    "HTTP",
    "HELP",
];

const ADDRESS_INDICATORS: [&str; 5] = ["D/O", "S/O", "C/O", "W/O", "ADDRESS"];

const ADDRESS_SKIP_TERMS: [&str; 9] = [
    "GOVERNMENT",
    "UNIQUE",
    "IDENTIFICATION",
    "AUTHORITY",
    "WWW",
    "HTTP",
    "HELP@",
    "UIDAI",
    "1800",
];

pub fn extract(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    let lines: Vec<&str> = text.lines().collect();

    // The Aadhaar number prints either spaced (XXXX XXXX XXXX) or fused by
    // the OCR; normalize to the spaced form either way.
    for line in &lines {
        let compact = SEPARATORS.replace_all(line, "");
        if AADHAAR_COMPACT.is_match(&compact) {
            let formatted = format!(
                "{} {} {}",
                &compact[0..4],
                &compact[4..8],
                &compact[8..12]
            );
            fields.insert(
                "aadhaar_number".to_string(),
                ExtractedField::new(formatted, 95.0, SOURCE),
            );
            break;
        }
        if AADHAAR_SPACED.is_match(line.trim()) {
            fields.insert(
                "aadhaar_number".to_string(),
                ExtractedField::new(line.trim(), 95.0, SOURCE),
            );
            break;
        }
    }

    for line in &lines {
        if let Some(caps) = DOB_LINE.captures(line) {
            let dob = caps[1].replace('-', "/");
            fields.insert(
                "date_of_birth".to_string(),
                ExtractedField::new(dob, 90.0, SOURCE),
            );
            break;
        }
    }

    for line in &lines {
        let upper = line.trim().to_uppercase();
        if upper == "MALE" || upper == "FEMALE" || upper == "TRANSGENDER" {
            fields.insert(
                "gender".to_string(),
                ExtractedField::new(title_case(&upper), 95.0, SOURCE),
            );
            break;
        }
    }

    if let Some(name) = extract_name(&lines) {
        fields.insert(
            "full_name".to_string(),
            ExtractedField::new(name, 85.0, SOURCE),
        );
    }

    if let Some(address) = extract_address(&lines) {
        fields.insert(
            "address".to_string(),
            ExtractedField::new(address, 80.0, SOURCE),
        );
    }

    fields
}

/// The holder's name sits between the government header and the DOB line;
/// collect up to three plausible digit-free lines from that window.
fn extract_name(lines: &[&str]) -> Option<String> {
    let mut name_parts: Vec<String> = Vec::new();
    let mut found_government = false;

    for line in lines {
        let line_clean = line.trim();
        let upper = line.to_uppercase();

        if upper.contains("GOVERNMENT") || upper.contains("INDIA") {
            found_government = true;
            continue;
        }
        if upper.contains("DOB") {
            break;
        }

        if found_government
            && !line_clean.is_empty()
            && !has_digit(line_clean)
            && !NAME_SKIP_WORDS.iter().any(|w| upper.contains(w))
            && line_clean.chars().count() > 1
            && !line_clean.starts_with("http")
            && !line_clean.starts_with("www")
        {
            name_parts.push(line_clean.to_string());
            if name_parts.len() >= 3 {
                break;
            }
        }
    }

    if name_parts.is_empty() {
        return None;
    }
    let full_name = MULTI_SPACE
        .replace_all(&name_parts.join(" "), " ")
        .trim()
        .to_string();
    Some(full_name)
}

/// Addresses open with a D/O, S/O, C/O or W/O relation marker and run until
/// the Aadhaar number; UIDAI contact boilerplate is dropped along the way.
fn extract_address(lines: &[&str]) -> Option<String> {
    let mut address_parts: Vec<String> = Vec::new();
    let mut capture = false;

    for line in lines {
        let line_clean = line.trim();
        let upper = line.to_uppercase();

        if ADDRESS_INDICATORS.iter().any(|ind| upper.contains(ind)) && !capture {
            capture = true;
            // Bare indicator lines add nothing; lines with content keep it.
            if !ADDRESS_INDICATORS.contains(&upper.trim()) {
                address_parts.push(line_clean.to_string());
            }
            continue;
        }

        if capture {
            let compact = SEPARATORS.replace_all(line_clean, "");
            if AADHAAR_COMPACT.is_match(&compact) {
                break;
            }
            if ADDRESS_SKIP_TERMS.iter().any(|t| upper.contains(t)) {
                continue;
            }
            if line_clean.chars().count() > 1 {
                address_parts.push(line_clean.to_string());
            }
        }
    }

    if address_parts.is_empty() {
        return None;
    }
    let joined = address_parts.join(", ");
    let joined = EMPTY_LIST_ITEMS.replace_all(&joined, ",");
    let joined = MULTI_SPACE.replace_all(&joined, " ");
    Some(joined.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Government of India\nChurchil Sundar Raj\nMekala\nDOB: 21/09/1996\nMALE\nS/O Sundar Raj\n12 Main Street\nMadurai District\nTamil Nadu 625001\n9214 5678 9012";

    #[test]
    fn test_extract_aadhaar_fields() {
        let fields = extract(SAMPLE);

        assert_eq!(
            fields["aadhaar_number"].value.as_deref(),
            Some("9214 5678 9012")
        );
        assert_eq!(fields["date_of_birth"].value.as_deref(), Some("21/09/1996"));
        assert_eq!(fields["gender"].value.as_deref(), Some("Male"));
        assert_eq!(
            fields["full_name"].value.as_deref(),
            Some("Churchil Sundar Raj Mekala")
        );
        let address = fields["address"].value.clone().unwrap();
        assert!(address.starts_with("S/O Sundar Raj"));
        assert!(address.contains("12 Main Street"));
        assert!(address.contains("Tamil Nadu 625001"));
    }

    #[test]
    fn test_fused_aadhaar_number_is_reformatted() {
        let fields = extract("Government of India\n921456789012");
        assert_eq!(
            fields["aadhaar_number"].value.as_deref(),
            Some("9214 5678 9012")
        );
    }

    #[test]
    fn test_aadhaar_must_not_start_with_0_or_1() {
        let fields = extract("Government of India\n121456789012");
        assert!(!fields.contains_key("aadhaar_number"));
    }

    #[test]
    fn test_dob_with_dashes_normalized_to_slashes() {
        let fields = extract("DOB 21-09-1996");
        assert_eq!(fields["date_of_birth"].value.as_deref(), Some("21/09/1996"));
    }

    #[test]
    fn test_garbage_yields_empty_map() {
        assert!(extract("@@@@").is_empty());
    }
}

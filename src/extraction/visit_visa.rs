//! Visit / tourist visa extraction: almost everything is label-anchored —
//! find the line carrying the label, split on the colon, else take the next
//! text line when it cannot be a different field.

use lazy_static::lazy_static;
use regex::Regex;

use crate::extraction::text::{colon_value, has_digit, next_textual_line};
use crate::models::{ExtractedField, FieldMap};

const SOURCE: &str = "VISIT_VISA_OCR";

lazy_static! {
    static ref DURATION: Regex = Regex::new(r"\b\d+\s*(?:DAY|DAYS|MONTH|MONTHS)\b").unwrap();
    static ref PERMIT_NUMBER: Regex = Regex::new(r"[A-Z0-9]{8,15}").unwrap();
    static ref UID_NUMBER: Regex = Regex::new(r"\b[0-9]{12,15}\b").unwrap();
    static ref SLASH_DATE: Regex = Regex::new(r"([0-3]?\d[/-][0-1]?\d[/-]\d{4})").unwrap();
    static ref PLACE_AFTER_DATE: Regex = Regex::new(r"([A-Z][a-z]+(?:\s[A-Z][a-z]+)*)").unwrap();
    static ref PASSPORT_NUMBER: Regex = Regex::new(r"\b([A-Z]{1,2}[0-9]{7,8})\b").unwrap();
}

const VISA_KEYWORDS: [&str; 8] = [
    "TOURIST", "VISIT", "VISA", "SINGLE", "MULTIPLE", "TRIP", "DAYS", "MONTH",
];

pub fn extract(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    let lines: Vec<&str> = text.lines().collect();

    extract_visa_type(&lines, &mut fields);
    extract_permit_number(&lines, &mut fields);
    extract_uid(&lines, &mut fields);
    extract_issue(&lines, &mut fields);

    // Full name.
    for (i, line) in lines.iter().enumerate() {
        if line.to_uppercase().contains("NAME") && line.contains(':') {
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
        let upper = line.to_uppercase();
        if upper.contains("NATIONALITY") || upper.contains("CITIZEN") {
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

    // Place of birth.
    for (i, line) in lines.iter().enumerate() {
        let upper = line.to_uppercase();
        if upper.contains("PLACE") && upper.contains("BIRTH") {
            if let Some(value) = colon_value(line) {
                fields.insert(
                    "place_of_birth".to_string(),
                    ExtractedField::new(value, 88.0, SOURCE),
                );
                break;
            }
            if let Some(next) = next_textual_line(&lines, i) {
                fields.insert(
                    "place_of_birth".to_string(),
                    ExtractedField::new(next, 85.0, SOURCE),
                );
                break;
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

    // Passport number.
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

    // Profession.
    for (i, line) in lines.iter().enumerate() {
        let upper = line.to_uppercase();
        if upper.contains("PROFESSION") || upper.contains("OCCUPATION") || upper.contains("JOB") {
            if let Some(value) = colon_value(line) {
                fields.insert(
                    "profession".to_string(),
                    ExtractedField::new(value, 85.0, SOURCE),
                );
                break;
            }
            if let Some(next) = next_textual_line(&lines, i) {
                fields.insert(
                    "profession".to_string(),
                    ExtractedField::new(next, 82.0, SOURCE),
                );
                break;
            }
        }
    }

    fields
}

/// Collect the lines describing the visa class and stay duration into one
/// combined value.
fn extract_visa_type(lines: &[&str], fields: &mut FieldMap) {
    let mut visa_lines = Vec::new();
    for line in lines {
        let upper = line.to_uppercase();
        if VISA_KEYWORDS.iter().any(|k| upper.contains(k)) {
            if DURATION.is_match(&upper)
                || upper.contains("VISA")
                || upper.contains("TOURIST")
                || upper.contains("VISIT")
            {
                visa_lines.push(line.trim().to_string());
            }
        }
    }
    if !visa_lines.is_empty() {
        fields.insert(
            "visa_type_duration".to_string(),
            ExtractedField::new(visa_lines.join(" "), 85.0, SOURCE),
        );
    }
}

fn extract_permit_number(lines: &[&str], fields: &mut FieldMap) {
    for (i, line) in lines.iter().enumerate() {
        let upper = line.to_uppercase();
        if upper.contains("ENTRY") && (upper.contains("PERMIT") || upper.contains("NO")) {
            if let Some(m) = PERMIT_NUMBER.find(line) {
                fields.insert(
                    "entry_permit_number".to_string(),
                    ExtractedField::new(m.as_str(), 90.0, SOURCE),
                );
                return;
            }
            if let Some(next) = lines.get(i + 1) {
                if let Some(m) = PERMIT_NUMBER.find(next) {
                    fields.insert(
                        "entry_permit_number".to_string(),
                        ExtractedField::new(m.as_str(), 90.0, SOURCE),
                    );
                    return;
                }
            }
        }
    }
}

fn extract_uid(lines: &[&str], fields: &mut FieldMap) {
    for (i, line) in lines.iter().enumerate() {
        let upper = line.to_uppercase();
        if upper.contains("U.I.D") || upper.contains("UID") || upper.contains("UNIFIED") {
            if let Some(m) = UID_NUMBER.find(line) {
                fields.insert(
                    "uid_number".to_string(),
                    ExtractedField::new(m.as_str(), 92.0, SOURCE),
                );
                return;
            }
            if let Some(next) = lines.get(i + 1) {
                if let Some(m) = UID_NUMBER.find(next) {
                    fields.insert(
                        "uid_number".to_string(),
                        ExtractedField::new(m.as_str(), 90.0, SOURCE),
                    );
                    return;
                }
            }
        }
    }
}

/// Issue date plus the issuing place when one trails the date or sits on
/// the following line.
fn extract_issue(lines: &[&str], fields: &mut FieldMap) {
    for (i, line) in lines.iter().enumerate() {
        let upper = line.to_uppercase();
        if !upper.contains("ISSUE") && !upper.contains("ISSUED") {
            continue;
        }
        if let Some(caps) = SLASH_DATE.captures(line) {
            let date_value = caps[1].replace('-', "/");
            let rest = &line[caps.get(1).map(|m| m.end()).unwrap_or(0)..];
            if let Some(place) = PLACE_AFTER_DATE.captures(rest) {
                fields.insert(
                    "date_place_of_issue".to_string(),
                    ExtractedField::new(format!("{}, {}", date_value, &place[1]), 88.0, SOURCE),
                );
            } else if let Some(next) = lines.get(i + 1).map(|l| l.trim()).filter(|l| !has_digit(l) && !l.is_empty())
            {
                fields.insert(
                    "date_place_of_issue".to_string(),
                    ExtractedField::new(format!("{}, {}", date_value, next), 85.0, SOURCE),
                );
            } else {
                fields.insert(
                    "date_place_of_issue".to_string(),
                    ExtractedField::new(date_value, 80.0, SOURCE),
                );
            }
            return;
        }
    }
}

//! Labor card extraction. These cards mix Arabic and English; profession
//! and nationality go through small static term maps rather than any
//! translation layer.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::extraction::text::{normalize_date, title_case};
use crate::models::{ExtractedField, FieldMap};

const SOURCE: &str = "LABOR_OCR";

lazy_static! {
    static ref NAME_LINE: Regex = Regex::new(r"^[A-Za-z ]{5,80}$").unwrap();
    static ref DATE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(\d{2}[/-]\d{2}[/-]\d{4})").unwrap(),
        Regex::new(r"(\d{4}[/-]\d{2}[/-]\d{2})").unwrap(),
        Regex::new(r"(\d{2}\s[A-Z]{3}\s\d{4})").unwrap(),
    ];
    static ref ESTABLISHMENT_PATTERNS: Vec<Regex> = vec![
        RegexBuilder::new(r"([A-Z][A-Za-z\s&\-]+(?:LLC|L\.L\.C|LTD|LIMITED))")
            .case_insensitive(true)
            .build()
            .unwrap(),
        RegexBuilder::new(r"(?:Establishment|Company|Corporation)[\s:]+([A-Z][A-Za-z\s&\-]+)")
            .case_insensitive(true)
            .build()
            .unwrap(),
    ];
    static ref ESTABLISHMENT_LABEL: Regex = RegexBuilder::new(r"establishment\s*:\s*")
        .case_insensitive(true)
        .build()
        .unwrap();
    static ref LLC_FALLBACK: Regex = RegexBuilder::new(r"([A-Z][A-Za-z\s&\-]{5,50}(?:LLC|L\.L\.C))")
        .case_insensitive(true)
        .build()
        .unwrap();
}

const NAME_BLACKLIST: [&str; 9] = [
    "expiry",
    "permit",
    "profession",
    "nationality",
    "date",
    "work",
    "card",
    "labor",
    "establishment",
];

const ARABIC_PROFESSIONS: [(&str, &str); 10] = [
    ("مدير مشروع", "Project Manager"),
    ("مهندس مدني", "Civil Engineer"),
    ("مهندس كهربائي", "Electrical Engineer"),
    ("مهندس ميكانيكي", "Mechanical Engineer"),
    ("مهندس", "Engineer"),
    ("عامل", "Worker"),
    ("فني", "Technician"),
    ("سائق", "Driver"),
    ("مشرف", "Supervisor"),
    ("محاسب", "Accountant"),
];

const ENGLISH_PROFESSION_KEYWORDS: [&str; 6] = [
    "manager",
    "engineer",
    "technician",
    "driver",
    "worker",
    "supervisor",
];

const ARABIC_NATIONALITIES: [(&str, &str); 9] = [
    ("الهند", "Indian"),
    ("باكستان", "Pakistani"),
    ("بنغلاديش", "Bangladeshi"),
    ("نيبال", "Nepalese"),
    ("سريلانكا", "Sri Lankan"),
    ("الفلبين", "Filipino"),
    ("مصر", "Egyptian"),
    ("الأردن", "Jordanian"),
    ("السودان", "Sudanese"),
];

const ENGLISH_NATIONALITIES: [(&str, &str); 9] = [
    ("india", "Indian"),
    ("pakistan", "Pakistani"),
    ("bangladesh", "Bangladeshi"),
    ("nepal", "Nepalese"),
    ("philippines", "Filipino"),
    ("sri lanka", "Sri Lankan"),
    ("egypt", "Egyptian"),
    ("jordan", "Jordanian"),
    ("sudan", "Sudanese"),
];

pub fn extract(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();

    if let Some(name) = extract_name(text) {
        fields.insert(
            "full_name".to_string(),
            ExtractedField::new(name, 85.0, SOURCE),
        );
    }

    // Work permit numbers run 8-11 digits, personal numbers 12-16.
    if let Some(number) = extract_number(text, 8, 11) {
        fields.insert(
            "work_permit_number".to_string(),
            ExtractedField::new(number, 90.0, SOURCE),
        );
    }
    if let Some(number) = extract_number(text, 12, 16) {
        fields.insert(
            "personal_number".to_string(),
            ExtractedField::new(number, 90.0, SOURCE),
        );
    }

    if let Some(date) = extract_date(text) {
        fields.insert(
            "expiry_date".to_string(),
            ExtractedField::new(date, 85.0, SOURCE),
        );
    }

    if let Some(profession) = extract_profession(text) {
        fields.insert(
            "profession".to_string(),
            ExtractedField::new(profession, 80.0, SOURCE),
        );
    }

    if let Some(nationality) = extract_nationality(text) {
        fields.insert(
            "nationality".to_string(),
            ExtractedField::new(nationality, 85.0, SOURCE),
        );
    }

    if let Some(company) = extract_establishment(text) {
        fields.insert(
            "company_name".to_string(),
            ExtractedField::new(company, 80.0, SOURCE),
        );
    }

    fields
}

/// Names usually span two printed lines; take the first two plausible
/// all-letter lines that carry no field labels.
fn extract_name(text: &str) -> Option<String> {
    let mut name_lines = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if NAME_LINE.is_match(line) {
            let lower = line.to_lowercase();
            if !NAME_BLACKLIST.iter().any(|k| lower.contains(k)) {
                name_lines.push(line);
            }
        }
    }

    if name_lines.len() >= 2 {
        Some(format!("{} {}", name_lines[0], name_lines[1]).to_uppercase())
    } else {
        name_lines.first().map(|l| l.to_uppercase())
    }
}

fn extract_number(text: &str, min_len: usize, max_len: usize) -> Option<String> {
    let pattern = Regex::new(&format!(r"\b\d{{{},{}}}\b", min_len, max_len)).ok()?;
    pattern.find(text).map(|m| m.as_str().to_string())
}

fn extract_date(text: &str) -> Option<String> {
    for pattern in DATE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            return Some(normalize_date(&caps[1]));
        }
    }
    None
}

fn extract_profession(text: &str) -> Option<String> {
    for (arabic, english) in ARABIC_PROFESSIONS.iter() {
        if text.contains(arabic) {
            return Some(english.to_string());
        }
    }

    let text_lower = text.to_lowercase();
    for keyword in ENGLISH_PROFESSION_KEYWORDS.iter() {
        if text_lower.contains(keyword) {
            let pattern =
                RegexBuilder::new(&format!(r"\b([A-Za-z ]*{}[A-Za-z ]*)\b", keyword))
                    .case_insensitive(true)
                    .build()
                    .ok()?;
            if let Some(caps) = pattern.captures(&text_lower) {
                let profession = caps[1].trim().to_string();
                let len = profession.chars().count();
                if (3..=40).contains(&len) {
                    return Some(title_case(&profession));
                }
            }
        }
    }

    None
}

fn extract_nationality(text: &str) -> Option<String> {
    for (arabic, english) in ARABIC_NATIONALITIES.iter() {
        if text.contains(arabic) {
            return Some(english.to_string());
        }
    }

    let text_lower = text.to_lowercase();
    for (country, nationality) in ENGLISH_NATIONALITIES.iter() {
        if text_lower.contains(country) {
            return Some(nationality.to_string());
        }
    }

    None
}

fn extract_establishment(text: &str) -> Option<String> {
    for pattern in ESTABLISHMENT_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let company = ESTABLISHMENT_LABEL.replace_all(&caps[1], "");
            return Some(company.trim().to_uppercase());
        }
    }

    let lower = text.to_lowercase();
    if lower.contains("llc") || lower.contains("l.l.c") {
        if let Some(caps) = LLC_FALLBACK.captures(text) {
            let company = ESTABLISHMENT_LABEL.replace_all(&caps[1], "");
            return Some(company.trim().to_uppercase());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "MINISTRY OF LABOR\nWork Permit Card\nCHURCHIL SUNDAR\nRAJ MEKALA\nWork Permit NO : 10021099682055\nPersonal NO : 102033033\nProfession : Civil Engineer\nNationality : India\nEstablishment : ENGISOFT TECHNICAL SERVICES LLC\nExpiry Date : 27/01/2023";

    #[test]
    fn test_extract_labor_card_fields() {
        let fields = extract(SAMPLE);

        assert_eq!(
            fields["full_name"].value.as_deref(),
            Some("CHURCHIL SUNDAR RAJ MEKALA")
        );
        assert_eq!(fields["work_permit_number"].value.as_deref(), Some("102033033"));
        assert_eq!(
            fields["personal_number"].value.as_deref(),
            Some("10021099682055")
        );
        assert_eq!(fields["expiry_date"].value.as_deref(), Some("27-Jan-23"));
        assert_eq!(fields["profession"].value.as_deref(), Some("Civil Engineer"));
        assert_eq!(fields["nationality"].value.as_deref(), Some("Indian"));
        assert_eq!(
            fields["company_name"].value.as_deref(),
            Some("ENGISOFT TECHNICAL SERVICES LLC")
        );
        assert!(fields.values().all(|f| f.source == "LABOR_OCR"));
    }

    #[test]
    fn test_arabic_term_maps() {
        let text = "بطاقة عمل\nمهندس مدني\nالهند";
        let fields = extract(text);
        assert_eq!(fields["profession"].value.as_deref(), Some("Civil Engineer"));
        assert_eq!(fields["nationality"].value.as_deref(), Some("Indian"));
    }

    #[test]
    fn test_garbage_yields_empty_map() {
        assert!(extract("%%%% 12 ??").is_empty());
    }
}

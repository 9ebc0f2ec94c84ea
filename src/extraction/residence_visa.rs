//! Residence visa extraction. The visa page is label-poor, so most fields
//! come from shape-based scans: digit runs for UID and file numbers, long
//! uppercase runs for the holder's name, a known-city list for the issuing
//! emirate, and chronological ordering for the two dates.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::extraction::text::{strip_arabic, title_case};
use crate::models::{ExtractedField, FieldMap};

const SOURCE: &str = "VISA_OCR";

lazy_static! {
    static ref UID_LABELED: Regex = RegexBuilder::new(r"(?:U\.I\.D\.No|UID|U\.I\.D)\s*[:\s]*(\d{9})")
        .case_insensitive(true)
        .build()
        .unwrap();
    static ref UID_BARE: Regex = Regex::new(r"\b(\d{9})\b").unwrap();
    static ref FILE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?:File|FILE)\s*[:\s]*(\d{3}/\d{4}/\d+)").unwrap(),
        Regex::new(r"(\d{3}/\d{4}/\d+)").unwrap(),
        Regex::new(r"(\d{3}/\d{4})").unwrap(),
    ];
    static ref NAME_RUN: Regex = Regex::new(r"\b([A-Z\s]{15,})\b").unwrap();
    static ref SPONSOR_PATTERNS: Vec<Regex> = vec![
        RegexBuilder::new(r"([A-Z][A-Za-z\s&\-]+(?:L\.L\.C|LLC))")
            .case_insensitive(true)
            .build()
            .unwrap(),
        RegexBuilder::new(r"((?:[A-Z]{3,}\s+){2,4}(?:TECHNICAL|SERVICES|ENGINEERING|COMPANY)[A-Z\s]*)")
            .case_insensitive(true)
            .build()
            .unwrap(),
    ];
    static ref SPONSOR_LABEL: Regex = RegexBuilder::new(r"\bSponsor\b")
        .case_insensitive(true)
        .build()
        .unwrap();
    static ref VISA_DATE: Regex = Regex::new(r"(\d{4}/\d{2}/\d{2})").unwrap();
}

const NAME_BLACKLIST: [&str; 9] = [
    "ENGINEER",
    "SERVICES",
    "RESIDENCE",
    "EMIRATES",
    "TECHNICAL",
    "SPONSOR",
    "PROFESSION",
    "MUHREM",
    "ALLOWED",
];

const PROFESSION_KEYWORDS: [&str; 8] = [
    "ENGINEER",
    "MUHREM",
    "NOT ALLOWED",
    "ALLOWED TO WORK",
    "MANAGER",
    "ACCOUNTANT",
    "DOCTOR",
    "TECHNICIAN",
];

const UAE_CITIES: [&str; 7] = [
    "DUBAI",
    "ABU DHABI",
    "SHARJAH",
    "AJMAN",
    "RAS AL KHAIMAH",
    "FUJAIRAH",
    "UMM AL QUWAIN",
];

pub fn extract(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();

    // UID: nine digits, ideally labeled, any bare nine-digit run otherwise.
    if let Some(caps) = UID_LABELED.captures(text) {
        fields.insert(
            "uid_number".to_string(),
            ExtractedField::new(&caps[1], 95.0, SOURCE),
        );
    } else if let Some(caps) = UID_BARE.captures(text) {
        fields.insert(
            "uid_number".to_string(),
            ExtractedField::new(&caps[1], 85.0, SOURCE),
        );
    }

    for pattern in FILE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            fields.insert(
                "file_number".to_string(),
                ExtractedField::new(&caps[1], 90.0, SOURCE),
            );
            break;
        }
    }

    if let Some(name) = extract_name(text) {
        fields.insert(
            "name_on_visa".to_string(),
            ExtractedField::new(name, 85.0, SOURCE),
        );
    }

    if let Some(profession) = extract_profession(text) {
        fields.insert(
            "profession".to_string(),
            ExtractedField::new(profession, 80.0, SOURCE),
        );
    }

    if let Some(sponsor) = extract_sponsor(text) {
        fields.insert(
            "sponsor".to_string(),
            ExtractedField::new(sponsor, 80.0, SOURCE),
        );
    }

    let upper = text.to_uppercase();
    if let Some(city) = UAE_CITIES.iter().find(|c| upper.contains(*c)) {
        fields.insert(
            "place_of_issue".to_string(),
            ExtractedField::new(title_case(city), 90.0, SOURCE),
        );
    }

    // Visa dates print as YYYY/MM/DD; chronological order decides the
    // roles — earliest is the issue date, latest the expiry. A layout that
    // breaks that assumption mislabels them.
    let dates: Vec<String> = VISA_DATE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect();
    if dates.len() >= 2 {
        let mut sorted = dates.clone();
        sorted.sort();
        fields.insert(
            "issue_date".to_string(),
            ExtractedField::new(sorted[0].clone(), 90.0, SOURCE),
        );
        fields.insert(
            "expiry_date".to_string(),
            ExtractedField::new(sorted[sorted.len() - 1].clone(), 90.0, SOURCE),
        );
    } else if dates.len() == 1 {
        fields.insert(
            "issue_date".to_string(),
            ExtractedField::new(dates[0].clone(), 80.0, SOURCE),
        );
    }

    fields
}

/// The holder's name prints as a long run of capitals; take the longest run
/// that carries no field keywords after Arabic stripping.
fn extract_name(text: &str) -> Option<String> {
    let mut candidates = Vec::new();
    for caps in NAME_RUN.captures_iter(text) {
        let candidate = caps[1].trim().to_string();
        if candidate.chars().count() < 15 {
            continue;
        }
        if NAME_BLACKLIST.iter().any(|k| candidate.contains(k)) || candidate.contains("LLC") {
            continue;
        }
        let cleaned = strip_arabic(&candidate);
        if cleaned.chars().count() >= 15 {
            candidates.push(cleaned);
        }
    }
    candidates.into_iter().max_by_key(|c| c.chars().count())
}

/// The profession prints as an uppercase run around a known job keyword;
/// expand a window over uppercase letters and spaces from the first
/// matching keyword on its line.
fn extract_profession(text: &str) -> Option<String> {
    for keyword in PROFESSION_KEYWORDS.iter() {
        if !text.contains(keyword) {
            continue;
        }
        for line in text.lines() {
            if let Some(pos) = line.find(keyword) {
                let chars: Vec<char> = line.chars().collect();
                let char_pos = line[..pos].chars().count();
                let mut start = char_pos;
                while start > 0 && (chars[start - 1].is_ascii_uppercase() || chars[start - 1] == ' ')
                {
                    start -= 1;
                }
                let mut end = char_pos + keyword.chars().count();
                while end < chars.len() && (chars[end].is_ascii_uppercase() || chars[end] == ' ') {
                    end += 1;
                }
                let window: String = chars[start..end].iter().collect();
                let profession = strip_arabic(window.trim());
                if profession.chars().count() >= 3 {
                    return Some(profession);
                }
            }
        }
    }
    None
}

fn extract_sponsor(text: &str) -> Option<String> {
    for pattern in SPONSOR_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let sponsor = strip_arabic(&caps[1]);
            let sponsor = SPONSOR_LABEL.replace_all(&sponsor, "").trim().to_string();
            let sponsor = sponsor.replace("LL C", "L.L.C").replace("LLC", "L.L.C");
            if sponsor.chars().count() >= 10 {
                return Some(sponsor);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "UNITED ARAB EMIRATES RESIDENCE\nU.I.D.No : 784123456\nFile 201/2021/1234567\nالاسم MOHAMMED ABDUL RAHEEM KHAN\nالمهنة: CIVIL ENGINEER\nSponsor: ENGISOFT TECHNICAL SERVICES LLC\nDUBAI 2021/03/15 2024/03/14";

    #[test]
    fn test_extract_residence_visa_fields() {
        let fields = extract(SAMPLE);

        assert_eq!(fields["uid_number"].value.as_deref(), Some("784123456"));
        assert_eq!(fields["uid_number"].confidence, 95.0);
        assert_eq!(
            fields["file_number"].value.as_deref(),
            Some("201/2021/1234567")
        );
        assert_eq!(
            fields["name_on_visa"].value.as_deref(),
            Some("MOHAMMED ABDUL RAHEEM KHAN")
        );
        assert_eq!(fields["place_of_issue"].value.as_deref(), Some("Dubai"));
        assert_eq!(fields["issue_date"].value.as_deref(), Some("2021/03/15"));
        assert_eq!(fields["expiry_date"].value.as_deref(), Some("2024/03/14"));
        assert!(fields["sponsor"]
            .value
            .as_deref()
            .unwrap()
            .contains("ENGISOFT"));
    }

    #[test]
    fn test_date_roles_assigned_by_sort_order() {
        // Expiry printed before issue; the sort still calls the earlier
        // date the issue date.
        let text = "RESIDENCE\n2026/01/01\n2020/05/05";
        let fields = extract(text);
        assert_eq!(fields["issue_date"].value.as_deref(), Some("2020/05/05"));
        assert_eq!(fields["expiry_date"].value.as_deref(), Some("2026/01/01"));
    }

    #[test]
    fn test_profession_window_around_keyword() {
        let text = "PROFESSION\nSALES MANAGER\n";
        let fields = extract(text);
        assert_eq!(fields["profession"].value.as_deref(), Some("SALES MANAGER"));
    }

    #[test]
    fn test_single_date_is_issue_only() {
        let fields = extract("RESIDENCE 2022/06/30");
        assert_eq!(fields["issue_date"].value.as_deref(), Some("2022/06/30"));
        assert_eq!(fields["issue_date"].confidence, 80.0);
        assert!(!fields.contains_key("expiry_date"));
    }

    #[test]
    fn test_garbage_yields_empty_map() {
        assert!(extract("???").is_empty());
    }
}

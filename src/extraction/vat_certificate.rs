//! Tax registration certificate extraction. The TRN is the anchor field: a
//! 15-digit registration number, ideally labeled, any bare 15-digit run as
//! a fallback.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::extraction::text::strip_arabic;
use crate::models::{ExtractedField, FieldMap};

const SOURCE: &str = "VAT_OCR";

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

lazy_static! {
    static ref TRN_LABELED: Regex =
        ci(r"(?:TRN|tax\s*registration\s*number)\s*[:\-]?\s*(\d{15})");
    static ref TRN_BARE: Regex = Regex::new(r"\b(\d{15})\b").unwrap();
    static ref CERTIFICATE_NUMBER: Regex =
        ci(r"certificate\s*(?:no|number)\.?\s*[:\-]?\s*([A-Z0-9\-/]{4,20})");
    static ref LEGAL_NAME: Regex = ci(r"legal\s*name[^:\n]*[:\-]\s*([^\n]{3,80})");
    static ref REGISTERED_ADDRESS: Regex = ci(r"(?:registered\s*)?address\s*[:\-]\s*([^\n]{5,120})");
    static ref CONTACT_NUMBER: Regex = ci(r"(?:contact|phone|tel)\s*(?:no|number)?\.?\s*[:\-]?\s*([+\d\s\-]{7,18})");
    static ref EFFECTIVE_DATE: Regex = ci(
        r"effective\s*(?:registration\s*)?date\s*[:\-]?\s*(\d{1,2}[/\-\.]\d{1,2}[/\-\.]\d{4})"
    );
    static ref ISSUE_DATE: Regex =
        ci(r"(?:date\s*of\s*issue|issue\s*date)\s*[:\-]?\s*(\d{1,2}[/\-\.]\d{1,2}[/\-\.]\d{4})");
    static ref RETURN_PERIOD: Regex =
        ci(r"(?:first\s*)?vat\s*return\s*period\s*[:\-]?\s*([^\n]{3,60})");
    static ref RETURN_DUE: Regex =
        ci(r"vat\s*return\s*due\s*date\s*[:\-]?\s*([^\n]{3,40})");
    static ref TAX_PERIOD: Regex = ci(r"tax\s*period\s*[:\-]?\s*([^\n]{3,60})");
}

pub fn extract(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();

    if let Some(caps) = TRN_LABELED.captures(text) {
        fields.insert(
            "registration_number".to_string(),
            ExtractedField::new(&caps[1], 95.0, SOURCE),
        );
    } else if let Some(caps) = TRN_BARE.captures(text) {
        fields.insert(
            "registration_number".to_string(),
            ExtractedField::new(&caps[1], 85.0, SOURCE),
        );
    }

    let mut capture = |name: &str, pattern: &Regex, confidence: f64| {
        if let Some(caps) = pattern.captures(text) {
            fields.insert(
                name.to_string(),
                ExtractedField::new(caps[1].trim(), confidence, SOURCE),
            );
        }
    };

    capture("certificate_number", &CERTIFICATE_NUMBER, 90.0);
    capture("registered_address", &REGISTERED_ADDRESS, 75.0);
    capture("contact_number", &CONTACT_NUMBER, 85.0);
    capture("effective_registration_date", &EFFECTIVE_DATE, 88.0);
    capture("date_of_issue", &ISSUE_DATE, 88.0);
    capture("first_vat_return_period", &RETURN_PERIOD, 80.0);
    capture("vat_return_due_date", &RETURN_DUE, 80.0);
    capture("tax_period_start_end", &TAX_PERIOD, 80.0);

    // The legal name prints bilingually; keep the Latin rendering.
    if let Some(caps) = LEGAL_NAME.captures(text) {
        let name = strip_arabic(caps[1].trim());
        if name.chars().count() >= 3 {
            fields.insert(
                "legal_name_english".to_string(),
                ExtractedField::new(name, 85.0, SOURCE),
            );
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "FEDERAL TAX AUTHORITY\nTax Registration Certificate\nTRN: 100123456789012\nCertificate No: CRT-44821\nLegal Name of Entity: ENGISOFT TECHNICAL SERVICES L.L.C\nRegistered Address: Office 904, Al Maktoum Road, Deira, Dubai\nEffective Registration Date: 01/01/2018\nDate of Issue: 05/01/2018\nFirst VAT Return Period: Jan 2018 - Mar 2018\nVAT Return Due Date: 28/04/2018\nTax Period: Quarterly";

    #[test]
    fn test_extract_vat_certificate_fields() {
        let fields = extract(SAMPLE);

        assert_eq!(
            fields["registration_number"].value.as_deref(),
            Some("100123456789012")
        );
        assert_eq!(fields["registration_number"].confidence, 95.0);
        assert_eq!(
            fields["certificate_number"].value.as_deref(),
            Some("CRT-44821")
        );
        assert_eq!(
            fields["legal_name_english"].value.as_deref(),
            Some("ENGISOFT TECHNICAL SERVICES L.L.C")
        );
        assert_eq!(
            fields["effective_registration_date"].value.as_deref(),
            Some("01/01/2018")
        );
        assert_eq!(fields["date_of_issue"].value.as_deref(), Some("05/01/2018"));
        assert_eq!(
            fields["first_vat_return_period"].value.as_deref(),
            Some("Jan 2018 - Mar 2018")
        );
        assert_eq!(fields["tax_period_start_end"].value.as_deref(), Some("Quarterly"));
    }

    #[test]
    fn test_unlabeled_trn_gets_lower_confidence() {
        let fields = extract("registration 100123456789012");
        assert_eq!(
            fields["registration_number"].value.as_deref(),
            Some("100123456789012")
        );
        assert_eq!(fields["registration_number"].confidence, 85.0);
    }

    #[test]
    fn test_garbage_yields_empty_map() {
        assert!(extract("~~~~").is_empty());
    }
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::DocumentType;
use crate::utils::ExtractionError;

/// Ordered list of fallback patterns for one semantic field. Order is part
/// of the contract: patterns are tried in sequence and the first match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPatternSet {
    pub field: String,
    pub patterns: Vec<String>,
}

/// Static description of one document type: display name, the semantic
/// fields a complete extraction is expected to produce, and the last-resort
/// regex fallbacks for fields the type-specific extractor misses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTypeTemplate {
    pub document_type: DocumentType,
    pub name: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub field_patterns: Vec<FieldPatternSet>,
}

/// Keyed template table, loaded once at startup and immutable thereafter.
#[derive(Debug, Clone)]
pub struct DocumentTemplates {
    templates: HashMap<DocumentType, DocumentTypeTemplate>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn pattern_set(field: &str, patterns: &[&str]) -> FieldPatternSet {
    FieldPatternSet {
        field: field.to_string(),
        patterns: strings(patterns),
    }
}

impl DocumentTemplates {
    /// Built-in template table: one canonical definition per type key, with
    /// each field list matching the vocabulary its type's extractor emits.
    pub fn default_set() -> Self {
        let mut templates = HashMap::new();
        for template in Self::default_entries() {
            templates.insert(template.document_type, template);
        }
        DocumentTemplates { templates }
    }

    /// Load templates from a JSON array. Duplicate type keys are a
    /// deployment defect and fail fast instead of silently shadowing.
    pub fn from_json(json: &str) -> Result<Self, ExtractionError> {
        let entries: Vec<DocumentTypeTemplate> = serde_json::from_str(json)?;
        let mut templates = HashMap::new();
        for template in entries {
            if templates
                .insert(template.document_type, template.clone())
                .is_some()
            {
                return Err(ExtractionError::DuplicateTypeKey(
                    template.document_type.as_key().to_string(),
                ));
            }
        }
        Ok(DocumentTemplates { templates })
    }

    pub fn get(&self, document_type: DocumentType) -> Option<&DocumentTypeTemplate> {
        self.templates.get(&document_type)
    }

    /// Number of fields a complete extraction of this type is expected to
    /// produce; 0 for unconfigured types.
    pub fn expected_field_count(&self, document_type: DocumentType) -> usize {
        self.templates
            .get(&document_type)
            .map(|t| t.fields.len())
            .unwrap_or(0)
    }

    fn default_entries() -> Vec<DocumentTypeTemplate> {
        vec![
            DocumentTypeTemplate {
                document_type: DocumentType::Passport,
                name: "Passport".to_string(),
                fields: strings(&[
                    "surname",
                    "given_name",
                    "full_name",
                    "date_of_birth",
                    "place_of_birth",
                    "gender",
                    "nationality",
                    "passport_number",
                    "issue_date",
                    "expiry_date",
                    "issue_place",
                    "country_code",
                ]),
                field_patterns: vec![
                    pattern_set(
                        "passport_number",
                        &[
                            r"([A-Z][0-9]{7,8})",
                            r"passport.*?([A-Z0-9]{6,12})",
                            r"no\.?\s*([A-Z0-9]{6,12})",
                        ],
                    ),
                    pattern_set(
                        "surname",
                        &[r"surname[:\s]*([A-Z][A-Z\s]+)", r"P<<([A-Z]+)<<"],
                    ),
                    pattern_set(
                        "given_name",
                        &[r"given.*?name[:\s]*([A-Z][A-Za-z\s]{2,30})", r"<<([A-Z]+)<"],
                    ),
                    pattern_set("full_name", &[r"name[:\s]*([A-Z][A-Z\s]{3,40})"]),
                    pattern_set(
                        "date_of_birth",
                        &[r"birth.*?(\d{1,2}[/\-\.]\d{1,2}[/\-\.]\d{4})"],
                    ),
                    pattern_set(
                        "issue_date",
                        &[
                            r"issue.*?(\d{1,2}[/\-\.]\d{1,2}[/\-\.]\d{4})",
                            r"date.*?issue.*?(\d{1,2}[/\-\.]\d{1,2}[/\-\.]\d{4})",
                        ],
                    ),
                    pattern_set(
                        "expiry_date",
                        &[
                            r"expiry.*?(\d{1,2}[/\-\.]\d{1,2}[/\-\.]\d{4})",
                            r"date.*?expiry.*?(\d{1,2}[/\-\.]\d{1,2}[/\-\.]\d{4})",
                        ],
                    ),
                    pattern_set("gender", &[r"sex[:\s]*(M|F|MALE|FEMALE)"]),
                    pattern_set(
                        "nationality",
                        &[r"nationality[:\s]*([A-Z]+)", r"national.*?([A-Z]{3,20})"],
                    ),
                    pattern_set(
                        "country_code",
                        &[r"code[:\s]*([A-Z]{3})", r"\b(IND|USA|GBR|UAE)\b"],
                    ),
                    pattern_set(
                        "place_of_birth",
                        &[
                            r"([A-Z]{4,},\s*[A-Z]{4,})",
                            r"birth[:\s]*([A-Z][A-Za-z\s,]+)",
                        ],
                    ),
                    pattern_set("issue_place", &[r"issue[:\s]*([A-Z][A-Za-z\s]+)"]),
                ],
            },
            DocumentTypeTemplate {
                document_type: DocumentType::VisitVisa,
                name: "Visit Visa".to_string(),
                fields: strings(&[
                    "visa_type_duration",
                    "entry_permit_number",
                    "date_place_of_issue",
                    "uid_number",
                    "full_name",
                    "nationality",
                    "place_of_birth",
                    "date_of_birth",
                    "passport_number",
                    "profession",
                ]),
                field_patterns: Vec::new(),
            },
            DocumentTypeTemplate {
                document_type: DocumentType::ResidenceVisa,
                name: "Residence Visa".to_string(),
                fields: strings(&[
                    "name_on_visa",
                    "uid_number",
                    "file_number",
                    "profession",
                    "sponsor",
                    "place_of_issue",
                    "issue_date",
                    "expiry_date",
                ]),
                field_patterns: Vec::new(),
            },
            DocumentTypeTemplate {
                document_type: DocumentType::LaborCard,
                name: "Labor Card".to_string(),
                fields: strings(&[
                    "full_name",
                    "father_name",
                    "date_of_birth",
                    "nationality",
                    "gender",
                    "work_permit_number",
                    "issue_date",
                    "expiry_date",
                    "file_number",
                    "company_name",
                    "position",
                    "salary",
                    "contract_duration",
                    "work_location",
                    "sponsor_name",
                    "sponsor_id",
                    "issue_authority",
                    "passport_number",
                ]),
                field_patterns: vec![
                    pattern_set(
                        "full_name",
                        &[
                            r"Name\s*:\s*([A-Z][A-Z\s]+)",
                            r"([A-Z]{4,}\s+[A-Z]{4,}\s+[A-Z]{3,})",
                        ],
                    ),
                    pattern_set(
                        "work_permit_number",
                        &[r"Personal\s*NO\s*:\s*([A-Z0-9]{6,15})", r"(\d{9})"],
                    ),
                    pattern_set(
                        "passport_number",
                        &[r"Work\s*Permit\s*NO\s*:\s*(\d{10,15})", r"(\d{12,14})"],
                    ),
                    pattern_set("position", &[r"Profession\s*:\s*([A-Za-z\s]{3,50})"]),
                    pattern_set(
                        "nationality",
                        &[
                            r"Nationality\s*:\s*([A-Za-z\s]+)",
                            r"(INDIAN|PAKISTANI|BANGLADESHI|FILIPINO)",
                        ],
                    ),
                    pattern_set(
                        "company_name",
                        &[
                            r"Establishment\s*:\s*([A-Z][A-Z\s\&]+LLC)",
                            r"([A-Z\s]{10,}\s+LLC)",
                        ],
                    ),
                    pattern_set(
                        "expiry_date",
                        &[r"Expiry\s*Date\s*:\s*(\d{2}/\d{2}/\d{4})"],
                    ),
                    pattern_set("gender", &[r"\b(M|F|MALE|FEMALE)\b"]),
                ],
            },
            DocumentTypeTemplate {
                document_type: DocumentType::EmiratesId,
                name: "Emirates ID".to_string(),
                fields: strings(&[
                    "full_name",
                    "id_number",
                    "card_number",
                    "date_of_birth",
                    "nationality",
                    "gender",
                    "issue_date",
                    "expiry_date",
                    "employer_name",
                    "issue_authority",
                ]),
                field_patterns: vec![
                    pattern_set(
                        "id_number",
                        &[
                            r"id\s*no\.?\s*[:\-]?\s*(\d{3}\-\d{4}\-\d{7}\-\d)",
                            r"(\d{3}\-\d{4}\-\d{7}\-\d)",
                        ],
                    ),
                    pattern_set(
                        "card_number",
                        &[
                            r"card\s*no\.?\s*[:\-]?\s*(\d{15})",
                            r"card\s*number\s*[:\-]?\s*(\d{15})",
                        ],
                    ),
                ],
            },
            DocumentTypeTemplate {
                document_type: DocumentType::HomeCountryId,
                name: "Home Country ID".to_string(),
                fields: strings(&[
                    "full_name",
                    "father_name",
                    "mother_name",
                    "date_of_birth",
                    "place_of_birth",
                    "gender",
                    "id_number",
                    "aadhaar_number",
                    "issue_date",
                    "issue_authority",
                    "permanent_address",
                    "district",
                    "state",
                    "pin_code",
                    "mobile_number",
                    "biometric_ref",
                    "qr_code_data",
                ]),
                field_patterns: vec![
                    pattern_set(
                        "aadhaar_number",
                        &[r"(\d{4}\s\d{4}\s\d{4})", r"aadhaar\s*[:\-]?\s*(\d{12})"],
                    ),
                    pattern_set("id_number", &[r"id\s*no\.?\s*[:\-]?\s*([A-Z0-9]{6,15})"]),
                ],
            },
            DocumentTypeTemplate {
                document_type: DocumentType::Invoice,
                name: "Invoice".to_string(),
                fields: strings(&[
                    "invoice_number",
                    "invoice_date",
                    "due_date",
                    "invoice_type",
                    "supplier_name",
                    "supplier_address",
                    "supplier_email",
                    "supplier_phone",
                    "supplier_tax_id",
                    "customer_name",
                    "customer_address",
                    "customer_email",
                    "customer_phone",
                    "customer_tax_id",
                    "line_items",
                    "subtotal",
                    "tax_amount",
                    "tax_rate",
                    "grand_total",
                    "payment_terms",
                    "currency",
                    "po_number",
                    "bank_details",
                    "notes",
                ]),
                field_patterns: Vec::new(),
            },
            DocumentTypeTemplate {
                document_type: DocumentType::PurchaseOrder,
                name: "Purchase Order".to_string(),
                fields: strings(&[
                    "po_number",
                    "po_date",
                    "reference_number",
                    "vendor_name",
                    "vendor_id",
                    "vendor_address",
                    "vendor_contact",
                    "vendor_tax_id",
                    "buyer_company",
                    "buyer_address",
                    "buyer_contact",
                    "buyer_department",
                    "item_description",
                    "quantity",
                    "unit_price",
                    "total_per_item",
                    "subtotal",
                    "tax_amount",
                    "discount",
                    "total_amount",
                    "payment_terms",
                    "delivery_date",
                    "shipping_address",
                    "currency",
                ]),
                field_patterns: vec![
                    pattern_set(
                        "po_number",
                        &[
                            r"po\s*no\.?\s*[:\-]?\s*([A-Z0-9\-]{4,20})",
                            r"purchase\s*order\s*[:\-]?\s*([A-Z0-9\-]{4,20})",
                        ],
                    ),
                    pattern_set(
                        "total_amount",
                        &[r"total\s*[:\-]?\s*(?:[A-Z]{3})?\s*(\d{1,15}\.?\d{0,2})"],
                    ),
                ],
            },
            DocumentTypeTemplate {
                document_type: DocumentType::CompanyLicense,
                name: "Company License".to_string(),
                fields: strings(&[
                    "license_type",
                    "license_no",
                    "main_license_no",
                    "register_no",
                    "dcci_no",
                    "duns_no",
                    "company_name",
                    "company_name_ar",
                    "business_name",
                    "legal_type",
                    "issue_date",
                    "expiry_date",
                    "address",
                    "po_box",
                    "phone",
                    "fax",
                    "mobile",
                    "parcel_id",
                    "email",
                    "members_table",
                    "partners_table",
                ]),
                field_patterns: Vec::new(),
            },
            DocumentTypeTemplate {
                document_type: DocumentType::VisaCancellation,
                name: "Visa Cancellation".to_string(),
                fields: strings(&[
                    "full_name",
                    "passport_number",
                    "nationality",
                    "date_of_birth",
                    "visa_type",
                    "visa_number",
                    "issuing_emirate",
                    "profession",
                    "sponsor_name",
                    "sponsor_id",
                    "establishment_number",
                    "cancellation_date",
                    "cancellation_ref",
                    "application_number",
                ]),
                field_patterns: Vec::new(),
            },
            DocumentTypeTemplate {
                document_type: DocumentType::CompanyVatCertificate,
                name: "Company VAT Certificate".to_string(),
                fields: strings(&[
                    "registration_number",
                    "certificate_number",
                    "legal_name_english",
                    "legal_name_arabic",
                    "registered_address",
                    "contact_number",
                    "effective_registration_date",
                    "date_of_issue",
                    "first_vat_return_period",
                    "vat_return_due_date",
                    "tax_period_start_end",
                ]),
                field_patterns: Vec::new(),
            },
            DocumentTypeTemplate {
                document_type: DocumentType::EntryPermit,
                name: "Entry Permit".to_string(),
                fields: strings(&[
                    "permit_number",
                    "visa_number",
                    "file_number",
                    "uid_number",
                    "application_number",
                    "reference_number",
                    "full_name",
                    "nationality",
                    "gender",
                    "date_of_birth",
                    "passport_number",
                    "passport_issue_date",
                    "passport_expiry_date",
                    "passport_issue_place",
                    "permit_type",
                    "permit_category",
                    "entry_type",
                    "number_of_entries",
                    "duration",
                    "issue_date",
                    "expiry_date",
                    "valid_from",
                    "valid_until",
                    "port_of_entry",
                    "purpose_of_visit",
                    "sponsor_name",
                    "sponsor_id",
                    "employer_name",
                    "job_title",
                    "email",
                    "phone",
                    "address",
                    "status",
                    "approval_status",
                    "issued_by",
                    "issuing_office",
                    "qr_code",
                    "barcode_number",
                ]),
                field_patterns: Vec::new(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_covers_all_types() {
        let templates = DocumentTemplates::default_set();
        for doc_type in DocumentType::all() {
            assert!(
                templates.get(*doc_type).is_some(),
                "missing template for {}",
                doc_type
            );
        }
        assert!(templates.get(DocumentType::Unknown).is_none());
    }

    #[test]
    fn test_expected_field_counts() {
        let templates = DocumentTemplates::default_set();
        assert_eq!(templates.expected_field_count(DocumentType::Passport), 12);
        assert_eq!(
            templates.expected_field_count(DocumentType::ResidenceVisa),
            8
        );
        assert_eq!(templates.expected_field_count(DocumentType::Unknown), 0);
    }

    #[test]
    fn test_from_json_rejects_duplicate_keys() {
        let json = r#"[
            {"document_type": "INVOICE", "name": "Invoice", "fields": ["invoice_number"]},
            {"document_type": "INVOICE", "name": "Invoice Again", "fields": ["other"]}
        ]"#;
        match DocumentTemplates::from_json(json) {
            Err(ExtractionError::DuplicateTypeKey(key)) => assert_eq!(key, "INVOICE"),
            other => panic!("expected duplicate-key error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_from_json_round_trip() {
        let json = r#"[
            {"document_type": "PASSPORT", "name": "Passport",
             "fields": ["passport_number"],
             "field_patterns": [{"field": "passport_number", "patterns": ["([A-Z][0-9]{7,8})"]}]}
        ]"#;
        let templates = DocumentTemplates::from_json(json).unwrap();
        let template = templates.get(DocumentType::Passport).unwrap();
        assert_eq!(template.fields, vec!["passport_number"]);
        assert_eq!(template.field_patterns.len(), 1);
    }
}

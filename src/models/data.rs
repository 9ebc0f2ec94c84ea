use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The configured document types, plus the `Unknown` sentinel returned by
/// the classifier when no type passes its gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Passport,
    VisitVisa,
    ResidenceVisa,
    LaborCard,
    EmiratesId,
    HomeCountryId,
    Invoice,
    PurchaseOrder,
    CompanyLicense,
    VisaCancellation,
    CompanyVatCertificate,
    EntryPermit,
    Unknown,
}

impl DocumentType {
    /// Stable string key used in configuration tables and API payloads.
    pub fn as_key(&self) -> &'static str {
        match self {
            DocumentType::Passport => "PASSPORT",
            DocumentType::VisitVisa => "VISIT_VISA",
            DocumentType::ResidenceVisa => "RESIDENCE_VISA",
            DocumentType::LaborCard => "LABOR_CARD",
            DocumentType::EmiratesId => "EMIRATES_ID",
            DocumentType::HomeCountryId => "HOME_COUNTRY_ID",
            DocumentType::Invoice => "INVOICE",
            DocumentType::PurchaseOrder => "PURCHASE_ORDER",
            DocumentType::CompanyLicense => "COMPANY_LICENSE",
            DocumentType::VisaCancellation => "VISA_CANCELLATION",
            DocumentType::CompanyVatCertificate => "COMPANY_VAT_CERTIFICATE",
            DocumentType::EntryPermit => "ENTRY_PERMIT",
            DocumentType::Unknown => "UNKNOWN",
        }
    }

    pub fn from_key(key: &str) -> Option<DocumentType> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_key() == key)
            .or(if key == "UNKNOWN" {
                Some(DocumentType::Unknown)
            } else {
                None
            })
    }

    /// Every configured type, in rule-declaration order. `Unknown` is not a
    /// configured type and is excluded.
    pub fn all() -> &'static [DocumentType] {
        &[
            DocumentType::Passport,
            DocumentType::VisitVisa,
            DocumentType::ResidenceVisa,
            DocumentType::LaborCard,
            DocumentType::EmiratesId,
            DocumentType::HomeCountryId,
            DocumentType::Invoice,
            DocumentType::PurchaseOrder,
            DocumentType::CompanyLicense,
            DocumentType::VisaCancellation,
            DocumentType::CompanyVatCertificate,
            DocumentType::EntryPermit,
        ]
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_key())
    }
}

/// One extracted field: the value (null for placeholder fields some
/// extractors emit for schema compatibility), a calibrated confidence in
/// [0, 100], and a source tag naming the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub value: Option<String>,
    pub confidence: f64,
    pub source: String,
}

impl ExtractedField {
    pub fn new(value: impl Into<String>, confidence: f64, source: &str) -> Self {
        ExtractedField {
            value: Some(value.into()),
            confidence,
            source: source.to_string(),
        }
    }

    /// A null-valued placeholder (confidence 0).
    pub fn placeholder() -> Self {
        ExtractedField {
            value: None,
            confidence: 0.0,
            source: "N/A".to_string(),
        }
    }
}

/// Field name → extracted field, the output of one extractor invocation
/// against one page of text.
pub type FieldMap = HashMap<String, ExtractedField>;

/// An extracted field after the cross-page merge, tagged with the 1-based
/// page number that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedField {
    pub value: Option<String>,
    pub confidence: f64,
    pub source: String,
    pub page: usize,
}

/// One page of OCR output as received from the text-recognition engine:
/// plain multi-line text plus the engine's mean confidence for the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    pub text: String,
    pub confidence: f64,
}

impl PageText {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        PageText {
            text: text.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub document_type: DocumentType,
    pub confidence: f64,
    pub messages: Vec<String>,
}

impl ClassificationResult {
    /// The `UNKNOWN` outcome always carries confidence 0.
    pub fn unknown(message: impl Into<String>) -> Self {
        ClassificationResult {
            document_type: DocumentType::Unknown,
            confidence: 0.0,
            messages: vec![message.into()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Completed,
    Partial,
    /// Reserved for hard errors upstream of extraction (unreadable file,
    /// unsupported format). The extraction core itself never produces it.
    Failed,
}

/// Document-level outcome built by the orchestrator across all pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub per_page_text: Vec<String>,
    pub combined_text: String,
    pub fields: HashMap<String, MergedField>,
    pub overall_confidence: f64,
    pub status: ProcessingStatus,
}

pub mod company_license;
pub mod emirates_id;
pub mod entry_permit;
pub mod home_country_id;
pub mod invoice;
pub mod labor_card;
pub mod mrz;
pub mod passport;
pub mod patterns;
pub mod purchase_order;
pub mod residence_visa;
pub mod text;
pub mod vat_certificate;
pub mod visa_cancellation;
pub mod visit_visa;

use crate::models::{DocumentType, FieldMap};

/// Route one page of OCR text to the extractor for the given type. Adding a
/// document type means adding one arm here, nothing else. `Unknown` has no
/// extractor and yields nothing.
pub fn extract_for_type(document_type: DocumentType, text: &str) -> FieldMap {
    match document_type {
        DocumentType::Passport => passport::extract(text),
        DocumentType::VisitVisa => visit_visa::extract(text),
        DocumentType::ResidenceVisa => residence_visa::extract(text),
        DocumentType::LaborCard => labor_card::extract(text),
        DocumentType::EmiratesId => emirates_id::extract(text),
        DocumentType::HomeCountryId => home_country_id::extract(text),
        DocumentType::Invoice => invoice::extract(text),
        DocumentType::PurchaseOrder => purchase_order::extract(text),
        DocumentType::CompanyLicense => company_license::extract(text),
        DocumentType::VisaCancellation => visa_cancellation::extract(text),
        DocumentType::CompanyVatCertificate => vat_certificate::extract(text),
        DocumentType::EntryPermit => entry_permit::extract(text),
        DocumentType::Unknown => FieldMap::new(),
    }
}

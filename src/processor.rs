//! The extraction orchestrator: routes each page to its type-specific
//! extractor, merges fields across pages, and settles the document-level
//! confidence and completion status.

use std::collections::HashMap;

use log::{debug, info};

use crate::extraction;
use crate::extraction::patterns::CompiledFieldPatterns;
use crate::models::{
    DocumentTemplates, DocumentType, FieldMap, MergedField, PageText, ProcessingResult,
    ProcessingStatus,
};
use crate::utils::ExtractionError;

/// Fraction of a template's expected fields that must be recovered for the
/// document to count as completed.
const COMPLETION_THRESHOLD: f64 = 0.3;

/// Stateless orchestrator over an immutable template table; safe to share
/// across any number of concurrent document runs.
pub struct DocumentProcessor {
    templates: DocumentTemplates,
    fallback_patterns: HashMap<DocumentType, CompiledFieldPatterns>,
}

impl DocumentProcessor {
    /// Processor over the built-in template table.
    pub fn new() -> Result<Self, ExtractionError> {
        Self::with_templates(DocumentTemplates::default_set())
    }

    /// Processor over an externally loaded template table. Pattern
    /// compilation failures are deployment defects and fail fast.
    pub fn with_templates(templates: DocumentTemplates) -> Result<Self, ExtractionError> {
        let mut fallback_patterns = HashMap::new();
        for doc_type in DocumentType::all() {
            if let Some(template) = templates.get(*doc_type) {
                fallback_patterns.insert(
                    *doc_type,
                    CompiledFieldPatterns::compile(&template.field_patterns)?,
                );
            }
        }
        Ok(DocumentProcessor {
            templates,
            fallback_patterns,
        })
    }

    pub fn templates(&self) -> &DocumentTemplates {
        &self.templates
    }

    /// Extract fields from one page of text for a known document type: the
    /// type-specific extractor first, then the template's pattern library
    /// for expected fields the extractor missed. A page the extractor finds
    /// nothing in stays empty — the catch-all fallback patterns are not
    /// allowed to invent fields out of unrelated text.
    pub fn extract_fields(&self, text: &str, document_type: DocumentType) -> FieldMap {
        let mut fields = extraction::extract_for_type(document_type, text);

        if !fields.is_empty() {
            if let Some(patterns) = self.fallback_patterns.get(&document_type) {
                patterns.fill_missing(text, &mut fields);
            }
        }

        fields
    }

    /// Process all pages of one document. Per field name, the first page to
    /// produce it wins; later pages never override. Overall confidence is
    /// the mean of the per-page OCR confidences, passed through from the
    /// recognition engine rather than recomputed from field confidences.
    pub fn process(&self, pages: &[PageText], document_type: DocumentType) -> ProcessingResult {
        let mut fields: HashMap<String, MergedField> = HashMap::new();
        let mut per_page_text = Vec::with_capacity(pages.len());

        for (index, page) in pages.iter().enumerate() {
            let page_number = index + 1;
            debug!("Processing page {}/{}", page_number, pages.len());

            let page_fields = self.extract_fields(&page.text, document_type);
            for (name, field) in page_fields {
                fields.entry(name).or_insert(MergedField {
                    value: field.value,
                    confidence: field.confidence,
                    source: field.source,
                    page: page_number,
                });
            }

            per_page_text.push(page.text.clone());
        }

        let overall_confidence = if pages.is_empty() {
            0.0
        } else {
            pages.iter().map(|p| p.confidence).sum::<f64>() / pages.len() as f64
        };

        let status = self.completion_status(document_type, fields.len());

        info!(
            "Extracted {} fields for {} across {} pages ({:?})",
            fields.len(),
            document_type,
            pages.len(),
            status
        );

        ProcessingResult {
            combined_text: per_page_text.join("\n"),
            per_page_text,
            fields,
            overall_confidence,
            status,
        }
    }

    /// `completed` needs at least 30% of the template's expected fields; an
    /// empty result is always `partial`. `failed` is reserved for hard
    /// errors upstream of extraction and never produced here.
    fn completion_status(&self, document_type: DocumentType, extracted: usize) -> ProcessingStatus {
        if extracted == 0 {
            return ProcessingStatus::Partial;
        }
        let expected = self.templates.expected_field_count(document_type);
        if extracted as f64 >= expected as f64 * COMPLETION_THRESHOLD {
            ProcessingStatus::Completed
        } else {
            ProcessingStatus::Partial
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSPORT_PAGE: &str = "P<INDSUNDAR<RAJ<MEKALA<<CHURCHIL<<<<<<<<<<<<<<\nW1403565<2IND9609211M3209192064574868122<36";

    fn processor() -> DocumentProcessor {
        DocumentProcessor::new().unwrap()
    }

    #[test]
    fn test_end_to_end_passport_extraction() {
        let pages = vec![PageText::new(PASSPORT_PAGE, 91.5)];
        let result = processor().process(&pages, DocumentType::Passport);

        assert_eq!(
            result.fields["nationality"].value.as_deref(),
            Some("IND")
        );
        assert_eq!(
            result.fields["passport_number"].value.as_deref(),
            Some("W1403565")
        );
        assert_eq!(
            result.fields["date_of_birth"].value.as_deref(),
            Some("21-Sep-96")
        );
        assert_eq!(result.fields["gender"].value.as_deref(), Some("Male"));
        assert!(result.fields["expiry_date"]
            .value
            .as_deref()
            .unwrap()
            .ends_with("-32"));

        for name in [
            "nationality",
            "passport_number",
            "date_of_birth",
            "gender",
            "expiry_date",
        ] {
            assert!(result.fields[name].confidence >= 90.0, "{} too low", name);
        }

        assert_eq!(result.overall_confidence, 91.5);
        assert_eq!(result.status, ProcessingStatus::Completed);
        assert_eq!(result.combined_text, PASSPORT_PAGE);
    }

    #[test]
    fn test_first_page_wins_merge() {
        // Both pages decode a passport number; page 1's value and page tag
        // must survive.
        let page1 = PageText::new(PASSPORT_PAGE, 90.0);
        let page2 = PageText::new(
            "P<INDOTHER<NAME<<PERSON<<<<<<<<<<<<<<<<<<<<<<<\nZ9988776<1IND8001012F2801012012345678901<44",
            80.0,
        );
        let result = processor().process(&[page1, page2], DocumentType::Passport);

        let passport_number = &result.fields["passport_number"];
        assert_eq!(passport_number.value.as_deref(), Some("W1403565"));
        assert_eq!(passport_number.page, 1);
        assert_eq!(result.overall_confidence, 85.0);
    }

    #[test]
    fn test_completion_threshold_boundary() {
        let processor = processor();
        // Residence visa expects 8 fields: ceil(0.3 * 8) = 3 completes.
        assert_eq!(
            processor.completion_status(DocumentType::ResidenceVisa, 3),
            ProcessingStatus::Completed
        );
        assert_eq!(
            processor.completion_status(DocumentType::ResidenceVisa, 2),
            ProcessingStatus::Partial
        );
        // Passport expects 12: ceil(0.3 * 12) = 4.
        assert_eq!(
            processor.completion_status(DocumentType::Passport, 4),
            ProcessingStatus::Completed
        );
        assert_eq!(
            processor.completion_status(DocumentType::Passport, 3),
            ProcessingStatus::Partial
        );
    }

    #[test]
    fn test_empty_extraction_is_partial() {
        let pages = vec![PageText::new("nothing that looks like a passport", 42.0)];
        let result = processor().process(&pages, DocumentType::Passport);
        assert!(result.fields.is_empty());
        assert_eq!(result.status, ProcessingStatus::Partial);
        assert_eq!(result.overall_confidence, 42.0);
    }

    #[test]
    fn test_unknown_type_extracts_nothing() {
        let pages = vec![PageText::new(PASSPORT_PAGE, 90.0)];
        let result = processor().process(&pages, DocumentType::Unknown);
        assert!(result.fields.is_empty());
        assert_eq!(result.status, ProcessingStatus::Partial);
    }

    #[test]
    fn test_pattern_library_fills_missing_template_fields() {
        // The MRZ gives the passport extractor its anchor; the country
        // code only exists as page text, recovered by the template's
        // fallback patterns.
        let text = format!("Code: IND\n{}", PASSPORT_PAGE);
        let fields = processor().extract_fields(&text, DocumentType::Passport);
        assert_eq!(fields["country_code"].value.as_deref(), Some("IND"));
        assert_eq!(fields["country_code"].source, "PATTERN_LIB");
        assert_eq!(fields["country_code"].confidence, 90.0);
    }

    #[test]
    fn test_garbage_text_yields_empty_map_for_every_type() {
        let processor = processor();
        for doc_type in DocumentType::all() {
            let fields = processor.extract_fields("#@!? *&^%", *doc_type);
            assert!(fields.is_empty(), "{} extracted from garbage", doc_type);
        }
    }

    #[test]
    fn test_no_pages_is_partial_with_zero_confidence() {
        let result = processor().process(&[], DocumentType::Invoice);
        assert_eq!(result.status, ProcessingStatus::Partial);
        assert_eq!(result.overall_confidence, 0.0);
        assert!(result.per_page_text.is_empty());
    }
}

pub mod data;
pub mod templates;

pub use data::{
    ClassificationResult, DocumentType, ExtractedField, FieldMap, MergedField, PageText,
    ProcessingResult, ProcessingStatus,
};
pub use templates::{DocumentTemplates, DocumentTypeTemplate};

use thiserror::Error;

/// Errors raised for structural problems only: broken configuration tables
/// or unreadable input. Data-quality problems (noisy OCR text, missing
/// fields, malformed MRZ lines) never produce an error — they degrade to
/// lower confidence, missing fields or an `UNKNOWN` classification.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid pattern for {context}: {source}")]
    InvalidPattern {
        context: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("Duplicate document type key in configuration: {0}")]
    DuplicateTypeKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed configuration file: {0}")]
    MalformedConfig(#[from] serde_json::Error),
}

// Command-line front end: classify an OCR text dump and extract its fields.
// The OCR engine itself is an external concern; this binary consumes its
// plain-text output.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use sanad::classification::{ClassificationRule, ClassifierConfig};
use sanad::models::{DocumentTemplates, DocumentType, PageText};
use sanad::utils::ExtractionError;
use sanad::{DocumentClassifier, DocumentProcessor};

#[derive(Parser)]
#[command(
    name = "sanad",
    about = "Classify scanned-document OCR text and extract structured fields"
)]
struct Args {
    /// OCR text dump, one file per document. Pages separated by form-feed
    /// characters are processed as separate pages.
    input: PathBuf,

    /// Skip classification and extract for this type key (e.g. PASSPORT).
    #[arg(long)]
    document_type: Option<String>,

    /// JSON file with an alternative classification rule table.
    #[arg(long)]
    rules: Option<PathBuf>,

    /// JSON file with an alternative document template table.
    #[arg(long)]
    templates: Option<PathBuf>,

    /// OCR confidence to attribute to each page of the dump.
    #[arg(long, default_value_t = 90.0)]
    ocr_confidence: f64,
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), ExtractionError> {
    let text = std::fs::read_to_string(&args.input)?;

    let classifier = match &args.rules {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            DocumentClassifier::with_rules(
                ClassificationRule::from_json(&json)?,
                ClassifierConfig::default(),
            )?
        }
        None => DocumentClassifier::new()?,
    };

    let processor = match &args.templates {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            DocumentProcessor::with_templates(DocumentTemplates::from_json(&json)?)?
        }
        None => DocumentProcessor::new()?,
    };

    let document_type = match &args.document_type {
        Some(key) => DocumentType::from_key(key).ok_or_else(|| {
            ExtractionError::Configuration(format!("Invalid document_type: {}", key))
        })?,
        None => {
            let classification = classifier.classify(&text);
            println!("===============================================");
            println!("      DOCUMENT CLASSIFICATION");
            println!("===============================================");
            println!("  Type:       {}", classification.document_type);
            println!("  Confidence: {:.1}%", classification.confidence);
            for message in &classification.messages {
                println!("  - {}", message);
            }
            classification.document_type
        }
    };

    let pages: Vec<PageText> = text
        .split('\u{000C}')
        .map(|page| PageText::new(page, args.ocr_confidence))
        .collect();

    let result = processor.process(&pages, document_type);

    println!("\n===============================================");
    println!("      EXTRACTED FIELDS ({})", document_type);
    println!("===============================================");

    let mut names: Vec<&String> = result.fields.keys().collect();
    names.sort();
    for name in names {
        let field = &result.fields[name];
        println!(
            "  {}: {} ({:.1}%, {}, page {})",
            name,
            field.value.as_deref().unwrap_or("-"),
            field.confidence,
            field.source,
            field.page
        );
    }

    println!("\n  Overall confidence: {:.1}%", result.overall_confidence);
    println!("  Status: {:?}", result.status);

    Ok(())
}

//! The field pattern library: ordered regex fallbacks per template field,
//! and the generic `Label : Value` sweep that works on any document type.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::models::templates::FieldPatternSet;
use crate::models::{ExtractedField, FieldMap};
use crate::utils::ExtractionError;

const SOURCE_PATTERN_LIB: &str = "PATTERN_LIB";
const SOURCE_KEY_VALUE: &str = "KEY_VALUE";

/// A template's fallback patterns, compiled once at startup. Field order and
/// per-field pattern order are preserved: first match wins, and reordering
/// would change observable behavior.
#[derive(Debug)]
pub struct CompiledFieldPatterns {
    fields: Vec<(String, Vec<Regex>)>,
}

impl CompiledFieldPatterns {
    /// Compile a template's pattern sets. An invalid pattern is a
    /// configuration defect and fails fast.
    pub fn compile(sets: &[FieldPatternSet]) -> Result<Self, ExtractionError> {
        let mut fields = Vec::with_capacity(sets.len());
        for set in sets {
            let mut compiled = Vec::with_capacity(set.patterns.len());
            for pattern in &set.patterns {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .multi_line(true)
                    .dot_matches_new_line(true)
                    .build()
                    .map_err(|e| ExtractionError::InvalidPattern {
                        context: set.field.clone(),
                        source: Box::new(e),
                    })?;
                compiled.push(regex);
            }
            fields.push((set.field.clone(), compiled));
        }
        Ok(CompiledFieldPatterns { fields })
    }

    /// Fill `fields` with pattern-library matches for every template field
    /// not already present.
    pub fn fill_missing(&self, text: &str, fields: &mut FieldMap) {
        for (name, patterns) in &self.fields {
            if fields.contains_key(name) {
                continue;
            }
            if let Some(value) = first_match(text, patterns) {
                fields.insert(
                    name.clone(),
                    ExtractedField::new(value, 90.0, SOURCE_PATTERN_LIB),
                );
            }
        }
    }
}

/// Try patterns in declared order; the first match's first capture group
/// (whole match when the pattern has no groups) is the value. Empty captures
/// are discarded, not returned at low confidence.
pub fn first_match(text: &str, patterns: &[Regex]) -> Option<String> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            let matched = caps
                .get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().trim().to_string())?;
            if !matched.is_empty() {
                return Some(matched);
            }
        }
    }
    None
}

lazy_static! {
    // "Label : Value" — label of letters/ampersand/slash, value opening
    // with an uppercase letter or digit, stopped by colon or line end.
    static ref KEY_VALUE: Regex =
        Regex::new(r"([A-Za-z][A-Za-z\s&/]{2,30}?)\s*:+\s*([A-Z0-9][^\n:]{3,50})").unwrap();
    // Trailing text that is really the next field's label.
    static ref TRAILING_LABEL: Regex =
        Regex::new(r"\s+(?:Name|Date|ID|Number|Sex|Nationality|Card|Expiry|Issue)").unwrap();
}

/// Sweep the text for `Label : Value` pairs and return them keyed by a
/// snake_cased version of the label. Works on any document type; junk labels
/// and noise values are filtered rather than scored down.
pub fn extract_key_value_pairs(text: &str) -> FieldMap {
    let mut extracted = FieldMap::new();

    for caps in KEY_VALUE.captures_iter(text) {
        let key = caps[1].trim().to_string();
        let mut value = caps[2].trim().to_string();

        // The greedy value may have swallowed the next label on the line.
        if let Some(m) = TRAILING_LABEL.find(&value) {
            value = value[..m.start()].trim().to_string();
        }

        let field_name = key
            .to_lowercase()
            .replace(' ', "_")
            .replace('&', "and")
            .replace('/', "_");

        if field_name.chars().count() < 3
            || field_name.starts_with('_')
            || field_name.chars().take(3).any(|c| c.is_ascii_digit())
        {
            continue;
        }

        let value_len = value.chars().count();
        if value_len < 2 || value_len > 100 || value.trim().is_empty() {
            continue;
        }

        // Values dominated by symbols are OCR noise.
        let symbol_count = value
            .chars()
            .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
            .count();
        if symbol_count as f64 > value_len as f64 * 0.4 {
            continue;
        }

        extracted
            .entry(field_name)
            .or_insert_with(|| ExtractedField::new(value, 85.0, SOURCE_KEY_VALUE));
    }

    extracted
}

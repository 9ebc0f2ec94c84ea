//! Multi-stage rule classifier: a mandatory gate, an exclusion veto, then
//! graduated indicator scoring. Deterministic rule evaluation, not a
//! statistical model — every constant lives in `ClassifierConfig`.

use log::{debug, info, warn};
use regex::{Regex, RegexBuilder};

use crate::classification::rules::{ClassificationRule, ClassifierConfig};
use crate::models::{ClassificationResult, DocumentType};
use crate::utils::ExtractionError;

struct CompiledRule {
    document_type: DocumentType,
    mandatory: Vec<Regex>,
    exclusions: Vec<Regex>,
    strong_indicators: Vec<Regex>,
    weak_indicators: Vec<Regex>,
    weight: f64,
    required_score: f64,
}

/// Holds only immutable compiled rule tables; cheap to share and safe to
/// use from any number of threads.
pub struct DocumentClassifier {
    rules: Vec<CompiledRule>,
    config: ClassifierConfig,
}

impl DocumentClassifier {
    /// Classifier over the built-in rule table.
    pub fn new() -> Result<Self, ExtractionError> {
        Self::with_rules(ClassificationRule::default_rules(), ClassifierConfig::default())
    }

    /// Classifier over an externally supplied rule table. Invalid patterns
    /// are a deployment defect and fail construction.
    pub fn with_rules(
        rules: Vec<ClassificationRule>,
        config: ClassifierConfig,
    ) -> Result<Self, ExtractionError> {
        let compiled = rules
            .into_iter()
            .map(|rule| {
                Ok(CompiledRule {
                    document_type: rule.document_type,
                    mandatory: compile_set(&rule.mandatory, rule.document_type, "mandatory")?,
                    exclusions: compile_set(&rule.exclusions, rule.document_type, "exclusion")?,
                    strong_indicators: compile_set(
                        &rule.strong_indicators,
                        rule.document_type,
                        "strong",
                    )?,
                    weak_indicators: compile_set(
                        &rule.weak_indicators,
                        rule.document_type,
                        "weak",
                    )?,
                    weight: rule.weight,
                    required_score: rule.required_score,
                })
            })
            .collect::<Result<Vec<_>, ExtractionError>>()?;

        Ok(DocumentClassifier {
            rules: compiled,
            config,
        })
    }

    /// Decide which document type best explains the text, or `UNKNOWN`.
    /// Never fails: data-quality problems degrade to `UNKNOWN` with a
    /// diagnostic message.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        if text.trim().chars().count() < self.config.min_text_length {
            return ClassificationResult::unknown("Insufficient text for classification");
        }

        info!("Classifying document (text length: {} chars)", text.len());

        let mut scores: Vec<(DocumentType, f64)> = Vec::with_capacity(self.rules.len());
        let mut winner_strong_matches = 0usize;

        for rule in &self.rules {
            let (score, strong_matches) = self.score_rule(rule, text);
            if score > scores.iter().map(|(_, s)| *s).fold(0.0, f64::max) {
                winner_strong_matches = strong_matches;
            }
            scores.push((rule.document_type, score));
        }

        debug!("Classification scores: {:?}", scores);

        let (best_type, best_score) = scores
            .iter()
            .copied()
            .fold(None, |best: Option<(DocumentType, f64)>, candidate| {
                match best {
                    // Strictly greater keeps the earlier-declared rule on ties.
                    Some((_, score)) if candidate.1 > score => Some(candidate),
                    Some(best) => Some(best),
                    None => Some(candidate),
                }
            })
            .unwrap_or((DocumentType::Unknown, 0.0));

        if best_score == 0.0 {
            return ClassificationResult::unknown("No document type matched the criteria");
        }

        let mut confidence = (best_score * self.config.confidence_scale).min(100.0);
        let mut messages = Vec::new();

        let second = scores
            .iter()
            .filter(|(doc_type, _)| *doc_type != best_type)
            .map(|(doc_type, score)| (*doc_type, *score))
            .fold(None, |best: Option<(DocumentType, f64)>, candidate| match best {
                Some((_, score)) if candidate.1 > score => Some(candidate),
                Some(best) => Some(best),
                None => Some(candidate),
            });

        if let Some((second_type, second_score)) = second {
            if second_score > 0.0 && (best_score - second_score) < self.config.ambiguity_margin {
                confidence *= self.config.ambiguity_penalty;
                messages.push(format!(
                    "Ambiguous classification: {} vs {}",
                    best_type, second_type
                ));
                warn!(
                    "Ambiguous: {} ({:.1}) vs {} ({:.1})",
                    best_type, best_score, second_type, second_score
                );
            }
        }

        messages.push(format!(
            "Identified as {} based on {} strong indicators",
            best_type, winner_strong_matches
        ));

        if confidence < self.config.low_confidence_floor {
            messages.push(format!(
                "Low confidence ({:.1}%). Manual verification recommended.",
                confidence
            ));
        }

        info!(
            "Final classification: {} with {:.1}% confidence",
            best_type, confidence
        );

        ClassificationResult {
            document_type: best_type,
            confidence,
            messages,
        }
    }

    /// Score one rule against the text. Returns (score, strong matches).
    fn score_rule(&self, rule: &CompiledRule, text: &str) -> (f64, usize) {
        // Mandatory gate: at least one must match or the type cannot win.
        if !rule.mandatory.iter().any(|p| p.is_match(text)) {
            debug!("{}: missing mandatory indicator", rule.document_type);
            return (0.0, 0);
        }
        let mut score = self.config.mandatory_score;

        // Exclusion veto: any match definitively rules the type out.
        if let Some(excluded_by) = rule.exclusions.iter().find(|p| p.is_match(text)) {
            info!(
                "{} excluded due to pattern: {}",
                rule.document_type,
                excluded_by.as_str()
            );
            return (0.0, 0);
        }

        let strong_matches = rule
            .strong_indicators
            .iter()
            .filter(|p| p.is_match(text))
            .count();
        let weak_matches = rule
            .weak_indicators
            .iter()
            .filter(|p| p.is_match(text))
            .count();

        score += strong_matches as f64 * self.config.strong_weight;
        score += weak_matches as f64 * self.config.weak_weight;
        score *= rule.weight;

        if strong_matches >= self.config.strong_bonus_threshold {
            score *= self.config.strong_bonus;
        }

        if score < rule.required_score {
            debug!(
                "{}: score too low ({:.1} < {:.1})",
                rule.document_type, score, rule.required_score
            );
            return (0.0, strong_matches);
        }

        (score, strong_matches)
    }
}

fn compile_set(
    patterns: &[String],
    document_type: DocumentType,
    tier: &str,
) -> Result<Vec<Regex>, ExtractionError> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| ExtractionError::InvalidPattern {
                    context: format!("{} {} pattern", document_type, tier),
                    source: Box::new(e),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> DocumentClassifier {
        DocumentClassifier::new().unwrap()
    }

    const PASSPORT_TEXT: &str = "REPUBLIC OF INDIA PASSPORT\nNationality INDIAN\nDate of Birth 21/09/1996\nPlace of Birth MADURAI\nSex M\nP<INDSUNDAR<RAJ<MEKALA<<CHURCHIL<<<<<<<<<<<<<<\nW1403565<2IND9609211M3209192064574868122<36";

    #[test]
    fn test_classifies_passport() {
        let result = classifier().classify(PASSPORT_TEXT);
        assert_eq!(result.document_type, DocumentType::Passport);
        assert!(result.confidence > 60.0);
    }

    #[test]
    fn test_short_text_is_unknown_with_message() {
        let result = classifier().classify("scan");
        assert_eq!(result.document_type, DocumentType::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert!(!result.messages.is_empty());
    }

    #[test]
    fn test_no_match_is_unknown_zero() {
        let result =
            classifier().classify("a perfectly ordinary letter about gardening and weather");
        assert_eq!(result.document_type, DocumentType::Unknown);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_mandatory_gate_blocks_indicator_rich_text() {
        // Every passport strong/weak indicator present, but no P< MRZ
        // marker: the mandatory gate must hold the score at zero.
        let text = "passport passeport nationality surname given names\nplace of birth date of birth Sex M A1234567 but no zone here";
        let result = classifier().classify(text);
        assert_ne!(result.document_type, DocumentType::Passport);
    }

    #[test]
    fn test_exclusion_gate_vetoes_candidate() {
        // Passes the passport mandatory gate (MRZ marker) but mentions a
        // sponsor, which rules passports out.
        let text = "P<INDKUMAR<<RAJ<<<<<<<<<<<<<<<<<<<<<<<<<<<<<\npassport nationality date of birth\nsponsor: ACME LLC residence\npermit no 12345 profession engineer place of issue dubai valid until 2025\nfile no 101/2024/9988 u.i.d no 784123456";
        let result = classifier().classify(text);
        assert_ne!(result.document_type, DocumentType::Passport);
    }

    #[test]
    fn test_ambiguity_penalty_lowers_confidence() {
        // Invoice text alone scores cleanly.
        let clean = "tax invoice\ninvoice number INV-1 bill to customer\nsubtotal amount quantity date";
        let clean_result = classifier().classify(clean);
        assert_eq!(clean_result.document_type, DocumentType::Invoice);

        // Same invoice signals with a tax-certificate block close behind:
        // same winner, penalized confidence and an ambiguity message.
        let contested = "tax invoice\ninvoice number INV-1 bill to customer\nsubtotal amount quantity date\nfederal tax authority\ntrn registration number certificate number legal name\naddress tax period";
        let contested_result = classifier().classify(contested);
        assert!(contested_result.confidence < clean_result.confidence);
        assert!(contested_result
            .messages
            .iter()
            .any(|m| m.contains("Ambiguous classification")));
    }

    #[test]
    fn test_invalid_rule_pattern_fails_fast() {
        let rules = vec![ClassificationRule {
            document_type: DocumentType::Invoice,
            mandatory: vec!["([broken".to_string()],
            exclusions: Vec::new(),
            strong_indicators: Vec::new(),
            weak_indicators: Vec::new(),
            weight: 1.0,
            required_score: 20.0,
        }];
        assert!(matches!(
            DocumentClassifier::with_rules(rules, ClassifierConfig::default()),
            Err(ExtractionError::InvalidPattern { .. })
        ));
    }
}

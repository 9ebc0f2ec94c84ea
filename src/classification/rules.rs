use serde::{Deserialize, Serialize};

use crate::models::DocumentType;
use crate::utils::ExtractionError;

/// Hand-tuned scoring constants for the classifier. All of them are
/// configuration, not code: callers can deserialize a different set and
/// inject it at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Base score granted when a mandatory pattern matches.
    pub mandatory_score: f64,
    /// Score added per matching strong indicator.
    pub strong_weight: f64,
    /// Score added per matching weak indicator.
    pub weak_weight: f64,
    /// Strong-indicator count at which the bonus multiplier kicks in.
    pub strong_bonus_threshold: usize,
    /// Multiplier applied when enough strong indicators match.
    pub strong_bonus: f64,
    /// Raw-score gap under which the top two candidates count as ambiguous.
    pub ambiguity_margin: f64,
    /// Confidence multiplier applied on an ambiguous outcome.
    pub ambiguity_penalty: f64,
    /// Raw score to confidence scaling factor (capped at 100).
    pub confidence_scale: f64,
    /// Confidence under which manual verification is recommended.
    pub low_confidence_floor: f64,
    /// Texts shorter than this are not classified at all.
    pub min_text_length: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            mandatory_score: 25.0,
            strong_weight: 10.0,
            weak_weight: 3.0,
            strong_bonus_threshold: 3,
            strong_bonus: 1.3,
            ambiguity_margin: 15.0,
            ambiguity_penalty: 0.6,
            confidence_scale: 2.0,
            low_confidence_floor: 60.0,
            min_text_length: 20,
        }
    }
}

/// One document type's classification rule: mandatory patterns gate
/// candidacy, exclusion patterns veto it, strong and weak indicators score
/// it. All patterns are matched case-insensitively against the raw text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub document_type: DocumentType,
    pub mandatory: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default)]
    pub strong_indicators: Vec<String>,
    #[serde(default)]
    pub weak_indicators: Vec<String>,
    pub weight: f64,
    pub required_score: f64,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ClassificationRule {
    /// Parse a rule table from a JSON array, rejecting duplicate type keys
    /// instead of letting a later entry shadow an earlier one.
    pub fn from_json(json: &str) -> Result<Vec<ClassificationRule>, ExtractionError> {
        let rules: Vec<ClassificationRule> = serde_json::from_str(json)?;
        let mut seen = Vec::new();
        for rule in &rules {
            if seen.contains(&rule.document_type) {
                return Err(ExtractionError::DuplicateTypeKey(
                    rule.document_type.as_key().to_string(),
                ));
            }
            seen.push(rule.document_type);
        }
        Ok(rules)
    }

    /// The built-in rule table. Declaration order doubles as the tie-break
    /// order when two types score identically.
    pub fn default_rules() -> Vec<ClassificationRule> {
        vec![
            ClassificationRule {
                document_type: DocumentType::Passport,
                mandatory: strings(&[r"P<[A-Z]{3}"]),
                exclusions: strings(&[
                    r"residence\s*visa",
                    r"visit\s*visa",
                    r"labor\s*card",
                    r"emirates\s*id",
                    r"entry\s*permit\s*no",
                    r"visa\s*type",
                    r"sponsor",
                ]),
                strong_indicators: strings(&[
                    r"passport",
                    r"passeport",
                    r"passaporte",
                    r"reisepass",
                    r"[A-Z]{1}\d{7,9}",
                    r"nationality",
                    r"place\s*of\s*birth",
                    r"date\s*of\s*birth",
                    r"sex.*[MF]",
                ]),
                weak_indicators: strings(&[r"surname", r"given\s*names?"]),
                weight: 1.0,
                required_score: 35.0,
            },
            ClassificationRule {
                document_type: DocumentType::VisitVisa,
                mandatory: strings(&[r"(?:visit|tourist|visitor)\s*visa", r"entry\s*permit"]),
                exclusions: strings(&[r"residence\s*permit", r"P<[A-Z]{3}", r"labor\s*card"]),
                strong_indicators: strings(&[
                    r"u\.?i\.?d\s*(?:no|number)",
                    r"visa\s*type",
                    r"entry\s*type",
                    r"sponsor",
                    r"visa\s*number",
                    r"visa\s*status",
                ]),
                weak_indicators: strings(&[
                    r"passport\s*(?:no|number)",
                    r"duration",
                    r"valid\s*until",
                ]),
                weight: 1.0,
                required_score: 30.0,
            },
            ClassificationRule {
                document_type: DocumentType::ResidenceVisa,
                mandatory: strings(&[
                    r"residence",
                    r"r\s*e\s*s\s*i\s*d\s*e\s*n\s*c\s*e",
                    r"resident\s*(?:permit|visa)",
                    r"united\s*arab\s*emirates",
                    r"state\s*of\s*united\s*arab\s*emirates",
                ]),
                exclusions: strings(&[r"passeport", r"P<[A-Z]{3}", r"visit\s*visa", r"tourist"]),
                strong_indicators: strings(&[
                    r"permit\s*(?:no|number)",
                    r"file\s*(?:no|number)",
                    r"u\.?i\.?d\s*(?:no|number)",
                    r"sponsor",
                    r"profession",
                    r"place\s*of\s*issue",
                    r"valid\s*until",
                ]),
                weak_indicators: strings(&[r"passport\s*(?:no|number)", r"nationality"]),
                weight: 1.0,
                required_score: 25.0,
            },
            ClassificationRule {
                document_type: DocumentType::LaborCard,
                mandatory: strings(&[r"labor\s*card", r"work\s*permit", r"mol"]),
                exclusions: strings(&[r"visit\s*visa", r"residence\s*visa"]),
                strong_indicators: strings(&[
                    r"ministry\s*of\s*(?:labor|labour)",
                    r"ministry\s*of\s*human\s*resources",
                    r"mohre",
                    r"employer",
                    r"occupation",
                    r"card\s*(?:no|number)",
                ]),
                weak_indicators: strings(&[r"validity", r"issue\s*date"]),
                weight: 1.0,
                required_score: 25.0,
            },
            ClassificationRule {
                document_type: DocumentType::EmiratesId,
                mandatory: strings(&[r"emirates\s*id", r"784-\d{4}-\d{7}-\d{1}"]),
                exclusions: strings(&[r"passport", r"visa", r"labor"]),
                strong_indicators: strings(&[
                    r"identity\s*card",
                    r"idn",
                    r"card\s*(?:no|number)",
                    r"united\s*arab\s*emirates",
                ]),
                weak_indicators: strings(&[r"nationality", r"expiry"]),
                weight: 1.0,
                required_score: 30.0,
            },
            ClassificationRule {
                document_type: DocumentType::HomeCountryId,
                mandatory: strings(&[r"aadhaa?r", r"uidai"]),
                exclusions: strings(&[r"passport", r"visa", r"emirates"]),
                strong_indicators: strings(&[
                    r"\d{4}\s*\d{4}\s*\d{4}",
                    r"unique\s*identification",
                    r"government\s*of\s*india",
                ]),
                weak_indicators: strings(&[r"dob", r"address"]),
                weight: 1.0,
                required_score: 25.0,
            },
            ClassificationRule {
                document_type: DocumentType::Invoice,
                mandatory: strings(&[r"invoice"]),
                exclusions: strings(&[r"passport", r"visa", r"purchase\s*order"]),
                strong_indicators: strings(&[
                    r"tax\s*invoice",
                    r"invoice\s*(?:no|number|#)",
                    r"bill\s*to",
                    r"(?:sub)?total",
                    r"amount",
                    r"quantity",
                ]),
                weak_indicators: strings(&[r"date", r"customer"]),
                weight: 0.9,
                required_score: 20.0,
            },
            ClassificationRule {
                document_type: DocumentType::PurchaseOrder,
                mandatory: strings(&[r"purchase\s*order", r"p\.?o\.?\s*(?:no|number)"]),
                exclusions: strings(&[r"passport", r"visa", r"invoice"]),
                strong_indicators: strings(&[
                    r"vendor",
                    r"buyer",
                    r"ship\s*to",
                    r"order\s*date",
                ]),
                weak_indicators: strings(&[r"quantity", r"price"]),
                weight: 0.9,
                required_score: 20.0,
            },
            ClassificationRule {
                document_type: DocumentType::CompanyLicense,
                mandatory: strings(&[
                    r"(?:commercial|business|trade|professional)\s*licen[cs]e",
                    r"license\s*type",
                ]),
                exclusions: strings(&[r"passport", r"visa", r"invoice"]),
                strong_indicators: strings(&[
                    r"licen[cs]e\s*(?:no|number)",
                    r"main\s*license\s*(?:no|number)",
                    r"dcci\s*no",
                    r"chamber\s*of\s*commerce",
                    r"legal\s*(?:form|type)",
                ]),
                weak_indicators: strings(&[r"issue\s*date", r"expiry\s*date", r"activity"]),
                weight: 1.0,
                required_score: 25.0,
            },
            ClassificationRule {
                document_type: DocumentType::VisaCancellation,
                mandatory: strings(&[
                    r"(?:visa|residence)\s*cancellation",
                    r"application\s*for\s*cancellation",
                ]),
                exclusions: Vec::new(),
                strong_indicators: strings(&[
                    r"cancellation\s*transaction",
                    r"cancellation\s*date",
                    r"establishment\s*(?:no|number)",
                    r"sponsor",
                    r"application\s*(?:no|number)",
                ]),
                weak_indicators: strings(&[r"passport", r"nationality", r"profession"]),
                weight: 1.0,
                required_score: 25.0,
            },
            ClassificationRule {
                document_type: DocumentType::CompanyVatCertificate,
                mandatory: strings(&[
                    r"federal\s*tax\s*authority",
                    r"tax\s*registration\s*certificate",
                ]),
                exclusions: Vec::new(),
                strong_indicators: strings(&[
                    r"vat\s*number",
                    r"trn",
                    r"registration\s*number",
                    r"certificate\s*number",
                    r"legal\s*name",
                ]),
                weak_indicators: strings(&[r"address", r"issue\s*date", r"tax\s*period"]),
                weight: 1.0,
                required_score: 30.0,
            },
            ClassificationRule {
                document_type: DocumentType::EntryPermit,
                mandatory: strings(&[r"entry\s*permit", r"permit\s*no"]),
                exclusions: Vec::new(),
                strong_indicators: strings(&[
                    r"permit\s*number",
                    r"visa\s*number",
                    r"uid\s*number",
                    r"file\s*number",
                    r"application\s*number",
                    r"place\s*of\s*issue",
                ]),
                weak_indicators: strings(&[r"nationality", r"passport", r"profession"]),
                weight: 1.0,
                required_score: 30.0,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_cover_all_types() {
        let rules = ClassificationRule::default_rules();
        assert_eq!(rules.len(), 12);
        for doc_type in DocumentType::all() {
            assert!(
                rules.iter().any(|r| r.document_type == *doc_type),
                "missing rule for {}",
                doc_type
            );
        }
    }

    #[test]
    fn test_from_json_rejects_duplicates() {
        let json = r#"[
            {"document_type": "INVOICE", "mandatory": ["invoice"], "weight": 1.0, "required_score": 20.0},
            {"document_type": "INVOICE", "mandatory": ["invoice"], "weight": 0.5, "required_score": 10.0}
        ]"#;
        assert!(matches!(
            ClassificationRule::from_json(json),
            Err(ExtractionError::DuplicateTypeKey(_))
        ));
    }

    #[test]
    fn test_config_defaults() {
        let config = ClassifierConfig::default();
        assert_eq!(config.mandatory_score, 25.0);
        assert_eq!(config.strong_weight, 10.0);
        assert_eq!(config.weak_weight, 3.0);
        assert_eq!(config.min_text_length, 20);
    }
}

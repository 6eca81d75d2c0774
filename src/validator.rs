//! Locale consistency validation.
//!
//! Compares a language table against a reference table: every reference key
//! should be translated, and every translation should use the same `{name}`
//! placeholders as its reference template.

use crate::model::{TranslationCollectedMap, TranslationStringMap};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Validation report containing errors and warnings about one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Keys the language cannot resolve
    pub errors: Vec<String>,

    /// Non-critical issues (extra keys, placeholder drift)
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

/// Validator for translation tables.
pub struct TranslationValidator;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationValidator {
    /// Validate `candidate` against `reference`.
    ///
    /// - keys missing from `candidate` are errors
    /// - keys only `candidate` has are warnings
    /// - templates whose placeholder sets differ are warnings
    ///
    /// Findings are reported in key order.
    pub fn validate(
        reference: &TranslationStringMap,
        candidate: &TranslationStringMap,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();

        let reference_keys: BTreeSet<&String> = reference.keys().collect();
        let candidate_keys: BTreeSet<&String> = candidate.keys().collect();

        for key in reference_keys.difference(&candidate_keys) {
            report.errors.push(format!("Missing key: {}", key));
        }

        for key in candidate_keys.difference(&reference_keys) {
            report.warnings.push(format!("Unknown key: {}", key));
        }

        for key in reference_keys.intersection(&candidate_keys) {
            let expected = Self::extract_placeholders(&reference[*key]);
            let actual = Self::extract_placeholders(&candidate[*key]);
            if expected != actual {
                report.warnings.push(format!(
                    "Placeholder mismatch for {}: reference has {:?}, translation has {:?}",
                    key, expected, actual
                ));
            }
        }

        report
    }

    /// Validate every language in `collected` against `reference_language`.
    ///
    /// Returns `None` when the reference language has no table.
    pub fn validate_languages(
        collected: &TranslationCollectedMap,
        reference_language: &str,
    ) -> Option<BTreeMap<String, ValidationReport>> {
        let reference = collected.get(reference_language)?;

        Some(
            collected
                .iter()
                .filter(|(language, _)| language.as_str() != reference_language)
                .map(|(language, table)| (language.clone(), Self::validate(reference, table)))
                .collect(),
        )
    }

    /// Extract the distinct `{name}` placeholders of a template
    pub fn extract_placeholders(template: &str) -> BTreeSet<String> {
        let regex = PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\{([^{}]+)\}").unwrap());

        regex
            .captures_iter(template)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }
}

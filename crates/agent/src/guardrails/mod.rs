//! Guardrails applied around the generation call: input moderation, reply
//! scanning (PII masking and commitment checks) and the quality gate.

pub mod moderation;
pub mod quality;
pub mod scanner;
pub mod tables;

use std::sync::Arc;

use autoventa_core::GuardrailsConfig;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

pub use moderation::ModerationEngine;
pub use quality::QualityGate;
pub use scanner::{PolicyScanner, ScannerLimits};

#[derive(Debug, Error)]
pub enum GuardrailError {
    #[error("invalid guardrail pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// The three guardrail components, built once at startup and shared by
/// every turn.
#[derive(Clone, Debug)]
pub struct Guardrails {
    pub moderation: Arc<ModerationEngine>,
    pub scanner: PolicyScanner,
    pub quality: QualityGate,
}

impl Guardrails {
    pub fn from_config(config: &GuardrailsConfig) -> Result<Self, GuardrailError> {
        let moderation = Arc::new(ModerationEngine::new()?);
        let scanner = PolicyScanner::new(
            Arc::clone(&moderation),
            ScannerLimits::from(config),
            &config.allowed_phones,
            &config.allowed_emails,
        )?;
        let quality = QualityGate::new(config.min_quality_chars);

        Ok(Self { moderation, scanner, quality })
    }
}

pub(crate) fn compile(pattern: &str, case_insensitive: bool) -> Result<Regex, GuardrailError> {
    RegexBuilder::new(pattern).case_insensitive(case_insensitive).build().map_err(|source| {
        GuardrailError::InvalidPattern { pattern: pattern.to_string(), source }
    })
}

pub(crate) fn compile_all(
    patterns: &[&str],
    case_insensitive: bool,
) -> Result<Vec<Regex>, GuardrailError> {
    patterns.iter().map(|pattern| compile(pattern, case_insensitive)).collect()
}

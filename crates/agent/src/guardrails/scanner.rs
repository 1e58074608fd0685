use std::collections::HashSet;
use std::sync::Arc;

use autoventa_core::{
    CommitmentKind, GuardrailsConfig, GuardrailsValidationResult, ResponseViolation,
};
use regex::{Captures, Regex};
use tracing::{error, info, warn};

use super::moderation::ModerationEngine;
use super::tables::{
    CARD_MASK, CARD_PATTERN, COMMITMENT_PATTERNS, CURP_MASK, CURP_PATTERN, EMAIL_MASK,
    EMAIL_PATTERN, INE_MASK, INE_PATTERN, INVENTED_SPEC_PATTERNS, PHONE_MASK, PHONE_PATTERN,
};
use super::{compile, compile_all, GuardrailError};

/// A reply with masked PII stays deliverable up to this many violations.
pub const MAX_VIOLATIONS_WITH_PII: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScannerLimits {
    pub max_reply_chars: usize,
    pub min_reply_chars: usize,
}

impl From<&GuardrailsConfig> for ScannerLimits {
    fn from(config: &GuardrailsConfig) -> Self {
        Self { max_reply_chars: config.max_reply_chars, min_reply_chars: config.min_reply_chars }
    }
}

impl Default for ScannerLimits {
    fn default() -> Self {
        Self::from(&GuardrailsConfig::default())
    }
}

/// Findings of a single stage over the current cleaned text.
#[derive(Debug, Default)]
struct StageOutcome {
    masked: Option<String>,
    violations: Vec<ResponseViolation>,
    pii: bool,
    force_invalid: bool,
}

impl StageOutcome {
    fn flag(violations: Vec<ResponseViolation>) -> Self {
        Self { violations, ..Self::default() }
    }

    fn masked(masked: String, violations: Vec<ResponseViolation>) -> Self {
        Self { masked: Some(masked), violations, pii: true, force_invalid: false }
    }
}

#[derive(Debug)]
struct ScanState {
    cleaned: String,
    violations: Vec<ResponseViolation>,
    pii_detected: bool,
    moderation_failed: bool,
}

impl ScanState {
    fn absorb(mut self, outcome: StageOutcome) -> Self {
        if let Some(masked) = outcome.masked {
            self.cleaned = masked;
        }
        self.violations.extend(outcome.violations);
        self.pii_detected |= outcome.pii;
        self.moderation_failed |= outcome.force_invalid;
        self
    }

    fn into_result(self) -> GuardrailsValidationResult {
        let is_valid = if self.moderation_failed {
            false
        } else if self.violations.is_empty() {
            true
        } else {
            // Masked PII is remediated, so a handful of findings is tolerated
            // when PII was involved; the same findings without PII are not.
            self.pii_detected && self.violations.len() <= MAX_VIOLATIONS_WITH_PII
        };
        let requires_human_escalation =
            self.violations.iter().any(ResponseViolation::requires_escalation);

        GuardrailsValidationResult {
            is_valid,
            violations: self.violations,
            cleaned_content: self.cleaned,
            requires_human_escalation,
        }
    }
}

/// `(scanner, original reply, cleaned so far) -> findings`
type Stage = fn(&PolicyScanner, &str, &str) -> StageOutcome;

const STAGES: &[Stage] = &[
    PolicyScanner::check_length,
    PolicyScanner::mask_cards,
    PolicyScanner::mask_national_ids,
    PolicyScanner::mask_phones,
    PolicyScanner::mask_emails,
    PolicyScanner::detect_commitments,
    PolicyScanner::detect_invented_specs,
    PolicyScanner::recheck_moderation,
];

/// Scans generated replies for sensitive data, unauthorized commitments and
/// fabricated specifications before they reach the user.
#[derive(Clone, Debug)]
pub struct PolicyScanner {
    moderation: Arc<ModerationEngine>,
    limits: ScannerLimits,
    card: Regex,
    ine: Regex,
    curp: Regex,
    phone: Regex,
    email: Regex,
    commitments: Vec<(CommitmentKind, Regex)>,
    invented_specs: Vec<Regex>,
    allowed_phones: HashSet<String>,
    allowed_emails: HashSet<String>,
}

impl PolicyScanner {
    pub fn new(
        moderation: Arc<ModerationEngine>,
        limits: ScannerLimits,
        allowed_phones: &[String],
        allowed_emails: &[String],
    ) -> Result<Self, GuardrailError> {
        let commitments = COMMITMENT_PATTERNS
            .iter()
            .map(|(kind, pattern)| compile(pattern, true).map(|regex| (*kind, regex)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            moderation,
            limits,
            card: compile(CARD_PATTERN, false)?,
            ine: compile(INE_PATTERN, false)?,
            curp: compile(CURP_PATTERN, false)?,
            phone: compile(PHONE_PATTERN, false)?,
            email: compile(EMAIL_PATTERN, false)?,
            commitments,
            invented_specs: compile_all(INVENTED_SPEC_PATTERNS, true)?,
            allowed_phones: allowed_phones.iter().map(|phone| normalize_phone(phone)).collect(),
            allowed_emails: allowed_emails.iter().map(|email| email.to_lowercase()).collect(),
        })
    }

    pub fn scan_reply(&self, text: &str) -> GuardrailsValidationResult {
        if text.trim().is_empty() {
            return GuardrailsValidationResult::empty_response();
        }

        let initial = ScanState {
            cleaned: text.to_string(),
            violations: Vec::new(),
            pii_detected: false,
            moderation_failed: false,
        };
        let result = STAGES
            .iter()
            .fold(initial, |state, stage| {
                let outcome = stage(self, text, &state.cleaned);
                state.absorb(outcome)
            })
            .into_result();

        info!(
            event_name = "agent.scanner.completed",
            is_valid = result.is_valid,
            violation_count = result.violations.len(),
            requires_human_escalation = result.requires_human_escalation,
            "response validation completed"
        );
        result
    }

    fn check_length(&self, original: &str, _cleaned: &str) -> StageOutcome {
        let chars = original.chars().count();
        let mut violations = Vec::new();

        if chars > self.limits.max_reply_chars {
            warn!(event_name = "agent.scanner.too_long", chars, "response exceeds maximum length");
            violations.push(ResponseViolation::TooLong { max_chars: self.limits.max_reply_chars });
        }
        if chars < self.limits.min_reply_chars {
            warn!(event_name = "agent.scanner.too_short", chars, "response is too short");
            violations.push(ResponseViolation::TooShort { min_chars: self.limits.min_reply_chars });
        }

        StageOutcome::flag(violations)
    }

    fn mask_cards(&self, _original: &str, cleaned: &str) -> StageOutcome {
        if !self.card.is_match(cleaned) {
            return StageOutcome::default();
        }

        warn!(event_name = "agent.scanner.pii_masked", kind = "card", "card number masked");
        let masked = self.card.replace_all(cleaned, CARD_MASK).into_owned();
        StageOutcome::masked(masked, vec![ResponseViolation::CreditCardDetected])
    }

    fn mask_national_ids(&self, _original: &str, cleaned: &str) -> StageOutcome {
        if !self.ine.is_match(cleaned) && !self.curp.is_match(cleaned) {
            return StageOutcome::default();
        }

        warn!(event_name = "agent.scanner.pii_masked", kind = "national_id", "national id masked");
        let masked = self.ine.replace_all(cleaned, INE_MASK);
        let masked = self.curp.replace_all(&masked, CURP_MASK).into_owned();
        StageOutcome::masked(masked, vec![ResponseViolation::NationalIdDetected])
    }

    fn mask_phones(&self, _original: &str, cleaned: &str) -> StageOutcome {
        let (masked, hits) = mask_unless(&self.phone, cleaned, PHONE_MASK, |phone| {
            self.allowed_phones.contains(&normalize_phone(phone))
        });
        if hits == 0 {
            return StageOutcome::default();
        }

        warn!(event_name = "agent.scanner.pii_masked", kind = "phone", hits, "phone masked");
        StageOutcome::masked(masked, vec![ResponseViolation::UnauthorizedPhoneDetected; hits])
    }

    fn mask_emails(&self, _original: &str, cleaned: &str) -> StageOutcome {
        let (masked, hits) = mask_unless(&self.email, cleaned, EMAIL_MASK, |email| {
            self.allowed_emails.contains(&email.to_lowercase())
        });
        if hits == 0 {
            return StageOutcome::default();
        }

        warn!(event_name = "agent.scanner.pii_masked", kind = "email", hits, "email masked");
        StageOutcome::masked(masked, vec![ResponseViolation::UnauthorizedEmailDetected; hits])
    }

    fn detect_commitments(&self, original: &str, _cleaned: &str) -> StageOutcome {
        let violations = self
            .commitments
            .iter()
            .filter(|(_, pattern)| pattern.is_match(original))
            .map(|(kind, _)| ResponseViolation::UnauthorizedCommitment { kind: *kind })
            .collect::<Vec<_>>();

        if !violations.is_empty() {
            warn!(
                event_name = "agent.scanner.unauthorized_commitment",
                count = violations.len(),
                "unauthorized commitments detected"
            );
        }
        StageOutcome::flag(violations)
    }

    fn detect_invented_specs(&self, original: &str, _cleaned: &str) -> StageOutcome {
        if !self.invented_specs.iter().any(|pattern| pattern.is_match(original)) {
            return StageOutcome::default();
        }

        warn!(
            event_name = "agent.scanner.invented_specification",
            "response may contain invented vehicle information"
        );
        StageOutcome::flag(vec![ResponseViolation::InventedSpecification])
    }

    fn recheck_moderation(&self, original: &str, _cleaned: &str) -> StageOutcome {
        let moderation = self.moderation.classify(original);
        if moderation.is_appropriate {
            return StageOutcome::default();
        }

        error!(
            event_name = "agent.scanner.inappropriate_reply",
            flags = %moderation.flags_label(),
            "generated reply failed content moderation"
        );
        StageOutcome {
            violations: vec![ResponseViolation::InappropriateContent { flags: moderation.flags }],
            force_invalid: true,
            ..StageOutcome::default()
        }
    }
}

/// Replaces every match of `pattern` that `keep` rejects, returning the new
/// text and the number of replaced matches.
fn mask_unless(
    pattern: &Regex,
    text: &str,
    mask: &str,
    keep: impl Fn(&str) -> bool,
) -> (String, usize) {
    let mut hits = 0;
    let masked = pattern
        .replace_all(text, |captures: &Captures<'_>| {
            let found = &captures[0];
            if keep(found) {
                found.to_string()
            } else {
                hits += 1;
                mask.to_string()
            }
        })
        .into_owned();
    (masked, hits)
}

fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|ch| !matches!(ch, '-' | '.')).collect()
}

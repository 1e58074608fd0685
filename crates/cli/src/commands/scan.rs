use autoventa_core::GuardrailsValidationResult;
use serde::Serialize;

use super::{load_guardrails, CommandResult};

#[derive(Debug, Serialize)]
struct ScanReport {
    command: &'static str,
    validation: GuardrailsValidationResult,
    violation_codes: Vec<String>,
    quality_acceptable: bool,
}

pub fn run(text: &str) -> CommandResult {
    let guardrails = match load_guardrails("scan") {
        Ok(guardrails) => guardrails,
        Err(failure) => return failure,
    };

    let validation = guardrails.scanner.scan_reply(text);
    let candidate =
        if validation.cleaned_content.is_empty() { text } else { &validation.cleaned_content };
    let quality_acceptable = guardrails.quality.is_acceptable(candidate);

    CommandResult::report(
        "scan",
        &ScanReport {
            command: "scan",
            violation_codes: validation.violation_codes(),
            validation,
            quality_acceptable,
        },
    )
}

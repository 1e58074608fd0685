use autoventa_core::ContentModerationResult;
use serde::Serialize;

use super::{load_guardrails, CommandResult};

#[derive(Debug, Serialize)]
struct ModerateReport<'a> {
    command: &'static str,
    text: &'a str,
    verdict: ContentModerationResult,
}

pub fn run(text: &str) -> CommandResult {
    let guardrails = match load_guardrails("moderate") {
        Ok(guardrails) => guardrails,
        Err(failure) => return failure,
    };

    let verdict = guardrails.moderation.classify(text);
    CommandResult::report("moderate", &ModerateReport { command: "moderate", text, verdict })
}

use std::time::Duration;

use autoventa_agent::{default_generator, GenerationError, Guardrails, ResponseGenerator};
use autoventa_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use super::{CommandResult, EXIT_CONFIG};

const PROBE_CARD: &str = "Mi tarjeta es 4111 1111 1111 1111, gracias";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { EXIT_CONFIG } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_guardrail_tables(&config));
            checks.push(check_generation_backend(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["guardrail_tables", "generation_backend"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_guardrail_tables(config: &AppConfig) -> DoctorCheck {
    let guardrails = match Guardrails::from_config(&config.guardrails) {
        Ok(guardrails) => guardrails,
        Err(error) => {
            return DoctorCheck {
                name: "guardrail_tables",
                status: CheckStatus::Fail,
                details: error.to_string(),
            };
        }
    };

    let probe = guardrails.scanner.scan_reply(PROBE_CARD);
    if probe.cleaned_content.contains("4111") {
        return DoctorCheck {
            name: "guardrail_tables",
            status: CheckStatus::Fail,
            details: "scanner did not mask the probe card number".to_string(),
        };
    }

    DoctorCheck {
        name: "guardrail_tables",
        status: CheckStatus::Pass,
        details: format!(
            "guardrail tables compiled; strike limit {}, {} allow-listed phones, \
             {} allow-listed emails",
            config.guardrails.strike_limit,
            config.guardrails.allowed_phones.len(),
            config.guardrails.allowed_emails.len()
        ),
    }
}

/// Probes the same generator the server wires at bootstrap.
fn check_generation_backend(config: &AppConfig) -> DoctorCheck {
    let (generator, mode) = default_generator();
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "generation_backend",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let timeout = Duration::from_secs(config.generation.timeout_secs);
    let probe = runtime.block_on(async {
        tokio::time::timeout(
            timeout,
            generator.generate(&config.assistant.system_prompt, "hola", None),
        )
        .await
    });

    match probe {
        Ok(Ok(_)) => DoctorCheck {
            name: "generation_backend",
            status: CheckStatus::Pass,
            details: format!("generation backend ({mode}) answered the probe"),
        },
        Ok(Err(GenerationError::Unavailable(reason))) => DoctorCheck {
            name: "generation_backend",
            status: CheckStatus::Skipped,
            details: format!(
                "mode {mode}: {reason}; replies degrade to the technical-difficulty message"
            ),
        },
        Ok(Err(error)) => DoctorCheck {
            name: "generation_backend",
            status: CheckStatus::Fail,
            details: format!("mode {mode}: {error}"),
        },
        Err(_) => DoctorCheck {
            name: "generation_backend",
            status: CheckStatus::Fail,
            details: format!("mode {mode}: probe timed out after {}s", timeout.as_secs()),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

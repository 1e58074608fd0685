use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use autoventa_core::config::{default_config_paths, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let guardrails = &config.guardrails;
    let entries = [
        (
            "assistant.system_prompt",
            preview(&config.assistant.system_prompt),
            source("assistant.system_prompt", &["AUTOVENTA_ASSISTANT_SYSTEM_PROMPT"]),
        ),
        (
            "generation.timeout_secs",
            config.generation.timeout_secs.to_string(),
            source("generation.timeout_secs", &["AUTOVENTA_GENERATION_TIMEOUT_SECS"]),
        ),
        (
            "guardrails.strike_limit",
            guardrails.strike_limit.to_string(),
            source("guardrails.strike_limit", &["AUTOVENTA_GUARDRAILS_STRIKE_LIMIT"]),
        ),
        (
            "guardrails.max_reply_chars",
            guardrails.max_reply_chars.to_string(),
            source("guardrails.max_reply_chars", &["AUTOVENTA_GUARDRAILS_MAX_REPLY_CHARS"]),
        ),
        (
            "guardrails.min_reply_chars",
            guardrails.min_reply_chars.to_string(),
            source("guardrails.min_reply_chars", &["AUTOVENTA_GUARDRAILS_MIN_REPLY_CHARS"]),
        ),
        (
            "guardrails.min_quality_chars",
            guardrails.min_quality_chars.to_string(),
            source("guardrails.min_quality_chars", &["AUTOVENTA_GUARDRAILS_MIN_QUALITY_CHARS"]),
        ),
        (
            "guardrails.allowed_phones",
            guardrails.allowed_phones.join(","),
            source("guardrails.allowed_phones", &["AUTOVENTA_GUARDRAILS_ALLOWED_PHONES"]),
        ),
        (
            "guardrails.allowed_emails",
            guardrails.allowed_emails.join(","),
            source("guardrails.allowed_emails", &["AUTOVENTA_GUARDRAILS_ALLOWED_EMAILS"]),
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            source("server.bind_address", &["AUTOVENTA_SERVER_BIND_ADDRESS"]),
        ),
        (
            "server.port",
            config.server.port.to_string(),
            source("server.port", &["AUTOVENTA_SERVER_PORT"]),
        ),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            source("server.graceful_shutdown_secs", &["AUTOVENTA_SERVER_GRACEFUL_SHUTDOWN_SECS"]),
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            source("logging.level", &["AUTOVENTA_LOGGING_LEVEL", "AUTOVENTA_LOG_LEVEL"]),
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            source("logging.format", &["AUTOVENTA_LOGGING_FORMAT", "AUTOVENTA_LOG_FORMAT"]),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(entries.into_iter().map(|(key, value, source)| render_line(key, &value, source)));
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    default_config_paths().into_iter().find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Long prompts are shown truncated so each entry stays on one line.
fn preview(text: &str) -> String {
    const LIMIT: usize = 60;
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= LIMIT {
        return single_line;
    }

    let truncated = single_line.chars().take(LIMIT).collect::<String>();
    format!("{truncated}...")
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Eres Baba, un asistente virtual de Kavak que ayuda a clientes a encontrar vehículos.";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub assistant: AssistantConfig,
    pub generation: GenerationConfig,
    pub guardrails: GuardrailsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    pub system_prompt: String,
}

#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardrailsConfig {
    pub strike_limit: u32,
    pub max_reply_chars: usize,
    pub min_reply_chars: usize,
    pub min_quality_chars: usize,
    pub allowed_phones: Vec<String>,
    pub allowed_emails: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub system_prompt: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub strike_limit: Option<u32>,
    pub generation_timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            strike_limit: 3,
            max_reply_chars: 1000,
            min_reply_chars: 10,
            min_quality_chars: 20,
            allowed_phones: vec!["5512345678".to_string(), "8001234567".to_string()],
            allowed_emails: vec![
                "contacto@kavak.com".to_string(),
                "soporte@kavak.com".to_string(),
                "ventas@kavak.com".to_string(),
            ],
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assistant: AssistantConfig { system_prompt: DEFAULT_SYSTEM_PROMPT.to_string() },
            generation: GenerationConfig { timeout_secs: 30 },
            guardrails: GuardrailsConfig::default(),
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("autoventa.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(assistant) = patch.assistant {
            if let Some(system_prompt) = assistant.system_prompt {
                self.assistant.system_prompt = system_prompt;
            }
        }

        if let Some(generation) = patch.generation {
            if let Some(timeout_secs) = generation.timeout_secs {
                self.generation.timeout_secs = timeout_secs;
            }
        }

        if let Some(guardrails) = patch.guardrails {
            if let Some(strike_limit) = guardrails.strike_limit {
                self.guardrails.strike_limit = strike_limit;
            }
            if let Some(max_reply_chars) = guardrails.max_reply_chars {
                self.guardrails.max_reply_chars = max_reply_chars;
            }
            if let Some(min_reply_chars) = guardrails.min_reply_chars {
                self.guardrails.min_reply_chars = min_reply_chars;
            }
            if let Some(min_quality_chars) = guardrails.min_quality_chars {
                self.guardrails.min_quality_chars = min_quality_chars;
            }
            if let Some(allowed_phones) = guardrails.allowed_phones {
                self.guardrails.allowed_phones = allowed_phones;
            }
            if let Some(allowed_emails) = guardrails.allowed_emails {
                self.guardrails.allowed_emails = allowed_emails;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("AUTOVENTA_ASSISTANT_SYSTEM_PROMPT") {
            self.assistant.system_prompt = value;
        }

        if let Some(value) = read_env("AUTOVENTA_GENERATION_TIMEOUT_SECS") {
            self.generation.timeout_secs = parse_u64("AUTOVENTA_GENERATION_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("AUTOVENTA_GUARDRAILS_STRIKE_LIMIT") {
            self.guardrails.strike_limit = parse_u32("AUTOVENTA_GUARDRAILS_STRIKE_LIMIT", &value)?;
        }
        if let Some(value) = read_env("AUTOVENTA_GUARDRAILS_MAX_REPLY_CHARS") {
            self.guardrails.max_reply_chars =
                parse_usize("AUTOVENTA_GUARDRAILS_MAX_REPLY_CHARS", &value)?;
        }
        if let Some(value) = read_env("AUTOVENTA_GUARDRAILS_MIN_REPLY_CHARS") {
            self.guardrails.min_reply_chars =
                parse_usize("AUTOVENTA_GUARDRAILS_MIN_REPLY_CHARS", &value)?;
        }
        if let Some(value) = read_env("AUTOVENTA_GUARDRAILS_MIN_QUALITY_CHARS") {
            self.guardrails.min_quality_chars =
                parse_usize("AUTOVENTA_GUARDRAILS_MIN_QUALITY_CHARS", &value)?;
        }
        if let Some(value) = read_env("AUTOVENTA_GUARDRAILS_ALLOWED_PHONES") {
            self.guardrails.allowed_phones = split_list(&value);
        }
        if let Some(value) = read_env("AUTOVENTA_GUARDRAILS_ALLOWED_EMAILS") {
            self.guardrails.allowed_emails = split_list(&value);
        }

        if let Some(value) = read_env("AUTOVENTA_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("AUTOVENTA_SERVER_PORT") {
            self.server.port = parse_u16("AUTOVENTA_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("AUTOVENTA_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("AUTOVENTA_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("AUTOVENTA_LOGGING_LEVEL").or_else(|| read_env("AUTOVENTA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("AUTOVENTA_LOGGING_FORMAT").or_else(|| read_env("AUTOVENTA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(system_prompt) = overrides.system_prompt {
            self.assistant.system_prompt = system_prompt;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(strike_limit) = overrides.strike_limit {
            self.guardrails.strike_limit = strike_limit;
        }
        if let Some(timeout_secs) = overrides.generation_timeout_secs {
            self.generation.timeout_secs = timeout_secs;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_generation(&self.generation)?;
        validate_guardrails(&self.guardrails)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Candidate config file locations, in lookup order.
pub fn default_config_paths() -> [PathBuf; 2] {
    [PathBuf::from("autoventa.toml"), PathBuf::from("config/autoventa.toml")]
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    default_config_paths().into_iter().find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_generation(generation: &GenerationConfig) -> Result<(), ConfigError> {
    if generation.timeout_secs == 0 || generation.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "generation.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_guardrails(guardrails: &GuardrailsConfig) -> Result<(), ConfigError> {
    if guardrails.strike_limit == 0 {
        return Err(ConfigError::Validation(
            "guardrails.strike_limit must be greater than zero".to_string(),
        ));
    }

    if guardrails.min_reply_chars >= guardrails.max_reply_chars {
        return Err(ConfigError::Validation(
            "guardrails.min_reply_chars must be lower than guardrails.max_reply_chars"
                .to_string(),
        ));
    }

    if let Some(phone) = guardrails
        .allowed_phones
        .iter()
        .find(|phone| phone.is_empty() || !phone.chars().all(|ch| ch.is_ascii_digit()))
    {
        return Err(ConfigError::Validation(format!(
            "guardrails.allowed_phones entries must be digits only (got `{phone}`)"
        )));
    }

    if let Some(email) = guardrails.allowed_emails.iter().find(|email| !email.contains('@')) {
        return Err(ConfigError::Validation(format!(
            "guardrails.allowed_emails entries must be email addresses (got `{email}`)"
        )));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    assistant: Option<AssistantPatch>,
    generation: Option<GenerationPatch>,
    guardrails: Option<GuardrailsPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AssistantPatch {
    system_prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerationPatch {
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct GuardrailsPatch {
    strike_limit: Option<u32>,
    max_reply_chars: Option<usize>,
    min_reply_chars: Option<usize>,
    min_quality_chars: Option<usize>,
    allowed_phones: Option<Vec<String>>,
    allowed_emails: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

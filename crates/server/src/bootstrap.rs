use std::sync::Arc;

use autoventa_agent::{
    default_generator, ConversationOrchestrator, GuardrailError, Guardrails, SharedGenerator,
    TurnPolicy,
};
use autoventa_core::config::{AppConfig, ConfigError, DEFAULT_SYSTEM_PROMPT};
use thiserror::Error;
use tracing::{info, warn};

pub type Orchestrator = ConversationOrchestrator<SharedGenerator>;

pub struct Application {
    pub config: AppConfig,
    pub orchestrator: Arc<Orchestrator>,
    pub generation_mode: &'static str,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("guardrail setup failed: {0}")]
    Guardrails(#[source] GuardrailError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let (generator, generation_mode) = default_generator();
    bootstrap_with_generator(config, generator, generation_mode)
}

pub fn bootstrap_with_generator(
    mut config: AppConfig,
    generator: SharedGenerator,
    generation_mode: &'static str,
) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        generation_mode,
        "starting application bootstrap"
    );
    config.validate()?;
    if config.assistant.system_prompt.trim().is_empty() {
        warn!(
            event_name = "system.bootstrap.default_prompt",
            correlation_id = "bootstrap",
            "assistant.system_prompt is blank; using the default prompt"
        );
        config.assistant.system_prompt = DEFAULT_SYSTEM_PROMPT.to_string();
    }
    let guardrails =
        Guardrails::from_config(&config.guardrails).map_err(BootstrapError::Guardrails)?;
    info!(
        event_name = "system.bootstrap.guardrails_ready",
        correlation_id = "bootstrap",
        strike_limit = config.guardrails.strike_limit,
        "guardrail tables compiled"
    );

    let orchestrator =
        ConversationOrchestrator::new(generator, guardrails, TurnPolicy::from_config(&config));

    Ok(Application { config, orchestrator: Arc::new(orchestrator), generation_mode })
}

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),
    #[error("generation timed out after {timeout_secs}s")]
    TimedOut { timeout_secs: u64 },
}

/// Produces the assistant's reply for one user message. Implementations own
/// the wire protocol; the orchestrator only sees text or a failure.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        history: Option<&[String]>,
    ) -> Result<String, GenerationError>;
}

#[async_trait]
impl<T> ResponseGenerator for Arc<T>
where
    T: ResponseGenerator + ?Sized,
{
    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        history: Option<&[String]>,
    ) -> Result<String, GenerationError> {
        (**self).generate(system_prompt, user_message, history).await
    }
}

pub type SharedGenerator = Arc<dyn ResponseGenerator>;

/// The generator a deployment runs with and the mode name it reports.
pub fn default_generator() -> (SharedGenerator, &'static str) {
    (Arc::new(UnconfiguredGenerator), UnconfiguredGenerator::MODE)
}

/// Stand-in used when no generation backend is wired; every turn degrades to
/// the technical-difficulty reply.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnconfiguredGenerator;

impl UnconfiguredGenerator {
    pub const MODE: &'static str = "unconfigured";
}

#[async_trait]
impl ResponseGenerator for UnconfiguredGenerator {
    async fn generate(
        &self,
        _system_prompt: &str,
        _user_message: &str,
        _history: Option<&[String]>,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable("no generation backend configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{default_generator, GenerationError, ResponseGenerator, UnconfiguredGenerator};

    #[tokio::test]
    async fn unconfigured_generator_is_unavailable() {
        let result = UnconfiguredGenerator.generate("prompt", "hola", None).await;
        assert!(matches!(result, Err(GenerationError::Unavailable(_))));
    }

    #[tokio::test]
    async fn shared_generator_delegates_through_arc() {
        let shared: Arc<dyn ResponseGenerator> = Arc::new(UnconfiguredGenerator);
        let result = shared.generate("prompt", "hola", Some(&["previo".to_string()])).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn default_generator_reports_unconfigured_mode() {
        let (generator, mode) = default_generator();
        assert_eq!(mode, "unconfigured");

        let result = generator.generate("prompt", "hola", None).await;
        assert!(matches!(result, Err(GenerationError::Unavailable(_))));
    }

    #[test]
    fn timeout_error_names_the_budget() {
        let error = GenerationError::TimedOut { timeout_secs: 30 };
        assert_eq!(error.to_string(), "generation timed out after 30s");
    }
}

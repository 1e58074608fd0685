pub mod config;
pub mod domain;
pub mod errors;

pub use config::{AppConfig, ConfigError, GuardrailsConfig, LoadOptions};
pub use domain::conversation::ConversationResponse;
pub use domain::moderation::{
    CommitmentKind, ContentModerationResult, GuardrailsValidationResult, ModerationFlag,
    ModerationSeverity, ResponseViolation,
};
pub use errors::{ApplicationError, InterfaceError};

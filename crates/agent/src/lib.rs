//! Conversation pipeline for the vehicle-sales assistant.
//!
//! Every user turn moves through a fixed sequence:
//! 1. **Input moderation** (`guardrails::moderation`) - classify the user's
//!    message and count strikes for inappropriate input
//! 2. **Generation** (`llm`) - ask the pluggable backend for a reply
//! 3. **Reply scanning** (`guardrails::scanner`) - mask PII, flag
//!    unauthorized commitments and invented specifications
//! 4. **Quality gate** (`guardrails::quality`) - reject blank, short or
//!    emoji-heavy replies
//!
//! # Key Types
//!
//! - `ConversationOrchestrator` - runs one turn end to end
//! - `ResponseGenerator` - pluggable trait for generation backends
//! - `Guardrails` - the moderation engine, scanner and quality gate bundle
//!
//! # Safety Principle
//!
//! The model never speaks for the business. Prices, discounts, credit
//! approvals and warranties are routed to a human advisor instead.

pub mod conversation;
pub mod guardrails;
pub mod llm;
pub mod strikes;

pub use conversation::{ConversationOrchestrator, TurnPolicy};
pub use guardrails::{GuardrailError, Guardrails};
pub use llm::{
    default_generator, GenerationError, ResponseGenerator, SharedGenerator, UnconfiguredGenerator,
};

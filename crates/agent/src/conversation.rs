use std::time::Duration;

use autoventa_core::{
    AppConfig, ContentModerationResult, ConversationResponse, GuardrailsValidationResult,
    ModerationSeverity, ResponseViolation,
};
use tracing::{error, info, warn};

use crate::guardrails::Guardrails;
use crate::llm::{GenerationError, ResponseGenerator};
use crate::strikes::StrikeLedger;

pub const GENERIC_DEFLECTION_MESSAGE: &str = "Lo siento, no puedo ayudarte con eso. \
     ¿Hay algo relacionado con vehículos en lo que pueda asistirte?";

pub const CLOSING_MESSAGE: &str = "No puedo continuar esta conversación. \
     Si necesitas asistencia para comprar un vehículo en el futuro, \
     estaremos disponibles. Que tengas buen día.";

pub const TECHNICAL_DIFFICULTY_MESSAGE: &str =
    "Lo siento, tuve un problema técnico. ¿Podrías intentar de nuevo?";

pub const HANDOFF_MESSAGE: &str = "Déjame conectarte con un asesor especializado que podrá \
     ayudarte mejor. Dame un momento...";

pub const REPHRASE_MESSAGE: &str = "Disculpa, déjame reformular eso. \
     ¿Podrías ser más específico sobre lo que necesitas?";

pub const CLARIFICATION_MESSAGE: &str = "¿Podrías darme más detalles sobre lo que buscas? \
     Así puedo ayudarte mejor.";

/// Per-deployment knobs for a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnPolicy {
    /// Strikes after which the conversation is handed off.
    pub strike_limit: u32,
    /// Upper bound on one generation call; `None` waits indefinitely.
    pub generation_timeout: Option<Duration>,
}

impl TurnPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            strike_limit: config.guardrails.strike_limit,
            generation_timeout: Some(Duration::from_secs(config.generation.timeout_secs)),
        }
    }
}

impl Default for TurnPolicy {
    fn default() -> Self {
        Self { strike_limit: 3, generation_timeout: None }
    }
}

/// Drives one user turn through input moderation, generation, reply scanning
/// and the quality gate. Strike counts are the only state kept across turns.
pub struct ConversationOrchestrator<G> {
    generator: G,
    guardrails: Guardrails,
    policy: TurnPolicy,
    strikes: StrikeLedger,
}

impl<G> ConversationOrchestrator<G>
where
    G: ResponseGenerator,
{
    pub fn new(generator: G, guardrails: Guardrails, policy: TurnPolicy) -> Self {
        Self { generator, guardrails, policy, strikes: StrikeLedger::new() }
    }

    pub fn policy(&self) -> TurnPolicy {
        self.policy
    }

    pub fn guardrails(&self) -> &Guardrails {
        &self.guardrails
    }

    /// Runs a full turn. Every failure is folded into the returned response.
    pub async fn process_turn(
        &self,
        user_id: &str,
        user_message: &str,
        system_prompt: &str,
        history: Option<&[String]>,
    ) -> ConversationResponse {
        info!(
            event_name = "agent.turn.started",
            user_id,
            message_chars = user_message.chars().count(),
            "processing user turn"
        );

        let moderation = self.guardrails.moderation.classify(user_message);
        if !moderation.is_appropriate {
            return self.decline_input(user_id, moderation);
        }

        let reply = match self.generate(system_prompt, user_message, history).await {
            Ok(reply) => reply,
            Err(generation_error) => {
                error!(
                    event_name = "agent.turn.generation_failed",
                    user_id,
                    error = %generation_error,
                    "reply generation failed"
                );
                return ConversationResponse::declined(TECHNICAL_DIFFICULTY_MESSAGE);
            }
        };

        let validation = self.guardrails.scanner.scan_reply(&reply);
        if validation.requires_human_escalation {
            warn!(
                event_name = "agent.turn.handoff",
                user_id,
                violations = ?validation.violation_codes(),
                "reply requires a human advisor"
            );
            return ConversationResponse::escalated(HANDOFF_MESSAGE);
        }
        if !validation.is_valid && !only_too_short(&validation) {
            warn!(
                event_name = "agent.turn.reply_rejected",
                user_id,
                violations = ?validation.violation_codes(),
                "reply failed policy scan"
            );
            return ConversationResponse::declined(REPHRASE_MESSAGE);
        }

        // An invalid reply reaching this point was only too short.
        let candidate = deliverable_text(&validation, &reply);
        if !validation.is_valid || !self.guardrails.quality.is_acceptable(candidate) {
            warn!(event_name = "agent.turn.low_quality", user_id, "reply failed quality gate");
            return ConversationResponse::declined(CLARIFICATION_MESSAGE);
        }

        self.strikes.clear(user_id);
        let has_pii = validation.has_pii();
        info!(event_name = "agent.turn.completed", user_id, has_pii, "turn completed");
        ConversationResponse::delivered(candidate, has_pii)
    }

    pub fn reset_violations(&self, user_id: &str) {
        self.strikes.clear(user_id);
    }

    pub fn violation_count(&self, user_id: &str) -> u32 {
        self.strikes.count(user_id)
    }

    fn decline_input(
        &self,
        user_id: &str,
        moderation: ContentModerationResult,
    ) -> ConversationResponse {
        let count = self.strikes.record_violation(user_id);
        let flags = moderation.flags.clone();

        if moderation.severity == ModerationSeverity::High || count >= self.policy.strike_limit {
            warn!(
                event_name = "agent.turn.terminated",
                user_id,
                strikes = count,
                flags = %moderation.flags_label(),
                "conversation terminated after moderation violation"
            );
            return ConversationResponse::escalated(response_for_violation(&moderation, count))
                .with_flags(flags);
        }

        info!(
            event_name = "agent.turn.deflected",
            user_id,
            strikes = count,
            flags = %moderation.flags_label(),
            "user message deflected"
        );
        let message = moderation.suggested_response().unwrap_or(GENERIC_DEFLECTION_MESSAGE);
        ConversationResponse::declined(message).with_flags(flags)
    }

    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        history: Option<&[String]>,
    ) -> Result<String, GenerationError> {
        let call = self.generator.generate(system_prompt, user_message, history);
        match self.policy.generation_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| GenerationError::TimedOut { timeout_secs: limit.as_secs() })?,
            None => call.await,
        }
    }
}

/// Message shown to a user whose input failed moderation, given their
/// current strike count.
pub fn response_for_violation(moderation: &ContentModerationResult, count: u32) -> String {
    if count == 1 {
        if let Some(suggested) = moderation.suggested_response() {
            return suggested.to_string();
        }
    }

    if count >= 2 && moderation.severity >= ModerationSeverity::Medium {
        return CLOSING_MESSAGE.to_string();
    }

    moderation.suggested_response().unwrap_or(GENERIC_DEFLECTION_MESSAGE).to_string()
}

/// Replies rejected for brevity alone are left to the quality gate, which
/// asks the user for more detail instead of rephrasing.
fn only_too_short(validation: &GuardrailsValidationResult) -> bool {
    !validation.violations.is_empty()
        && validation
            .violations
            .iter()
            .all(|violation| matches!(violation, ResponseViolation::TooShort { .. }))
}

fn deliverable_text<'a>(validation: &'a GuardrailsValidationResult, raw: &'a str) -> &'a str {
    if validation.cleaned_content.is_empty() {
        raw
    } else {
        &validation.cleaned_content
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use autoventa_core::{
        ContentModerationResult, GuardrailsConfig, ModerationFlag, ModerationSeverity,
    };

    use super::{
        response_for_violation, ConversationOrchestrator, TurnPolicy, CLARIFICATION_MESSAGE,
        CLOSING_MESSAGE, GENERIC_DEFLECTION_MESSAGE, HANDOFF_MESSAGE, REPHRASE_MESSAGE,
        TECHNICAL_DIFFICULTY_MESSAGE,
    };
    use crate::guardrails::Guardrails;
    use crate::llm::{GenerationError, ResponseGenerator, UnconfiguredGenerator};

    const PROMPT: &str = "Eres un asistente de ventas de autos.";
    const GOOD_REPLY: &str =
        "Tenemos un Toyota Corolla 2022 con bluetooth disponible, ¿quieres agendar una prueba?";

    #[derive(Default)]
    struct ScriptedGenerator {
        reply: String,
        calls: AtomicUsize,
        last_history: Mutex<Option<Vec<String>>>,
    }

    impl ScriptedGenerator {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: reply.to_string(), ..Self::default() })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ResponseGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_message: &str,
            history: Option<&[String]>,
        ) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = self.last_history.lock() {
                *last = history.map(<[String]>::to_vec);
            }
            Ok(self.reply.clone())
        }
    }

    struct HangingGenerator;

    #[async_trait]
    impl ResponseGenerator for HangingGenerator {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_message: &str,
            _history: Option<&[String]>,
        ) -> Result<String, GenerationError> {
            std::future::pending::<()>().await;
            Ok(String::new())
        }
    }

    fn guardrails() -> Guardrails {
        Guardrails::from_config(&GuardrailsConfig::default()).expect("default guardrails")
    }

    fn orchestrator<G: ResponseGenerator>(generator: G) -> ConversationOrchestrator<G> {
        ConversationOrchestrator::new(generator, guardrails(), TurnPolicy::default())
    }

    #[tokio::test]
    async fn on_topic_message_is_delivered_and_history_forwarded() {
        let generator = ScriptedGenerator::replying(GOOD_REPLY);
        let orchestrator = orchestrator(Arc::clone(&generator));
        let history = vec!["Hola".to_string(), "¡Hola! ¿En qué te ayudo?".to_string()];

        let response = orchestrator
            .process_turn(
                "user-1",
                "Quiero un Toyota Corolla 2022 con bluetooth",
                PROMPT,
                Some(&history),
            )
            .await;

        assert!(response.success);
        assert_eq!(response.message, GOOD_REPLY);
        assert!(!response.requires_escalation);
        assert!(response.moderation_flags.is_empty());
        assert!(!response.has_pii_violations);
        assert_eq!(generator.calls(), 1);
        let forwarded = generator.last_history.lock().expect("history lock").clone();
        assert_eq!(forwarded, Some(history));
    }

    #[tokio::test]
    async fn third_low_severity_strike_escalates() {
        let generator = ScriptedGenerator::replying(GOOD_REPLY);
        let orchestrator = orchestrator(Arc::clone(&generator));

        let first = orchestrator
            .process_turn("user-2", "¿Me das una receta de pozole?", PROMPT, None)
            .await;
        assert!(!first.success);
        assert!(!first.requires_escalation);
        assert_eq!(first.moderation_flags, vec![ModerationFlag::OffTopic]);
        assert!(first.message.contains("especialidad"));

        let second = orchestrator
            .process_turn("user-2", "¿Qué película me recomiendas?", PROMPT, None)
            .await;
        assert!(!second.requires_escalation);
        assert_eq!(orchestrator.violation_count("user-2"), 2);

        let third = orchestrator
            .process_turn("user-2", "¿Y cuál es tu música favorita?", PROMPT, None)
            .await;
        assert!(!third.success);
        assert!(third.requires_escalation);
        assert_eq!(third.moderation_flags, vec![ModerationFlag::OffTopic]);
        assert_eq!(orchestrator.violation_count("user-2"), 3);
        assert_eq!(generator.calls(), 0, "moderated turns never reach the generator");
    }

    #[tokio::test]
    async fn successful_turn_resets_strikes() {
        let orchestrator = orchestrator(ScriptedGenerator::replying(GOOD_REPLY));

        orchestrator.process_turn("user-3", "¿Me das una receta de pozole?", PROMPT, None).await;
        orchestrator.process_turn("user-3", "¿Qué película me recomiendas?", PROMPT, None).await;
        assert_eq!(orchestrator.violation_count("user-3"), 2);

        let response = orchestrator
            .process_turn("user-3", "¿Qué SUV tienen con menos de 50 mil kilómetros?", PROMPT, None)
            .await;
        assert!(response.success);
        assert_eq!(orchestrator.violation_count("user-3"), 0);

        let after = orchestrator
            .process_turn("user-3", "¿Me das una receta de pozole?", PROMPT, None)
            .await;
        assert!(!after.requires_escalation, "count restarted from zero");
        assert_eq!(orchestrator.violation_count("user-3"), 1);
    }

    #[tokio::test]
    async fn high_severity_input_escalates_on_first_strike() {
        let orchestrator = orchestrator(ScriptedGenerator::replying(GOOD_REPLY));

        let response = orchestrator.process_turn("user-4", "te voy a golpear", PROMPT, None).await;

        assert!(!response.success);
        assert!(response.requires_escalation);
        assert_eq!(response.moderation_flags, vec![ModerationFlag::Violence]);
        assert!(response.message.contains("autoridades"));
        assert_eq!(orchestrator.violation_count("user-4"), 1);
    }

    #[tokio::test]
    async fn repeated_harassment_gets_closing_message() {
        let orchestrator = orchestrator(ScriptedGenerator::replying(GOOD_REPLY));

        let first = orchestrator.process_turn("user-5", "eres un idiota", PROMPT, None).await;
        assert!(!first.requires_escalation);
        assert!(first.message.contains("respetuosa"));

        let second = orchestrator.process_turn("user-5", "idiota", PROMPT, None).await;
        assert!(!second.requires_escalation, "medium severity below the limit only deflects");

        let third = orchestrator.process_turn("user-5", "pendejo", PROMPT, None).await;
        assert!(third.requires_escalation);
        assert_eq!(third.message, CLOSING_MESSAGE);
    }

    #[tokio::test]
    async fn unauthorized_commitment_hands_off_to_human() {
        let orchestrator =
            orchestrator(ScriptedGenerator::replying("Te garantizo un descuento del 50%"));

        let response = orchestrator
            .process_turn("user-6", "¿Tienen descuento en el Corolla?", PROMPT, None)
            .await;

        assert!(!response.success);
        assert!(response.requires_escalation);
        assert_eq!(response.message, HANDOFF_MESSAGE);
        assert!(response.moderation_flags.is_empty());
        assert_eq!(orchestrator.violation_count("user-6"), 0);
    }

    #[tokio::test]
    async fn invalid_reply_asks_to_rephrase() {
        let orchestrator = orchestrator(ScriptedGenerator::replying(
            "Este auto tiene exactamente 180 hp y es ideal para carretera",
        ));

        let response =
            orchestrator.process_turn("user-7", "¿Cuántos caballos tiene?", PROMPT, None).await;

        assert!(!response.success);
        assert!(!response.requires_escalation);
        assert_eq!(response.message, REPHRASE_MESSAGE);
    }

    fn orchestrator_with_reply(reply: &str) -> ConversationOrchestrator<Arc<ScriptedGenerator>> {
        orchestrator(ScriptedGenerator::replying(reply))
    }

    #[tokio::test]
    async fn five_char_reply_asks_for_more_detail() {
        let passes = orchestrator_with_reply("Claro, el auto está listo")
            .process_turn("user-8", "¿Está listo mi auto?", PROMPT, None)
            .await;
        assert!(passes.success);

        let five = orchestrator_with_reply("Claro")
            .process_turn("user-8", "¿Está listo mi auto?", PROMPT, None)
            .await;
        assert!(!five.success);
        assert!(!five.requires_escalation);
        assert_eq!(five.message, CLARIFICATION_MESSAGE);

        let terse = orchestrator_with_reply("Sí, disponible.")
            .process_turn("user-8", "¿Está disponible el Corolla?", PROMPT, None)
            .await;
        assert!(!terse.success);
        assert_eq!(terse.message, CLARIFICATION_MESSAGE);
    }

    #[tokio::test]
    async fn too_short_reply_is_never_delivered_with_a_lenient_quality_gate() {
        let config = GuardrailsConfig { min_quality_chars: 1, ..GuardrailsConfig::default() };
        let orchestrator = ConversationOrchestrator::new(
            ScriptedGenerator::replying("Claro"),
            Guardrails::from_config(&config).expect("lenient guardrails"),
            TurnPolicy::default(),
        );

        let response =
            orchestrator.process_turn("user-8", "¿Está listo mi auto?", PROMPT, None).await;

        assert!(!response.success);
        assert_eq!(response.message, CLARIFICATION_MESSAGE);
    }

    #[tokio::test]
    async fn short_reply_with_other_violations_still_asks_to_rephrase() {
        let orchestrator = orchestrator_with_reply("idiota");

        let response =
            orchestrator.process_turn("user-8", "¿Qué opinas de mí?", PROMPT, None).await;

        assert!(!response.success);
        assert_eq!(response.message, REPHRASE_MESSAGE);
    }

    #[tokio::test]
    async fn masked_pii_is_delivered_and_reported() {
        let orchestrator = orchestrator_with_reply(
            "Puedes escribir a tu asesor en mario.lopez@gmail.com para agendar la cita",
        );

        let response =
            orchestrator.process_turn("user-9", "¿Con quién agendo la cita?", PROMPT, None).await;

        assert!(response.success);
        assert!(response.has_pii_violations);
        assert!(response.message.contains("[EMAIL OCULTO]"));
        assert!(!response.message.contains("mario.lopez@gmail.com"));
    }

    #[tokio::test]
    async fn generation_failure_is_not_a_strike() {
        let orchestrator = orchestrator(UnconfiguredGenerator);

        orchestrator.process_turn("user-10", "¿Me das una receta de pozole?", PROMPT, None).await;
        let response =
            orchestrator.process_turn("user-10", "¿Qué autos tienen?", PROMPT, None).await;

        assert!(!response.success);
        assert!(!response.requires_escalation);
        assert_eq!(response.message, TECHNICAL_DIFFICULTY_MESSAGE);
        assert_eq!(orchestrator.violation_count("user-10"), 1, "strikes are left untouched");
    }

    #[tokio::test]
    async fn generation_timeout_degrades_to_technical_message() {
        let orchestrator = ConversationOrchestrator::new(
            HangingGenerator,
            guardrails(),
            TurnPolicy { strike_limit: 3, generation_timeout: Some(Duration::from_millis(20)) },
        );

        let response =
            orchestrator.process_turn("user-11", "¿Qué autos tienen?", PROMPT, None).await;

        assert!(!response.success);
        assert_eq!(response.message, TECHNICAL_DIFFICULTY_MESSAGE);
    }

    #[tokio::test]
    async fn reset_violations_is_idempotent() {
        let orchestrator = orchestrator(UnconfiguredGenerator);
        orchestrator.process_turn("user-12", "¿Me das una receta de pozole?", PROMPT, None).await;
        assert_eq!(orchestrator.violation_count("user-12"), 1);

        orchestrator.reset_violations("user-12");
        orchestrator.reset_violations("user-12");
        orchestrator.reset_violations("nobody");
        assert_eq!(orchestrator.violation_count("user-12"), 0);
    }

    #[tokio::test]
    async fn strikes_are_tracked_per_user() {
        let orchestrator = orchestrator(UnconfiguredGenerator);
        orchestrator.process_turn("alice", "¿Me das una receta de pozole?", PROMPT, None).await;
        orchestrator.process_turn("alice", "¿Qué película me recomiendas?", PROMPT, None).await;

        let bob =
            orchestrator.process_turn("bob", "¿Me das una receta de pozole?", PROMPT, None).await;
        assert!(!bob.requires_escalation);
        assert_eq!(orchestrator.violation_count("alice"), 2);
        assert_eq!(orchestrator.violation_count("bob"), 1);
    }

    #[test]
    fn response_for_violation_follows_count_and_severity() {
        let harassment = ContentModerationResult::flagged(
            ModerationFlag::Harassment,
            ModerationSeverity::Medium,
            "mantengamos el respeto",
        );
        assert_eq!(response_for_violation(&harassment, 1), "mantengamos el respeto");
        assert_eq!(response_for_violation(&harassment, 2), CLOSING_MESSAGE);

        let off_topic = ContentModerationResult::flagged(
            ModerationFlag::OffTopic,
            ModerationSeverity::Low,
            "hablemos de autos",
        );
        assert_eq!(response_for_violation(&off_topic, 3), "hablemos de autos");

        let silent = ContentModerationResult::flagged(
            ModerationFlag::Harassment,
            ModerationSeverity::Low,
            "",
        );
        assert_eq!(response_for_violation(&silent, 1), GENERIC_DEFLECTION_MESSAGE);
    }
}

use autoventa_core::{ContentModerationResult, ModerationFlag, ModerationSeverity};
use regex::Regex;
use tracing::{debug, info, warn};

use super::tables::{
    BUSINESS_KEYWORDS, HARASSMENT_RESPONSE, HATE_SPEECH_KEYWORDS, HATE_SPEECH_RESPONSE,
    OFFENSIVE_PATTERNS, OFF_TOPIC_KEYWORDS, OFF_TOPIC_RESPONSE, PERSONAL_QUESTION_PATTERNS,
    SEXUAL_CONTENT_KEYWORDS, SEXUAL_CONTENT_RESPONSE, SHORT_TASK_REQUEST_CHARS,
    TASK_REQUEST_PATTERNS, VIOLENCE_KEYWORDS, VIOLENCE_RESPONSE,
};
use super::{compile_all, GuardrailError};

#[derive(Clone, Debug)]
enum Matcher {
    Keywords(&'static [&'static str]),
    Patterns(Vec<Regex>),
    OffTopic(OffTopicDetector),
}

impl Matcher {
    fn matches(&self, lowered: &str) -> bool {
        match self {
            Self::Keywords(keywords) => contains_any(lowered, keywords),
            Self::Patterns(patterns) => patterns.iter().any(|pattern| pattern.is_match(lowered)),
            Self::OffTopic(detector) => detector.is_off_topic(lowered),
        }
    }
}

#[derive(Clone, Debug)]
struct ModerationRule {
    flag: ModerationFlag,
    severity: ModerationSeverity,
    suggested_response: &'static str,
    matcher: Matcher,
}

#[derive(Clone, Debug)]
struct OffTopicDetector {
    personal_questions: Vec<Regex>,
    task_requests: Vec<Regex>,
}

impl OffTopicDetector {
    fn is_off_topic(&self, lowered: &str) -> bool {
        let on_business = contains_any(lowered, BUSINESS_KEYWORDS);

        if contains_any(lowered, OFF_TOPIC_KEYWORDS) && !on_business {
            return true;
        }

        if !on_business && self.personal_questions.iter().any(|pattern| pattern.is_match(lowered))
        {
            return true;
        }

        lowered.chars().count() < SHORT_TASK_REQUEST_CHARS
            && self.task_requests.iter().any(|pattern| pattern.is_match(lowered))
    }
}

/// Classifies text against a fixed, ordered rule table. The first matching
/// rule decides the verdict, so at most one flag is ever reported.
#[derive(Clone, Debug)]
pub struct ModerationEngine {
    rules: Vec<ModerationRule>,
}

impl ModerationEngine {
    pub fn new() -> Result<Self, GuardrailError> {
        let off_topic = OffTopicDetector {
            personal_questions: compile_all(PERSONAL_QUESTION_PATTERNS, true)?,
            task_requests: compile_all(TASK_REQUEST_PATTERNS, true)?,
        };

        let rules = vec![
            ModerationRule {
                flag: ModerationFlag::HateSpeech,
                severity: ModerationSeverity::High,
                suggested_response: HATE_SPEECH_RESPONSE,
                matcher: Matcher::Keywords(HATE_SPEECH_KEYWORDS),
            },
            ModerationRule {
                flag: ModerationFlag::Violence,
                severity: ModerationSeverity::High,
                suggested_response: VIOLENCE_RESPONSE,
                matcher: Matcher::Keywords(VIOLENCE_KEYWORDS),
            },
            ModerationRule {
                flag: ModerationFlag::SexualContent,
                severity: ModerationSeverity::High,
                suggested_response: SEXUAL_CONTENT_RESPONSE,
                matcher: Matcher::Keywords(SEXUAL_CONTENT_KEYWORDS),
            },
            ModerationRule {
                flag: ModerationFlag::Harassment,
                severity: ModerationSeverity::Medium,
                suggested_response: HARASSMENT_RESPONSE,
                matcher: Matcher::Patterns(compile_all(OFFENSIVE_PATTERNS, true)?),
            },
            ModerationRule {
                flag: ModerationFlag::OffTopic,
                severity: ModerationSeverity::Low,
                suggested_response: OFF_TOPIC_RESPONSE,
                matcher: Matcher::OffTopic(off_topic),
            },
        ];

        Ok(Self { rules })
    }

    pub fn classify(&self, text: &str) -> ContentModerationResult {
        if text.trim().is_empty() {
            return ContentModerationResult::appropriate();
        }

        let lowered = text.to_lowercase();
        let Some(rule) = self.rules.iter().find(|rule| rule.matcher.matches(&lowered)) else {
            debug!(event_name = "agent.moderation.passed", "message passed content moderation");
            return ContentModerationResult::appropriate();
        };

        if rule.severity >= ModerationSeverity::Medium {
            warn!(
                event_name = "agent.moderation.flagged",
                flag = rule.flag.as_str(),
                severity = ?rule.severity,
                "message failed content moderation"
            );
        } else {
            info!(
                event_name = "agent.moderation.flagged",
                flag = rule.flag.as_str(),
                severity = ?rule.severity,
                "off-topic message detected"
            );
        }

        ContentModerationResult::flagged(rule.flag, rule.severity, rule.suggested_response)
    }
}

fn contains_any(lowered: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| lowered.contains(keyword))
}

#[cfg(test)]
mod tests {
    use autoventa_core::{ModerationFlag, ModerationSeverity};

    use super::ModerationEngine;

    fn engine() -> ModerationEngine {
        ModerationEngine::new().expect("built-in moderation tables should compile")
    }

    #[test]
    fn blank_text_is_trivially_safe() {
        let engine = engine();
        for text in ["", "   ", "\n\t "] {
            let result = engine.classify(text);
            assert!(result.is_appropriate, "blank text {text:?} should be appropriate");
            assert_eq!(result.severity, ModerationSeverity::None);
            assert!(result.flags.is_empty());
        }
    }

    #[test]
    fn on_topic_vehicle_request_passes() {
        let result = engine().classify("Quiero un Toyota Corolla 2022 con bluetooth");
        assert!(result.is_appropriate);
        assert_eq!(result.severity, ModerationSeverity::None);
        assert!(result.flags.is_empty());
    }

    #[test]
    fn hate_speech_is_high_severity_with_single_flag() {
        let result = engine().classify("Ese vendedor es un RACISTA");
        assert!(!result.is_appropriate);
        assert_eq!(result.flags, vec![ModerationFlag::HateSpeech]);
        assert_eq!(result.severity, ModerationSeverity::High);
        assert!(result.suggested_response.contains("compra de un vehículo"));
    }

    #[test]
    fn first_matching_category_wins() {
        // Matches both hate speech and violence; hate speech is evaluated first.
        let result = engine().classify("los xenofobos quieren atacar");
        assert_eq!(result.flags, vec![ModerationFlag::HateSpeech]);

        // Violence is checked before harassment.
        let result = engine().classify("idiota, te voy a golpear");
        assert_eq!(result.flags, vec![ModerationFlag::Violence]);
        assert_eq!(result.severity, ModerationSeverity::High);
    }

    #[test]
    fn sexual_content_is_high_severity() {
        let result = engine().classify("hablemos de sexo");
        assert_eq!(result.flags, vec![ModerationFlag::SexualContent]);
        assert_eq!(result.severity, ModerationSeverity::High);
    }

    #[test]
    fn offensive_language_is_medium_harassment() {
        let result = engine().classify("Eres un ESTÚPIDO, no sirves");
        assert_eq!(result.flags, vec![ModerationFlag::Harassment]);
        assert_eq!(result.severity, ModerationSeverity::Medium);
        assert!(result.suggested_response.contains("respetuosa"));
    }

    #[test]
    fn offensive_patterns_respect_word_boundaries() {
        let result = engine().classify("necesito una computadora para comparar autos");
        assert!(result.is_appropriate, "`computadora` must not match the `puta` pattern");
    }

    #[test]
    fn off_topic_keyword_without_business_context_is_flagged() {
        let result = engine().classify("¿Me pasas una receta de pozole?");
        assert_eq!(result.flags, vec![ModerationFlag::OffTopic]);
        assert_eq!(result.severity, ModerationSeverity::Low);
    }

    #[test]
    fn off_topic_keyword_with_business_context_passes() {
        let result =
            engine().classify("¿Qué auto me recomiendas para ir al fútbol con mi familia?");
        assert!(result.is_appropriate);
    }

    #[test]
    fn personal_question_without_business_context_is_off_topic() {
        let result = engine().classify("hola, ¿cómo estás?");
        assert_eq!(result.flags, vec![ModerationFlag::OffTopic]);
    }

    #[test]
    fn short_task_request_is_off_topic_even_with_business_words() {
        let result = engine().classify("traduce esto: precio del auto");
        assert_eq!(result.flags, vec![ModerationFlag::OffTopic]);
    }

    #[test]
    fn long_task_request_with_business_context_passes() {
        let result = engine().classify(
            "Estoy comparando modelos y quiero saber si me pueden ayudar a traducir la factura del auto",
        );
        assert!(result.is_appropriate);
    }

    #[test]
    fn substring_keyword_collisions_are_accepted() {
        // `arma` is a violence keyword, so `armado` collides by substring.
        let result = engine().classify("quiero el paquete armado con rines");
        assert_eq!(result.flags, vec![ModerationFlag::Violence]);
    }
}

use serde::Serialize;

use crate::domain::moderation::ModerationFlag;

/// Final verdict for one turn, relayed to the inbound transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConversationResponse {
    pub success: bool,
    pub message: String,
    pub requires_escalation: bool,
    pub moderation_flags: Vec<ModerationFlag>,
    pub has_pii_violations: bool,
}

impl ConversationResponse {
    pub fn delivered(message: impl Into<String>, has_pii_violations: bool) -> Self {
        Self {
            success: true,
            message: message.into(),
            requires_escalation: false,
            moderation_flags: Vec::new(),
            has_pii_violations,
        }
    }

    pub fn declined(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            requires_escalation: false,
            moderation_flags: Vec::new(),
            has_pii_violations: false,
        }
    }

    pub fn escalated(message: impl Into<String>) -> Self {
        Self { requires_escalation: true, ..Self::declined(message) }
    }

    pub fn with_flags(mut self, flags: Vec<ModerationFlag>) -> Self {
        self.moderation_flags = flags;
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::moderation::ModerationFlag;

    use super::ConversationResponse;

    #[test]
    fn escalated_response_is_unsuccessful_and_flagged_for_handoff() {
        let response = ConversationResponse::escalated("un asesor te contactará")
            .with_flags(vec![ModerationFlag::Violence]);

        assert!(!response.success);
        assert!(response.requires_escalation);
        assert_eq!(response.moderation_flags, vec![ModerationFlag::Violence]);
        assert!(!response.has_pii_violations);
    }

    #[test]
    fn declined_response_serializes_flags_in_snake_case() {
        let response = ConversationResponse::declined("fuera de tema")
            .with_flags(vec![ModerationFlag::OffTopic]);
        let json = serde_json::to_value(&response).expect("response should serialize");

        assert_eq!(json["success"], false);
        assert_eq!(json["moderation_flags"][0], "off_topic");
    }

    #[test]
    fn delivered_response_carries_pii_marker() {
        let response = ConversationResponse::delivered("hola", true);
        assert!(response.success);
        assert!(response.has_pii_violations);
        assert!(!response.requires_escalation);
    }
}

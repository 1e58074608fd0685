use std::any::Any;
use std::sync::Arc;

use autoventa_core::ApplicationError;
use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::bootstrap::Orchestrator;

pub const INCOMING_PATH: &str = "/v1/webhook/twilio/incoming";

const UNKNOWN_USER: &str = "unknown";

#[derive(Clone)]
pub struct WebhookState {
    pub orchestrator: Arc<Orchestrator>,
    pub system_prompt: Arc<str>,
}

/// Form body posted by the messaging provider for each inbound message.
#[derive(Clone, Debug, Deserialize)]
pub struct IncomingMessage {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "To", default)]
    pub to: Option<String>,
    #[serde(rename = "MessageSid", default)]
    pub message_sid: Option<String>,
}

pub async fn incoming_message(
    State(state): State<WebhookState>,
    form: Result<Form<IncomingMessage>, FormRejection>,
) -> Response {
    let Form(message) = match form {
        Ok(form) => form,
        Err(rejection) => {
            let error = ApplicationError::Transport(rejection.body_text())
                .into_interface(Uuid::new_v4().to_string());
            warn!(
                event_name = "server.webhook.rejected",
                correlation_id = error.correlation_id(),
                error = %error,
                "inbound webhook payload rejected"
            );
            return twiml_response(StatusCode::BAD_REQUEST, error.user_message());
        }
    };

    let correlation_id = message
        .message_sid
        .clone()
        .filter(|sid| !sid.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let user_id = if message.from.trim().is_empty() { UNKNOWN_USER } else { message.from.as_str() };

    info!(
        event_name = "server.webhook.received",
        correlation_id = %correlation_id,
        user_id,
        to = message.to.as_deref().unwrap_or(UNKNOWN_USER),
        "inbound message received"
    );

    let response = state
        .orchestrator
        .process_turn(user_id, &message.body, &state.system_prompt, None)
        .await;

    if response.requires_escalation {
        warn!(
            event_name = "server.webhook.escalation",
            correlation_id = %correlation_id,
            user_id,
            flags = ?response.moderation_flags,
            "conversation requires human escalation"
        );
    }
    if response.has_pii_violations {
        warn!(
            event_name = "server.webhook.pii_masked",
            correlation_id = %correlation_id,
            user_id,
            "sensitive data masked in reply"
        );
    }
    info!(
        event_name = "server.webhook.replied",
        correlation_id = %correlation_id,
        user_id,
        success = response.success,
        "reply sent"
    );

    twiml_response(StatusCode::OK, &response.message)
}

/// Replaces a panicked request with the generic error reply so the user is
/// never left without an answer.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    let error = ApplicationError::Unexpected(detail).into_interface(Uuid::new_v4().to_string());
    error!(
        event_name = "server.webhook.panicked",
        correlation_id = error.correlation_id(),
        error = %error,
        "request handler panicked"
    );
    twiml_response(StatusCode::OK, error.user_message())
}

fn twiml_response(status: StatusCode, message: &str) -> Response {
    (status, [(header::CONTENT_TYPE, "application/xml")], render_twiml(message)).into_response()
}

pub fn render_twiml(message: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n    <Message>{}</Message>\n</Response>",
        escape_xml(message)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

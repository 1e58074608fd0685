use axum::{
    routing::{get, post},
    Router,
};
use tokio::{sync::oneshot, task::JoinHandle};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, info};

use crate::health;
use crate::webhook::{self, WebhookState};

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route(webhook::INCOMING_PATH, post(webhook::incoming_message))
        .with_state(state)
        .layer(CatchPanicLayer::custom(webhook::panic_response))
}

/// Running listener plus the trigger that starts its graceful shutdown.
pub struct ServerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn shutdown(self) -> JoinHandle<()> {
        let _ = self.shutdown.send(());
        self.task
    }
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    state: WebhookState,
) -> std::io::Result<ServerHandle> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let (shutdown, signal) = oneshot::channel::<()>();

    info!(
        event_name = "system.http.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "http listener started"
    );

    let task = tokio::spawn(async move {
        let serve = axum::serve(listener, router(state)).with_graceful_shutdown(async move {
            let _ = signal.await;
        });
        if let Err(error) = serve.await {
            error!(
                event_name = "system.http.error",
                correlation_id = "bootstrap",
                error = %error,
                "http listener terminated unexpectedly"
            );
        }
    });

    Ok(ServerHandle { shutdown, task })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use autoventa_core::config::AppConfig;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    use crate::bootstrap::bootstrap_with_config;
    use crate::http::router;
    use crate::webhook::WebhookState;

    fn state() -> WebhookState {
        let app = bootstrap_with_config(AppConfig::default()).expect("bootstrap");
        WebhookState { orchestrator: app.orchestrator, system_prompt: Arc::from("prompt") }
    }

    #[tokio::test]
    async fn health_route_is_mounted() {
        let response = router(state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(payload["status"], "healthy");
    }

    #[tokio::test]
    async fn webhook_rejects_get() {
        let response = router(state())
            .oneshot(
                Request::builder()
                    .uri("/v1/webhook/twilio/incoming")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

use axum::{http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

pub const SERVICE_NAME: &str = "autoventa-server";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub checked_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub message: &'static str,
    pub version: &'static str,
    pub webhook: &'static str,
}

pub async fn health() -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        checked_at: Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(payload))
}

pub async fn root() -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor {
        message: "Autoventa conversation API",
        version: env!("CARGO_PKG_VERSION"),
        webhook: crate::webhook::INCOMING_PATH,
    })
}

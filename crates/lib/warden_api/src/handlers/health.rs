//! Liveness probe.

use axum::Json;

use crate::models::HealthResponse;

/// `GET /health` — process is up.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: warden_core::version().to_string(),
    })
}

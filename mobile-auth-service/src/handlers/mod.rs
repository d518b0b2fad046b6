//! HTTP handlers for the mobile auth service.

pub mod auth;
pub mod embed;
pub mod phone;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;

use crate::store::HealthCheck;
use crate::AppState;

/// Liveness/readiness probe. Degrades rather than fails when the store is
/// unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let store_ok = state.store_health.check().await;
    let status = if store_ok { "healthy" } else { "degraded" };
    let code = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(json!({
            "status": status,
            "service": state.config.service_name,
            "version": state.config.service_version,
        })),
    )
}

// Health and status endpoints
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;
use tracing::{error, warn};

use crate::server::response;
use crate::server::state::AppState;

fn disabled() -> Response {
    response::ok_with_message(
        json!({ "status": "disabled", "enabled": false, "connected": false }),
        "Search service is disabled",
    )
}

/// Engine connectivity. 503 when enabled but unreachable.
pub async fn health(State(state): State<AppState>) -> Response {
    if !state.engine.is_enabled() {
        return disabled();
    }

    if state.engine.ping().await {
        response::ok(json!({ "status": "healthy", "enabled": true, "connected": true }))
    } else {
        error!("Health check failed: search engine unreachable");
        response::error_with_data(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "status": "unhealthy", "enabled": true, "connected": false }),
            "Search engine is unreachable",
            "engine_unavailable",
        )
    }
}

/// Cluster health as reported by the engine.
pub async fn cluster_health(State(state): State<AppState>) -> Response {
    if !state.engine.is_enabled() {
        return disabled();
    }

    match state.engine.cluster_health().await {
        Ok(health) if health.is_healthy() => response::ok(health),
        Ok(health) => {
            warn!(cluster = %health.cluster_name, status = %health.status, "Cluster is degraded");
            let message = format!("Cluster status is {}", health.status);
            response::ok_with_message(health, message)
        }
        Err(e) => {
            error!(error = %e, "Cluster health check failed");
            response::error(
                StatusCode::SERVICE_UNAVAILABLE,
                e.to_string(),
                "engine_unavailable",
            )
        }
    }
}

/// `{enabled, connected}` snapshot.
pub async fn service_status(State(state): State<AppState>) -> Response {
    response::ok(state.engine.service_status().await)
}

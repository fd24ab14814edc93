use axum::{Json, Router, routing::get};
use serde::{Deserialize, Serialize};

use crate::app::AppContext;

/// Liveness status reported by `/health`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
}

/// Body of the health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
}

/// Liveness check. Does not touch the gateway or the store.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Ok,
    })
}

pub fn health_routes() -> Router<AppContext> {
    Router::new().route("/health", get(health_handler))
}

//! Health check endpoint handler.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of configured properties.
    pub properties: usize,
    pub loyalty_sync_enabled: bool,
}

/// Liveness check. Upstream APIs are not probed.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        properties: state.properties.len(),
        loyalty_sync_enabled: state.config.odoo.enabled,
    })
}

//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    /// Weather responses held across all endpoint caches
    pub cached_responses: u64,
}

/// Alerts need the database; weather advice does not, so a lost
/// connection only degrades the service.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(err) => {
            tracing::warn!("Health check could not reach the database: {}", err);
            "disconnected"
        }
    };

    Json(HealthResponse {
        status: if database == "connected" { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
        cached_responses: state.weather.cached_responses().await,
    })
}

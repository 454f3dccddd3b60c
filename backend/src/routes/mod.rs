//! Route definitions for the weather safety advisor

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/weather", weather_routes())
        .nest("/alerts", alert_routes())
}

/// Weather readings with hazards and equipment advice
fn weather_routes() -> Router<AppState> {
    Router::new()
        .route("/current", get(handlers::get_current_weather))
        .route("/hourly", get(handlers::get_hourly_forecast))
        .route("/forecast", get(handlers::get_daily_forecast))
        .route("/air-quality", get(handlers::get_air_quality))
}

/// Persisted hazard alerts
fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_alerts))
        .route("/evaluate", post(handlers::evaluate_alerts))
        .route("/:alert_id", get(handlers::get_alert))
        .route("/:alert_id/resolve", post(handlers::resolve_alert))
}

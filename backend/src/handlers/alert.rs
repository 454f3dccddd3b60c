//! HTTP handlers for alert endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{Alert, AlertStatus, Condition};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::weather::{resolve_location, WeatherQuery, WeatherResponse};
use crate::services::alert::{AlertFilter, AlertService, AlertSyncOutcome};
use crate::AppState;

/// Result of evaluating current conditions against stored alerts
#[derive(Debug, Serialize)]
pub struct AlertEvaluation {
    pub location_key: String,
    pub conditions: Vec<Condition>,
    /// Absent when the weather data was stale and alerts were left untouched
    pub sync: Option<AlertSyncOutcome>,
}

/// Evaluate current conditions for a location and update its alerts.
///
/// Stale weather data is reported but never used to open or clear alerts.
pub async fn evaluate_alerts(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> AppResult<Json<WeatherResponse<AlertEvaluation>>> {
    let location = resolve_location(&state, &query).await?;
    let report = state
        .weather
        .current_report(location.coordinates, query.tz.as_deref())
        .await?;

    let sync = if report.stale {
        tracing::warn!(
            "Skipping alert sync for {}: weather data is stale",
            report.location_key
        );
        None
    } else {
        let service = AlertService::new(state.db.clone());
        Some(
            service
                .sync_location(&report.location_key, &report.advisory.conditions)
                .await?,
        )
    };

    let evaluation = AlertEvaluation {
        location_key: report.location_key,
        conditions: report.advisory.conditions,
        sync,
    };
    Ok(Json(WeatherResponse::new(evaluation, location, report.stale)))
}

/// Query parameters for listing alerts
#[derive(Debug, Deserialize)]
pub struct AlertListQuery {
    pub status: Option<String>,
    pub location: Option<String>,
}

pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertListQuery>,
) -> AppResult<Json<Vec<Alert>>> {
    let status = query
        .status
        .as_deref()
        .map(AlertStatus::from_str)
        .transpose()
        .map_err(|e| AppError::validation("status", e))?;

    let service = AlertService::new(state.db);
    let alerts = service
        .list_alerts(AlertFilter {
            status,
            location_key: query.location,
        })
        .await?;
    Ok(Json(alerts))
}

pub async fn get_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
) -> AppResult<Json<Alert>> {
    let service = AlertService::new(state.db);
    let alert = service.get_alert(alert_id).await?;
    Ok(Json(alert))
}

/// Resolve an alert by hand; an already resolved alert is rejected
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
) -> AppResult<Json<Alert>> {
    let service = AlertService::new(state.db);
    let alert = service.resolve_alert(alert_id).await?;
    Ok(Json(alert))
}

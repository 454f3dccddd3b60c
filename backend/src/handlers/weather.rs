//! HTTP handlers for weather endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::GpsCoordinates;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::location::{LocationError, LocationSource, PositionFix, ResolvedLocation};
use crate::services::weather::{AirQualityReport, CurrentReport, DailyReport, HourlyReport};
use crate::AppState;

const DEFAULT_HOURS: u32 = 24;
const DEFAULT_DAYS: u32 = 7;

const PAIRED_COORDINATES: &str = "lat and lon must be given together";

/// Reported ages beyond a week are treated as a week
const MAX_REPORTED_AGE_SECS: u64 = 7 * 24 * 3600;

pub const STALE_NOTICE: &str =
    "Weather data may be out of date; the weather service is currently unavailable";

/// Query parameters shared by the weather endpoints.
///
/// Without `lat` and `lon` the configured default location is used.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct WeatherQuery {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub lat: Option<f64>,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub lon: Option<f64>,

    /// Seconds since the client acquired the position
    pub position_age_secs: Option<u64>,

    /// IANA timezone for the current reading
    pub tz: Option<String>,

    #[validate(range(min = 1, max = 168, message = "hours must be between 1 and 168"))]
    pub hours: Option<u32>,

    #[validate(range(min = 1, max = 16, message = "days must be between 1 and 16"))]
    pub days: Option<u32>,
}

fn to_decimal(field: &str, value: f64) -> AppResult<Decimal> {
    Decimal::try_from(value)
        .map_err(|_| AppError::validation(field, format!("{} is not a number", field)))
}

impl WeatherQuery {
    fn position(&self) -> AppResult<Result<PositionFix, LocationError>> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => {
                let coordinates =
                    GpsCoordinates::new(to_decimal("lat", lat)?, to_decimal("lon", lon)?);
                let age = self.position_age_secs.unwrap_or(0).min(MAX_REPORTED_AGE_SECS);
                Ok(Ok(PositionFix {
                    coordinates,
                    acquired_at: Utc::now() - chrono::Duration::seconds(age as i64),
                }))
            }
            (None, None) => Ok(Err(LocationError::NotProvided)),
            (None, Some(_)) => Err(AppError::validation("lat", PAIRED_COORDINATES)),
            (Some(_), None) => Err(AppError::validation("lon", PAIRED_COORDINATES)),
        }
    }
}

/// Validate the query and settle on a location
pub async fn resolve_location(
    state: &AppState,
    query: &WeatherQuery,
) -> AppResult<ResolvedLocation> {
    query.validate()?;
    let position = query.position()?;
    Ok(state.location.acquire(async move { position }).await)
}

/// A report plus where its location came from and anything the user should know
#[derive(Debug, Serialize)]
pub struct WeatherResponse<T> {
    #[serde(flatten)]
    pub report: T,
    pub location_source: LocationSource,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
}

impl<T> WeatherResponse<T> {
    pub fn new(report: T, location: ResolvedLocation, stale: bool) -> Self {
        let mut notices: Vec<String> = location.notice.into_iter().collect();
        if stale {
            notices.push(STALE_NOTICE.to_string());
        }
        Self {
            report,
            location_source: location.source,
            notices,
        }
    }
}

/// Current conditions with hazards and equipment
pub async fn get_current_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> AppResult<Json<WeatherResponse<CurrentReport>>> {
    let location = resolve_location(&state, &query).await?;
    let report = state
        .weather
        .current_report(location.coordinates, query.tz.as_deref())
        .await?;
    let stale = report.stale;
    Ok(Json(WeatherResponse::new(report, location, stale)))
}

/// Hourly forecast, 24 hours unless `hours` says otherwise
pub async fn get_hourly_forecast(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> AppResult<Json<WeatherResponse<HourlyReport>>> {
    let location = resolve_location(&state, &query).await?;
    let report = state
        .weather
        .hourly_report(location.coordinates, query.hours.unwrap_or(DEFAULT_HOURS))
        .await?;
    let stale = report.stale;
    Ok(Json(WeatherResponse::new(report, location, stale)))
}

/// Daily forecast, seven days unless `days` says otherwise
pub async fn get_daily_forecast(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> AppResult<Json<WeatherResponse<DailyReport>>> {
    let location = resolve_location(&state, &query).await?;
    let report = state
        .weather
        .daily_report(location.coordinates, query.days.unwrap_or(DEFAULT_DAYS))
        .await?;
    let stale = report.stale;
    Ok(Json(WeatherResponse::new(report, location, stale)))
}

pub async fn get_air_quality(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> AppResult<Json<WeatherResponse<AirQualityReport>>> {
    let location = resolve_location(&state, &query).await?;
    let report = state.weather.air_quality_report(location.coordinates).await?;
    let stale = report.stale;
    Ok(Json(WeatherResponse::new(report, location, stale)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_query_fails_validation() {
        let query = WeatherQuery {
            lat: Some(91.0),
            lon: Some(0.0),
            ..Default::default()
        };
        let err = AppError::from(query.validate().unwrap_err());
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "lat"));

        let query = WeatherQuery {
            hours: Some(0),
            ..Default::default()
        };
        assert!(query.validate().is_err());

        let query = WeatherQuery {
            days: Some(17),
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_half_a_coordinate_is_rejected() {
        let query = WeatherQuery {
            lat: Some(18.0),
            ..Default::default()
        };
        assert!(query.position().is_err());
    }

    #[test]
    fn test_no_coordinates_means_not_provided() {
        let query = WeatherQuery::default();
        assert_eq!(query.position().unwrap(), Err(LocationError::NotProvided));
    }

    #[test]
    fn test_stale_adds_notice() {
        let location = ResolvedLocation {
            coordinates: GpsCoordinates::new(Decimal::from(18), Decimal::from(98)),
            source: LocationSource::Default,
            notice: Some("default location".to_string()),
        };
        let response = WeatherResponse::new((), location, true);
        assert_eq!(response.notices.len(), 2);
        assert_eq!(response.notices[1], STALE_NOTICE);
    }
}

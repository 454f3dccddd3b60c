//! Weather API client for fetching weather data
//!
//! Integrates with Open-Meteo for current conditions, hourly and daily
//! forecasts, and air quality. No API key is needed.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared::{AirQuality, DailyReading, GpsCoordinates, HourlyReading, Reading};
use thiserror::Error;

use crate::config::WeatherConfig;

/// Failure talking to the weather provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Weather API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Weather API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse weather response: {0}")]
    Decode(String),
}

/// Source of raw weather readings
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(
        &self,
        location: GpsCoordinates,
        timezone: &str,
    ) -> Result<Reading, ProviderError>;

    /// The next `hours` hourly entries, timestamps in UTC
    async fn hourly(
        &self,
        location: GpsCoordinates,
        hours: u32,
    ) -> Result<Vec<HourlyReading>, ProviderError>;

    /// The next `days` daily rollups, day boundaries in `timezone`
    async fn daily(
        &self,
        location: GpsCoordinates,
        days: u32,
        timezone: &str,
    ) -> Result<Vec<DailyReading>, ProviderError>;

    async fn air_quality(&self, location: GpsCoordinates) -> Result<AirQuality, ProviderError>;
}

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,\
precipitation,weather_code,wind_speed_10m,wind_gusts_10m,visibility,uv_index,is_day";
const HOURLY_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,\
precipitation,weather_code,wind_speed_10m,wind_gusts_10m,visibility,uv_index,is_day";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,\
wind_speed_10m_max,precipitation_sum,uv_index_max";
const AIR_QUALITY_FIELDS: &str = "us_aqi,european_aqi,pm2_5,pm10";

/// Open-Meteo API client
#[derive(Clone)]
pub struct OpenMeteoClient {
    client: Client,
    forecast_url: String,
    air_quality_url: String,
}

/// Open-Meteo response carrying a `current` block
#[derive(Debug, Deserialize)]
struct OMCurrentResponse<T> {
    current: T,
}

#[derive(Debug, Deserialize)]
struct OMCurrent {
    temperature_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    relative_humidity_2m: Option<f64>,
    precipitation: Option<f64>,
    weather_code: Option<i32>,
    wind_speed_10m: Option<f64>,
    wind_gusts_10m: Option<f64>,
    /// Metres
    visibility: Option<f64>,
    uv_index: Option<f64>,
    is_day: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OMAirQuality {
    us_aqi: Option<f64>,
    european_aqi: Option<f64>,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OMHourlyResponse {
    hourly: OMHourly,
}

/// Column-oriented hourly series; any column may be missing
#[derive(Debug, Deserialize)]
struct OMHourly {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    apparent_temperature: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    wind_gusts_10m: Vec<Option<f64>>,
    #[serde(default)]
    visibility: Vec<Option<f64>>,
    #[serde(default)]
    uv_index: Vec<Option<f64>>,
    #[serde(default)]
    is_day: Vec<Option<u8>>,
}

#[derive(Debug, Deserialize)]
struct OMDailyResponse {
    daily: OMDaily,
}

#[derive(Debug, Deserialize)]
struct OMDaily {
    time: Vec<String>,
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    uv_index_max: Vec<Option<f64>>,
}

fn column<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}

fn metres_to_km(metres: Option<f64>) -> Option<f64> {
    metres.map(|m| m / 1000.0)
}

impl OpenMeteoClient {
    /// Create a new client from the weather configuration
    pub fn new(config: &WeatherConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            forecast_url: config.forecast_endpoint.clone(),
            air_quality_url: config.air_quality_endpoint.clone(),
        })
    }

    /// Create a client against custom endpoints (for testing)
    pub fn with_base_urls(forecast_url: String, air_quality_url: String) -> Self {
        Self {
            client: Client::new(),
            forecast_url,
            air_quality_url,
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let response = self.client.get(url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }

    fn location_query(location: GpsCoordinates) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", location.latitude.normalize().to_string()),
            ("longitude", location.longitude.normalize().to_string()),
            ("wind_speed_unit", "kmh".to_string()),
        ]
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn current(
        &self,
        location: GpsCoordinates,
        timezone: &str,
    ) -> Result<Reading, ProviderError> {
        let mut query = Self::location_query(location);
        query.push(("current", CURRENT_FIELDS.to_string()));
        query.push(("timezone", timezone.to_string()));

        let data: OMCurrentResponse<OMCurrent> = self.fetch(&self.forecast_url, &query).await?;
        Ok(convert_current(data.current))
    }

    async fn hourly(
        &self,
        location: GpsCoordinates,
        hours: u32,
    ) -> Result<Vec<HourlyReading>, ProviderError> {
        let mut query = Self::location_query(location);
        query.push(("hourly", HOURLY_FIELDS.to_string()));
        query.push(("forecast_hours", hours.to_string()));
        query.push(("timezone", "GMT".to_string()));

        let data: OMHourlyResponse = self.fetch(&self.forecast_url, &query).await?;
        convert_hourly(data.hourly)
    }

    async fn daily(
        &self,
        location: GpsCoordinates,
        days: u32,
        timezone: &str,
    ) -> Result<Vec<DailyReading>, ProviderError> {
        let mut query = Self::location_query(location);
        query.push(("daily", DAILY_FIELDS.to_string()));
        query.push(("forecast_days", days.to_string()));
        query.push(("timezone", timezone.to_string()));

        let data: OMDailyResponse = self.fetch(&self.forecast_url, &query).await?;
        convert_daily(data.daily)
    }

    async fn air_quality(&self, location: GpsCoordinates) -> Result<AirQuality, ProviderError> {
        let query = vec![
            ("latitude", location.latitude.normalize().to_string()),
            ("longitude", location.longitude.normalize().to_string()),
            ("current", AIR_QUALITY_FIELDS.to_string()),
        ];

        let data: OMCurrentResponse<OMAirQuality> =
            self.fetch(&self.air_quality_url, &query).await?;
        Ok(AirQuality {
            us_aqi: data.current.us_aqi,
            european_aqi: data.current.european_aqi,
            pm2_5: data.current.pm2_5,
            pm10: data.current.pm10,
        })
    }
}

/// Convert an Open-Meteo current block to our format
fn convert_current(data: OMCurrent) -> Reading {
    Reading {
        temperature_celsius: data.temperature_2m,
        apparent_temperature_celsius: data.apparent_temperature,
        wind_speed_kmh: data.wind_speed_10m,
        wind_gusts_kmh: data.wind_gusts_10m,
        precipitation_mm: data.precipitation,
        humidity_percent: data.relative_humidity_2m,
        visibility_km: metres_to_km(data.visibility),
        uv_index: data.uv_index,
        weather_code: data.weather_code,
        is_day: data.is_day.map(|d| d == 1),
        air_quality: AirQuality::default(),
    }
}

/// Convert Open-Meteo hourly columns to one reading per hour
fn convert_hourly(data: OMHourly) -> Result<Vec<HourlyReading>, ProviderError> {
    data.time
        .iter()
        .enumerate()
        .map(|(i, time)| {
            let timestamp = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
                .map_err(|e| ProviderError::Decode(format!("Bad hourly time {}: {}", time, e)))?
                .and_utc();

            Ok(HourlyReading {
                timestamp,
                reading: Reading {
                    temperature_celsius: column(&data.temperature_2m, i),
                    apparent_temperature_celsius: column(&data.apparent_temperature, i),
                    wind_speed_kmh: column(&data.wind_speed_10m, i),
                    wind_gusts_kmh: column(&data.wind_gusts_10m, i),
                    precipitation_mm: column(&data.precipitation, i),
                    humidity_percent: column(&data.relative_humidity_2m, i),
                    visibility_km: metres_to_km(column(&data.visibility, i)),
                    uv_index: column(&data.uv_index, i),
                    weather_code: column(&data.weather_code, i),
                    is_day: column(&data.is_day, i).map(|d| d == 1),
                    air_quality: AirQuality::default(),
                },
            })
        })
        .collect()
}

/// Convert Open-Meteo daily columns to one rollup per day
fn convert_daily(data: OMDaily) -> Result<Vec<DailyReading>, ProviderError> {
    data.time
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| ProviderError::Decode(format!("Bad daily date {}: {}", date, e)))?;

            Ok(DailyReading {
                date,
                weather_code: column(&data.weather_code, i),
                temperature_max_celsius: column(&data.temperature_2m_max, i),
                temperature_min_celsius: column(&data.temperature_2m_min, i),
                wind_speed_max_kmh: column(&data.wind_speed_10m_max, i),
                precipitation_sum_mm: column(&data.precipitation_sum, i),
                uv_index_max: column(&data.uv_index_max, i),
            })
        })
        .collect()
}

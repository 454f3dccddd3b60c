//! Weather reading models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::GpsCoordinates;

/// Air-quality values attached to a reading
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AirQuality {
    pub us_aqi: Option<f64>,
    pub european_aqi: Option<f64>,
    /// PM2.5 in µg/m³
    pub pm2_5: Option<f64>,
    /// PM10 in µg/m³
    pub pm10: Option<f64>,
}

impl AirQuality {
    pub fn is_empty(&self) -> bool {
        self.us_aqi.is_none()
            && self.european_aqi.is_none()
            && self.pm2_5.is_none()
            && self.pm10.is_none()
    }
}

/// Weather at a single point in time. Every metric may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    pub temperature_celsius: Option<f64>,
    pub apparent_temperature_celsius: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_gusts_kmh: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub humidity_percent: Option<f64>,
    pub visibility_km: Option<f64>,
    pub uv_index: Option<f64>,
    /// WMO weather interpretation code
    pub weather_code: Option<i32>,
    pub is_day: Option<bool>,
    #[serde(default)]
    pub air_quality: AirQuality,
}

/// One entry of the hourly forecast
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HourlyReading {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub reading: Reading,
}

/// One entry of the daily forecast
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyReading {
    pub date: NaiveDate,
    pub weather_code: Option<i32>,
    pub temperature_max_celsius: Option<f64>,
    pub temperature_min_celsius: Option<f64>,
    pub wind_speed_max_kmh: Option<f64>,
    pub precipitation_sum_mm: Option<f64>,
    pub uv_index_max: Option<f64>,
}

impl DailyReading {
    /// A day with nothing but its date filled in
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            weather_code: None,
            temperature_max_celsius: None,
            temperature_min_celsius: None,
            wind_speed_max_kmh: None,
            precipitation_sum_mm: None,
            uv_index_max: None,
        }
    }
}

/// Snapshot of everything known about the weather at one coordinate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingSet {
    pub location: GpsCoordinates,
    pub current: Option<Reading>,
    #[serde(default)]
    pub hourly: Vec<HourlyReading>,
    #[serde(default)]
    pub daily: Vec<DailyReading>,
    /// Served from cache past its freshness window because the provider failed
    #[serde(default)]
    pub stale: bool,
}

impl ReadingSet {
    pub fn new(location: GpsCoordinates) -> Self {
        Self {
            location,
            current: None,
            hourly: Vec::new(),
            daily: Vec::new(),
            stale: false,
        }
    }

    pub fn with_current(mut self, reading: Reading) -> Self {
        self.current = Some(reading);
        self
    }

    pub fn with_hourly(mut self, hourly: Vec<HourlyReading>) -> Self {
        self.hourly = hourly;
        self
    }

    pub fn with_daily(mut self, daily: Vec<DailyReading>) -> Self {
        self.daily = daily;
        self
    }

    pub fn hour(&self, index: usize) -> Option<&HourlyReading> {
        self.hourly.get(index)
    }

    pub fn day(&self, index: usize) -> Option<&DailyReading> {
        self.daily.get(index)
    }
}

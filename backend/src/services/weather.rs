//! Weather service: fetch through the freshness cache, then classify and advise

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    advise, classify_air_quality, classify_uv, describe_optional_weather_code,
    normalize_reading_set, sanitize_index_value, Advisory, AirQuality, AqiClassification,
    DailyReading, GpsCoordinates, Horizon, HourlyReading, Reading, ReadingSet, UvClassification,
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CacheConfig, WeatherConfig};
use crate::error::AppResult;
use crate::external::WeatherProvider;
use crate::services::cache::{cache_key, Cached, FreshnessCache};

/// Current conditions with bands and equipment
#[derive(Debug, Clone, Serialize)]
pub struct CurrentReport {
    pub location: GpsCoordinates,
    pub location_key: String,
    pub reading: Reading,
    pub description: &'static str,
    pub air_quality: AqiClassification,
    pub uv: UvClassification,
    #[serde(flatten)]
    pub advisory: Advisory,
    pub stale: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourlyEntry {
    #[serde(flatten)]
    pub hour: HourlyReading,
    pub description: &'static str,
    pub uv: UvClassification,
    #[serde(flatten)]
    pub advisory: Advisory,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourlyReport {
    pub location: GpsCoordinates,
    pub location_key: String,
    pub hours: Vec<HourlyEntry>,
    pub stale: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyEntry {
    #[serde(flatten)]
    pub day: DailyReading,
    pub description: &'static str,
    pub uv: UvClassification,
    #[serde(flatten)]
    pub advisory: Advisory,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub location: GpsCoordinates,
    pub location_key: String,
    pub days: Vec<DailyEntry>,
    pub stale: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AirQualityReport {
    pub location: GpsCoordinates,
    pub location_key: String,
    pub air_quality: AirQuality,
    pub classification: AqiClassification,
    pub stale: bool,
    pub fetched_at: DateTime<Utc>,
}

/// Weather service shared by all handlers
#[derive(Clone)]
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    current: FreshnessCache<Reading>,
    hourly: FreshnessCache<Vec<HourlyReading>>,
    daily: FreshnessCache<Vec<DailyReading>>,
    air_quality: FreshnessCache<AirQuality>,
    ttl: CacheConfig,
    timezone: String,
}

fn location_params(location: GpsCoordinates) -> Vec<(&'static str, String)> {
    vec![
        ("lat", location.latitude.normalize().to_string()),
        ("lon", location.longitude.normalize().to_string()),
    ]
}

/// Enforce reading-set invariants before any rule sees the data
fn normalize(set: &mut ReadingSet) {
    let dropped = normalize_reading_set(set);
    if dropped > 0 {
        tracing::warn!(
            "Dropped {} invalid values from provider data for {}",
            dropped,
            set.location.location_key()
        );
    }
}

fn sanitize_air_quality(mut air_quality: AirQuality) -> AirQuality {
    air_quality.us_aqi = sanitize_index_value(air_quality.us_aqi);
    air_quality.european_aqi = sanitize_index_value(air_quality.european_aqi);
    air_quality
}

impl WeatherService {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        weather: &WeatherConfig,
        cache: &CacheConfig,
    ) -> Self {
        Self {
            provider,
            current: FreshnessCache::new(cache.max_entries),
            hourly: FreshnessCache::new(cache.max_entries),
            daily: FreshnessCache::new(cache.max_entries),
            air_quality: FreshnessCache::new(cache.max_entries),
            ttl: cache.clone(),
            timezone: weather.timezone.clone(),
        }
    }

    async fn fetch_current(
        &self,
        location: GpsCoordinates,
        timezone: &str,
    ) -> AppResult<Cached<Reading>> {
        let mut params = location_params(location);
        params.push(("tz", timezone.to_string()));
        let key = cache_key("current", params);

        let cached = self
            .current
            .get_or_fetch(&key, Duration::from_secs(self.ttl.current_ttl_secs), || {
                self.provider.current(location, timezone)
            })
            .await?;
        Ok(cached)
    }

    async fn fetch_air_quality(&self, location: GpsCoordinates) -> AppResult<Cached<AirQuality>> {
        let key = cache_key("air_quality", location_params(location));

        let cached = self
            .air_quality
            .get_or_fetch(
                &key,
                Duration::from_secs(self.ttl.air_quality_ttl_secs),
                || self.provider.air_quality(location),
            )
            .await?;
        Ok(cached)
    }

    /// Current conditions, air quality included when available
    pub async fn current_report(
        &self,
        location: GpsCoordinates,
        timezone: Option<&str>,
    ) -> AppResult<CurrentReport> {
        let timezone = timezone.unwrap_or(&self.timezone);
        let current = self.fetch_current(location, timezone).await?;

        // Missing air quality only disables the air-quality rule
        let air_quality = match self.fetch_air_quality(location).await {
            Ok(cached) => Some(cached),
            Err(err) => {
                tracing::warn!(
                    "Air quality unavailable for {}: {}",
                    location.location_key(),
                    err
                );
                None
            }
        };

        let mut reading = current.value;
        let mut stale = current.stale;
        if let Some(cached) = air_quality {
            reading.air_quality = cached.value;
            stale |= cached.stale;
        }

        let mut set = ReadingSet::new(location).with_current(reading);
        set.stale = stale;
        normalize(&mut set);

        let advisory = advise(&set, Horizon::Current);
        let reading = set.current.unwrap_or_default();

        Ok(CurrentReport {
            location,
            location_key: location.location_key(),
            description: describe_optional_weather_code(reading.weather_code),
            air_quality: classify_air_quality(&reading.air_quality),
            uv: classify_uv(reading.uv_index),
            reading,
            advisory,
            stale,
            fetched_at: current.fetched_at,
        })
    }

    /// The next `hours` hours, each with its own advisory
    pub async fn hourly_report(
        &self,
        location: GpsCoordinates,
        hours: u32,
    ) -> AppResult<HourlyReport> {
        let mut params = location_params(location);
        params.push(("hours", hours.to_string()));
        let key = cache_key("hourly", params);

        let cached = self
            .hourly
            .get_or_fetch(&key, Duration::from_secs(self.ttl.hourly_ttl_secs), || {
                self.provider.hourly(location, hours)
            })
            .await?;

        let mut set = ReadingSet::new(location).with_hourly(cached.value);
        set.stale = cached.stale;
        normalize(&mut set);

        let entries = set
            .hourly
            .iter()
            .enumerate()
            .map(|(i, hour)| HourlyEntry {
                description: describe_optional_weather_code(hour.reading.weather_code),
                uv: classify_uv(hour.reading.uv_index),
                advisory: advise(&set, Horizon::Hour(i)),
                hour: hour.clone(),
            })
            .collect();

        Ok(HourlyReport {
            location,
            location_key: location.location_key(),
            hours: entries,
            stale: set.stale,
            fetched_at: cached.fetched_at,
        })
    }

    /// The next `days` days, each with its own advisory
    pub async fn daily_report(
        &self,
        location: GpsCoordinates,
        days: u32,
    ) -> AppResult<DailyReport> {
        let timezone = self.timezone.as_str();
        let mut params = location_params(location);
        params.push(("days", days.to_string()));
        params.push(("tz", timezone.to_string()));
        let key = cache_key("daily", params);

        let cached = self
            .daily
            .get_or_fetch(&key, Duration::from_secs(self.ttl.daily_ttl_secs), || {
                self.provider.daily(location, days, timezone)
            })
            .await?;

        let mut set = ReadingSet::new(location).with_daily(cached.value);
        set.stale = cached.stale;
        normalize(&mut set);

        let entries = set
            .daily
            .iter()
            .enumerate()
            .map(|(i, day)| DailyEntry {
                description: describe_optional_weather_code(day.weather_code),
                uv: classify_uv(day.uv_index_max),
                advisory: advise(&set, Horizon::Day(i)),
                day: day.clone(),
            })
            .collect();

        Ok(DailyReport {
            location,
            location_key: location.location_key(),
            days: entries,
            stale: set.stale,
            fetched_at: cached.fetched_at,
        })
    }

    pub async fn cached_responses(&self) -> u64 {
        self.current.entry_count().await
            + self.hourly.entry_count().await
            + self.daily.entry_count().await
            + self.air_quality.entry_count().await
    }

    pub async fn air_quality_report(
        &self,
        location: GpsCoordinates,
    ) -> AppResult<AirQualityReport> {
        let cached = self.fetch_air_quality(location).await?;
        let air_quality = sanitize_air_quality(cached.value);

        Ok(AirQualityReport {
            location,
            location_key: location.location_key(),
            classification: classify_air_quality(&air_quality),
            air_quality,
            stale: cached.stale,
            fetched_at: cached.fetched_at,
        })
    }
}

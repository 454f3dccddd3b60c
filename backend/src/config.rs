//! Configuration management for the weather safety advisor
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with WSA_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::GpsCoordinates;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Weather provider configuration
    pub weather: WeatherConfig,

    /// Freshness cache configuration
    pub cache: CacheConfig,

    /// Geolocation fallback configuration
    pub location: LocationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WeatherConfig {
    /// Forecast API endpoint
    pub forecast_endpoint: String,

    /// Air quality API endpoint
    pub air_quality_endpoint: String,

    /// Used when a request carries no usable position
    pub default_latitude: Decimal,
    pub default_longitude: Decimal,

    /// IANA zone for daily rollups, or "auto"
    pub timezone: String,

    /// Upstream request timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    pub current_ttl_secs: u64,
    pub hourly_ttl_secs: u64,
    pub daily_ttl_secs: u64,
    pub air_quality_ttl_secs: u64,

    /// Upper bound on entries per endpoint cache
    pub max_entries: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LocationConfig {
    /// How long to wait for a position fix
    pub acquire_timeout_ms: u64,

    /// Oldest position fix that is still accepted
    pub max_position_age_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("WSA_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .add_source(config::Config::try_from(&Config::default())?)
            .set_override("environment", environment.clone())?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (WSA_ prefix)
            .add_source(
                Environment::with_prefix("WSA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl WeatherConfig {
    pub fn default_location(&self) -> GpsCoordinates {
        GpsCoordinates::new(self.default_latitude, self.default_longitude)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl LocationConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn max_position_age(&self) -> Duration {
        Duration::from_secs(self.max_position_age_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/weather_safety".to_string(),
            max_connections: 10,
            min_connections: 2,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            forecast_endpoint: "https://api.open-meteo.com/v1/forecast".to_string(),
            air_quality_endpoint: "https://air-quality-api.open-meteo.com/v1/air-quality"
                .to_string(),
            // Chiang Mai
            default_latitude: Decimal::new(187883, 4),
            default_longitude: Decimal::new(989853, 4),
            timezone: "auto".to_string(),
            request_timeout_secs: 15,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            current_ttl_secs: 600,
            hourly_ttl_secs: 600,
            daily_ttl_secs: 3 * 3600,
            air_quality_ttl_secs: 600,
            max_entries: 1_000,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            acquire_timeout_ms: 10_000,
            max_position_age_secs: 600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.cache.daily_ttl_secs, 10_800);
        assert_eq!(config.location.acquire_timeout(), Duration::from_secs(10));
        assert_eq!(config.location.max_position_age(), Duration::from_secs(600));
        assert_eq!(
            config.weather.default_location().location_key(),
            "18.79,98.99"
        );
    }
}

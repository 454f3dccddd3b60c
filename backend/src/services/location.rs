//! Location resolution with fallback to the configured site
//!
//! Acquiring a position either yields a fix or does not. Failing to get one
//! is never an error: the default coordinate is used instead, with a notice
//! the client can show.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::GpsCoordinates;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::config::LocationConfig;

/// A position reported by the client
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub coordinates: GpsCoordinates,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("No position provided")]
    NotProvided,

    #[error("Position unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Device,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub coordinates: GpsCoordinates,
    pub source: LocationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    default: GpsCoordinates,
    acquire_timeout: Duration,
    max_age: Duration,
}

impl LocationResolver {
    pub fn new(config: &LocationConfig, default: GpsCoordinates) -> Self {
        Self {
            default,
            acquire_timeout: config.acquire_timeout(),
            max_age: config.max_position_age(),
        }
    }

    pub fn default_location(&self) -> ResolvedLocation {
        ResolvedLocation {
            coordinates: self.default,
            source: LocationSource::Default,
            notice: None,
        }
    }

    /// Wait for a position fix, bounded by the acquire timeout.
    ///
    /// Fixes older than the maximum position age are rejected.
    pub async fn acquire<F>(&self, source: F) -> ResolvedLocation
    where
        F: Future<Output = Result<PositionFix, LocationError>>,
    {
        let outcome = match tokio::time::timeout(self.acquire_timeout, source).await {
            Ok(outcome) => outcome,
            Err(_) => Err(LocationError::Unavailable(format!(
                "no fix within {} ms",
                self.acquire_timeout.as_millis()
            ))),
        };

        match outcome {
            Ok(fix) => self.accept(fix),
            Err(LocationError::NotProvided) => self.default_location(),
            Err(err) => self.fall_back(&err.to_string()),
        }
    }

    fn accept(&self, fix: PositionFix) -> ResolvedLocation {
        let age = Utc::now()
            .signed_duration_since(fix.acquired_at)
            .to_std()
            .unwrap_or_default();

        if age > self.max_age {
            return self.fall_back(&format!("position is {} s old", age.as_secs()));
        }

        ResolvedLocation {
            coordinates: fix.coordinates,
            source: LocationSource::Device,
            notice: None,
        }
    }

    fn fall_back(&self, reason: &str) -> ResolvedLocation {
        tracing::warn!("Using default location: {}", reason);
        ResolvedLocation {
            notice: Some(format!(
                "Showing weather for the default location ({})",
                reason
            )),
            ..self.default_location()
        }
    }
}

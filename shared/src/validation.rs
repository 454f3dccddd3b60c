//! Validation utilities for weather readings
//!
//! Provider data is normalized before it reaches the rule engine: bad index
//! values become absent and forecast series are put in strict time order.

use rust_decimal::Decimal;

use crate::models::{AirQuality, Reading, ReadingSet};

// ============================================================================
// Metric Validations
// ============================================================================

/// AQI and UV values must be absent or finite and non-negative
pub fn validate_index_value(value: Option<f64>) -> Result<(), &'static str> {
    match value {
        Some(v) if !v.is_finite() => Err("Index value must be a finite number"),
        Some(v) if v < 0.0 => Err("Index value cannot be negative"),
        _ => Ok(()),
    }
}

/// Drop an index value that breaks [`validate_index_value`]
pub fn sanitize_index_value(value: Option<f64>) -> Option<f64> {
    value.filter(|v| validate_index_value(Some(*v)).is_ok())
}

fn validate_air_quality(air_quality: &AirQuality) -> Result<(), &'static str> {
    validate_index_value(air_quality.us_aqi)?;
    validate_index_value(air_quality.european_aqi)?;
    Ok(())
}

fn validate_reading(reading: &Reading) -> Result<(), &'static str> {
    validate_index_value(reading.uv_index)?;
    validate_air_quality(&reading.air_quality)
}

/// Clean up a reading in place. Returns the number of values dropped.
pub fn sanitize_reading(reading: &mut Reading) -> usize {
    let mut dropped = 0;
    for value in [
        &mut reading.uv_index,
        &mut reading.air_quality.us_aqi,
        &mut reading.air_quality.european_aqi,
    ] {
        let clean = sanitize_index_value(*value);
        if clean != *value {
            dropped += 1;
            *value = clean;
        }
    }
    dropped
}

// ============================================================================
// Reading Set Validations
// ============================================================================

/// Check every invariant of a reading set
pub fn validate_reading_set(set: &ReadingSet) -> Result<(), &'static str> {
    validate_coordinates(set.location.latitude, set.location.longitude)?;

    if let Some(current) = &set.current {
        validate_reading(current)?;
    }

    for hour in &set.hourly {
        validate_reading(&hour.reading)?;
    }
    if set
        .hourly
        .windows(2)
        .any(|w| w[0].timestamp >= w[1].timestamp)
    {
        return Err("Hourly readings must be in strictly ascending time order");
    }

    for day in &set.daily {
        validate_index_value(day.uv_index_max)?;
    }
    if set.daily.windows(2).any(|w| w[0].date >= w[1].date) {
        return Err("Daily readings must be in strictly ascending date order");
    }

    Ok(())
}

/// Bring a reading set in line with its invariants.
///
/// Bad index values are dropped; hourly and daily series are sorted and
/// duplicates removed, keeping the first entry for a timestamp or date.
/// Returns the number of values and entries dropped.
pub fn normalize_reading_set(set: &mut ReadingSet) -> usize {
    let mut dropped = 0;

    if let Some(current) = set.current.as_mut() {
        dropped += sanitize_reading(current);
    }
    for hour in set.hourly.iter_mut() {
        dropped += sanitize_reading(&mut hour.reading);
    }
    for day in set.daily.iter_mut() {
        let clean = sanitize_index_value(day.uv_index_max);
        if clean != day.uv_index_max {
            dropped += 1;
            day.uv_index_max = clean;
        }
    }

    let before = set.hourly.len() + set.daily.len();
    set.hourly.sort_by_key(|h| h.timestamp);
    set.hourly.dedup_by_key(|h| h.timestamp);
    set.daily.sort_by_key(|d| d.date);
    set.daily.dedup_by_key(|d| d.date);
    dropped += before - (set.hourly.len() + set.daily.len());

    dropped
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate latitude and longitude ranges
pub fn validate_coordinates(latitude: Decimal, longitude: Decimal) -> Result<(), &'static str> {
    if latitude < Decimal::from(-90) || latitude > Decimal::from(90) {
        return Err("Latitude must be between -90 and 90");
    }
    if longitude < Decimal::from(-180) || longitude > Decimal::from(180) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyReading, HourlyReading};
    use crate::types::GpsCoordinates;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn location() -> GpsCoordinates {
        GpsCoordinates::new(Decimal::from(18), Decimal::from(98))
    }

    fn hour(h: u32) -> HourlyReading {
        HourlyReading {
            timestamp: Utc.with_ymd_and_hms(2026, 10, 19, h, 0, 0).unwrap(),
            reading: Reading::default(),
        }
    }

    fn day(d: u32) -> DailyReading {
        DailyReading::empty(NaiveDate::from_ymd_opt(2026, 10, d).unwrap())
    }

    #[test]
    fn test_index_value_validation() {
        assert!(validate_index_value(None).is_ok());
        assert!(validate_index_value(Some(0.0)).is_ok());
        assert!(validate_index_value(Some(42.5)).is_ok());
        assert!(validate_index_value(Some(-1.0)).is_err());
        assert!(validate_index_value(Some(f64::NAN)).is_err());
        assert!(validate_index_value(Some(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_sanitize_reading_drops_bad_values() {
        let mut reading = Reading {
            uv_index: Some(-2.0),
            ..Default::default()
        };
        reading.air_quality.us_aqi = Some(f64::NAN);
        reading.air_quality.european_aqi = Some(30.0);

        assert_eq!(sanitize_reading(&mut reading), 2);
        assert_eq!(reading.uv_index, None);
        assert_eq!(reading.air_quality.us_aqi, None);
        assert_eq!(reading.air_quality.european_aqi, Some(30.0));
    }

    #[test]
    fn test_unordered_hourly_is_invalid() {
        let set = ReadingSet::new(location()).with_hourly(vec![hour(3), hour(1)]);
        assert!(validate_reading_set(&set).is_err());
    }

    #[test]
    fn test_duplicate_days_are_invalid() {
        let set = ReadingSet::new(location()).with_daily(vec![day(19), day(19)]);
        assert!(validate_reading_set(&set).is_err());
    }

    #[test]
    fn test_normalize_sorts_and_dedups() {
        let mut set = ReadingSet::new(location())
            .with_hourly(vec![hour(5), hour(2), hour(5), hour(3)])
            .with_daily(vec![day(21), day(20), day(21)]);

        let dropped = normalize_reading_set(&mut set);

        assert_eq!(dropped, 2);
        assert!(validate_reading_set(&set).is_ok());
        assert_eq!(set.hourly.len(), 3);
        assert_eq!(set.daily.len(), 2);
    }

    #[test]
    fn test_coordinate_ranges() {
        assert!(validate_coordinates(Decimal::from(18), Decimal::from(98)).is_ok());
        assert!(validate_coordinates(Decimal::from(91), Decimal::from(0)).is_err());
        assert!(validate_coordinates(Decimal::from(0), Decimal::from(-181)).is_err());
    }
}

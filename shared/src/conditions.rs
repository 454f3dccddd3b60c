//! Hazard rule evaluation
//!
//! Each rule looks at one or two metrics and fires independently of the
//! others. The same rule bodies serve every horizon; only the threshold
//! table and the field mapping change between current readings, hourly
//! forecasts and daily rollups.

use crate::classify::describe_weather_code;
use crate::models::{
    Condition, ConditionKind, DailyReading, HourlyReading, Reading, ReadingSet, Severity, Trigger,
};
use crate::types::Horizon;

/// Threshold table for one horizon
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Sustained wind for `high_wind`. `None` disables the rule.
    pub wind_speed_kmh: Option<f64>,
    pub wind_gust_kmh: f64,
    /// Rain must exceed this, not merely reach it
    pub heavy_rain_mm: f64,
    pub high_temperature_celsius: f64,
    pub low_temperature_celsius: f64,
    pub uv_index: f64,
    pub uv_index_severe: f64,
    /// Visibility must be below this
    pub visibility_km: f64,
    /// US AQI must exceed this
    pub us_aqi: f64,
}

impl Thresholds {
    pub fn current() -> Self {
        Self {
            wind_speed_kmh: Some(30.0),
            wind_gust_kmh: 40.0,
            heavy_rain_mm: 5.0,
            high_temperature_celsius: 35.0,
            low_temperature_celsius: 15.0,
            uv_index: 6.0,
            uv_index_severe: 8.0,
            visibility_km: 1.0,
            us_aqi: 150.0,
        }
    }

    pub fn hourly() -> Self {
        Self {
            visibility_km: 5.0,
            ..Self::current()
        }
    }

    /// Daily rollups carry no gusts; the day's maximum wind stands in for them
    pub fn daily() -> Self {
        Self {
            wind_speed_kmh: None,
            visibility_km: 5.0,
            ..Self::current()
        }
    }

    pub fn for_horizon(horizon: Horizon) -> Self {
        match horizon {
            Horizon::Current => Self::current(),
            Horizon::Hour(_) => Self::hourly(),
            Horizon::Day(_) => Self::daily(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Metric {
    name: &'static str,
    value: f64,
}

fn metric(name: &'static str, value: Option<f64>) -> Option<Metric> {
    value.map(|value| Metric { name, value })
}

/// Field mapping shared by all rules
#[derive(Debug, Default)]
struct Sample {
    weather_code: Option<i32>,
    wind_speed: Option<Metric>,
    wind_gust: Option<Metric>,
    precipitation: Option<Metric>,
    temperature_high: Option<Metric>,
    temperature_low: Option<Metric>,
    uv_index: Option<Metric>,
    visibility: Option<Metric>,
    us_aqi: Option<Metric>,
}

impl From<&Reading> for Sample {
    fn from(reading: &Reading) -> Self {
        let temperature = metric("temperature_celsius", reading.temperature_celsius);
        Self {
            weather_code: reading.weather_code,
            wind_speed: metric("wind_speed_kmh", reading.wind_speed_kmh),
            wind_gust: metric("wind_gusts_kmh", reading.wind_gusts_kmh),
            precipitation: metric("precipitation_mm", reading.precipitation_mm),
            temperature_high: temperature,
            temperature_low: temperature,
            uv_index: metric("uv_index", reading.uv_index),
            visibility: metric("visibility_km", reading.visibility_km),
            us_aqi: metric("us_aqi", reading.air_quality.us_aqi),
        }
    }
}

impl From<&DailyReading> for Sample {
    fn from(day: &DailyReading) -> Self {
        Self {
            weather_code: day.weather_code,
            wind_speed: None,
            wind_gust: metric("wind_speed_max_kmh", day.wind_speed_max_kmh),
            precipitation: metric("precipitation_sum_mm", day.precipitation_sum_mm),
            temperature_high: metric("temperature_max_celsius", day.temperature_max_celsius),
            temperature_low: metric("temperature_min_celsius", day.temperature_min_celsius),
            uv_index: metric("uv_index_max", day.uv_index_max),
            visibility: None,
            us_aqi: None,
        }
    }
}

type Rule = fn(&Sample, &Thresholds) -> Option<Condition>;

/// Output order of [`evaluate`] follows this table
const RULES: [Rule; 10] = [
    thunderstorm,
    high_wind_gust,
    high_wind,
    heavy_rain,
    low_visibility,
    fog,
    poor_air_quality,
    high_temperature,
    high_uv,
    low_temperature,
];

fn fired(
    kind: ConditionKind,
    severity: Severity,
    message: String,
    triggers: Vec<Trigger>,
) -> Option<Condition> {
    Some(Condition {
        kind,
        severity,
        message,
        triggers,
    })
}

fn thunderstorm(sample: &Sample, _: &Thresholds) -> Option<Condition> {
    let code = sample.weather_code.filter(|c| matches!(c, 95 | 96 | 99))?;
    fired(
        ConditionKind::Thunderstorm,
        Severity::Critical,
        format!(
            "{}: stop work at height and stay away from metal structures",
            describe_weather_code(code)
        ),
        vec![Trigger::new("weather_code", f64::from(code))],
    )
}

fn high_wind_gust(sample: &Sample, t: &Thresholds) -> Option<Condition> {
    let gust = sample.wind_gust.filter(|m| m.value >= t.wind_gust_kmh)?;
    fired(
        ConditionKind::HighWindGust,
        Severity::Critical,
        format!("Wind gusts up to {:.0} km/h (limit {:.0} km/h)", gust.value, t.wind_gust_kmh),
        vec![Trigger::new(gust.name, gust.value)],
    )
}

fn high_wind(sample: &Sample, t: &Thresholds) -> Option<Condition> {
    let limit = t.wind_speed_kmh?;
    let wind = sample.wind_speed.filter(|m| m.value >= limit)?;
    fired(
        ConditionKind::HighWind,
        Severity::High,
        format!("Sustained wind of {:.0} km/h (limit {:.0} km/h)", wind.value, limit),
        vec![Trigger::new(wind.name, wind.value)],
    )
}

fn heavy_rain(sample: &Sample, t: &Thresholds) -> Option<Condition> {
    let rain = sample.precipitation.filter(|m| m.value > t.heavy_rain_mm)?;
    fired(
        ConditionKind::HeavyRain,
        Severity::High,
        format!("Heavy rain: {:.1} mm expected", rain.value),
        vec![Trigger::new(rain.name, rain.value)],
    )
}

fn low_visibility(sample: &Sample, t: &Thresholds) -> Option<Condition> {
    let visibility = sample.visibility.filter(|m| m.value < t.visibility_km)?;
    fired(
        ConditionKind::LowVisibility,
        Severity::High,
        format!("Visibility down to {:.1} km", visibility.value),
        vec![Trigger::new(visibility.name, visibility.value)],
    )
}

fn fog(sample: &Sample, _: &Thresholds) -> Option<Condition> {
    let code = sample.weather_code.filter(|c| matches!(c, 45 | 48))?;
    fired(
        ConditionKind::Fog,
        Severity::Medium,
        format!(
            "{}: reduced visibility around vehicles and machinery",
            describe_weather_code(code)
        ),
        vec![Trigger::new("weather_code", f64::from(code))],
    )
}

fn poor_air_quality(sample: &Sample, t: &Thresholds) -> Option<Condition> {
    let aqi = sample.us_aqi.filter(|m| m.value > t.us_aqi)?;
    fired(
        ConditionKind::PoorAirQuality,
        Severity::High,
        format!("Poor air quality: US AQI {:.0}", aqi.value),
        vec![Trigger::new(aqi.name, aqi.value)],
    )
}

fn high_temperature(sample: &Sample, t: &Thresholds) -> Option<Condition> {
    let temperature = sample
        .temperature_high
        .filter(|m| m.value >= t.high_temperature_celsius)?;
    fired(
        ConditionKind::HighTemperature,
        Severity::High,
        format!("High temperature: {:.1}°C, risk of heat stress", temperature.value),
        vec![Trigger::new(temperature.name, temperature.value)],
    )
}

fn high_uv(sample: &Sample, t: &Thresholds) -> Option<Condition> {
    let uv = sample.uv_index.filter(|m| m.value >= t.uv_index)?;
    let severity = if uv.value >= t.uv_index_severe {
        Severity::High
    } else {
        Severity::Medium
    };
    fired(
        ConditionKind::HighUv,
        severity,
        format!("UV index {:.1}", uv.value),
        vec![Trigger::new(uv.name, uv.value)],
    )
}

fn low_temperature(sample: &Sample, t: &Thresholds) -> Option<Condition> {
    let temperature = sample
        .temperature_low
        .filter(|m| m.value <= t.low_temperature_celsius)?;
    fired(
        ConditionKind::LowTemperature,
        Severity::Medium,
        format!("Low temperature: {:.1}°C", temperature.value),
        vec![Trigger::new(temperature.name, temperature.value)],
    )
}

fn run_rules(sample: &Sample, thresholds: &Thresholds) -> Vec<Condition> {
    RULES
        .iter()
        .filter_map(|rule| rule(sample, thresholds))
        .collect()
}

/// Conditions for a current reading
pub fn evaluate_reading(reading: &Reading) -> Vec<Condition> {
    evaluate_reading_with(reading, &Thresholds::current())
}

pub fn evaluate_reading_with(reading: &Reading, thresholds: &Thresholds) -> Vec<Condition> {
    run_rules(&Sample::from(reading), thresholds)
}

/// Conditions for one hour of the forecast
pub fn evaluate_hour(hour: &HourlyReading) -> Vec<Condition> {
    evaluate_reading_with(&hour.reading, &Thresholds::hourly())
}

/// Conditions for one day of the forecast
pub fn evaluate_day(day: &DailyReading) -> Vec<Condition> {
    evaluate_day_with(day, &Thresholds::daily())
}

pub fn evaluate_day_with(day: &DailyReading, thresholds: &Thresholds) -> Vec<Condition> {
    run_rules(&Sample::from(day), thresholds)
}

/// Active conditions for one horizon of a reading set.
///
/// A missing current reading or an index past the end of the forecast
/// yields no conditions.
pub fn evaluate(set: &ReadingSet, horizon: Horizon) -> Vec<Condition> {
    match horizon {
        Horizon::Current => set
            .current
            .as_ref()
            .map(evaluate_reading)
            .unwrap_or_default(),
        Horizon::Hour(index) => set.hour(index).map(evaluate_hour).unwrap_or_default(),
        Horizon::Day(index) => set.day(index).map(evaluate_day).unwrap_or_default(),
    }
}

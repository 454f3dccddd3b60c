//! Per-metric risk bands
//!
//! Every function here is total: any input, including `None`, NaN or a
//! weather code nobody has heard of, yields a value.

use serde::{Deserialize, Serialize};

use crate::models::AirQuality;

/// Description returned for weather codes outside the WMO table
pub const UNDETERMINED: &str = "Undetermined";

/// US EPA air-quality bands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AqiBand {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

impl std::fmt::Display for AqiBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AqiBand::Good => write!(f, "Good"),
            AqiBand::Moderate => write!(f, "Moderate"),
            AqiBand::UnhealthyForSensitive => write!(f, "Unhealthy for sensitive groups"),
            AqiBand::Unhealthy => write!(f, "Unhealthy"),
            AqiBand::VeryUnhealthy => write!(f, "Very unhealthy"),
            AqiBand::Hazardous => write!(f, "Hazardous"),
            AqiBand::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AqiClassification {
    pub band: AqiBand,
    pub description: String,
    pub health_advice: Option<String>,
}

/// UV index bands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UvBand {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
    Unknown,
}

impl std::fmt::Display for UvBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UvBand::Low => write!(f, "Low"),
            UvBand::Moderate => write!(f, "Moderate"),
            UvBand::High => write!(f, "High"),
            UvBand::VeryHigh => write!(f, "Very high"),
            UvBand::Extreme => write!(f, "Extreme"),
            UvBand::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UvClassification {
    pub band: UvBand,
    pub description: String,
}

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

/// Classify an AQI value. Upper bounds are inclusive.
pub fn classify_aqi(value: Option<f64>) -> AqiClassification {
    let (band, advice) = match usable(value) {
        None => (AqiBand::Unknown, None),
        Some(v) if v <= 50.0 => (AqiBand::Good, Some("Air quality is satisfactory.")),
        Some(v) if v <= 100.0 => (
            AqiBand::Moderate,
            Some("Unusually sensitive people should limit prolonged outdoor exertion."),
        ),
        Some(v) if v <= 150.0 => (
            AqiBand::UnhealthyForSensitive,
            Some("Sensitive groups should reduce prolonged or heavy outdoor exertion."),
        ),
        Some(v) if v <= 200.0 => (
            AqiBand::Unhealthy,
            Some("Everyone should reduce outdoor exertion; wear a respirator outdoors."),
        ),
        Some(v) if v <= 300.0 => (
            AqiBand::VeryUnhealthy,
            Some("Avoid prolonged outdoor work; respirators required."),
        ),
        Some(_) => (
            AqiBand::Hazardous,
            Some("Suspend outdoor work where possible."),
        ),
    };

    AqiClassification {
        band,
        description: band.to_string(),
        health_advice: advice.map(str::to_string),
    }
}

/// Pick the AQI value to classify: US first, European as fallback
pub fn select_aqi(air_quality: &AirQuality) -> Option<f64> {
    usable(air_quality.us_aqi).or_else(|| usable(air_quality.european_aqi))
}

pub fn classify_air_quality(air_quality: &AirQuality) -> AqiClassification {
    classify_aqi(select_aqi(air_quality))
}

/// Classify a UV index. Upper bounds are inclusive.
pub fn classify_uv(value: Option<f64>) -> UvClassification {
    let (band, description) = match usable(value) {
        None => (UvBand::Unknown, "No UV data"),
        Some(v) if v <= 2.0 => (UvBand::Low, "Minimal protection required"),
        Some(v) if v <= 5.0 => (UvBand::Moderate, "Seek shade around midday"),
        Some(v) if v <= 7.0 => (UvBand::High, "Protection required: hat, sunglasses, sunscreen"),
        Some(v) if v <= 10.0 => (
            UvBand::VeryHigh,
            "Extra protection required, limit midday exposure",
        ),
        Some(_) => (UvBand::Extreme, "Avoid exposure; full protection required"),
    };

    UvClassification {
        band,
        description: description.to_string(),
    }
}

/// Text for a WMO weather interpretation code
pub fn describe_weather_code(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snowfall",
        73 => "Moderate snowfall",
        75 => "Heavy snowfall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => UNDETERMINED,
    }
}

/// Like [`describe_weather_code`], for a code that may be missing
pub fn describe_optional_weather_code(code: Option<i32>) -> &'static str {
    code.map(describe_weather_code).unwrap_or(UNDETERMINED)
}

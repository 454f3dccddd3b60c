//! Hazard condition models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hazard types the evaluator can raise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Thunderstorm,
    HighWindGust,
    HighWind,
    HeavyRain,
    LowVisibility,
    Fog,
    PoorAirQuality,
    HighTemperature,
    HighUv,
    LowTemperature,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 10] = [
        ConditionKind::Thunderstorm,
        ConditionKind::HighWindGust,
        ConditionKind::HighWind,
        ConditionKind::HeavyRain,
        ConditionKind::LowVisibility,
        ConditionKind::Fog,
        ConditionKind::PoorAirQuality,
        ConditionKind::HighTemperature,
        ConditionKind::HighUv,
        ConditionKind::LowTemperature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::Thunderstorm => "thunderstorm",
            ConditionKind::HighWindGust => "high_wind_gust",
            ConditionKind::HighWind => "high_wind",
            ConditionKind::HeavyRain => "heavy_rain",
            ConditionKind::LowVisibility => "low_visibility",
            ConditionKind::Fog => "fog",
            ConditionKind::PoorAirQuality => "poor_air_quality",
            ConditionKind::HighTemperature => "high_temperature",
            ConditionKind::HighUv => "high_uv",
            ConditionKind::LowTemperature => "low_temperature",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown condition kind: {}", s))
    }
}

/// How urgently a condition needs attention
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("Unknown severity: {}", other)),
        }
    }
}

/// A metric value that caused a condition to fire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trigger {
    pub metric: String,
    pub value: f64,
}

impl Trigger {
    pub fn new(metric: &str, value: f64) -> Self {
        Self {
            metric: metric.to_string(),
            value,
        }
    }
}

/// An active hazard produced by one evaluation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    pub kind: ConditionKind,
    pub severity: Severity,
    pub message: String,
    pub triggers: Vec<Trigger>,
}

//! Common types used across the platform

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// GPS coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: Decimal,
    pub longitude: Decimal,
}

impl GpsCoordinates {
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Stable identity for a site, rounded to roughly a kilometre.
    ///
    /// Two requests for the same site that differ only in trailing digits or
    /// in scale (`18.70` vs `18.7`) map to the same key.
    pub fn location_key(&self) -> String {
        format!(
            "{},{}",
            self.latitude.round_dp(2).normalize(),
            self.longitude.round_dp(2).normalize()
        )
    }

    pub fn latitude_f64(&self) -> f64 {
        self.latitude.to_f64().unwrap_or_default()
    }

    pub fn longitude_f64(&self) -> f64 {
        self.longitude.to_f64().unwrap_or_default()
    }
}

/// Which slice of a reading set an evaluation looks at
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", tag = "type", content = "index")]
pub enum Horizon {
    #[default]
    Current,
    Hour(usize),
    Day(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_location_key_rounds_and_normalizes() {
        let a = GpsCoordinates::new(dec("18.7883"), dec("98.9853"));
        assert_eq!(a.location_key(), "18.79,98.99");

        let b = GpsCoordinates::new(dec("18.70"), dec("98.900"));
        let c = GpsCoordinates::new(dec("18.7"), dec("98.9"));
        assert_eq!(b.location_key(), c.location_key());
    }

    #[test]
    fn test_coordinates_to_f64() {
        let coords = GpsCoordinates::new(dec("-33.8688"), dec("151.2093"));
        assert!((coords.latitude_f64() + 33.8688).abs() < 1e-9);
        assert!((coords.longitude_f64() - 151.2093).abs() < 1e-9);
    }
}

//! WebAssembly module for the weather safety advisor
//!
//! Gives the dashboard widgets the same classification and advisory logic
//! the backend runs:
//! - AQI and UV bands
//! - Weather code descriptions
//! - Hazard conditions and equipment advisories for any horizon

use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::advisory::*;
pub use shared::classify::*;
pub use shared::conditions::*;
pub use shared::models::*;
pub use shared::types::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
}

/// AQI band label for a value; `undefined` gives "Unknown"
#[wasm_bindgen]
pub fn aqi_band(value: Option<f64>) -> String {
    classify_aqi(value).band.to_string()
}

/// Full AQI classification (band, description, advice) as JSON
#[wasm_bindgen]
pub fn classify_aqi_json(
    us_aqi: Option<f64>,
    european_aqi: Option<f64>,
) -> Result<String, JsValue> {
    let air_quality = AirQuality {
        us_aqi,
        european_aqi,
        ..Default::default()
    };
    to_json(&classify_air_quality(&air_quality))
}

/// UV band label; `undefined` gives "Unknown" and the widget renders no tag
#[wasm_bindgen]
pub fn uv_band(value: Option<f64>) -> String {
    classify_uv(value).band.to_string()
}

#[wasm_bindgen]
pub fn weather_description(code: i32) -> String {
    describe_weather_code(code).to_string()
}

/// Advisory for one horizon of a reading set.
///
/// `horizon` is `"current"`, `"hour:N"` or `"day:N"`.
#[wasm_bindgen]
pub fn advise_json(reading_set_json: &str, horizon: &str) -> Result<String, JsValue> {
    let set: ReadingSet = serde_json::from_str(reading_set_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid reading set JSON: {}", e)))?;
    let horizon = parse_horizon(horizon).map_err(|e| JsValue::from_str(&e))?;
    if set.stale {
        web_sys::console::warn_1(&JsValue::from_str(
            "Advising on cached weather data; the weather provider is unavailable",
        ));
    }
    to_json(&advise(&set, horizon))
}

/// Advisory for one day entry of the seven-day forecast
#[wasm_bindgen]
pub fn advise_day_json(daily_json: &str) -> Result<String, JsValue> {
    let day: DailyReading = serde_json::from_str(daily_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid daily reading JSON: {}", e)))?;
    to_json(&Advisory::from_conditions(evaluate_day(&day)))
}

/// Parse `"current"`, `"hour:N"` or `"day:N"`
pub fn parse_horizon(value: &str) -> Result<Horizon, String> {
    let invalid = || format!("Invalid horizon: {}", value);
    match value.split_once(':') {
        None if value == "current" => Ok(Horizon::Current),
        Some(("hour", index)) => index.parse().map(Horizon::Hour).map_err(|_| invalid()),
        Some(("day", index)) => index.parse().map(Horizon::Day).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

//! Services for the weather safety advisor

pub mod alert;
pub mod cache;
pub mod location;
pub mod weather;

pub use alert::AlertService;
pub use cache::FreshnessCache;
pub use location::LocationResolver;
pub use weather::WeatherService;

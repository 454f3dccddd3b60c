//! Weather safety advisor backend
//!
//! Serves current conditions and forecasts with hazard conditions and
//! protective-equipment advice, and keeps a persisted alert history per
//! location.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};

use external::WeatherProvider;
use services::{LocationResolver, WeatherService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub weather: WeatherService,
    pub location: LocationResolver,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, config: Config, provider: Arc<dyn WeatherProvider>) -> Self {
        let weather = WeatherService::new(provider, &config.weather, &config.cache);
        let location = LocationResolver::new(&config.location, config.weather.default_location());
        Self {
            db,
            config: Arc::new(config),
            weather,
            location,
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Weather Safety Advisor API v1"
}

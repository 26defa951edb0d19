pub mod config;
pub mod models;
pub mod service;

pub use config::ServerConfig;
pub use service::{AppState, build_router};

use insurance_compare::{ComparisonService, HttpComparisonBackend};
use std::sync::Arc;

/// Builds the application router against the configured comparison backend.
pub fn create_app(config: &ServerConfig) -> insurance_compare::Result<axum::Router> {
    let backend = HttpComparisonBackend::new(&config.comparison_api_url)?;
    let comparison = ComparisonService::new(Arc::new(backend));
    Ok(build_router(AppState::new(comparison, config.request_timeout)))
}

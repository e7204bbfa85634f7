// Library crate for the game result tracking server
// This file exposes the public API for integration tests

pub mod config;
pub mod results;
pub mod shared;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// Re-export commonly used types for easier access in tests
pub use config::AppConfig;
pub use results::{InMemoryResultStore, PostgresResultStore, ResultService, ResultStore, ResultsError};
pub use shared::{ApiResponse, AppError, AppState};

/// Full HTTP application with tracing and permissive CORS
pub fn app(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(results::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

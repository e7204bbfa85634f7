// Public API - what other modules can use
pub use errors::ResultsError;
pub use handlers::{create_result, list_results, monthly_average, period_average, yearly_average};
pub use repository::{InMemoryResultStore, PostgresResultStore, ResultStore};
pub use service::ResultService;

pub mod aggregation;
mod errors;
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};

use crate::shared::AppState;

const SELECTION: &str =
    "/game-result/patient/:patient_id/game/:game_id/:initial_date/:final_date";

/// Game result routes; `?sound=<value>` narrows any selection to one sound condition
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/game-result", post(create_result))
        .route(SELECTION, get(list_results))
        .route(&format!("{SELECTION}/average"), get(period_average))
        .route(&format!("{SELECTION}/monthaverage"), get(monthly_average))
        .route(&format!("{SELECTION}/yearaverage"), get(yearly_average))
}

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::ResultRecord,
    service::ResultService,
    types::{CreateResultRequest, ResultSelector, SoundQuery},
    validation::build_selector,
};
use crate::shared::{ApiResponse, AppError, AppState};

/// patient id, game id, initial date, final date
type SelectionPath = Path<(String, String, String, String)>;

fn service(state: &AppState) -> ResultService {
    ResultService::new(Arc::clone(&state.result_store))
}

fn selector(
    Path((patient_id, game_id, initial_date, final_date)): SelectionPath,
    Query(query): Query<SoundQuery>,
) -> Result<ResultSelector, AppError> {
    Ok(build_selector(
        &patient_id,
        &game_id,
        &initial_date,
        &final_date,
        query.sound,
    )?)
}

/// 200 with the envelope, or 204 when nothing matched
fn respond<T: Serialize>(summary: Option<T>) -> Response {
    match summary {
        Some(body) => ApiResponse::ok(body).into_response(),
        None => {
            info!("No game results matched the selection");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

/// POST /game-result
#[instrument(name = "create_result", skip(state, payload))]
pub async fn create_result(
    State(state): State<AppState>,
    payload: Result<Json<CreateResultRequest>, JsonRejection>,
) -> Result<ApiResponse<ResultRecord>, AppError> {
    // unreadable bodies get the same envelope as field-level validation
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Rejected game result body");
        AppError::Validation(rejection.body_text())
    })?;

    let record = service(&state).create_result(request).await?;
    Ok(ApiResponse::created(record))
}

/// GET /game-result/patient/:patient_id/game/:game_id/:initial_date/:final_date
#[instrument(name = "list_results", skip_all)]
pub async fn list_results(
    State(state): State<AppState>,
    path: SelectionPath,
    query: Query<SoundQuery>,
) -> Result<Response, AppError> {
    let selector = selector(path, query)?;
    Ok(respond(service(&state).list_results(&selector).await?))
}

/// GET .../average
#[instrument(name = "period_average", skip_all)]
pub async fn period_average(
    State(state): State<AppState>,
    path: SelectionPath,
    query: Query<SoundQuery>,
) -> Result<Response, AppError> {
    let selector = selector(path, query)?;
    Ok(respond(service(&state).period_average(&selector).await?))
}

/// GET .../monthaverage
#[instrument(name = "monthly_average", skip_all)]
pub async fn monthly_average(
    State(state): State<AppState>,
    path: SelectionPath,
    query: Query<SoundQuery>,
) -> Result<Response, AppError> {
    let selector = selector(path, query)?;
    Ok(respond(service(&state).monthly_average(&selector).await?))
}

/// GET .../yearaverage
#[instrument(name = "yearly_average", skip_all)]
pub async fn yearly_average(
    State(state): State<AppState>,
    path: SelectionPath,
    query: Query<SoundQuery>,
) -> Result<Response, AppError> {
    let selector = selector(path, query)?;
    Ok(respond(service(&state).yearly_average(&selector).await?))
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::results::{repository::ResultStore, ResultsError};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub result_store: Arc<dyn ResultStore>,
}

impl AppState {
    pub fn new(result_store: Arc<dyn ResultStore>) -> Self {
        Self { result_store }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Computation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ResultsError> for AppError {
    fn from(error: ResultsError) -> Self {
        match error {
            ResultsError::Validation(msg) => AppError::Validation(msg),
            computation @ ResultsError::Computation { .. } => {
                AppError::Computation(computation.to_string())
            }
            ResultsError::Storage(msg) => AppError::Storage(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Validation(msg) | AppError::Computation(msg) => msg,
            // storage details stay in the logs
            AppError::Storage(_) => "Internal server error".to_string(),
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "message": message,
            "error": true,
            "body": {}
        }));

        (status, body).into_response()
    }
}

/// Success envelope: `{ status, message, error: false, body }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    pub error: bool,
    pub body: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(body: T) -> Self {
        Self::with_status(StatusCode::OK, "Ok", body)
    }

    pub fn created(body: T) -> Self {
        Self::with_status(StatusCode::CREATED, "Created", body)
    }

    fn with_status(status: StatusCode, message: &str, body: T) -> Self {
        Self {
            status: status.as_u16(),
            message: message.to_string(),
            error: false,
            body,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResultsError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Metric '{metric}' of record {record_id} is not numeric")]
    Computation { record_id: Uuid, metric: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for ResultsError {
    fn from(error: sqlx::Error) -> Self {
        ResultsError::Storage(error.to_string())
    }
}

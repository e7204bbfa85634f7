use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Row};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::{
    errors::ResultsError,
    models::{Metrics, NewResult, ResultRecord, SoundCondition},
    types::ResultSelector,
    validation::validate_metrics,
};

/// Persistence boundary for logged sessions. Records are create-only.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Every record matching the selector, in no particular order
    async fn query(&self, selector: &ResultSelector) -> Result<Vec<ResultRecord>, ResultsError>;
    async fn append(&self, new_result: NewResult) -> Result<ResultRecord, ResultsError>;
}

/// In-memory implementation of ResultStore for development and testing.
/// Data is lost when the application restarts.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    records: Arc<RwLock<Vec<ResultRecord>>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Creates a store with pre-populated records
    pub fn with_records(records: Vec<ResultRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    #[instrument(skip(self))]
    async fn query(&self, selector: &ResultSelector) -> Result<Vec<ResultRecord>, ResultsError> {
        let records = self.records.read().await;
        let matching: Vec<ResultRecord> = records
            .iter()
            .filter(|record| selector.matches(record))
            .cloned()
            .collect();

        debug!(record_count = matching.len(), "Queried results in memory");
        Ok(matching)
    }

    #[instrument(skip(self, new_result))]
    async fn append(&self, new_result: NewResult) -> Result<ResultRecord, ResultsError> {
        validate_metrics(&new_result.results)?;

        let record = ResultRecord::from_new(new_result);
        self.records.write().await.push(record.clone());

        debug!(result_id = %record.id, "Result stored in memory");
        Ok(record)
    }
}

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS game_results (
    id UUID PRIMARY KEY,
    patient_id UUID NOT NULL,
    game_id UUID NOT NULL,
    sound TEXT NOT NULL,
    results JSONB NOT NULL,
    date TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const CREATE_INDEX: &str = "CREATE INDEX IF NOT EXISTS game_results_selection_idx
    ON game_results (patient_id, game_id, date)";

/// Logs a database failure before turning it into a storage error
fn storage_failure(context: &'static str) -> impl Fn(sqlx::Error) -> ResultsError {
    move |e| {
        warn!(error = %e, "{}", context);
        ResultsError::from(e)
    }
}

/// PostgreSQL implementation of ResultStore
pub struct PostgresResultStore {
    pool: PgPool,
}

impl PostgresResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the results table and its lookup index when missing
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), ResultsError> {
        for statement in [CREATE_TABLE, CREATE_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(storage_failure("Failed to prepare game_results schema"))?;
        }
        debug!("game_results schema ready");
        Ok(())
    }
}

#[async_trait]
impl ResultStore for PostgresResultStore {
    #[instrument(skip(self))]
    async fn query(&self, selector: &ResultSelector) -> Result<Vec<ResultRecord>, ResultsError> {
        let rows = sqlx::query(
            "SELECT id, patient_id, game_id, sound, results, date FROM game_results \
             WHERE patient_id = $1 AND game_id = $2 \
             AND ($3::TEXT IS NULL OR sound = $3) \
             AND date >= $4 AND date <= $5",
        )
        .bind(selector.patient_id)
        .bind(selector.game_id)
        .bind(selector.sound_condition.as_ref().map(SoundCondition::as_str))
        .bind(selector.start)
        .bind(selector.end)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_failure("Failed to query results from database"))?;

        let records = rows
            .into_iter()
            .map(|row| {
                let Json(results): Json<Metrics> = row.try_get("results")?;
                let sound: String = row.try_get("sound")?;
                Ok(ResultRecord {
                    id: row.try_get("id")?,
                    patient_id: row.try_get("patient_id")?,
                    game_id: row.try_get("game_id")?,
                    sound_condition: SoundCondition::new(sound),
                    results,
                    date: row.try_get("date")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(storage_failure("Failed to decode result rows from database"))?;

        debug!(record_count = records.len(), "Queried results from database");
        Ok(records)
    }

    #[instrument(skip(self, new_result))]
    async fn append(&self, new_result: NewResult) -> Result<ResultRecord, ResultsError> {
        validate_metrics(&new_result.results)?;

        let record = ResultRecord::from_new(new_result);

        sqlx::query(
            "INSERT INTO game_results (id, patient_id, game_id, sound, results, date) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(record.patient_id)
        .bind(record.game_id)
        .bind(record.sound_condition.as_str())
        .bind(Json(&record.results))
        .bind(record.date)
        .execute(&self.pool)
        .await
        .map_err(storage_failure("Failed to store result in database"))?;

        debug!(result_id = %record.id, "Result stored in database");
        Ok(record)
    }
}

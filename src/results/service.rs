use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    aggregation,
    errors::ResultsError,
    models::ResultRecord,
    repository::ResultStore,
    types::{
        Aggregation, AggregationMode, CreateResultRequest, MonthlyAverage, PeriodAverage,
        RawEntry, ResultSelector, YearlyAverage,
    },
    validation::validate_create_request,
};

/// Service for logging game sessions and summarising them.
///
/// Each read performs exactly one store query followed by one in-memory
/// aggregation. `Ok(None)` means the selection matched no records.
pub struct ResultService {
    store: Arc<dyn ResultStore>,
}

impl ResultService {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, request))]
    pub async fn create_result(
        &self,
        request: CreateResultRequest,
    ) -> Result<ResultRecord, ResultsError> {
        let new_result = validate_create_request(request).map_err(|e| {
            warn!(error = %e, "Rejected game result");
            e
        })?;

        let record = self.store.append(new_result).await?;

        info!(
            result_id = %record.id,
            patient_id = %record.patient_id,
            game_id = %record.game_id,
            "Game result created"
        );
        Ok(record)
    }

    pub async fn list_results(
        &self,
        selector: &ResultSelector,
    ) -> Result<Option<Vec<RawEntry>>, ResultsError> {
        Ok(match self.run(selector, AggregationMode::Raw).await? {
            Some(Aggregation::Raw(entries)) => Some(entries),
            _ => None,
        })
    }

    pub async fn period_average(
        &self,
        selector: &ResultSelector,
    ) -> Result<Option<PeriodAverage>, ResultsError> {
        Ok(match self.run(selector, AggregationMode::PeriodAverage).await? {
            Some(Aggregation::Period(averages)) => Some(averages),
            _ => None,
        })
    }

    pub async fn monthly_average(
        &self,
        selector: &ResultSelector,
    ) -> Result<Option<Vec<MonthlyAverage>>, ResultsError> {
        Ok(match self.run(selector, AggregationMode::MonthlyAverage).await? {
            Some(Aggregation::Monthly(months)) => Some(months),
            _ => None,
        })
    }

    pub async fn yearly_average(
        &self,
        selector: &ResultSelector,
    ) -> Result<Option<Vec<YearlyAverage>>, ResultsError> {
        Ok(match self.run(selector, AggregationMode::YearlyAverage).await? {
            Some(Aggregation::Yearly(years)) => Some(years),
            _ => None,
        })
    }

    #[instrument(skip(self), fields(patient_id = %selector.patient_id, game_id = %selector.game_id))]
    async fn run(
        &self,
        selector: &ResultSelector,
        mode: AggregationMode,
    ) -> Result<Option<Aggregation>, ResultsError> {
        let records = self.store.query(selector).await?;
        info!(record_count = records.len(), "Aggregating game results");

        aggregation::aggregate(&records, mode).map_err(|e| {
            warn!(error = %e, "Aggregation failed");
            e
        })
    }
}

//! Grouped summaries over logged game sessions.
//!
//! Everything here is a pure function of its input slice: no I/O and no
//! shared state, so callers may run aggregations concurrently. Results never
//! depend on the order records arrive in; raw rows are sorted by date and
//! monthly/yearly partitions are emitted chronologically.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use super::{
    errors::ResultsError,
    models::ResultRecord,
    types::{
        Aggregation, AggregationMode, MonthlyAverage, MonthlyResults, PeriodAverage, RawEntry,
        YearlyAverage, YearlyResults, MONTH_YEAR_LABEL, YEAR_LABEL,
    },
};

/// Running sum and count for one metric
#[derive(Debug, Default, Clone, Copy)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    // count is never zero: an accumulator only exists once a value was added
    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Per-metric accumulators plus the records and calendar days seen in one group
#[derive(Debug, Default)]
struct Partition {
    metrics: BTreeMap<String, MeanAccumulator>,
    days: BTreeSet<NaiveDate>,
    records: usize,
}

impl Partition {
    /// Records missing a metric simply do not contribute to its mean
    fn add(&mut self, record: &ResultRecord) -> Result<(), ResultsError> {
        for (metric, value) in &record.results {
            let value = value.as_f64().ok_or_else(|| ResultsError::Computation {
                record_id: record.id,
                metric: metric.clone(),
            })?;
            self.metrics.entry(metric.clone()).or_default().add(value);
        }
        self.days.insert(record.date.date_naive());
        self.records += 1;
        Ok(())
    }

    fn averages(&self) -> BTreeMap<String, f64> {
        self.metrics
            .iter()
            .map(|(metric, acc)| (metric.clone(), acc.mean()))
            .collect()
    }

    /// Averages for labelled output; the partition label owns `label`, so a
    /// stored metric with that name is left out
    fn labelled_averages(&self, label: &str) -> BTreeMap<String, f64> {
        let mut averages = self.averages();
        if averages.remove(label).is_some() {
            warn!(metric = label, "Dropping metric that collides with partition label");
        }
        averages
    }
}

fn partition_by<K, F>(
    records: &[ResultRecord],
    key: F,
) -> Result<BTreeMap<K, Partition>, ResultsError>
where
    K: Ord,
    F: Fn(&DateTime<Utc>) -> K,
{
    let mut partitions: BTreeMap<K, Partition> = BTreeMap::new();
    for record in records {
        partitions
            .entry(key(&record.date))
            .or_default()
            .add(record)?;
    }
    Ok(partitions)
}

/// Every record as-is, oldest first, each tagged `days_logged = 1`
pub fn raw(records: &[ResultRecord]) -> Option<Vec<RawEntry>> {
    if records.is_empty() {
        return None;
    }

    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    Some(
        sorted
            .into_iter()
            .map(|record| RawEntry {
                days_logged: 1,
                record,
            })
            .collect(),
    )
}

/// Mean of each metric over the whole selection
pub fn period_average(records: &[ResultRecord]) -> Result<Option<PeriodAverage>, ResultsError> {
    if records.is_empty() {
        return Ok(None);
    }

    let mut partition = Partition::default();
    for record in records {
        partition.add(record)?;
    }
    Ok(Some(partition.averages()))
}

/// Means grouped by calendar month, with the distinct days logged in each month
pub fn monthly_average(
    records: &[ResultRecord],
) -> Result<Option<Vec<MonthlyAverage>>, ResultsError> {
    if records.is_empty() {
        return Ok(None);
    }

    let partitions = partition_by(records, |date| (date.year(), date.month()))?;

    Ok(Some(
        partitions
            .into_iter()
            .map(|((year, month), partition)| MonthlyAverage {
                days_logged: partition.days.len(),
                results: MonthlyResults {
                    month_year: format!("{}-{}", month, year),
                    averages: partition.labelled_averages(MONTH_YEAR_LABEL),
                },
            })
            .collect(),
    ))
}

/// Means grouped by calendar year.
///
/// `days_logged` is the number of distinct years in the whole selection and is
/// repeated on every entry, not a per-year day count.
pub fn yearly_average(
    records: &[ResultRecord],
) -> Result<Option<Vec<YearlyAverage>>, ResultsError> {
    if records.is_empty() {
        return Ok(None);
    }

    let partitions = partition_by(records, |date| date.year())?;
    let distinct_years = partitions.len();

    Ok(Some(
        partitions
            .into_iter()
            .map(|(year, partition)| YearlyAverage {
                days_logged: distinct_years,
                results: YearlyResults {
                    year: year.to_string(),
                    averages: partition.labelled_averages(YEAR_LABEL),
                },
            })
            .collect(),
    ))
}

/// Runs the requested mode; `Ok(None)` means there was nothing to aggregate
pub fn aggregate(
    records: &[ResultRecord],
    mode: AggregationMode,
) -> Result<Option<Aggregation>, ResultsError> {
    Ok(match mode {
        AggregationMode::Raw => raw(records).map(Aggregation::Raw),
        AggregationMode::PeriodAverage => period_average(records)?.map(Aggregation::Period),
        AggregationMode::MonthlyAverage => monthly_average(records)?.map(Aggregation::Monthly),
        AggregationMode::YearlyAverage => yearly_average(records)?.map(Aggregation::Yearly),
    })
}

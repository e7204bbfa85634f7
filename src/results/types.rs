use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::models::{ResultRecord, SoundCondition};

/// Request payload for logging a game session. Fields are kept as raw JSON so
/// missing or mistyped ones surface as validation messages instead of a JSON
/// rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResultRequest {
    pub patient_id: Option<Value>,
    pub game_id: Option<Value>,
    pub results: Option<Value>,
    pub sound: Option<Value>,
    pub date: Option<Value>,
}

/// Partition label keys in monthly/yearly output; metrics may not reuse them
pub const MONTH_YEAR_LABEL: &str = "month-year";
pub const YEAR_LABEL: &str = "year";

/// Query string accepted by the listing and average endpoints
#[derive(Debug, Default, Deserialize)]
pub struct SoundQuery {
    pub sound: Option<String>,
}

/// Which records an aggregation runs over
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSelector {
    pub patient_id: Uuid,
    pub game_id: Uuid,
    /// `None` matches every sound condition
    pub sound_condition: Option<SoundCondition>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ResultSelector {
    /// Exact match on ids and sound, inclusive on both date bounds
    pub fn matches(&self, record: &ResultRecord) -> bool {
        record.patient_id == self.patient_id
            && record.game_id == self.game_id
            && self
                .sound_condition
                .as_ref()
                .map_or(true, |sound| *sound == record.sound_condition)
            && record.date >= self.start
            && record.date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    Raw,
    PeriodAverage,
    MonthlyAverage,
    YearlyAverage,
}

/// A stored record as returned by the raw listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    /// Always 1: each row is a single session
    pub days_logged: usize,
    #[serde(flatten)]
    pub record: ResultRecord,
}

/// Metric name -> mean over the whole selection
pub type PeriodAverage = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAverage {
    pub days_logged: usize,
    pub results: MonthlyResults,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyResults {
    /// `"<month>-<year>"`, month not zero padded
    #[serde(rename = "month-year")]
    pub month_year: String,
    #[serde(flatten)]
    pub averages: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyAverage {
    pub days_logged: usize,
    pub results: YearlyResults,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyResults {
    pub year: String,
    #[serde(flatten)]
    pub averages: BTreeMap<String, f64>,
}

/// Output of a single aggregation call, shaped by its mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Aggregation {
    Raw(Vec<RawEntry>),
    Period(PeriodAverage),
    Monthly(Vec<MonthlyAverage>),
    Yearly(Vec<YearlyAverage>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::models::Metrics;
    use chrono::TimeZone;
    use serde_json::json;

    fn selector(sound: Option<&str>) -> ResultSelector {
        ResultSelector {
            patient_id: Uuid::from_u128(1),
            game_id: Uuid::from_u128(2),
            sound_condition: sound.map(SoundCondition::new),
            start: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2023, 1, 31, 0, 0, 0).unwrap(),
        }
    }

    fn record(sound: &str, date: DateTime<Utc>) -> ResultRecord {
        ResultRecord {
            id: Uuid::new_v4(),
            patient_id: Uuid::from_u128(1),
            game_id: Uuid::from_u128(2),
            sound_condition: SoundCondition::new(sound),
            results: Metrics::from([("t".to_string(), json!(1))]),
            date,
        }
    }

    #[test]
    fn selector_bounds_are_inclusive() {
        let selector = selector(None);

        assert!(selector.matches(&record("true", selector.start)));
        assert!(selector.matches(&record("true", selector.end)));
        assert!(!selector.matches(&record(
            "true",
            selector.end + chrono::Duration::seconds(1)
        )));
    }

    #[test]
    fn selector_without_sound_matches_all_conditions() {
        let date = Utc.with_ymd_and_hms(2023, 1, 10, 0, 0, 0).unwrap();

        assert!(selector(None).matches(&record("true", date)));
        assert!(selector(None).matches(&record("false", date)));
        assert!(selector(Some("true")).matches(&record("true", date)));
        assert!(!selector(Some("true")).matches(&record("false", date)));
    }

    #[test]
    fn monthly_average_serializes_label_next_to_metrics() {
        let entry = MonthlyAverage {
            days_logged: 2,
            results: MonthlyResults {
                month_year: "2-2023".to_string(),
                averages: BTreeMap::from([("t".to_string(), 10.0)]),
            },
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({ "daysLogged": 2, "results": { "month-year": "2-2023", "t": 10.0 } })
        );
    }
}

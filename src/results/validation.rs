use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{
    errors::ResultsError,
    models::{Metrics, NewResult, SoundCondition},
    types::{CreateResultRequest, ResultSelector, MONTH_YEAR_LABEL, YEAR_LABEL},
};

/// Which end of a date range a path parameter describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

pub fn parse_id(field: &str, raw: &str) -> Result<Uuid, ResultsError> {
    Uuid::parse_str(raw)
        .map_err(|_| ResultsError::Validation(format!("Invalid {}, please check: {}", field, raw)))
}

/// Accepts `YYYY-MM-DD` or RFC 3339. A bare date used as an end bound covers
/// the whole UTC day.
pub fn parse_date(raw: &str, bound: DateBound) -> Result<DateTime<Utc>, ResultsError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = match bound {
            DateBound::Start => date.and_hms_opt(0, 0, 0),
            DateBound::End => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
        };
        if let Some(time) = time {
            return Ok(time.and_utc());
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|_| ResultsError::Validation(format!("Invalid date: {}", raw)))
}

pub fn build_selector(
    patient_id: &str,
    game_id: &str,
    initial_date: &str,
    final_date: &str,
    sound: Option<String>,
) -> Result<ResultSelector, ResultsError> {
    let selector = ResultSelector {
        patient_id: parse_id("patientId", patient_id)?,
        game_id: parse_id("gameId", game_id)?,
        sound_condition: sound.map(SoundCondition::new),
        start: parse_date(initial_date, DateBound::Start)?,
        end: parse_date(final_date, DateBound::End)?,
    };

    if selector.start > selector.end {
        return Err(ResultsError::Validation(format!(
            "initialDate {} is after finalDate {}",
            initial_date, final_date
        )));
    }

    Ok(selector)
}

/// Results must be a non-empty mapping of numbers whose names do not clash
/// with the monthly/yearly partition labels
pub fn validate_metrics(results: &Metrics) -> Result<(), ResultsError> {
    if results.is_empty() {
        return Err(ResultsError::Validation(
            "results must contain at least one metric".to_string(),
        ));
    }

    if let Some(reserved) = [MONTH_YEAR_LABEL, YEAR_LABEL]
        .into_iter()
        .find(|label| results.contains_key(*label))
    {
        return Err(ResultsError::Validation(format!(
            "results may not use the reserved metric name '{}'",
            reserved
        )));
    }

    let non_numeric: Vec<&str> = results
        .iter()
        .filter(|(_, value)| !value.is_number())
        .map(|(metric, _)| metric.as_str())
        .collect();

    if !non_numeric.is_empty() {
        return Err(ResultsError::Validation(format!(
            "results must be numeric: {}",
            non_numeric.join(", ")
        )));
    }

    Ok(())
}

/// Checks every required field, reporting all problems at once joined by " | "
pub fn validate_create_request(request: CreateResultRequest) -> Result<NewResult, ResultsError> {
    let mut problems = Vec::new();

    let patient_id = required(&mut problems, "patientId", request.patient_id, |raw| {
        parse_id("patientId", as_text("patientId", &raw)?)
    });
    let game_id = required(&mut problems, "gameId", request.game_id, |raw| {
        parse_id("gameId", as_text("gameId", &raw)?)
    });
    let sound_condition = required(&mut problems, "sound", request.sound, |raw| match raw {
        Value::Bool(flag) => Ok(SoundCondition::from(flag)),
        Value::String(text) => Ok(SoundCondition::new(text)),
        other => Err(ResultsError::Validation(format!(
            "sound must be a boolean or a string, got {}",
            other
        ))),
    });
    let results = required(&mut problems, "results", request.results, |raw| match raw {
        Value::Object(map) => Ok(map.into_iter().collect::<Metrics>()),
        _ => Err(ResultsError::Validation(
            "results must be an object".to_string(),
        )),
    });

    // date is optional; the store stamps the creation time when absent
    let date = match request.date {
        None | Some(Value::Null) => None,
        Some(raw) => as_text("date", &raw)
            .and_then(|text| parse_date(text, DateBound::Start))
            .map_err(|e| problems.push(message(e)))
            .ok(),
    };

    match (patient_id, game_id, sound_condition, results) {
        (Some(patient_id), Some(game_id), Some(sound_condition), Some(results))
            if problems.is_empty() =>
        {
            Ok(NewResult {
                patient_id,
                game_id,
                sound_condition,
                results,
                date,
            })
        }
        _ => Err(ResultsError::Validation(problems.join(" | "))),
    }
}

/// Parses a required field, recording a problem when it is missing or malformed
fn required<T, F>(
    problems: &mut Vec<String>,
    field: &str,
    raw: Option<Value>,
    parse: F,
) -> Option<T>
where
    F: FnOnce(Value) -> Result<T, ResultsError>,
{
    match raw {
        None | Some(Value::Null) => {
            problems.push(format!("{} is required", field));
            None
        }
        Some(raw) => parse(raw).map_err(|e| problems.push(message(e))).ok(),
    }
}

fn as_text<'a>(field: &str, raw: &'a Value) -> Result<&'a str, ResultsError> {
    raw.as_str()
        .ok_or_else(|| ResultsError::Validation(format!("{} must be a string", field)))
}

fn message(error: ResultsError) -> String {
    match error {
        ResultsError::Validation(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use rstest::rstest;
    use serde_json::json;

    const PATIENT: &str = "6f1c2b8e-4a53-4f0e-9d55-6b1f6a1a2c01";
    const GAME: &str = "0b7d8a3c-1e2f-4a5b-8c9d-0e1f2a3b4c5d";

    #[test]
    fn date_only_end_covers_the_whole_day() {
        let end = parse_date("2023-02-09", DateBound::End).unwrap();
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2023, 2, 9).unwrap());
        assert_eq!(end.hour(), 23);
        assert_eq!(end.minute(), 59);

        let start = parse_date("2023-02-09", DateBound::Start).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 2, 9, 0, 0, 0).unwrap());
    }

    #[test]
    fn rfc3339_is_taken_as_given() {
        let date = parse_date("2023-02-09T15:30:00-03:00", DateBound::End).unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2023, 2, 9, 18, 30, 0).unwrap());
    }

    #[rstest]
    #[case("09/02/2023")]
    #[case("2023-13-01")]
    #[case("")]
    fn rejects_unparseable_dates(#[case] raw: &str) {
        assert!(matches!(
            parse_date(raw, DateBound::Start),
            Err(ResultsError::Validation(_))
        ));
    }

    #[test]
    fn rejects_invalid_ids() {
        let err = parse_id("patientId", "abc123").unwrap_err();
        assert_eq!(
            err,
            ResultsError::Validation("Invalid patientId, please check: abc123".to_string())
        );
    }

    #[test]
    fn selector_rejects_reversed_range() {
        let result = build_selector(PATIENT, GAME, "2023-03-01", "2023-01-01", None);
        assert!(matches!(result, Err(ResultsError::Validation(_))));
    }

    #[test]
    fn selector_keeps_sound_filter() {
        let selector =
            build_selector(PATIENT, GAME, "2023-01-01", "2023-03-01", Some("true".into()))
                .unwrap();
        assert_eq!(selector.sound_condition, Some(SoundCondition::new("true")));
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({ "score": "high" }))]
    #[case(json!({ "score": 1, "level": null }))]
    fn rejects_empty_or_non_numeric_metrics(#[case] results: Value) {
        let metrics: Metrics = serde_json::from_value(results).unwrap();
        assert!(matches!(
            validate_metrics(&metrics),
            Err(ResultsError::Validation(_))
        ));
    }

    #[test]
    fn accepts_numeric_metrics() {
        let metrics: Metrics = serde_json::from_value(json!({ "score": 10, "time": 2.5 })).unwrap();
        assert_eq!(validate_metrics(&metrics), Ok(()));
    }

    #[test]
    fn create_request_reports_every_missing_field() {
        let err = validate_create_request(CreateResultRequest::default()).unwrap_err();
        assert_eq!(
            err,
            ResultsError::Validation(
                "patientId is required | gameId is required | sound is required | results is required"
                    .to_string()
            )
        );
    }

    #[test]
    fn create_request_builds_new_result() {
        let request = CreateResultRequest {
            patient_id: Some(json!(PATIENT)),
            game_id: Some(json!(GAME)),
            results: Some(json!({ "score": 10, "level": 3 })),
            sound: Some(json!(true)),
            date: None,
        };

        let new_result = validate_create_request(request).unwrap();
        assert_eq!(new_result.patient_id, Uuid::parse_str(PATIENT).unwrap());
        assert_eq!(new_result.results.len(), 2);
        assert_eq!(new_result.sound_condition.as_str(), "true");
    }

    #[rstest]
    #[case(json!({ "year": 5 }), "year")]
    #[case(json!({ "score": 1, "month-year": 2 }), "month-year")]
    fn rejects_metrics_named_like_partition_labels(#[case] results: Value, #[case] name: &str) {
        let metrics: Metrics = serde_json::from_value(results).unwrap();
        assert_eq!(
            validate_metrics(&metrics),
            Err(ResultsError::Validation(format!(
                "results may not use the reserved metric name '{}'",
                name
            )))
        );
    }

    #[test]
    fn create_request_accepts_date_only_and_string_sound() {
        let request = CreateResultRequest {
            patient_id: Some(json!(PATIENT)),
            game_id: Some(json!(GAME)),
            results: Some(json!({ "score": 10 })),
            sound: Some(json!("false")),
            date: Some(json!("2023-02-09")),
        };

        let new_result = validate_create_request(request).unwrap();
        assert_eq!(
            new_result.date,
            Some(Utc.with_ymd_and_hms(2023, 2, 9, 0, 0, 0).unwrap())
        );
        assert_eq!(new_result.sound_condition.as_str(), "false");
    }

    #[test]
    fn create_request_reports_mistyped_fields() {
        let request = CreateResultRequest {
            patient_id: Some(json!(5)),
            game_id: Some(json!(GAME)),
            results: Some(json!([1, 2])),
            sound: Some(json!(1)),
            date: Some(json!("yesterday")),
        };

        let err = validate_create_request(request).unwrap_err();
        assert_eq!(
            err,
            ResultsError::Validation(
                "patientId must be a string | sound must be a boolean or a string, got 1 \
                 | results must be an object | Invalid date: yesterday"
                    .to_string()
            )
        );
    }
}

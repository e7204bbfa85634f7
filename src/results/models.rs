use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Metric name -> logged value. The key set is whatever the game's result
/// schema declares, so nothing here assumes fixed fields.
pub type Metrics = BTreeMap<String, Value>;

/// Whether sound was enabled during the session, kept in its stringified form
/// ("true"/"false") so stored records and path filters compare as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SoundCondition(String);

impl SoundCondition {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<bool> for SoundCondition {
    fn from(value: bool) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SoundCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SoundCondition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Clients send either `true` or `"true"`
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Flag(flag) => SoundCondition::from(flag),
            Raw::Text(text) => SoundCondition(text),
        })
    }
}

/// One logged game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub game_id: Uuid,
    #[serde(rename = "sound")]
    pub sound_condition: SoundCondition,
    pub results: Metrics,
    pub date: DateTime<Utc>,
}

/// Validated fields for a record that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewResult {
    pub patient_id: Uuid,
    pub game_id: Uuid,
    pub sound_condition: SoundCondition,
    pub results: Metrics,
    pub date: Option<DateTime<Utc>>,
}

impl ResultRecord {
    /// Assigns a fresh id and stamps the creation time when no date was given
    pub fn from_new(new_result: NewResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id: new_result.patient_id,
            game_id: new_result.game_id,
            sound_condition: new_result.sound_condition,
            results: new_result.results,
            date: new_result.date.unwrap_or_else(Utc::now),
        }
    }
}

use chrono::{TimeZone, Utc};
use playtrack::results::{
    models::{Metrics, ResultRecord, SoundCondition},
    types::ResultSelector,
};
use serde_json::Value;
use uuid::Uuid;

// ============================================================================
// Record Builders
// ============================================================================

pub const PATIENT: u128 = 0x6f1c2b8e_4a53_4f0e_9d55_6b1f6a1a2c01;
pub const GAME: u128 = 0x0b7d8a3c_1e2f_4a5b_8c9d_0e1f2a3b4c5d;

pub struct RecordBuilder {
    sound: bool,
    date: (i32, u32, u32, u32),
    results: Metrics,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self {
            sound: true,
            date: (2023, 1, 1, 12),
            results: Metrics::new(),
        }
    }

    pub fn on(mut self, year: i32, month: u32, day: u32) -> Self {
        self.date = (year, month, day, self.date.3);
        self
    }

    pub fn at_hour(mut self, hour: u32) -> Self {
        self.date.3 = hour;
        self
    }

    pub fn without_sound(mut self) -> Self {
        self.sound = false;
        self
    }

    pub fn metric(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.results.insert(name.to_string(), value.into());
        self
    }

    pub fn build(self) -> ResultRecord {
        let (year, month, day, hour) = self.date;
        ResultRecord {
            id: Uuid::new_v4(),
            patient_id: Uuid::from_u128(PATIENT),
            game_id: Uuid::from_u128(GAME),
            sound_condition: SoundCondition::from(self.sound),
            results: self.results,
            date: Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap(),
        }
    }
}

/// The whole of `year`, any sound condition
pub fn year_selector(year: i32) -> ResultSelector {
    ResultSelector {
        patient_id: Uuid::from_u128(PATIENT),
        game_id: Uuid::from_u128(GAME),
        sound_condition: None,
        start: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(year, 12, 31, 23, 59, 59).unwrap(),
    }
}

use crate::utils::time::calculate_duration_minutes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// One timed occurrence logged under an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: i64,
    pub start_date: String, // YYYY-MM-DD
    pub start_time: String, // HH:MM
    pub end_date: String,   // YYYY-MM-DD
    pub end_time: String,   // HH:MM
    pub duration_minutes: u32,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl Record {
    pub fn from_input(id: i64, input: RecordInput, now: DateTime<Utc>) -> Self {
        let duration_minutes = calculate_duration_minutes(&input.start_time, &input.end_time);
        Self {
            id,
            start_date: input.start_date,
            start_time: input.start_time,
            end_date: input.end_date,
            end_time: input.end_time,
            duration_minutes,
            note: input.note,
            created_at: now,
        }
    }

    /// Start instant used to order records (newest first).
    /// Unparsable dates sort last.
    pub fn start_key(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(&self.start_time, "%H:%M").unwrap_or(NaiveTime::MIN);
        Some(date.and_time(time))
    }
}

/// User-supplied part of a record; id, duration and creation time are derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordInput {
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub note: String,
}

/// Sort records by start instant, newest first.
pub fn sort_newest_first(records: &mut [Record]) {
    records.sort_by(|a, b| b.start_key().cmp(&a.start_key()));
}

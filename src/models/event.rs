use super::record::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle of the remote document backing an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteRef(pub String);

impl RemoteRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tracked activity and its timed records.
///
/// `id` is client-generated (milliseconds since epoch, made strictly
/// increasing by `utils::ids::IdGenerator`) and is the business key used
/// both locally and on the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ref: Option<RemoteRef>,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub records: Vec<Record>,
}

impl Event {
    /// Costruttore per eventi creati localmente (nessun remote_ref, nessun record).
    pub fn new(id: i64, title: &str, description: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            remote_ref: None,
            title: title.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
            records: Vec::new(),
        }
    }

    /// The fields an UPDATE is allowed to overwrite on the remote document.
    pub fn mutable_fields(&self) -> EventFields {
        EventFields {
            title: self.title.clone(),
            description: self.description.clone(),
            records: self.records.clone(),
            updated_at: self.updated_at,
        }
    }

    pub fn record(&self, record_id: i64) -> Option<&Record> {
        self.records.iter().find(|r| r.id == record_id)
    }

    /// Sum of the durations of all records, in minutes.
    pub fn total_minutes(&self) -> u64 {
        self.records
            .iter()
            .map(|r| u64::from(r.duration_minutes))
            .sum()
    }

    pub fn longest_minutes(&self) -> u64 {
        self.records
            .iter()
            .map(|r| u64::from(r.duration_minutes))
            .max()
            .unwrap_or(0)
    }

    /// Mean record duration, rounded down; 0 without records.
    pub fn average_minutes(&self) -> u64 {
        match self.records.len() as u64 {
            0 => 0,
            n => self.total_minutes() / n,
        }
    }
}

/// Partial update payload: everything except identity and creation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFields {
    pub title: String,
    pub description: String,
    pub records: Vec<Record>,
    pub updated_at: DateTime<Utc>,
}

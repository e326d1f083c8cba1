//! Local persistent store: the event collection and the pending-mutation
//! queue, kept under two keys of a durable key-value store.
//!
//! Loading never fails. Whatever is found on disk is coerced into the
//! current schema here, so the rest of the crate only sees well-formed
//! `Event`s and `MutationTask`s.

mod memory;
mod sqlite;

pub use memory::MemoryKv;
pub use sqlite::SqliteKv;

use crate::errors::AppResult;
use crate::models::{Event, MutationTask, Record};
use crate::utils::time::calculate_duration_minutes;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

pub const KEY_EVENTS: &str = "time-track-events";
pub const KEY_QUEUE: &str = "time-track-queue";

/// Low-level durable storage, synchronous from the caller's perspective.
pub trait KvStore: Send {
    fn get(&self, key: &str) -> AppResult<Option<Value>>;

    fn set(&mut self, key: &str, value: &Value) -> AppResult<()>;

    fn remove(&mut self, key: &str) -> AppResult<()>;

    /// Write several keys as one unit. Implementations backed by a real
    /// database override this with a transaction.
    fn set_many(&mut self, entries: &[(&str, Value)]) -> AppResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

pub struct LocalStore {
    kv: Box<dyn KvStore>,
}

impl LocalStore {
    pub fn new(kv: impl KvStore + 'static) -> Self {
        Self { kv: Box::new(kv) }
    }

    /// Last saved state, or empty collections on first run / unreadable data.
    pub fn load(&self) -> (Vec<Event>, Vec<MutationTask>) {
        let events = match self.kv.get(KEY_EVENTS) {
            Ok(Some(raw)) => decode_events(raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                error!(error = %e, "failed to read stored events");
                Vec::new()
            }
        };

        let queue = match self.kv.get(KEY_QUEUE) {
            Ok(Some(raw)) => decode_queue(raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                error!(error = %e, "failed to read stored queue");
                Vec::new()
            }
        };

        debug!(events = events.len(), tasks = queue.len(), "local state loaded");
        (events, queue)
    }

    /// Persist both collections together. Returns false (after logging) when
    /// the write failed; the in-memory copy stays authoritative.
    pub fn save(&mut self, events: &[Event], queue: &[MutationTask]) -> bool {
        let encoded = serde_json::to_value(events).and_then(|ev| {
            let q = serde_json::to_value(queue)?;
            Ok((ev, q))
        });

        let (ev, q) = match encoded {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = %e, "failed to encode local state");
                return false;
            }
        };

        match self.kv.set_many(&[(KEY_EVENTS, ev), (KEY_QUEUE, q)]) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "failed to save local state");
                false
            }
        }
    }

    pub fn clear(&mut self) {
        for key in [KEY_EVENTS, KEY_QUEUE] {
            if let Err(e) = self.kv.remove(key) {
                warn!(key, error = %e, "failed to remove stored key");
            }
        }
    }
}

fn decode_events(raw: Value) -> Vec<Event> {
    let Value::Array(items) = raw else {
        warn!("stored events are not a list, starting empty");
        return Vec::new();
    };

    items.into_iter().filter_map(sanitize_event).collect()
}

fn decode_queue(raw: Value) -> Vec<MutationTask> {
    let Value::Array(items) = raw else {
        warn!("stored queue is not a list, starting empty");
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<MutationTask>(item) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(error = %e, "dropping unreadable queued task");
                None
            }
        })
        .collect()
}

/// Coerce one stored event into the current schema.
fn sanitize_event(mut raw: Value) -> Option<Event> {
    let obj = raw.as_object_mut()?;

    // createdAt is the fallback for every other missing timestamp
    let created_at = obj.get("createdAt").cloned().unwrap_or(Value::Null);

    if obj.get("updatedAt").is_none_or(Value::is_null) {
        obj.insert("updatedAt".into(), created_at.clone());
    }
    if obj.get("description").is_none_or(Value::is_null) {
        obj.insert("description".into(), json!(""));
    }

    let raw_records = match obj.remove("records") {
        Some(Value::Array(list)) => list,
        _ => Vec::new(),
    };
    obj.insert("records".into(), json!([]));

    let mut event: Event = match serde_json::from_value(raw) {
        Ok(ev) => ev,
        Err(e) => {
            warn!(error = %e, "dropping unreadable stored event");
            return None;
        }
    };

    event.records = raw_records
        .into_iter()
        .filter_map(|r| sanitize_record(r, &created_at))
        .collect();

    Some(event)
}

/// Legacy records carried a single `date`; newer fields fall back to it.
fn sanitize_record(mut raw: Value, event_created_at: &Value) -> Option<Record> {
    let obj = raw.as_object_mut()?;

    let is_blank = |v: Option<&Value>| v.and_then(Value::as_str).is_none_or(str::is_empty);

    if is_blank(obj.get("startDate"))
        && let Some(date) = obj.get("date").cloned()
    {
        obj.insert("startDate".into(), date);
    }
    if is_blank(obj.get("endDate"))
        && let Some(start) = obj.get("startDate").cloned()
    {
        obj.insert("endDate".into(), start);
    }
    for field in ["startDate", "endDate", "startTime", "endTime", "note"] {
        if obj.get(field).is_none_or(Value::is_null) {
            obj.insert(field.into(), json!(""));
        }
    }
    if obj.get("durationMinutes").and_then(Value::as_u64).is_none() {
        let start = obj.get("startTime").and_then(Value::as_str).unwrap_or("");
        let end = obj.get("endTime").and_then(Value::as_str).unwrap_or("");
        let minutes = calculate_duration_minutes(start, end);
        obj.insert("durationMinutes".into(), json!(minutes));
    }
    if is_blank(obj.get("createdAt")) {
        obj.insert("createdAt".into(), event_created_at.clone());
    }
    obj.remove("date");

    match serde_json::from_value(raw) {
        Ok(rec) => Some(rec),
        Err(e) => {
            warn!(error = %e, "dropping unreadable stored record");
            None
        }
    }
}

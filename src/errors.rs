//! Error type of the CLI, config and db layers.
//!
//! The sync core does not use it: local writes report `bool`/`Option`,
//! remote failures travel as `remote::RemoteError` inside the outcomes.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // input validation
    #[error("Invalid date format: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid time format: {0} (expected HH:MM)")]
    InvalidTime(String),

    #[error("Event title cannot be empty")]
    EmptyTitle,

    // lookups
    #[error("Event not found: {0}")]
    EventNotFound(i64),

    #[error("Record {record} not found in event {event}")]
    RecordNotFound { event: i64, record: i64 },

    #[error("No remote store configured")]
    RemoteDisabled,

    // config
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to save configuration")]
    ConfigSave,
}

pub type AppResult<T> = Result<T, AppError>;

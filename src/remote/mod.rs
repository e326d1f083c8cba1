//! Remote document store seen by the sync core.
//!
//! The remote side is an opaque collection of event documents plus a
//! collection of record documents, addressed by business id and scoped to
//! one owner. Which technology sits behind it is chosen at startup:
//!
//! - [`SqliteRemote`]: a SQLite file acting as the shared collection
//! - [`DisabledRemote`]: no remote configured, every call is unavailable

mod disabled;
mod probe;
mod sqlite;

pub use disabled::DisabledRemote;
pub use probe::{NetworkProbe, StaticProbe, SwitchProbe};
pub use sqlite::SqliteRemote;

use crate::models::{Event, EventFields, Record, RemoteRef};
use async_trait::async_trait;
use thiserror::Error;

/// Default number of documents returned by one listing call.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One page of a listing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }

    pub fn next(self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }
}

/// A record document, carrying the business id of its owning event.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRecord {
    pub event_id: i64,
    pub record: Record,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout: {0}")]
    Timeout(String),

    #[error("remote unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("rejected by remote: {0}")]
    Invalid(String),

    #[error("remote storage error: {0}")]
    Storage(String),
}

impl RemoteError {
    /// Transient failures: the task stays at the head of the queue and is
    /// retried on the next trigger without user involvement.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::Network(_) | RemoteError::Timeout(_) | RemoteError::Unavailable(_)
        )
    }

    /// Classify a free-form error message by its signature.
    pub fn from_message(msg: &str) -> Self {
        let lower = msg.to_lowercase();
        if lower.contains("timeout") || lower.contains("timed out") {
            RemoteError::Timeout(msg.to_string())
        } else if lower.contains("network") || lower.contains("connection") {
            RemoteError::Network(msg.to_string())
        } else if lower.contains("permission") || lower.contains("denied") {
            RemoteError::PermissionDenied(msg.to_string())
        } else {
            RemoteError::Invalid(msg.to_string())
        }
    }
}

impl From<rusqlite::Error> for RemoteError {
    fn from(e: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match &e {
            rusqlite::Error::SqliteFailure(f, _) => match f.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    RemoteError::Timeout(e.to_string())
                }
                ErrorCode::CannotOpen | ErrorCode::SystemIoFailure => {
                    RemoteError::Unavailable(e.to_string())
                }
                ErrorCode::PermissionDenied
                | ErrorCode::ReadOnly
                | ErrorCode::AuthorizationForStatementDenied => {
                    RemoteError::PermissionDenied(e.to_string())
                }
                ErrorCode::ConstraintViolation => RemoteError::Invalid(e.to_string()),
                // vfs and extension failures only carry a message
                _ => RemoteError::from_message(&e.to_string()),
            },
            _ => RemoteError::Storage(e.to_string()),
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Narrow interface to the remote collections, implicitly scoped to the
/// calling identity.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Look up the document of an event by its business id.
    async fn find_event(&self, id: i64) -> RemoteResult<Option<RemoteRef>>;

    /// One page of event documents, without their records.
    async fn fetch_events(&self, page: Page) -> RemoteResult<Vec<Event>>;

    /// One page of record documents.
    async fn fetch_records(&self, page: Page) -> RemoteResult<Vec<RemoteRecord>>;

    /// Insert a new event document (records included).
    async fn create_event(&self, event: &Event) -> RemoteResult<RemoteRef>;

    /// Overwrite the mutable fields of an existing document.
    async fn update_event(&self, remote_ref: &RemoteRef, fields: &EventFields) -> RemoteResult<()>;

    /// Remove an event document and its records.
    async fn delete_event(&self, remote_ref: &RemoteRef) -> RemoteResult<()>;

    /// Insert or replace one record document.
    async fn put_record(&self, event_id: i64, record: &Record) -> RemoteResult<()>;

    async fn delete_record(&self, event_id: i64, record_id: i64) -> RemoteResult<()>;
}

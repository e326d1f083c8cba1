use super::{Page, RemoteError, RemoteRecord, RemoteResult, RemoteStore};
use crate::models::{Event, EventFields, Record, RemoteRef};
use async_trait::async_trait;

/// Stand-in used when no remote store is configured. Every call fails with
/// a retryable error, so queued tasks simply wait.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRemote;

fn unavailable<T>() -> RemoteResult<T> {
    Err(RemoteError::Unavailable("remote store disabled".to_string()))
}

#[async_trait]
impl RemoteStore for DisabledRemote {
    async fn find_event(&self, _id: i64) -> RemoteResult<Option<RemoteRef>> {
        unavailable()
    }

    async fn fetch_events(&self, _page: Page) -> RemoteResult<Vec<Event>> {
        unavailable()
    }

    async fn fetch_records(&self, _page: Page) -> RemoteResult<Vec<RemoteRecord>> {
        unavailable()
    }

    async fn create_event(&self, _event: &Event) -> RemoteResult<RemoteRef> {
        unavailable()
    }

    async fn update_event(&self, _remote_ref: &RemoteRef, _fields: &EventFields) -> RemoteResult<()> {
        unavailable()
    }

    async fn delete_event(&self, _remote_ref: &RemoteRef) -> RemoteResult<()> {
        unavailable()
    }

    async fn put_record(&self, _event_id: i64, _record: &Record) -> RemoteResult<()> {
        unavailable()
    }

    async fn delete_record(&self, _event_id: i64, _record_id: i64) -> RemoteResult<()> {
        unavailable()
    }
}

//! What the queue processor and the reconciler report back.

use super::manager::{DataManager, Inner};
use super::reconciler::MergeReport;
use crate::models::MutationKind;
use crate::remote::RemoteError;
use std::sync::{Arc, Weak};

/// Result of one `process_queue` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Another flush was in progress; this call did nothing.
    AlreadyRunning,
    /// Nothing queued.
    Idle,
    /// No network; the queue is untouched.
    Offline,
    /// Every task was confirmed.
    Drained { applied: usize },
    /// A task failed and processing stopped with it at the head.
    Halted { applied: usize, retryable: bool },
}

/// Result of one `sync_from_remote` call. Failures are reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Unchanged { fetched: usize },
    Merged { fetched: usize, report: MergeReport },
    Failed(String),
}

/// Sink for non-retryable flush failures.
pub type SyncErrorCallback = Arc<dyn Fn(SyncError) + Send + Sync>;

/// A flush failure that needs a user decision. The task is still queued.
#[derive(Debug, Clone)]
pub struct SyncError {
    pub kind: MutationKind,
    pub task_id: String,
    pub event_id: i64,
    pub message: String,
    pub error: RemoteError,
    pub retry: RetryHandle,
}

/// Re-runs the queue processor of the manager that reported the error.
///
/// Holds a weak reference: an error kept around by the UI does not keep a
/// discarded manager alive.
#[derive(Debug, Clone)]
pub struct RetryHandle {
    manager: Weak<Inner>,
}

impl RetryHandle {
    pub(crate) fn new(inner: &Arc<Inner>) -> Self {
        Self {
            manager: Arc::downgrade(inner),
        }
    }

    /// Flush again. Returns `Idle` if the manager no longer exists.
    pub async fn retry(&self) -> FlushOutcome {
        match self.manager.upgrade() {
            Some(inner) => DataManager::from_inner(inner).process_queue().await,
            None => FlushOutcome::Idle,
        }
    }
}

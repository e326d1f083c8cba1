//! Offline-first synchronization core.
//!
//! [`DataManager`] owns the local event list and the mutation queue. Writes
//! land locally first and are replayed against the remote store by the
//! queue processor; the reconciler pulls remote changes back in.

mod backoff;
mod manager;
mod notify;
mod outcome;
mod processor;
mod queue;
mod reconciler;

pub use backoff::Backoff;
pub use manager::DataManager;
pub use notify::{ChangeBus, Listener, Subscription};
pub use outcome::{FlushOutcome, ReconcileOutcome, RetryHandle, SyncError, SyncErrorCallback};
pub use processor::SYNC_FAILED_MESSAGE;
pub use queue::MutationQueue;
pub use reconciler::{MergeReport, attach_records, fetch_snapshot, merge_remote};

use crate::remote::DEFAULT_PAGE_SIZE;
use std::time::Duration;

/// Runtime knobs of the sync core.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Start flushes and reconciliations in the background on startup and
    /// after every local write. Off in tests and one-shot CLI commands,
    /// which drive the processor explicitly.
    pub auto_sync: bool,
    pub page_size: usize,
    /// Period of [`DataManager::spawn_background_sync`].
    pub flush_interval: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            page_size: DEFAULT_PAGE_SIZE,
            flush_interval: Duration::from_secs(30),
            backoff_base: Duration::from_secs(2),
            backoff_max: Duration::from_secs(300),
        }
    }
}

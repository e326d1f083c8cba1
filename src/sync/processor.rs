//! Queue processor: replays pending tasks against the remote store, one at
//! a time, in enqueue order.

use super::manager::{DataManager, Inner};
use super::outcome::{FlushOutcome, RetryHandle, SyncError};
use crate::models::{Mutation, MutationTask, RemoteRef};
use crate::remote::{RemoteError, RemoteResult};
use std::sync::atomic::Ordering;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

/// Message attached to every reported sync failure.
pub const SYNC_FAILED_MESSAGE: &str = "Sync failed, please retry";

/// Clears the single-flight flag when a flush ends, however it ends.
struct FlightGuard<'a> {
    inner: &'a Inner,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.inner.processing.store(false, Ordering::SeqCst);
        self.inner.idle.notify_waiters();
    }
}

impl DataManager {
    /// Drain the queue head-first until it is empty or a task fails.
    ///
    /// Only one flush runs at a time; a call made while another is active
    /// returns `AlreadyRunning` without touching the queue.
    pub async fn process_queue(&self) -> FlushOutcome {
        let mut total = 0usize;

        loop {
            match self.flush_once().await {
                FlushOutcome::Drained { applied } => total += applied,
                FlushOutcome::Idle => {}
                FlushOutcome::Halted { applied, retryable } => {
                    return FlushOutcome::Halted {
                        applied: total + applied,
                        retryable,
                    };
                }
                other if total > 0 => {
                    debug!(outcome = ?other, "flush handed over");
                    return FlushOutcome::Drained { applied: total };
                }
                other => return other,
            }

            // a task queued after the last peek may have seen the flag still set
            if !self.has_changes() {
                break;
            }
            debug!("tasks queued during flush, draining again");
        }

        if total == 0 {
            FlushOutcome::Idle
        } else {
            FlushOutcome::Drained { applied: total }
        }
    }

    /// One pass over the queue under the single-flight flag.
    async fn flush_once(&self) -> FlushOutcome {
        let inner = &*self.inner;

        if inner.processing.swap(true, Ordering::SeqCst) {
            debug!("queue flush already running");
            return FlushOutcome::AlreadyRunning;
        }
        let _flight = FlightGuard { inner };

        let pending = { inner.lock_shared().queue.len() };
        if pending == 0 {
            return FlushOutcome::Idle;
        }

        if !inner.probe.is_online().await {
            info!(pending, "offline, queue flush postponed");
            return FlushOutcome::Offline;
        }

        info!(pending, "queue flush started");
        let mut applied = 0usize;

        loop {
            let head = { inner.lock_shared().queue.peek().cloned() };
            let Some(task) = head else {
                break;
            };

            debug!(
                task_id = %task.id,
                kind = %task.kind(),
                event_id = task.target_id(),
                "applying task"
            );

            match self.apply_task(&task).await {
                Ok(remote_ref) => {
                    self.confirm_task(&task, remote_ref);
                    inner.backoff().reset();
                    applied += 1;
                }
                Err(err) if err.is_retryable() => {
                    let delay = inner.backoff().record_failure(Instant::now());
                    warn!(
                        task_id = %task.id,
                        error = %err,
                        retry_in_ms = delay.as_millis() as u64,
                        "transient sync failure, queue halted"
                    );
                    return FlushOutcome::Halted {
                        applied,
                        retryable: true,
                    };
                }
                Err(err) => {
                    error!(
                        task_id = %task.id,
                        kind = %task.kind(),
                        error = %err,
                        "sync failed, task kept at queue head"
                    );
                    self.report_sync_error(&task, err);
                    return FlushOutcome::Halted {
                        applied,
                        retryable: false,
                    };
                }
            }
        }

        info!(applied, "queue drained");
        FlushOutcome::Drained { applied }
    }

    /// Flush and report whether nothing is left pending. If a flush is
    /// already running, waits for it instead of starting a second one.
    pub async fn sync_to_remote(&self) -> bool {
        if self.process_queue().await == FlushOutcome::AlreadyRunning {
            self.wait_idle().await;
        }
        !self.has_changes()
    }

    /// Resolve once no flush is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // register before checking the flag so a wake-up cannot slip between
            notified.as_mut().enable();

            if !self.inner.processing.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }

    /// Periodic flusher honouring the retry backoff. Abort the returned
    /// handle to stop it.
    pub fn spawn_background_sync(&self) -> JoinHandle<()> {
        let this = self.clone();

        tokio::spawn(async move {
            let mut ticker = interval(this.inner.config.flush_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let due = { this.inner.backoff().is_due(Instant::now()) };
                if !due {
                    debug!("background flush deferred by backoff");
                    continue;
                }
                if this.has_changes() {
                    this.process_queue().await;
                }
            }
        })
    }

    /// Perform the remote call(s) for one task. Returns the document handle
    /// of the target event when the call learned it.
    async fn apply_task(&self, task: &MutationTask) -> RemoteResult<Option<RemoteRef>> {
        let remote = &self.inner.remote;

        match &task.op {
            Mutation::Create(event) => match remote.find_event(event.id).await? {
                // a previous attempt got through before the ack was lost
                Some(existing) => {
                    debug!(event_id = event.id, "event already on remote, updating");
                    remote
                        .update_event(&existing, &event.mutable_fields())
                        .await?;
                    Ok(Some(existing))
                }
                None => Ok(Some(remote.create_event(event).await?)),
            },

            Mutation::Update(event) => match remote.find_event(event.id).await? {
                Some(existing) => {
                    remote
                        .update_event(&existing, &event.mutable_fields())
                        .await?;
                    Ok(Some(existing))
                }
                None => {
                    warn!(event_id = event.id, "update target missing on remote, skipped");
                    Ok(None)
                }
            },

            Mutation::Delete { id } => match remote.find_event(*id).await? {
                Some(existing) => match remote.delete_event(&existing).await {
                    Ok(()) | Err(RemoteError::NotFound(_)) => Ok(None),
                    Err(e) => Err(e),
                },
                None => {
                    debug!(event_id = id, "delete target already gone on remote");
                    Ok(None)
                }
            },
        }
    }

    /// Remove the applied head task and remember the remote handle.
    fn confirm_task(&self, task: &MutationTask, remote_ref: Option<RemoteRef>) {
        let mut guard = self.inner.lock_shared();
        let shared = &mut *guard;

        if let Mutation::Delete { id } = &task.op {
            shared.delete_confirmed(*id);
        }

        if let Some(remote_ref) = remote_ref
            && let Some(event) = shared.events.iter_mut().find(|e| e.id == task.target_id())
            && event.remote_ref.is_none()
        {
            event.remote_ref = Some(remote_ref);
        }

        if !shared.queue.confirm(&task.id) {
            warn!(task_id = %task.id, "applied task no longer at queue head");
        }
        shared.persist();
    }

    fn report_sync_error(&self, task: &MutationTask, err: RemoteError) {
        let sync_error = SyncError {
            kind: task.kind(),
            task_id: task.id.clone(),
            event_id: task.target_id(),
            message: SYNC_FAILED_MESSAGE.to_string(),
            error: err,
            retry: RetryHandle::new(&self.inner),
        };

        match self.inner.sync_error_callback() {
            Some(callback) => callback(sync_error),
            None => warn!(task_id = %task.id, "no sync error callback registered"),
        }
    }
}

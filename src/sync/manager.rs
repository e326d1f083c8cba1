//! The data manager: single source of truth for events on this device.
//!
//! Every write is applied to the in-memory list, appended to the mutation
//! queue and persisted under one lock, so the reconciler can never observe
//! a local change without its pending task. Listeners are notified after
//! the lock is released.

use super::backoff::Backoff;
use super::notify::{ChangeBus, Subscription};
use super::outcome::{ReconcileOutcome, SyncErrorCallback};
use super::queue::MutationQueue;
use super::{FlushOutcome, SyncConfig};
use crate::models::{Event, Mutation, MutationTask, Record, RecordInput};
use crate::remote::{NetworkProbe, RemoteStore};
use crate::store::LocalStore;
use crate::utils::ids::IdGenerator;
use crate::utils::time::calculate_duration_minutes;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

pub(crate) struct Shared {
    pub(crate) events: Vec<Event>,
    pub(crate) queue: MutationQueue,
    pub(crate) store: LocalStore,
    /// Remote pulls between fetch start and merge.
    pulls_in_flight: usize,
    /// Ids whose DELETE was confirmed while a pull was in flight. The
    /// snapshot of that pull may still list them.
    pub(crate) tombstones: HashSet<i64>,
}

impl Shared {
    /// Write events and queue back to durable storage.
    pub(crate) fn persist(&mut self) -> bool {
        self.store.save(&self.events, self.queue.as_slice())
    }

    pub(crate) fn begin_pull(&mut self) {
        self.pulls_in_flight += 1;
    }

    /// Tombstones outlive a pull only while another one is still running.
    pub(crate) fn finish_pull(&mut self) {
        self.pulls_in_flight = self.pulls_in_flight.saturating_sub(1);
        if self.pulls_in_flight == 0 {
            self.tombstones.clear();
        }
    }

    /// A DELETE for `id` was confirmed by the remote.
    pub(crate) fn delete_confirmed(&mut self, id: i64) {
        if self.pulls_in_flight > 0 {
            self.tombstones.insert(id);
        }
    }

    pub(crate) fn seed_ids(&self, ids: &IdGenerator) {
        let newest = self
            .events
            .iter()
            .flat_map(|e| std::iter::once(e.id).chain(e.records.iter().map(|r| r.id)))
            .max();
        if let Some(max) = newest {
            ids.seed(max);
        }
    }
}

pub(crate) struct Inner {
    pub(crate) shared: Mutex<Shared>,
    pub(crate) bus: ChangeBus,
    pub(crate) remote: Arc<dyn RemoteStore>,
    pub(crate) probe: Arc<dyn NetworkProbe>,
    pub(crate) config: SyncConfig,
    pub(crate) ids: IdGenerator,
    pub(crate) processing: AtomicBool,
    pub(crate) idle: Notify,
    pub(crate) backoff: Mutex<Backoff>,
    initialized: AtomicBool,
    on_sync_error: RwLock<Option<SyncErrorCallback>>,
}

impl Inner {
    pub(crate) fn lock_shared(&self) -> MutexGuard<'_, Shared> {
        // state stays usable even if a listener thread panicked mid-write
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn backoff(&self) -> MutexGuard<'_, Backoff> {
        self.backoff.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn sync_error_callback(&self) -> Option<SyncErrorCallback> {
        self.on_sync_error
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct DataManager {
    pub(crate) inner: Arc<Inner>,
}

impl DataManager {
    pub fn new(
        store: LocalStore,
        remote: Arc<dyn RemoteStore>,
        probe: Arc<dyn NetworkProbe>,
        config: SyncConfig,
    ) -> Self {
        let backoff = Backoff::new(config.backoff_base, config.backoff_max);
        Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared {
                    events: Vec::new(),
                    queue: MutationQueue::new(),
                    store,
                    pulls_in_flight: 0,
                    tombstones: HashSet::new(),
                }),
                bus: ChangeBus::new(),
                remote,
                probe,
                config,
                ids: IdGenerator::new(),
                processing: AtomicBool::new(false),
                idle: Notify::new(),
                backoff: Mutex::new(backoff),
                initialized: AtomicBool::new(false),
                on_sync_error: RwLock::new(None),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    /// Load persisted state. Runs once; later calls are no-ops.
    ///
    /// With `auto_sync` enabled and a tokio runtime available, a queue flush
    /// and a remote reconciliation are started in the background.
    pub fn initialize(&self) {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            return;
        }

        let (event_count, task_count) = {
            let mut shared = self.inner.lock_shared();
            let (events, tasks) = shared.store.load();
            shared.events = events;
            shared.queue = MutationQueue::from_tasks(tasks);
            shared.seed_ids(&self.inner.ids);
            (shared.events.len(), shared.queue.len())
        };

        info!(
            events = event_count,
            pending = task_count,
            "data manager initialized"
        );

        if event_count > 0 {
            self.inner.bus.notify();
        }

        if self.inner.config.auto_sync {
            self.spawn_detached(|this| async move {
                this.process_queue().await;
                this.sync_from_remote().await;
            });
        }
    }

    /// Foreground hook: push pending writes, then pull the remote snapshot.
    pub async fn on_foreground(&self) -> (FlushOutcome, ReconcileOutcome) {
        let flushed = self.process_queue().await;
        let pulled = self.sync_from_remote().await;
        (flushed, pulled)
    }

    /// Drop all local events and pending tasks (e.g. on logout).
    pub fn clear(&self) {
        {
            let mut shared = self.inner.lock_shared();
            shared.events.clear();
            shared.queue.clear();
            shared.store.clear();
        }
        self.inner.initialized.store(false, Ordering::SeqCst);
        info!("local state cleared");
        self.inner.bus.notify();
    }

    // ---------------------------------------------------------------
    // Observers
    // ---------------------------------------------------------------

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.bus.subscribe(listener)
    }

    /// Register the sink for non-retryable flush failures (replaces any
    /// previous one).
    pub fn set_sync_error_callback<F>(&self, callback: F)
    where
        F: Fn(super::SyncError) + Send + Sync + 'static,
    {
        *self
            .inner
            .on_sync_error
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(callback));
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Snapshot of all events, newest first.
    pub fn get_all_events(&self) -> Vec<Event> {
        self.inner.lock_shared().events.clone()
    }

    pub fn get_event_by_id(&self, id: i64) -> Option<Event> {
        self.inner
            .lock_shared()
            .events
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    /// Records of one event; empty when the event does not exist.
    pub fn get_records_by_event_id(&self, event_id: i64) -> Vec<Record> {
        self.get_event_by_id(event_id)
            .map(|e| e.records)
            .unwrap_or_default()
    }

    pub fn has_changes(&self) -> bool {
        !self.inner.lock_shared().queue.is_empty()
    }

    pub fn pending_changes_count(&self) -> usize {
        self.inner.lock_shared().queue.len()
    }

    pub fn pending_tasks(&self) -> Vec<MutationTask> {
        self.inner.lock_shared().queue.as_slice().to_vec()
    }

    pub fn is_processing(&self) -> bool {
        self.inner.processing.load(Ordering::SeqCst)
    }

    // ---------------------------------------------------------------
    // Event mutations
    // ---------------------------------------------------------------

    pub fn create_event(&self, title: &str, description: &str) -> Event {
        let event = Event::new(self.inner.ids.next_id(), title, description, Utc::now());

        {
            let mut guard = self.inner.lock_shared();
            let shared = &mut *guard;
            shared.events.insert(0, event.clone());
            shared.queue.enqueue(Mutation::Create(event.clone()));
            shared.persist();
        }

        debug!(event_id = event.id, "event created");
        self.changed();
        event
    }

    /// Replace the stored event with `event` (matched by id). Returns false
    /// when no such event exists.
    pub fn update_event(&self, event: Event) -> bool {
        self.modify_event(event.id, move |slot| {
            let created_at = slot.created_at;
            let remote_ref = slot.remote_ref.take();
            *slot = event;
            slot.created_at = created_at;
            // the caller may hold a copy taken before the CREATE was confirmed
            if slot.remote_ref.is_none() {
                slot.remote_ref = remote_ref;
            }
            true
        })
    }

    pub fn delete_event(&self, id: i64) -> bool {
        let removed = {
            let mut guard = self.inner.lock_shared();
            let shared = &mut *guard;
            match shared.events.iter().position(|e| e.id == id) {
                Some(idx) => {
                    shared.events.remove(idx);
                    shared.queue.enqueue(Mutation::Delete { id });
                    shared.persist();
                    true
                }
                None => false,
            }
        };

        if removed {
            debug!(event_id = id, "event deleted");
            self.changed();
        } else {
            warn!(event_id = id, "delete requested for unknown event");
        }
        removed
    }

    // ---------------------------------------------------------------
    // Record mutations (each one is an UPDATE of the parent event)
    // ---------------------------------------------------------------

    pub fn create_record(&self, event_id: i64, input: RecordInput) -> Option<Record> {
        let record = Record::from_input(self.inner.ids.next_id(), input, Utc::now());
        let added = record.clone();

        self.modify_event(event_id, move |event| {
            event.records.insert(0, added);
            true
        })
        .then_some(record)
    }

    /// Replace a record (matched by id). Duration is recomputed from the
    /// times.
    pub fn update_record(&self, event_id: i64, record: Record) -> bool {
        let mut record = record;
        record.duration_minutes = calculate_duration_minutes(&record.start_time, &record.end_time);

        self.modify_event(event_id, move |event| {
            match event.records.iter_mut().find(|r| r.id == record.id) {
                Some(slot) => {
                    *slot = record;
                    true
                }
                None => false,
            }
        })
    }

    pub fn delete_record(&self, event_id: i64, record_id: i64) -> bool {
        self.modify_event(event_id, move |event| {
            let before = event.records.len();
            event.records.retain(|r| r.id != record_id);
            event.records.len() != before
        })
    }

    /// Shared UPDATE path: edit the event in place, bump `updatedAt`, queue
    /// an UPDATE carrying the full new state. `edit` returns false to abort
    /// without any change.
    fn modify_event<F>(&self, id: i64, edit: F) -> bool
    where
        F: FnOnce(&mut Event) -> bool,
    {
        let applied = {
            let mut guard = self.inner.lock_shared();
            let shared = &mut *guard;

            match shared.events.iter_mut().find(|e| e.id == id) {
                Some(slot) => {
                    let mut draft = slot.clone();
                    if edit(&mut draft) {
                        draft.id = id;
                        draft.updated_at = Utc::now().max(slot.updated_at);
                        *slot = draft.clone();
                        shared.queue.enqueue(Mutation::Update(draft));
                        shared.persist();
                        true
                    } else {
                        false
                    }
                }
                None => false,
            }
        };

        if applied {
            debug!(event_id = id, "event updated");
            self.changed();
        } else {
            warn!(event_id = id, "update rejected: unknown event or record");
        }
        applied
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    /// Notify listeners, then kick a background flush.
    fn changed(&self) {
        self.inner.bus.notify();
        if self.inner.config.auto_sync {
            self.spawn_detached(|this| async move {
                this.process_queue().await;
            });
        }
    }

    /// Run `job` on the current tokio runtime, if there is one.
    fn spawn_detached<F, Fut>(&self, job: F)
    where
        F: FnOnce(DataManager) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(job(self.clone()));
            }
            Err(_) => debug!("no async runtime, background sync skipped"),
        }
    }
}

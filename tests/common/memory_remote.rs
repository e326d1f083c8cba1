use async_trait::async_trait;
use rtimetrack::models::{Event, EventFields, Record, RemoteRef};
use rtimetrack::remote::{Page, RemoteError, RemoteRecord, RemoteResult, RemoteStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;

#[derive(Debug, Default)]
struct Collections {
    events: Vec<(RemoteRef, Event)>,
    records: Vec<RemoteRecord>,
    next_doc: u64,
    /// Failure returned by every call while set (e.g. connectivity loss).
    outage: Option<RemoteError>,
    /// Failure returned by writes touching one business id.
    rejected: HashMap<i64, RemoteError>,
}

impl Collections {
    fn doc_index(&self, remote_ref: &RemoteRef) -> Option<usize> {
        self.events.iter().position(|(r, _)| r == remote_ref)
    }

    fn mint_ref(&mut self) -> RemoteRef {
        self.next_doc += 1;
        RemoteRef(format!("doc-{}", self.next_doc))
    }

    fn check_read(&self) -> RemoteResult<()> {
        match &self.outage {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn check_write(&self, event_id: i64) -> RemoteResult<()> {
        self.check_read()?;
        match self.rejected.get(&event_id) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn replace_records(&mut self, event_id: i64, records: &[Record]) {
        self.records.retain(|r| r.event_id != event_id);
        self.records.extend(records.iter().map(|r| RemoteRecord {
            event_id,
            record: r.clone(),
        }));
    }
}

/// In-process remote store with fault injection and a pause gate, so tests
/// can drive the queue processor through partial failures and overlapping
/// flushes.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    data: Mutex<Collections>,
    calls: AtomicUsize,
    gate: Mutex<Option<Arc<Semaphore>>>,
    /// Closed by `release_listings`; event listings wait on it after reading.
    listing_gate: Mutex<Option<Arc<Semaphore>>>,
    held_listings: AtomicUsize,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> MutexGuard<'_, Collections> {
        // a panicking test thread must not hide the collections from the others
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Counts the call, then waits while the remote is paused.
    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self
            .gate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(sem) = gate {
            // resolves once the semaphore is closed by `resume`
            let _ = sem.acquire().await;
        }
    }

    /// Hold every subsequent call until [`resume`](Self::resume).
    pub fn pause(&self) {
        *self.gate.lock().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn resume(&self) {
        if let Some(sem) = self.gate.lock().unwrap_or_else(|e| e.into_inner()).take() {
            sem.close();
        }
    }

    /// Let event listings read their page, then hold the answer until
    /// [`release_listings`](Self::release_listings). Simulates a slow
    /// response that is already stale when it arrives.
    pub fn hold_listings(&self) {
        *self.listing_gate.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_listings(&self) {
        if let Some(sem) = self
            .listing_gate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            sem.close();
        }
    }

    /// Event listings that have read their page and are being held.
    pub fn held_listings(&self) -> usize {
        self.held_listings.load(Ordering::SeqCst)
    }

    /// Number of calls received so far (paused ones included).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fail every call with `err` until [`clear_faults`](Self::clear_faults).
    pub fn set_outage(&self, err: RemoteError) {
        self.data().outage = Some(err);
    }

    /// Fail writes for one business id with `err`.
    pub fn reject_event(&self, id: i64, err: RemoteError) {
        self.data().rejected.insert(id, err);
    }

    pub fn clear_faults(&self) {
        let mut data = self.data();
        data.outage = None;
        data.rejected.clear();
    }

    /// Store an event as if another device had written it; replaces any
    /// document with the same business id.
    pub fn seed_event(&self, event: &Event) -> RemoteRef {
        let mut data = self.data();
        data.events.retain(|(_, e)| e.id != event.id);
        let remote_ref = event.remote_ref.clone().unwrap_or_else(|| data.mint_ref());

        let mut doc = event.clone();
        doc.remote_ref = Some(remote_ref.clone());
        doc.records.clear();
        data.events.push((remote_ref.clone(), doc));
        data.replace_records(event.id, &event.records);
        remote_ref
    }

    /// Full event (records attached) for a business id.
    pub fn event(&self, id: i64) -> Option<Event> {
        let data = self.data();
        let (_, doc) = data.events.iter().find(|(_, e)| e.id == id)?;
        let mut ev = doc.clone();
        ev.records = data
            .records
            .iter()
            .filter(|r| r.event_id == id)
            .map(|r| r.record.clone())
            .collect();
        Some(ev)
    }

    /// Number of documents carrying a business id (more than one is a duplicate).
    pub fn documents_for(&self, id: i64) -> usize {
        self.data().events.iter().filter(|(_, e)| e.id == id).count()
    }

    pub fn event_count(&self) -> usize {
        self.data().events.len()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn find_event(&self, id: i64) -> RemoteResult<Option<RemoteRef>> {
        self.enter().await;
        let data = self.data();
        data.check_read()?;
        Ok(data
            .events
            .iter()
            .find(|(_, e)| e.id == id)
            .map(|(r, _)| r.clone()))
    }

    async fn fetch_events(&self, page: Page) -> RemoteResult<Vec<Event>> {
        self.enter().await;
        let listing: Vec<Event> = {
            let data = self.data();
            data.check_read()?;

            let mut all: Vec<Event> = data.events.iter().map(|(_, e)| e.clone()).collect();
            all.sort_by(|a, b| b.id.cmp(&a.id));
            all.into_iter().skip(page.offset).take(page.limit).collect()
        };

        let gate = self
            .listing_gate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(sem) = gate {
            self.held_listings.fetch_add(1, Ordering::SeqCst);
            let _ = sem.acquire().await;
        }
        Ok(listing)
    }

    async fn fetch_records(&self, page: Page) -> RemoteResult<Vec<RemoteRecord>> {
        self.enter().await;
        let data = self.data();
        data.check_read()?;
        Ok(data
            .records
            .iter()
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect())
    }

    async fn create_event(&self, event: &Event) -> RemoteResult<RemoteRef> {
        self.enter().await;
        let mut data = self.data();
        data.check_write(event.id)?;

        let remote_ref = data.mint_ref();
        let mut doc = event.clone();
        doc.remote_ref = Some(remote_ref.clone());
        doc.records.clear();
        data.events.push((remote_ref.clone(), doc));
        data.replace_records(event.id, &event.records);
        Ok(remote_ref)
    }

    async fn update_event(&self, remote_ref: &RemoteRef, fields: &EventFields) -> RemoteResult<()> {
        self.enter().await;
        let mut data = self.data();
        data.check_read()?;

        let idx = data
            .doc_index(remote_ref)
            .ok_or_else(|| RemoteError::NotFound(remote_ref.to_string()))?;
        let event_id = data.events[idx].1.id;
        data.check_write(event_id)?;

        let doc = &mut data.events[idx].1;
        doc.title = fields.title.clone();
        doc.description = fields.description.clone();
        doc.updated_at = fields.updated_at;
        data.replace_records(event_id, &fields.records);
        Ok(())
    }

    async fn delete_event(&self, remote_ref: &RemoteRef) -> RemoteResult<()> {
        self.enter().await;
        let mut data = self.data();
        data.check_read()?;

        let idx = data
            .doc_index(remote_ref)
            .ok_or_else(|| RemoteError::NotFound(remote_ref.to_string()))?;
        let event_id = data.events[idx].1.id;
        data.check_write(event_id)?;

        data.events.remove(idx);
        data.records.retain(|r| r.event_id != event_id);
        Ok(())
    }

    async fn put_record(&self, event_id: i64, record: &Record) -> RemoteResult<()> {
        self.enter().await;
        let mut data = self.data();
        data.check_write(event_id)?;

        if !data.events.iter().any(|(_, e)| e.id == event_id) {
            return Err(RemoteError::NotFound(format!("event {event_id}")));
        }
        data.records
            .retain(|r| !(r.event_id == event_id && r.record.id == record.id));
        data.records.push(RemoteRecord {
            event_id,
            record: record.clone(),
        });
        Ok(())
    }

    async fn delete_record(&self, event_id: i64, record_id: i64) -> RemoteResult<()> {
        self.enter().await;
        let mut data = self.data();
        data.check_write(event_id)?;
        data.records
            .retain(|r| !(r.event_id == event_id && r.record.id == record_id));
        Ok(())
    }
}

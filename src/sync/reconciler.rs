//! Remote reconciler: pulls the full remote snapshot and merges it into the
//! local list with last-writer-wins on `updatedAt`.

use super::manager::DataManager;
use super::outcome::ReconcileOutcome;
use super::queue::MutationQueue;
use crate::models::record::sort_newest_first;
use crate::models::{Event, Record};
use crate::remote::{Page, RemoteRecord, RemoteResult, RemoteStore};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// What a merge did to the local list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Remote events inserted locally.
    pub added: usize,
    /// Local events overwritten by a newer remote version.
    pub updated: usize,
    /// Remote events ignored because a local task for them is pending.
    pub skipped_pending: usize,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        self.added + self.updated > 0
    }
}

/// Read every page of a listing, stopping on an empty or short page.
async fn fetch_all<T, F, Fut>(page_size: usize, mut fetch: F) -> RemoteResult<Vec<T>>
where
    F: FnMut(Page) -> Fut,
    Fut: Future<Output = RemoteResult<Vec<T>>>,
{
    let page_size = page_size.max(1);
    let mut page = Page::first(page_size);
    let mut all = Vec::new();

    loop {
        let batch = fetch(page).await?;
        let n = batch.len();
        all.extend(batch);
        if n < page_size {
            break;
        }
        page = page.next();
    }
    Ok(all)
}

/// Full remote snapshot: every event document with its records attached.
pub async fn fetch_snapshot(remote: &dyn RemoteStore, page_size: usize) -> RemoteResult<Vec<Event>> {
    let mut events = fetch_all(page_size, |page| remote.fetch_events(page)).await?;
    let records = fetch_all(page_size, |page| remote.fetch_records(page)).await?;

    debug!(
        events = events.len(),
        records = records.len(),
        "remote snapshot fetched"
    );

    attach_records(&mut events, records);
    Ok(events)
}

/// Group record documents under their events, newest first. Records whose
/// event is not in the snapshot are dropped.
pub fn attach_records(events: &mut [Event], records: Vec<RemoteRecord>) {
    let mut by_event: HashMap<i64, Vec<Record>> = HashMap::new();
    for doc in records {
        by_event.entry(doc.event_id).or_default().push(doc.record);
    }

    for event in events.iter_mut() {
        event.records = by_event.remove(&event.id).unwrap_or_default();
        sort_newest_first(&mut event.records);
    }

    if !by_event.is_empty() {
        warn!(orphans = by_event.len(), "remote records without an event ignored");
    }
}

/// Merge a remote snapshot into `local`.
///
/// - unknown id, nothing pending: inserted
/// - known id, nothing pending: overwritten only if the remote `updatedAt`
///   is strictly newer
/// - any pending task for the id, or a delete confirmed after the snapshot
///   was read (`deleted`): the local state wins, untouched
///
/// Events missing from the snapshot are kept. On any change `local` is
/// re-sorted by id, newest first.
pub fn merge_remote(
    local: &mut Vec<Event>,
    queue: &MutationQueue,
    deleted: &HashSet<i64>,
    remote: Vec<Event>,
) -> MergeReport {
    let mut report = MergeReport::default();
    let mut index: HashMap<i64, usize> = local.iter().enumerate().map(|(i, e)| (e.id, i)).collect();

    for incoming in remote {
        if queue.is_pending(incoming.id) || deleted.contains(&incoming.id) {
            report.skipped_pending += 1;
            continue;
        }

        match index.get(&incoming.id).copied() {
            None => {
                index.insert(incoming.id, local.len());
                local.push(incoming);
                report.added += 1;
            }
            Some(i) => {
                let current = &mut local[i];
                if incoming.updated_at > current.updated_at {
                    let known_ref = current.remote_ref.take();
                    *current = incoming;
                    if current.remote_ref.is_none() {
                        current.remote_ref = known_ref;
                    }
                    report.updated += 1;
                }
            }
        }
    }

    if report.changed() {
        local.sort_by(|a, b| b.id.cmp(&a.id));
    }
    report
}

impl DataManager {
    /// Pull the remote snapshot and merge it. Failures are logged and
    /// reported, local state is left as it was.
    pub async fn sync_from_remote(&self) -> ReconcileOutcome {
        let inner = &*self.inner;
        info!("remote reconciliation started");

        // deletes confirmed from here on are remembered until the merge
        inner.lock_shared().begin_pull();

        let snapshot = match fetch_snapshot(inner.remote.as_ref(), inner.config.page_size).await {
            Ok(events) => events,
            Err(e) => {
                inner.lock_shared().finish_pull();
                warn!(error = %e, "remote reconciliation failed");
                return ReconcileOutcome::Failed(e.to_string());
            }
        };
        let fetched = snapshot.len();

        let report = {
            let mut guard = inner.lock_shared();
            let shared = &mut *guard;
            let report = merge_remote(
                &mut shared.events,
                &shared.queue,
                &shared.tombstones,
                snapshot,
            );
            shared.finish_pull();
            if report.changed() {
                shared.seed_ids(&inner.ids);
                shared.persist();
            }
            report
        };

        if !report.changed() {
            debug!(fetched, "local state already up to date");
            return ReconcileOutcome::Unchanged { fetched };
        }

        info!(
            fetched,
            added = report.added,
            updated = report.updated,
            skipped = report.skipped_pending,
            "remote changes merged"
        );
        inner.bus.notify();
        ReconcileOutcome::Merged { fetched, report }
    }
}

use rtimetrack::models::Event;
use rtimetrack::remote::{Page, RemoteError, RemoteStore, SqliteRemote, StaticProbe};
use rtimetrack::store::{LocalStore, SqliteKv};
use rtimetrack::sync::{DataManager, ReconcileOutcome};
use std::sync::Arc;
use tempfile::tempdir;

mod common;
use common::{manual_config, record, ts};

fn open(dir: &tempfile::TempDir, owner: &str) -> SqliteRemote {
    let path = dir.path().join("remote.sqlite");
    SqliteRemote::open(path.to_str().unwrap(), owner).unwrap()
}

#[tokio::test]
async fn create_find_update_delete() {
    let dir = tempdir().unwrap();
    let remote = open(&dir, "alice");

    let mut ev = Event::new(1, "Run", "", ts(0));
    ev.records.push(record(11, "2025-03-01", "08:00", "09:00"));

    let doc = remote.create_event(&ev).await.unwrap();
    assert_eq!(remote.find_event(1).await.unwrap(), Some(doc.clone()));
    assert_eq!(remote.find_event(2).await.unwrap(), None);

    ev.title = "Long run".into();
    ev.updated_at = ts(10);
    ev.records = vec![record(12, "2025-03-02", "08:00", "10:00")];
    remote.update_event(&doc, &ev.mutable_fields()).await.unwrap();

    let events = remote.fetch_events(Page::first(20)).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Long run");
    assert_eq!(events[0].updated_at, ts(10));
    assert_eq!(events[0].remote_ref, Some(doc.clone()));

    // records are replaced as a whole
    let records = remote.fetch_records(Page::first(20)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record.id, 12);
    assert_eq!(records[0].record.duration_minutes, 120);

    remote.delete_event(&doc).await.unwrap();
    assert_eq!(remote.find_event(1).await.unwrap(), None);
    assert!(remote.fetch_records(Page::first(20)).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_documents_report_not_found() {
    let dir = tempdir().unwrap();
    let remote = open(&dir, "alice");
    let ghost = rtimetrack::models::RemoteRef("nope".into());
    let fields = Event::new(1, "x", "", ts(0)).mutable_fields();

    assert!(matches!(
        remote.update_event(&ghost, &fields).await,
        Err(RemoteError::NotFound(_))
    ));
    assert!(matches!(
        remote.delete_event(&ghost).await,
        Err(RemoteError::NotFound(_))
    ));
    assert!(matches!(
        remote.put_record(1, &record(1, "2025-03-01", "08:00", "09:00")).await,
        Err(RemoteError::NotFound(_))
    ));
}

#[tokio::test]
async fn duplicate_business_ids_are_rejected() {
    let dir = tempdir().unwrap();
    let remote = open(&dir, "alice");
    let ev = Event::new(1, "Run", "", ts(0));

    remote.create_event(&ev).await.unwrap();
    let err = remote.create_event(&ev).await.unwrap_err();
    assert!(matches!(err, RemoteError::Invalid(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn single_record_documents() {
    let dir = tempdir().unwrap();
    let remote = open(&dir, "alice");
    remote.create_event(&Event::new(1, "Run", "", ts(0))).await.unwrap();

    let mut rec = record(5, "2025-03-01", "08:00", "09:00");
    remote.put_record(1, &rec).await.unwrap();
    rec.note = "tempo".into();
    remote.put_record(1, &rec).await.unwrap();

    let records = remote.fetch_records(Page::first(20)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record.note, "tempo");

    remote.delete_record(1, 5).await.unwrap();
    assert!(remote.fetch_records(Page::first(20)).await.unwrap().is_empty());
}

#[tokio::test]
async fn owners_do_not_see_each_other() {
    let dir = tempdir().unwrap();
    let alice = open(&dir, "alice");
    let bob = open(&dir, "bob");

    alice.create_event(&Event::new(1, "Run", "", ts(0))).await.unwrap();
    bob.create_event(&Event::new(1, "Swim", "", ts(0))).await.unwrap();

    let mine = alice.fetch_events(Page::first(20)).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].title, "Run");
    assert_eq!(bob.owner(), "bob");
}

#[tokio::test]
async fn paging_walks_the_whole_collection() {
    let dir = tempdir().unwrap();
    let remote = open(&dir, "alice");
    for id in 1..=5 {
        remote.create_event(&Event::new(id, "e", "", ts(id))).await.unwrap();
    }

    let first = remote.fetch_events(Page::first(2)).await.unwrap();
    let second = remote.fetch_events(Page::first(2).next()).await.unwrap();
    let third = remote.fetch_events(Page::first(2).next().next()).await.unwrap();

    let ids: Vec<i64> = first.iter().chain(&second).chain(&third).map(|e| e.id).collect();
    assert_eq!(ids, vec![5, 4, 3, 2, 1]);
}

fn device(dir: &tempfile::TempDir, name: &str) -> DataManager {
    let local = dir.path().join(format!("{name}.sqlite"));
    let remote = dir.path().join("remote.sqlite");

    let manager = DataManager::new(
        LocalStore::new(SqliteKv::open(local.to_str().unwrap()).unwrap()),
        Arc::new(SqliteRemote::open(remote.to_str().unwrap(), "alice").unwrap()),
        Arc::new(StaticProbe(true)),
        manual_config(),
    );
    manager.initialize();
    manager
}

#[tokio::test]
async fn two_devices_converge_through_the_shared_file() {
    let dir = tempdir().unwrap();
    let laptop = device(&dir, "laptop");
    let phone = device(&dir, "phone");

    let ev = laptop.create_event("Run", "5k");
    laptop.create_record(
        ev.id,
        rtimetrack::models::RecordInput {
            start_date: "2025-03-01".into(),
            start_time: "08:00".into(),
            end_date: "2025-03-01".into(),
            end_time: "08:30".into(),
            note: String::new(),
        },
    );
    assert!(laptop.sync_to_remote().await);

    let outcome = phone.sync_from_remote().await;
    assert!(matches!(outcome, ReconcileOutcome::Merged { fetched: 1, .. }));

    let seen = phone.get_event_by_id(ev.id).unwrap();
    assert_eq!(seen.title, "Run");
    assert_eq!(seen.records.len(), 1);
    assert_eq!(seen.total_minutes(), 30);

    // an edit on the phone flows back
    let mut edit = seen.clone();
    edit.title = "Run (easy)".into();
    phone.update_event(edit);
    assert!(phone.sync_to_remote().await);

    laptop.sync_from_remote().await;
    assert_eq!(laptop.get_event_by_id(ev.id).unwrap().title, "Run (easy)");
}

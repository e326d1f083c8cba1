use rtimetrack::db::pool::DbPool;
use rtimetrack::models::{Event, Mutation, MutationTask};
use rtimetrack::store::{KEY_EVENTS, KEY_QUEUE, KvStore, LocalStore, MemoryKv, SqliteKv};
use serde_json::json;
use tempfile::tempdir;

mod common;
use common::{record, ts};

#[test]
fn first_run_loads_empty_state() {
    let store = LocalStore::new(MemoryKv::new());
    let (events, queue) = store.load();
    assert!(events.is_empty());
    assert!(queue.is_empty());
}

#[test]
fn legacy_events_are_coerced_into_the_current_shape() {
    let raw = json!([
        {
            "id": 1700000000000_i64,
            "title": "Gym",
            "createdAt": "2024-01-05T10:00:00Z"
        },
        {
            "id": 1700000000001_i64,
            "title": "Piano",
            "description": "scales",
            "createdAt": "2024-01-06T10:00:00Z",
            "updatedAt": "2024-01-07T10:00:00Z",
            "records": [
                { "id": 1, "date": "2024-01-06", "startTime": "18:00", "endTime": "18:45" }
            ]
        }
    ]);
    let store = LocalStore::new(MemoryKv::new().with_entry(KEY_EVENTS, raw));

    let (events, _) = store.load();
    assert_eq!(events.len(), 2);

    let gym = &events[0];
    assert_eq!(gym.description, "");
    assert!(gym.records.is_empty());
    assert_eq!(gym.updated_at, gym.created_at);

    let rec = &events[1].records[0];
    assert_eq!(rec.start_date, "2024-01-06");
    assert_eq!(rec.end_date, "2024-01-06");
    assert_eq!(rec.duration_minutes, 45);
    assert_eq!(rec.note, "");
    assert_eq!(rec.created_at, events[1].created_at);
}

#[test]
fn absurd_record_times_load_without_panicking() {
    let events = json!([{
        "id": 3,
        "title": "Run",
        "createdAt": "2024-01-05T10:00:00Z",
        "records": [{
            "id": 4,
            "startDate": "2024-01-05",
            "startTime": "999999999999999999:00",
            "endTime": "01:00"
        }]
    }]);
    let store = LocalStore::new(MemoryKv::new().with_entry(KEY_EVENTS, events));

    let (events, _) = store.load();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].records[0].duration_minutes, 60);
}

#[test]
fn unreadable_items_are_dropped_not_fatal() {
    let events = json!([
        { "id": "not a number", "title": 3 },
        { "id": 5, "title": "ok", "createdAt": "2024-01-05T10:00:00Z", "records": "oops" },
        "garbage"
    ]);
    let queue = json!([
        { "id": "t1", "op": { "type": "BOGUS" }, "enqueuedAt": "2024-01-05T10:00:00Z" },
        { "id": "t2", "op": { "type": "DELETE", "payload": { "id": 5 } }, "enqueuedAt": "2024-01-05T10:00:00Z" }
    ]);
    let store = LocalStore::new(
        MemoryKv::new()
            .with_entry(KEY_EVENTS, events)
            .with_entry(KEY_QUEUE, queue),
    );

    let (events, queue) = store.load();
    assert_eq!(events.len(), 1);
    assert!(events[0].records.is_empty());
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].op, Mutation::Delete { id: 5 });
}

#[test]
fn non_list_values_load_as_empty() {
    let store = LocalStore::new(
        MemoryKv::new()
            .with_entry(KEY_EVENTS, json!({"not": "a list"}))
            .with_entry(KEY_QUEUE, json!(42)),
    );
    let (events, queue) = store.load();
    assert!(events.is_empty());
    assert!(queue.is_empty());
}

#[test]
fn tasks_serialize_with_a_type_tag() {
    let task = MutationTask::new(Mutation::Delete { id: 7 }, ts(0));
    let value = serde_json::to_value(&task).unwrap();

    assert_eq!(value["op"], json!({ "type": "DELETE", "payload": { "id": 7 } }));
    assert!(value["enqueuedAt"].is_string());

    let ev = Event::new(9, "Run", "", ts(0));
    let value = serde_json::to_value(MutationTask::new(Mutation::Create(ev), ts(0))).unwrap();
    assert_eq!(value["op"]["type"], "CREATE");
    assert_eq!(value["op"]["payload"]["title"], "Run");
}

#[test]
fn sqlite_store_round_trips_both_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("local.sqlite");
    let path = path.to_str().unwrap();

    let mut ev = Event::new(1, "Run", "", ts(0));
    ev.records.push(record(2, "2025-03-01", "08:00", "09:15"));
    let queue = vec![MutationTask::new(Mutation::Create(ev.clone()), ts(1))];

    {
        let mut store = LocalStore::new(SqliteKv::open(path).unwrap());
        assert!(store.save(std::slice::from_ref(&ev), &queue));
    }

    let store = LocalStore::new(SqliteKv::open(path).unwrap());
    let (events, tasks) = store.load();
    assert_eq!(events, vec![ev]);
    assert_eq!(tasks, queue);
}

#[test]
fn corrupt_sqlite_value_is_treated_as_absent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("local.sqlite");
    let path = path.to_str().unwrap();

    let kv = SqliteKv::open(path).unwrap();
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute(
        "INSERT INTO kv_store (key, value) VALUES (?1, '{broken json')",
        [KEY_EVENTS],
    )
    .unwrap();

    assert_eq!(kv.get(KEY_EVENTS).unwrap(), None);
    let (events, _) = LocalStore::new(kv).load();
    assert!(events.is_empty());
}

#[test]
fn clear_removes_both_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("local.sqlite");
    let path = path.to_str().unwrap();

    let mut store = LocalStore::new(SqliteKv::open(path).unwrap());
    store.save(&[Event::new(1, "Run", "", ts(0))], &[]);
    store.clear();

    let kv = SqliteKv::open(path).unwrap();
    assert_eq!(kv.get(KEY_EVENTS).unwrap(), None);
    assert_eq!(kv.get(KEY_QUEUE).unwrap(), None);
}

#[test]
fn in_memory_sqlite_store_works_without_a_file() {
    let kv = SqliteKv::from_pool(DbPool::in_memory().unwrap()).unwrap();
    let mut store = LocalStore::new(kv);

    let ev = Event::new(7, "Swim", "pool", ts(0));
    assert!(store.save(std::slice::from_ref(&ev), &[]));

    let (events, tasks) = store.load();
    assert_eq!(events, vec![ev]);
    assert!(tasks.is_empty());
}

#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, TimeZone, Utc};
use rtimetrack::models::{Event, Record};
use rtimetrack::remote::SwitchProbe;
use rtimetrack::store::{LocalStore, MemoryKv};
use rtimetrack::sync::{DataManager, SyncConfig};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

mod memory_remote;
pub use memory_remote::MemoryRemote;

pub fn rti() -> Command {
    cargo_bin_cmd!("rtimetrack")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rtimetrack.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Local + remote DB paths for one CLI test, both initialized.
pub fn init_cli_env(name: &str) -> (String, String) {
    let db = setup_test_db(name);
    let remote = setup_test_db(&format!("{name}_remote"));

    rti()
        .args(["--db", &db, "--remote", &remote, "--test", "init"])
        .assert()
        .success();

    (db, remote)
}

/// Sync settings for deterministic tests: nothing runs in the background.
pub fn manual_config() -> SyncConfig {
    SyncConfig {
        auto_sync: false,
        ..SyncConfig::default()
    }
}

/// Manager over an in-memory store, plus handles to drive the remote and
/// the network state.
pub struct Harness {
    pub manager: DataManager,
    pub remote: Arc<MemoryRemote>,
    pub probe: SwitchProbe,
}

pub fn harness() -> Harness {
    harness_with(LocalStore::new(MemoryKv::new()), Arc::new(MemoryRemote::new()))
}

pub fn harness_with(store: LocalStore, remote: Arc<MemoryRemote>) -> Harness {
    harness_config(store, remote, manual_config())
}

pub fn harness_config(store: LocalStore, remote: Arc<MemoryRemote>, config: SyncConfig) -> Harness {
    let probe = SwitchProbe::new(true);
    let manager = DataManager::new(store, remote.clone(), Arc::new(probe.clone()), config);
    manager.initialize();
    Harness {
        manager,
        remote,
        probe,
    }
}

/// Poll `cond` until it holds; false after ~5s. Sleeping lets spawned
/// background work run, also on a single-threaded test runtime.
pub async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..500 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

/// Counts change notifications.
pub fn counter(manager: &DataManager) -> Arc<AtomicUsize> {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    // the subscription stays alive for the whole test
    let _ = manager.subscribe(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });
    hits
}

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// An event as another device would have written it.
pub fn remote_event(id: i64, title: &str, updated_at: DateTime<Utc>) -> Event {
    let mut ev = Event::new(id, title, "", ts(0));
    ev.updated_at = updated_at;
    ev
}

pub fn record(id: i64, date: &str, start: &str, end: &str) -> Record {
    Record {
        id,
        start_date: date.to_string(),
        start_time: start.to_string(),
        end_date: date.to_string(),
        end_time: end.to_string(),
        duration_minutes: rtimetrack::utils::calculate_duration_minutes(start, end),
        note: String::new(),
        created_at: ts(0),
    }
}

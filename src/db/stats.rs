use crate::db::migrate::applied_versions;
use crate::db::pool::DbPool;
use crate::store::{KEY_EVENTS, KEY_QUEUE};
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use rusqlite::OptionalExtension;
use std::fs;

/// Length of the JSON array stored under `key`, if any.
fn stored_len(pool: &DbPool, key: &str) -> rusqlite::Result<Option<usize>> {
    let raw: Option<String> = pool
        .conn
        .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;

    Ok(raw
        .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok())
        .and_then(|v| v.as_array().map(|a| a.len())))
}

pub fn print_db_info(pool: &DbPool, db_path: &str) -> rusqlite::Result<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_kb = (file_size as f64) / 1024.0;

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.1} KB", CYAN, RESET, file_kb);

    //
    // 2) LOCAL STATE
    //
    let fmt = |n: Option<usize>| match n {
        Some(n) => format!("{GREEN}{n}{RESET}"),
        None => format!("{GREY}--{RESET}"),
    };
    println!(
        "{}• Local events:{} {}",
        CYAN,
        RESET,
        fmt(stored_len(pool, KEY_EVENTS)?)
    );
    println!(
        "{}• Pending tasks:{} {}",
        CYAN,
        RESET,
        fmt(stored_len(pool, KEY_QUEUE)?)
    );

    //
    // 3) REMOTE COLLECTIONS (only populated when this file is a remote store)
    //
    let remote_events: i64 =
        pool.conn
            .query_row("SELECT COUNT(*) FROM remote_events", [], |row| row.get(0))?;
    let remote_records: i64 =
        pool.conn
            .query_row("SELECT COUNT(*) FROM remote_records", [], |row| row.get(0))?;
    println!(
        "{}• Remote documents:{} {} events, {} records",
        CYAN, RESET, remote_events, remote_records
    );

    //
    // 4) MIGRATIONS
    //
    println!("{}• Migrations:{}", CYAN, RESET);
    for v in applied_versions(&pool.conn)? {
        println!("    {}", v);
    }

    println!();
    Ok(())
}

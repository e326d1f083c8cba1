use rusqlite::{Connection, OptionalExtension, Result};
use tracing::{debug, info};

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Local key-value table backing `store::SqliteKv`.
fn ensure_kv_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS kv_store (
            key    TEXT PRIMARY KEY,
            value  TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Document collections backing `remote::SqliteRemote`.
fn ensure_remote_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS remote_events (
            doc_id       TEXT PRIMARY KEY,
            owner        TEXT NOT NULL,
            id           INTEGER NOT NULL,
            title        TEXT NOT NULL,
            description  TEXT NOT NULL DEFAULT '',
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS remote_records (
            doc_id            TEXT PRIMARY KEY,
            owner             TEXT NOT NULL,
            event_id          INTEGER NOT NULL,
            id                INTEGER NOT NULL,
            start_date        TEXT NOT NULL,
            start_time        TEXT NOT NULL,
            end_date          TEXT NOT NULL,
            end_time          TEXT NOT NULL,
            duration_minutes  INTEGER NOT NULL DEFAULT 0 CHECK(duration_minutes >= 0),
            note              TEXT NOT NULL DEFAULT '',
            created_at        TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// A schema change applied once and remembered in the `log` table.
struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20250310_0001_kv_updated_at",
        description: "Track last write time of kv_store entries",
        sql: "ALTER TABLE kv_store ADD COLUMN updated_at TEXT NOT NULL DEFAULT '';",
    },
    Migration {
        version: "20250402_0002_remote_business_keys",
        description: "One remote document per (owner, business id)",
        sql: r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_remote_events_owner_id
                ON remote_events(owner, id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_remote_records_owner_event_id
                ON remote_records(owner, event_id, id);
        "#,
    },
];

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, m: &Migration) -> Result<()> {
    // 1) Verifica se già applicata
    if is_applied(conn, m.version)? {
        debug!(version = m.version, "migration already applied");
        return Ok(());
    }

    // 2) Esegui la migrazione + 3) marca come applicata, nella stessa transazione
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(m.sql)?;
    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [m.version, m.description],
    )?;
    tx.commit()?;

    info!(version = m.version, "{}", m.description);
    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invocata da db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_log_table(conn)?;
    ensure_kv_table(conn)?;
    ensure_remote_tables(conn)?;

    for m in MIGRATIONS {
        apply(conn, m)?;
    }

    Ok(())
}

/// Versions recorded as applied, oldest first.
pub fn applied_versions(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.collect()
}

use super::{Page, RemoteError, RemoteRecord, RemoteResult, RemoteStore};
use crate::db::initialize::open_db;
use crate::errors::AppResult;
use crate::models::{Event, EventFields, Record, RemoteRef};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Remote collections kept in a SQLite file, typically shared by several
/// local databases (one per device) under the same owner.
///
/// Calls run on tokio's blocking pool so the async caller never stalls on
/// file I/O.
pub struct SqliteRemote {
    conn: Arc<Mutex<Connection>>,
    owner: String,
}

impl SqliteRemote {
    pub fn open(path: &str, owner: &str) -> AppResult<Self> {
        let pool = open_db(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(pool.conn)),
            owner: owner.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    async fn run<F, T>(&self, func: F) -> RemoteResult<T>
    where
        F: FnOnce(&mut Connection, &str) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let owner = self.owner.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| RemoteError::Storage("remote connection poisoned".to_string()))?;
            func(&mut *guard, &owner).map_err(RemoteError::from)
        })
        .await
        .map_err(|e| RemoteError::from_message(&e.to_string()))?
    }
}

fn parse_ts(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn map_event(row: &Row) -> rusqlite::Result<Event> {
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Event {
        id: row.get("id")?,
        remote_ref: Some(RemoteRef(row.get("doc_id")?)),
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
        records: Vec::new(),
    })
}

fn map_record(row: &Row) -> rusqlite::Result<RemoteRecord> {
    let created_at: String = row.get("created_at")?;

    Ok(RemoteRecord {
        event_id: row.get("event_id")?,
        record: Record {
            id: row.get("id")?,
            start_date: row.get("start_date")?,
            start_time: row.get("start_time")?,
            end_date: row.get("end_date")?,
            end_time: row.get("end_time")?,
            duration_minutes: row.get("duration_minutes")?,
            note: row.get("note")?,
            created_at: parse_ts(&created_at)?,
        },
    })
}

fn upsert_record(tx: &Transaction, owner: &str, event_id: i64, rec: &Record) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO remote_records (doc_id, owner, event_id, id, start_date, start_time,
                                     end_date, end_time, duration_minutes, note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(owner, event_id, id) DO UPDATE SET
             start_date = excluded.start_date,
             start_time = excluded.start_time,
             end_date = excluded.end_date,
             end_time = excluded.end_time,
             duration_minutes = excluded.duration_minutes,
             note = excluded.note",
        params![
            uuid::Uuid::new_v4().to_string(),
            owner,
            event_id,
            rec.id,
            rec.start_date,
            rec.start_time,
            rec.end_date,
            rec.end_time,
            rec.duration_minutes,
            rec.note,
            rec.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Business id stored in a document, if the document exists.
fn event_id_of(tx: &Transaction, owner: &str, doc_id: &str) -> rusqlite::Result<Option<i64>> {
    tx.query_row(
        "SELECT id FROM remote_events WHERE owner = ?1 AND doc_id = ?2",
        params![owner, doc_id],
        |row| row.get(0),
    )
    .optional()
}

#[async_trait]
impl RemoteStore for SqliteRemote {
    async fn find_event(&self, id: i64) -> RemoteResult<Option<RemoteRef>> {
        self.run(move |conn, owner| {
            conn.query_row(
                "SELECT doc_id FROM remote_events WHERE owner = ?1 AND id = ?2 LIMIT 1",
                params![owner, id],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map(|doc| doc.map(RemoteRef))
        })
        .await
    }

    async fn fetch_events(&self, page: Page) -> RemoteResult<Vec<Event>> {
        self.run(move |conn, owner| {
            let mut stmt = conn.prepare_cached(
                "SELECT doc_id, id, title, description, created_at, updated_at
                 FROM remote_events
                 WHERE owner = ?1
                 ORDER BY id DESC
                 LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt.query_map(
                params![owner, page.limit as i64, page.offset as i64],
                map_event,
            )?;
            rows.collect()
        })
        .await
    }

    async fn fetch_records(&self, page: Page) -> RemoteResult<Vec<RemoteRecord>> {
        self.run(move |conn, owner| {
            let mut stmt = conn.prepare_cached(
                "SELECT event_id, id, start_date, start_time, end_date, end_time,
                        duration_minutes, note, created_at
                 FROM remote_records
                 WHERE owner = ?1
                 ORDER BY event_id ASC, id ASC
                 LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt.query_map(
                params![owner, page.limit as i64, page.offset as i64],
                map_record,
            )?;
            rows.collect()
        })
        .await
    }

    async fn create_event(&self, event: &Event) -> RemoteResult<RemoteRef> {
        let event = event.clone();
        let doc_id = uuid::Uuid::new_v4().to_string();

        self.run(move |conn, owner| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO remote_events (doc_id, owner, id, title, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    doc_id,
                    owner,
                    event.id,
                    event.title,
                    event.description,
                    event.created_at.to_rfc3339(),
                    event.updated_at.to_rfc3339(),
                ],
            )?;
            for rec in &event.records {
                upsert_record(&tx, owner, event.id, rec)?;
            }
            tx.commit()?;

            debug!(event_id = event.id, doc_id = %doc_id, "remote event created");
            Ok(RemoteRef(doc_id))
        })
        .await
    }

    async fn update_event(&self, remote_ref: &RemoteRef, fields: &EventFields) -> RemoteResult<()> {
        let doc_id = remote_ref.0.clone();
        let fields = fields.clone();

        let found = self
            .run(move |conn, owner| {
                let tx = conn.transaction()?;
                let Some(event_id) = event_id_of(&tx, owner, &doc_id)? else {
                    return Ok(false);
                };

                tx.execute(
                    "UPDATE remote_events
                     SET title = ?1, description = ?2, updated_at = ?3
                     WHERE owner = ?4 AND doc_id = ?5",
                    params![
                        fields.title,
                        fields.description,
                        fields.updated_at.to_rfc3339(),
                        owner,
                        doc_id,
                    ],
                )?;

                // records are a sub-field of the event: replace the whole set
                tx.execute(
                    "DELETE FROM remote_records WHERE owner = ?1 AND event_id = ?2",
                    params![owner, event_id],
                )?;
                for rec in &fields.records {
                    upsert_record(&tx, owner, event_id, rec)?;
                }
                tx.commit()?;
                Ok(true)
            })
            .await?;

        if found {
            Ok(())
        } else {
            Err(RemoteError::NotFound(remote_ref.to_string()))
        }
    }

    async fn delete_event(&self, remote_ref: &RemoteRef) -> RemoteResult<()> {
        let doc_id = remote_ref.0.clone();

        let found = self
            .run(move |conn, owner| {
                let tx = conn.transaction()?;
                let Some(event_id) = event_id_of(&tx, owner, &doc_id)? else {
                    return Ok(false);
                };
                tx.execute(
                    "DELETE FROM remote_records WHERE owner = ?1 AND event_id = ?2",
                    params![owner, event_id],
                )?;
                tx.execute(
                    "DELETE FROM remote_events WHERE owner = ?1 AND doc_id = ?2",
                    params![owner, doc_id],
                )?;
                tx.commit()?;
                Ok(true)
            })
            .await?;

        if found {
            Ok(())
        } else {
            Err(RemoteError::NotFound(remote_ref.to_string()))
        }
    }

    async fn put_record(&self, event_id: i64, record: &Record) -> RemoteResult<()> {
        let record = record.clone();

        let found = self
            .run(move |conn, owner| {
                let tx = conn.transaction()?;
                let exists: Option<i64> = tx
                    .query_row(
                        "SELECT 1 FROM remote_events WHERE owner = ?1 AND id = ?2",
                        params![owner, event_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if exists.is_none() {
                    return Ok(false);
                }
                upsert_record(&tx, owner, event_id, &record)?;
                tx.commit()?;
                Ok(true)
            })
            .await?;

        if found {
            Ok(())
        } else {
            Err(RemoteError::NotFound(format!("event {event_id}")))
        }
    }

    async fn delete_record(&self, event_id: i64, record_id: i64) -> RemoteResult<()> {
        self.run(move |conn, owner| {
            conn.execute(
                "DELETE FROM remote_records WHERE owner = ?1 AND event_id = ?2 AND id = ?3",
                params![owner, event_id, record_id],
            )?;
            Ok(())
        })
        .await
    }
}

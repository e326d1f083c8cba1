use super::KvStore;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use chrono::Local;
use rusqlite::{OptionalExtension, params};
use serde_json::Value;
use tracing::warn;

/// `kv_store` table of a local SQLite file.
pub struct SqliteKv {
    pool: DbPool,
}

impl SqliteKv {
    /// Open (and migrate) the database at `path`.
    pub fn open(path: &str) -> AppResult<Self> {
        let pool = DbPool::new(path)?;
        init_db(&pool.conn)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: DbPool) -> AppResult<Self> {
        init_db(&pool.conn)?;
        Ok(Self { pool })
    }
}

impl KvStore for SqliteKv {
    fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let raw: Option<String> = self
            .pool
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;

        match raw {
            None => Ok(None),
            Some(s) => match serde_json::from_str(&s) {
                Ok(v) => Ok(Some(v)),
                Err(e) => {
                    // corrupt value: treated as absent, never fatal
                    warn!(key, error = %e, "discarding corrupt kv value");
                    Ok(None)
                }
            },
        }
    }

    fn set(&mut self, key: &str, value: &Value) -> AppResult<()> {
        self.set_many(&[(key, value.clone())])
    }

    fn remove(&mut self, key: &str) -> AppResult<()> {
        self.pool
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(())
    }

    fn set_many(&mut self, entries: &[(&str, Value)]) -> AppResult<()> {
        let now = Local::now().to_rfc3339();
        self.pool.with_conn(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                    updated_at = excluded.updated_at",
                )?;
                for (key, value) in entries {
                    stmt.execute(params![*key, value.to_string(), now])?;
                }
            }
            tx.commit()
        })?;
        Ok(())
    }
}

//! SQLite-backed store, one row per key

use crate::{DbError, DbResult};
use flood_core::{KvStore, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);";

/// `rusqlite::Connection` is not `Sync`, so it sits behind a mutex and
/// every statement runs on the blocking pool.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> DbResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, op: F) -> DbResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> DbResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| DbError::ConfigError("sqlite connection poisoned".into()))?;
            op(&guard)
        })
        .await?
    }
}

#[async_trait::async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let key = key.to_string();
        let raw = self
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT value FROM documents WHERE key = ?1",
                        params![key],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?)
            })
            .await?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let key = key.to_string();
        let text = serde_json::to_string(&value)?;
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO documents (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, text],
            )?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let key = key.to_string();
        self.run(move |conn| {
            conn.execute("DELETE FROM documents WHERE key = ?1", params![key])?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn take(&self, key: &str) -> StoreResult<Option<Value>> {
        let key = key.to_string();
        let raw = self
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        "DELETE FROM documents WHERE key = ?1 RETURNING value",
                        params![key],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?)
            })
            .await?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let prefix = prefix.to_string();
        let keys = self
            .run(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT key FROM documents
                     WHERE substr(key, 1, length(?1)) = ?1
                     ORDER BY key",
                )?;
                let rows = stmt.query_map(params![prefix], |row| row.get::<_, String>(0))?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            })
            .await?;
        Ok(keys)
    }
}

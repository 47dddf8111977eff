//! MySQL-backed store, one row per key

use crate::DbResult;
use flood_core::{KvStore, StoreResult};
use serde_json::Value;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS flood_documents (
    doc_key VARCHAR(255) NOT NULL PRIMARY KEY,
    doc_value LONGTEXT NOT NULL
)";

/// Store wrapping an sqlx connection pool
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Connect and make sure the documents table exists
    pub async fn connect(database_url: &str) -> DbResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl KvStore for MySqlStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT doc_value FROM flood_documents WHERE doc_key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(crate::DbError::from)?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let text = serde_json::to_string(&value)?;
        sqlx::query(
            "INSERT INTO flood_documents (doc_key, doc_value) VALUES (?, ?)
             ON DUPLICATE KEY UPDATE doc_value = VALUES(doc_value)",
        )
        .bind(key)
        .bind(text)
        .execute(&self.pool)
        .await
        .map_err(crate::DbError::from)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM flood_documents WHERE doc_key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(crate::DbError::from)?;
        Ok(())
    }

    async fn take(&self, key: &str) -> StoreResult<Option<Value>> {
        let mut tx = self.pool.begin().await.map_err(crate::DbError::from)?;
        let raw: Option<String> = sqlx::query_scalar(
            "SELECT doc_value FROM flood_documents WHERE doc_key = ? FOR UPDATE",
        )
        .bind(key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(crate::DbError::from)?;
        if raw.is_some() {
            sqlx::query("DELETE FROM flood_documents WHERE doc_key = ?")
                .bind(key)
                .execute(&mut *tx)
                .await
                .map_err(crate::DbError::from)?;
        }
        tx.commit().await.map_err(crate::DbError::from)?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        // `_` is a LIKE wildcard, so over-match here and filter exactly below
        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT doc_key FROM flood_documents
             WHERE doc_key LIKE CONCAT(?, '%')
             ORDER BY doc_key",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::DbError::from)?;
        Ok(keys.into_iter().filter(|k| k.starts_with(prefix)).collect())
    }
}

//! Document store backends
//!
//! Every backend implements [`flood_core::KvStore`]. The in-memory store
//! backs tests and throwaway runs, the file store keeps one JSON file per
//! key, and the SQL stores keep one row per key.

pub mod fs;
pub mod memory;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use fs::*;
pub use memory::*;
#[cfg(feature = "mysql")]
pub use mysql::*;
#[cfg(feature = "sqlite")]
pub use sqlite::*;

use flood_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[cfg(feature = "mysql")]
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Stored value is not valid JSON: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("Blocking database task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::InvalidDocument(e) => StoreError::Json(e),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

//! Station services on top of the document store
//!
//! Wraps the pure rules from `flood-core` with the store round-trips:
//! the station push path, the rolling history, the notification mailbox,
//! the aggregate view and the administrative operations.

pub mod admin;
pub mod history;
pub mod mailbox;
pub mod overview;
pub mod station;

pub use admin::*;
pub use history::*;
pub use mailbox::*;
pub use overview::*;
pub use station::*;

use flood_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Normalize a station name, rejecting blank ones
pub(crate) fn required_key(station: &str) -> EngineResult<String> {
    let key = flood_core::station_key(station);
    if key.is_empty() {
        return Err(EngineError::Validation("station name required".into()));
    }
    Ok(key)
}

//! Core types and pure policy for the flood monitor
//!
//! This crate holds everything that decides station state without doing
//! I/O: weather classification, the interval policy, the push merge, the
//! history rules and the store seam the other crates plug into.

pub mod classify;
pub mod history;
pub mod policy;
pub mod reconcile;
pub mod simulate;
pub mod store;
pub mod types;

pub use classify::*;
pub use history::*;
pub use policy::*;
pub use reconcile::*;
pub use simulate::*;
pub use store::{get_json, keys, set_json, KvStore, StoreError, StoreResult};
pub use types::*;

//! Rolling history buffer rules

use crate::types::HistoryEntry;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept per station
pub const HISTORY_CAP: usize = 500;

/// Entries older than this are dropped on every write
pub const HISTORY_WINDOW_HOURS: i64 = 24;

/// Apply one write to a station's history.
///
/// Existing invalid entries are purged, `incoming` is appended only if
/// valid, entries older than the window are dropped and the result is
/// capped to the most recent [`HISTORY_CAP`] entries.
pub fn prune(
    mut entries: Vec<HistoryEntry>,
    incoming: Option<HistoryEntry>,
    now: DateTime<Utc>,
) -> Vec<HistoryEntry> {
    entries.retain(HistoryEntry::is_valid);

    if let Some(entry) = incoming.filter(HistoryEntry::is_valid) {
        entries.push(entry);
    }

    let cutoff = now - Duration::hours(HISTORY_WINDOW_HOURS);
    entries.retain(|e| e.ts >= cutoff);

    if entries.len() > HISTORY_CAP {
        let overflow = entries.len() - HISTORY_CAP;
        entries.drain(0..overflow);
    }

    entries
}

/// Summary of a station's history for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub station: String,
    pub count: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    pub first: Option<HistoryEntry>,
    pub last: Option<HistoryEntry>,
}

impl HistorySummary {
    pub fn new(station: impl Into<String>, entries: &[HistoryEntry]) -> Self {
        let first = entries.first().copied();
        let last = entries.last().copied();
        Self {
            station: station.into(),
            count: entries.len(),
            oldest: first.map(|e| e.ts),
            latest: last.map(|e| e.ts),
            first,
            last,
        }
    }
}

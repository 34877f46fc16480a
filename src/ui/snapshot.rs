//! The immutable per-cycle view published to the dashboard.

use serde::Serialize;

use crate::data::models::MatchEntity;

/// One table row: A cell, minute, B cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub minute: String,
    pub a: String,
    pub b: String,
}

impl TableRow {
    pub fn new(minute: &str, a: &str, b: &str) -> Self {
        Self {
            minute: minute.to_string(),
            a: a.to_string(),
            b: b.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotCounts {
    pub a_total: usize,
    pub b_total: usize,
    pub linked_total: usize,
    pub pending_total: usize,
}

/// Complete rendered state of one cycle. Replaced wholesale, never patched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub last_update: String,
    pub counts: SnapshotCounts,
    pub linked_rows: Vec<TableRow>,
    pub pending_rows: Vec<TableRow>,
    /// Pending A matches with their source-native names.
    pub a_pending: Vec<MatchEntity>,
    pub b_pending: Vec<MatchEntity>,
    /// Full page, still carrying the view-mode marker.
    #[serde(skip)]
    pub html: String,
}

//! Checkpoint ledger: per-protocol freshness plus the resume cursor

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Timestamp of an entry that has never been refreshed
pub const NEVER_UPDATED: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointEntry {
    pub id: String,
    /// Epoch seconds of the last successful refresh
    pub updated_at: i64,
}

impl CheckpointEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            updated_at: NEVER_UPDATED,
        }
    }
}

/// Entry order is significant: `cursor` is a position in `entries`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    pub entries: Vec<CheckpointEntry>,
    pub cursor: usize,
    pub last_run_at: i64,
}

impl Ledger {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a never-updated entry for every identifier not yet tracked.
    ///
    /// Existing entries keep their positions, so a persisted cursor still
    /// points at the same protocol afterwards. Identifiers are never removed.
    pub fn reconcile<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut known: HashSet<String> = self.entries.iter().map(|e| e.id.clone()).collect();

        for id in ids {
            let id = id.as_ref();
            if known.insert(id.to_string()) {
                self.entries.push(CheckpointEntry::new(id));
            }
        }

        self
    }

    /// Where the next sweep starts; `None` when there is nothing to sweep
    pub fn start_index(&self) -> Option<usize> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.cursor % self.entries.len())
        }
    }

    /// In-memory half of a successful refresh. Returns false for an
    /// out-of-range index, leaving the ledger untouched.
    pub fn mark_updated(&mut self, index: usize, timestamp: i64) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.updated_at = timestamp;
                self.cursor = index;
                self.last_run_at = timestamp;
                true
            }
            None => false,
        }
    }
}

//! Decides which ledger entries are due for a refresh

use crate::models::ledger::NEVER_UPDATED;

/// Default refresh interval in seconds (24 hours)
pub const DEFAULT_REFRESH_INTERVAL_SECS: i64 = 86400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    refresh_interval_secs: i64,
}

impl StalenessPolicy {
    pub fn new(refresh_interval_secs: i64) -> Self {
        Self {
            refresh_interval_secs,
        }
    }

    pub fn refresh_interval_secs(&self) -> i64 {
        self.refresh_interval_secs
    }

    /// Due iff `last_update <= now - interval`. Never-updated entries are
    /// always due; anything else is merely not due yet.
    pub fn is_due(&self, last_update: i64, now: i64) -> bool {
        last_update == NEVER_UPDATED
            || last_update <= now.saturating_sub(self.refresh_interval_secs)
    }
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL_SECS)
    }
}

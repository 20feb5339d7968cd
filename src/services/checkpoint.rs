//! Checkpoint ledger persistence
//!
//! The ledger is read once per sweep and written back after every single
//! refreshed protocol, so a crash loses at most the in-flight one.

use crate::error::{SyncError, SyncResult};
use crate::models::ledger::Ledger;
use crate::services::store::ProtocolStore;

/// Persisted ledger, or an empty one on first run
pub async fn load<S>(store: &S) -> SyncResult<Ledger>
where
    S: ProtocolStore + ?Sized,
{
    match store.load_ledger().await? {
        Some(ledger) => {
            tracing::debug!(
                entries = ledger.len(),
                cursor = ledger.cursor,
                last_run_at = ledger.last_run_at,
                "Loaded checkpoint ledger"
            );
            Ok(ledger)
        }
        None => {
            tracing::info!("No checkpoint ledger found, starting fresh");
            Ok(Ledger::empty())
        }
    }
}

/// Mark `index` refreshed at `timestamp`, move the cursor there and persist
/// the whole ledger.
///
/// The in-memory ledger is only changed once the write has succeeded, so
/// memory never runs ahead of what is stored.
pub async fn record_success<S>(
    store: &S,
    ledger: &mut Ledger,
    index: usize,
    timestamp: i64,
) -> SyncResult<()>
where
    S: ProtocolStore + ?Sized,
{
    let mut next = ledger.clone();
    if !next.mark_updated(index, timestamp) {
        return Err(SyncError::Ledger(format!(
            "Index {} out of range for {} entries",
            index,
            ledger.len()
        )));
    }

    store.save_ledger(&next).await?;
    *ledger = next;

    Ok(())
}

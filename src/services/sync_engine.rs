//! Protocol sync engine
//!
//! One sweep:
//! 1. Fetch the protocol list and persist every summary
//! 2. Load the checkpoint ledger and append newly listed protocols
//! 3. Walk the ledger once, circularly, starting at the resume cursor
//! 4. For each due entry: fetch detail, replace its rows, persist the
//!    merged summary, then persist the ledger with the cursor on that entry
//!
//! Any transport or store error aborts the sweep. Progress made before the
//! error is already durable, so a retried sweep only redoes the in-flight
//! protocol.

use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{SyncError, SyncResult};
use crate::models::ledger::Ledger;
use crate::models::protocol::ProtocolSummary;
use crate::services::catalog::CatalogClient;
use crate::services::checkpoint;
use crate::services::normalize::normalize_detail;
use crate::services::staleness::StalenessPolicy;
use crate::services::store::ProtocolStore;

/// Source of "now" in epoch seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Outcome of one completed sweep
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Ledger as persisted at the end of the sweep
    pub ledger: Ledger,
    /// Ledger positions refreshed, in the order they were processed
    pub refreshed: Vec<usize>,
    /// Protocols appended to the ledger by this sweep
    pub discovered: usize,
    /// Entries not due yet
    pub skipped_fresh: usize,
    /// Entries with no listing or no detail upstream; left stale
    pub missing_upstream: usize,
    pub tvl_rows: usize,
    pub token_rows: usize,
}

pub struct SyncEngine<C, S> {
    catalog: C,
    store: S,
    policy: StalenessPolicy,
    request_delay: Duration,
    clock: Box<dyn Clock>,
}

impl<C, S> SyncEngine<C, S>
where
    C: CatalogClient,
    S: ProtocolStore,
{
    pub fn new(catalog: C, store: S, policy: StalenessPolicy) -> Self {
        Self {
            catalog,
            store,
            policy,
            request_delay: Duration::ZERO,
            clock: Box::new(SystemClock),
        }
    }

    /// Pause between detail fetches
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> StalenessPolicy {
        self.policy
    }

    /// Run one sweep attempt
    pub async fn run_sweep(&self) -> SyncResult<SweepReport> {
        let summaries = self.catalog.list_summaries().await?;

        for summary in &summaries {
            self.store.upsert_summary(summary).await?;
        }

        let listed: Vec<&str> = summaries.iter().map(|s| s.id.as_str()).collect();
        let loaded = checkpoint::load(&self.store).await?;
        let known = loaded.len();
        let mut ledger = loaded.reconcile(listed);

        let mut report = SweepReport {
            discovered: ledger.len() - known,
            ..Default::default()
        };

        if report.discovered > 0 {
            tracing::info!(
                discovered = report.discovered,
                total = ledger.len(),
                "Appended new protocols to checkpoint ledger"
            );
            self.store.save_ledger(&ledger).await?;
        }

        let mut by_id: HashMap<String, ProtocolSummary> =
            summaries.into_iter().map(|s| (s.id.clone(), s)).collect();

        let Some(start) = ledger.start_index() else {
            tracing::info!("Checkpoint ledger is empty, nothing to sweep");
            return Ok(report);
        };

        let total = ledger.len();
        tracing::info!(
            total = total,
            start = start,
            last_run_at = ledger.last_run_at,
            "Starting protocol sweep"
        );

        for offset in 0..total {
            let index = (start + offset) % total;
            let (protocol_id, updated_at) = {
                let entry = &ledger.entries[index];
                (entry.id.clone(), entry.updated_at)
            };

            let now = self.clock.now();
            if !self.policy.is_due(updated_at, now) {
                report.skipped_fresh += 1;
                continue;
            }

            let Some(summary) = by_id.get_mut(&protocol_id) else {
                tracing::debug!(
                    protocol_id = %protocol_id,
                    "Protocol no longer listed upstream, leaving stale"
                );
                report.missing_upstream += 1;
                continue;
            };

            match self.refresh_protocol(summary).await {
                Ok((tvl_rows, token_rows)) => {
                    report.tvl_rows += tvl_rows;
                    report.token_rows += token_rows;
                }
                Err(SyncError::NotFound(slug)) => {
                    tracing::warn!(
                        protocol_id = %protocol_id,
                        slug = %slug,
                        "Protocol detail not found upstream, leaving stale"
                    );
                    report.missing_upstream += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        protocol_id = %protocol_id,
                        index = index,
                        error = %e,
                        "Protocol refresh failed, aborting sweep"
                    );
                    return Err(e);
                }
            }

            checkpoint::record_success(&self.store, &mut ledger, index, now).await?;
            report.refreshed.push(index);

            tracing::debug!(
                protocol_id = %protocol_id,
                index = index,
                "Protocol refreshed"
            );

            if report.refreshed.len() % 100 == 0 {
                tracing::info!(
                    "Progress: {}/{} entries visited | Refreshed: {} | Not due: {}",
                    offset + 1,
                    total,
                    report.refreshed.len(),
                    report.skipped_fresh
                );
            }

            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        tracing::info!(
            refreshed = report.refreshed.len(),
            skipped_fresh = report.skipped_fresh,
            missing_upstream = report.missing_upstream,
            tvl_rows = report.tvl_rows,
            token_rows = report.token_rows,
            "Protocol sweep complete"
        );

        report.ledger = ledger;
        Ok(report)
    }

    /// Fetch, normalize and store one protocol. Returns (tvl rows, token rows).
    async fn refresh_protocol(&self, summary: &mut ProtocolSummary) -> SyncResult<(usize, usize)> {
        let detail = self.catalog.get_detail(&summary.slug).await?;

        summary.merge_detail(&detail);
        let rows = normalize_detail(&summary.id, &detail)?;

        self.store.replace_rows(&summary.id, &rows).await?;
        self.store.upsert_summary(summary).await?;

        Ok((rows.tvl.len(), rows.tokens.len()))
    }
}

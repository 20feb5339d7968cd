//! Protocol Sync Job
//!
//! Drives the sync engine: retries a failed sweep until one completes,
//! then either exits (cron mode) or waits for the next scheduled cycle.

use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::services::catalog::CatalogClient;
use crate::services::store::ProtocolStore;
use crate::services::sync_engine::{SweepReport, SyncEngine};

/// Job name used for sweep bookkeeping
pub const JOB_NAME: &str = "protocol_sweep";

/// Exponential delay between failed sweep attempts, capped at `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
        }
    }

    /// No delay at all; retries immediately
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |d| d.min(self.max))
    }
}

/// A sweep that ran to completion, with the number of attempts it took
#[derive(Debug, Clone)]
pub struct CompletedSweep {
    pub report: SweepReport,
    pub attempts: u32,
}

/// Run sweeps until one finishes without error.
///
/// There is no attempt limit; only the delay between attempts is bounded.
pub async fn run_until_complete<C, S>(engine: &SyncEngine<C, S>, backoff: &Backoff) -> CompletedSweep
where
    C: CatalogClient,
    S: ProtocolStore,
{
    let mut attempts = 0u32;

    loop {
        attempts = attempts.saturating_add(1);
        info!(attempt = attempts, "Starting protocol sweep attempt");

        match engine.run_sweep().await {
            Ok(report) => {
                if let Err(e) = engine
                    .store()
                    .record_sweep_success(JOB_NAME, report.refreshed.len())
                    .await
                {
                    warn!(error = %e, "Failed to record sweep success");
                }

                info!(
                    attempts = attempts,
                    refreshed = report.refreshed.len(),
                    "Protocol sweep succeeded"
                );
                return CompletedSweep { report, attempts };
            }
            Err(e) => {
                if let Err(e2) = engine
                    .store()
                    .record_sweep_failure(JOB_NAME, &e.to_string())
                    .await
                {
                    warn!(error = %e2, "Failed to record sweep failure");
                }

                let delay = backoff.delay(attempts);
                if e.is_retryable() {
                    error!(
                        attempt = attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "Protocol sweep failed, retrying"
                    );
                } else {
                    error!(
                        attempt = attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "Protocol sweep failed on unexpected state, retrying; needs attention"
                    );
                }

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Run the job until done (no interval) or until Ctrl-C.
///
/// With `sweep_interval` unset a single complete sweep is run, which suits
/// cron invocation. Otherwise a sweep cycle starts on every tick.
pub async fn start_protocol_sync_job<C, S>(
    engine: SyncEngine<C, S>,
    backoff: Backoff,
    sweep_interval: Option<Duration>,
) where
    C: CatalogClient,
    S: ProtocolStore,
{
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };

    run_protocol_sync_job_until(engine, backoff, sweep_interval, ctrl_c).await;
}

/// Same as [`start_protocol_sync_job`], stopping when `shutdown` resolves.
/// An in-flight sweep is dropped; everything it checkpointed stays durable.
pub async fn run_protocol_sync_job_until<C, S, F>(
    engine: SyncEngine<C, S>,
    backoff: Backoff,
    sweep_interval: Option<Duration>,
    shutdown: F,
) where
    C: CatalogClient,
    S: ProtocolStore,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let Some(every) = sweep_interval else {
        info!("Running a single protocol sync cycle");
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping protocol sync");
            }
            done = run_until_complete(&engine, &backoff) => {
                info!(attempts = done.attempts, "Protocol sync cycle finished");
            }
        }
        return;
    };

    info!(
        sweep_interval_secs = every.as_secs(),
        refresh_interval_secs = engine.policy().refresh_interval_secs(),
        "Protocol sync job started"
    );

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping protocol sync job gracefully");
                break;
            }
            _ = ticker.tick() => {
                let stopped = tokio::select! {
                    _ = &mut shutdown => true,
                    done = run_until_complete(&engine, &backoff) => {
                        info!(
                            attempts = done.attempts,
                            refreshed = done.report.refreshed.len(),
                            "Scheduled protocol sync cycle finished"
                        );
                        false
                    }
                };

                if stopped {
                    info!("Shutdown signal received mid-cycle, stopping protocol sync job");
                    break;
                }
            }
        }
    }

    info!("Protocol sync job stopped");
}

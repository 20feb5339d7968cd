#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use protocol_sync::error::{SyncError, SyncResult};
use protocol_sync::models::ledger::{CheckpointEntry, Ledger};
use protocol_sync::models::protocol::{
    ChainSeries, ProtocolDetail, ProtocolSummary, TokenRow, TokenSample, TvlRow, TvlSample,
};
use protocol_sync::services::catalog::CatalogClient;
use protocol_sync::services::normalize::NormalizedRows;
use protocol_sync::services::store::ProtocolStore;
use protocol_sync::services::sync_engine::Clock;

pub const DAY: i64 = 86400;
pub const NOW: i64 = 1_700_000_000;

#[derive(Default)]
struct CatalogState {
    summaries: Vec<ProtocolSummary>,
    details: HashMap<String, ProtocolDetail>,
    failing_slugs: HashSet<String>,
    list_failures_left: usize,
    detail_calls: Vec<String>,
}

/// Catalog fake; clones share state
#[derive(Clone, Default)]
pub struct FakeCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl FakeCatalog {
    pub fn with_protocols(ids: &[&str]) -> Self {
        let catalog = Self::default();
        for id in ids {
            catalog.add_protocol(id, detail(&[("Ethereum", 1.0)]));
        }
        catalog
    }

    /// List `id` (slug = "<id>-slug") and serve `detail` for it
    pub fn add_protocol(&self, id: &str, detail: ProtocolDetail) {
        let mut state = self.state.lock().unwrap();
        let summary = summary(id);
        state.details.insert(summary.slug.clone(), detail);
        state.summaries.retain(|s| s.id != id);
        state.summaries.push(summary);
    }

    pub fn set_detail(&self, id: &str, detail: ProtocolDetail) {
        let mut state = self.state.lock().unwrap();
        state.details.insert(slug(id), detail);
    }

    pub fn remove_detail(&self, id: &str) {
        self.state.lock().unwrap().details.remove(&slug(id));
    }

    pub fn unlist(&self, id: &str) {
        self.state.lock().unwrap().summaries.retain(|s| s.id != id);
    }

    pub fn fail_detail(&self, id: &str) {
        self.state.lock().unwrap().failing_slugs.insert(slug(id));
    }

    pub fn heal_detail(&self, id: &str) {
        self.state.lock().unwrap().failing_slugs.remove(&slug(id));
    }

    pub fn fail_list(&self, times: usize) {
        self.state.lock().unwrap().list_failures_left = times;
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().detail_calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().detail_calls.clear();
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn list_summaries(&self) -> SyncResult<Vec<ProtocolSummary>> {
        let mut state = self.state.lock().unwrap();
        if state.list_failures_left > 0 {
            state.list_failures_left -= 1;
            return Err(SyncError::Transport("connection reset".to_string()));
        }
        Ok(state.summaries.clone())
    }

    async fn get_detail(&self, slug: &str) -> SyncResult<ProtocolDetail> {
        let mut state = self.state.lock().unwrap();
        state.detail_calls.push(slug.to_string());
        if state.failing_slugs.contains(slug) {
            return Err(SyncError::Transport(format!("timeout fetching {}", slug)));
        }
        state
            .details
            .get(slug)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(slug.to_string()))
    }
}

#[derive(Default)]
struct StoreState {
    summaries: HashMap<String, ProtocolSummary>,
    tvl: Vec<TvlRow>,
    tokens: Vec<TokenRow>,
    ledger: Option<Ledger>,
    ledger_saves: Vec<Ledger>,
    failing_rows: HashSet<String>,
    sweep_successes: Vec<usize>,
    sweep_failures: Vec<String>,
}

/// In-memory store; clones share state
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn with_ledger(ledger: Ledger) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().ledger = Some(ledger);
        store
    }

    pub fn ledger(&self) -> Option<Ledger> {
        self.state.lock().unwrap().ledger.clone()
    }

    /// Every ledger passed to `save_ledger`, oldest first
    pub fn ledger_saves(&self) -> Vec<Ledger> {
        self.state.lock().unwrap().ledger_saves.clone()
    }

    pub fn saved_cursors(&self) -> Vec<usize> {
        self.ledger_saves().iter().map(|l| l.cursor).collect()
    }

    pub fn clear_saves(&self) {
        self.state.lock().unwrap().ledger_saves.clear();
    }

    pub fn summary(&self, id: &str) -> Option<ProtocolSummary> {
        self.state.lock().unwrap().summaries.get(id).cloned()
    }

    pub fn tvl_rows(&self, id: &str) -> Vec<TvlRow> {
        let state = self.state.lock().unwrap();
        state.tvl.iter().filter(|r| r.protocol_id == id).cloned().collect()
    }

    pub fn token_rows(&self, id: &str) -> Vec<TokenRow> {
        let state = self.state.lock().unwrap();
        state.tokens.iter().filter(|r| r.protocol_id == id).cloned().collect()
    }

    pub fn fail_rows_for(&self, id: &str) {
        self.state.lock().unwrap().failing_rows.insert(id.to_string());
    }

    pub fn sweep_successes(&self) -> Vec<usize> {
        self.state.lock().unwrap().sweep_successes.clone()
    }

    pub fn sweep_failures(&self) -> Vec<String> {
        self.state.lock().unwrap().sweep_failures.clone()
    }
}

#[async_trait]
impl ProtocolStore for MemoryStore {
    async fn upsert_summary(&self, summary: &ProtocolSummary) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        state.summaries.insert(summary.id.clone(), summary.clone());
        Ok(())
    }

    async fn replace_rows(&self, protocol_id: &str, rows: &NormalizedRows) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_rows.contains(protocol_id) {
            return Err(SyncError::Store(sea_orm::DbErr::Custom(
                "connection closed".to_string(),
            )));
        }
        state.tvl.retain(|r| r.protocol_id != protocol_id);
        state.tokens.retain(|r| r.protocol_id != protocol_id);
        state.tvl.extend(rows.tvl.iter().cloned());
        state.tokens.extend(rows.tokens.iter().cloned());
        Ok(())
    }

    async fn load_ledger(&self) -> SyncResult<Option<Ledger>> {
        Ok(self.state.lock().unwrap().ledger.clone())
    }

    async fn save_ledger(&self, ledger: &Ledger) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        state.ledger = Some(ledger.clone());
        state.ledger_saves.push(ledger.clone());
        Ok(())
    }

    async fn record_sweep_success(&self, _job_name: &str, refreshed: usize) -> SyncResult<()> {
        self.state.lock().unwrap().sweep_successes.push(refreshed);
        Ok(())
    }

    async fn record_sweep_failure(&self, _job_name: &str, error: &str) -> SyncResult<()> {
        self.state.lock().unwrap().sweep_failures.push(error.to_string());
        Ok(())
    }
}

/// Clock the test can move; clones share the time
#[derive(Clone)]
pub struct TestClock(Arc<AtomicI64>);

impl TestClock {
    pub fn at(now: i64) -> Self {
        Self(Arc::new(AtomicI64::new(now)))
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn slug(id: &str) -> String {
    format!("{}-slug", id)
}

pub fn summary(id: &str) -> ProtocolSummary {
    ProtocolSummary {
        id: id.to_string(),
        name: id.to_uppercase(),
        slug: slug(id),
        symbol: None,
        category: Some("Dexes".to_string()),
        chains: vec!["Ethereum".to_string()],
        tvl: Some(1.0),
        chain_tvls: BTreeMap::from([("Ethereum".to_string(), 1.0)]),
    }
}

/// Detail with one TVL sample per chain
pub fn detail(chains: &[(&str, f64)]) -> ProtocolDetail {
    ProtocolDetail {
        id: None,
        tvl: vec![],
        current_chain_tvls: chains.iter().map(|(c, v)| (c.to_string(), *v)).collect(),
        chain_tvls: chains
            .iter()
            .map(|(c, v)| {
                (
                    c.to_string(),
                    ChainSeries {
                        tvl: vec![TvlSample {
                            date: NOW - DAY,
                            total_liquidity_usd: *v,
                        }],
                        ..Default::default()
                    },
                )
            })
            .collect(),
    }
}

pub fn token_sample(date: i64, pairs: &[(&str, f64)]) -> TokenSample {
    TokenSample {
        date,
        tokens: pairs.iter().map(|(t, v)| (t.to_string(), *v)).collect(),
    }
}

pub fn ledger(entries: &[(&str, i64)], cursor: usize) -> Ledger {
    Ledger {
        entries: entries
            .iter()
            .map(|(id, t)| CheckpointEntry {
                id: id.to_string(),
                updated_at: *t,
            })
            .collect(),
        cursor,
        last_run_at: 0,
    }
}

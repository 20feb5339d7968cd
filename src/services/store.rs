//! Durable store: protocol summaries, normalized rows and the checkpoint ledger

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};

use crate::entities::{prelude::*, protocol_tokens, protocol_tvl, protocols, sync_ledger};
use crate::error::{SyncError, SyncResult};
use crate::models::ledger::{CheckpointEntry, Ledger};
use crate::models::protocol::{ProtocolSummary, TokenRow, TvlRow};
use crate::services::normalize::{NormalizedRows, decimal_from_f64};
use crate::services::sync_status;

/// Key of the singleton ledger document
pub const LEDGER_ID: &str = "protocols";

/// Rows per INSERT statement, well under the Postgres bind limit
const INSERT_CHUNK_SIZE: usize = 1000;

#[async_trait]
pub trait ProtocolStore: Send + Sync {
    /// Replace the stored summary for `summary.id`
    async fn upsert_summary(&self, summary: &ProtocolSummary) -> SyncResult<()>;

    /// Delete every TVL and token row of the protocol, then insert `rows`
    async fn replace_rows(&self, protocol_id: &str, rows: &NormalizedRows) -> SyncResult<()>;

    /// `None` when no ledger was ever saved
    async fn load_ledger(&self) -> SyncResult<Option<Ledger>>;

    /// Supersede the stored ledger document as a whole
    async fn save_ledger(&self, ledger: &Ledger) -> SyncResult<()>;

    async fn record_sweep_success(&self, job_name: &str, refreshed: usize) -> SyncResult<()>;

    async fn record_sweep_failure(&self, job_name: &str, error: &str) -> SyncResult<()>;
}

pub struct PgProtocolStore {
    db: DatabaseConnection,
}

impl PgProtocolStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn into_db(self) -> DatabaseConnection {
        self.db
    }
}

#[async_trait]
impl ProtocolStore for PgProtocolStore {
    async fn upsert_summary(&self, summary: &ProtocolSummary) -> SyncResult<()> {
        let model = summary_model(summary);

        let txn = self.db.begin().await?;

        Protocols::delete_many()
            .filter(protocols::Column::ProtocolId.eq(summary.id.as_str()))
            .exec(&txn)
            .await?;
        Protocols::insert(model).exec_without_returning(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn replace_rows(&self, protocol_id: &str, rows: &NormalizedRows) -> SyncResult<()> {
        let txn = self.db.begin().await?;

        // Identifier-wide: the new batch always covers every chain of the fetch
        let tvl_deleted = ProtocolTvl::delete_many()
            .filter(protocol_tvl::Column::ProtocolId.eq(protocol_id))
            .exec(&txn)
            .await?
            .rows_affected;
        let tokens_deleted = ProtocolTokens::delete_many()
            .filter(protocol_tokens::Column::ProtocolId.eq(protocol_id))
            .exec(&txn)
            .await?
            .rows_affected;

        for chunk in rows.tvl.chunks(INSERT_CHUNK_SIZE) {
            ProtocolTvl::insert_many(chunk.iter().map(tvl_model))
                .exec_without_returning(&txn)
                .await?;
        }
        for chunk in rows.tokens.chunks(INSERT_CHUNK_SIZE) {
            ProtocolTokens::insert_many(chunk.iter().map(token_model))
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;

        tracing::debug!(
            protocol_id = %protocol_id,
            tvl_deleted = tvl_deleted,
            tokens_deleted = tokens_deleted,
            tvl_inserted = rows.tvl.len(),
            tokens_inserted = rows.tokens.len(),
            "Replaced protocol rows"
        );

        Ok(())
    }

    async fn load_ledger(&self) -> SyncResult<Option<Ledger>> {
        let record = SyncLedger::find_by_id(LEDGER_ID.to_string())
            .one(&self.db)
            .await?;

        record.map(ledger_from_model).transpose()
    }

    async fn save_ledger(&self, ledger: &Ledger) -> SyncResult<()> {
        let model = ledger_to_model(ledger)?;

        let txn = self.db.begin().await?;

        SyncLedger::delete_by_id(LEDGER_ID.to_string())
            .exec(&txn)
            .await?;
        SyncLedger::insert(model).exec_without_returning(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn record_sweep_success(&self, job_name: &str, refreshed: usize) -> SyncResult<()> {
        sync_status::record_success(&self.db, job_name, refreshed).await
    }

    async fn record_sweep_failure(&self, job_name: &str, error: &str) -> SyncResult<()> {
        sync_status::record_failure(&self.db, job_name, error).await
    }
}

fn summary_model(summary: &ProtocolSummary) -> protocols::ActiveModel {
    let tvl = summary.tvl.and_then(|value| {
        let tvl = decimal_from_f64(value);
        if tvl.is_none() {
            tracing::warn!(
                protocol_id = %summary.id,
                value = value,
                "Summary tvl out of decimal range, storing none"
            );
        }
        tvl
    });

    protocols::ActiveModel {
        protocol_id: Set(summary.id.clone()),
        name: Set(summary.name.clone()),
        slug: Set(summary.slug.clone()),
        symbol: Set(summary.symbol.clone()),
        category: Set(summary.category.clone()),
        chains: Set(serde_json::json!(summary.chains)),
        tvl: Set(tvl),
        chain_tvls: Set(serde_json::json!(summary.chain_tvls)),
        updated_at: Set(Some(Utc::now().naive_utc())),
        ..Default::default()
    }
}

fn tvl_model(row: &TvlRow) -> protocol_tvl::ActiveModel {
    protocol_tvl::ActiveModel {
        protocol_id: Set(row.protocol_id.clone()),
        chain: Set(row.chain.clone()),
        timestamp: Set(row.timestamp),
        tvl: Set(row.tvl),
        ..Default::default()
    }
}

fn token_model(row: &TokenRow) -> protocol_tokens::ActiveModel {
    protocol_tokens::ActiveModel {
        protocol_id: Set(row.protocol_id.clone()),
        chain: Set(row.chain.clone()),
        token: Set(row.token.clone()),
        timestamp: Set(row.timestamp),
        amount: Set(row.amount),
        amount_usd: Set(row.amount_usd),
        ..Default::default()
    }
}

fn ledger_to_model(ledger: &Ledger) -> SyncResult<sync_ledger::ActiveModel> {
    let entries = serde_json::to_value(&ledger.entries)
        .map_err(|e| SyncError::Ledger(format!("Failed to encode entries: {}", e)))?;
    let cursor = i64::try_from(ledger.cursor)
        .map_err(|_| SyncError::Ledger(format!("Cursor {} out of range", ledger.cursor)))?;

    Ok(sync_ledger::ActiveModel {
        id: Set(LEDGER_ID.to_string()),
        entries: Set(entries),
        cursor: Set(cursor),
        last_run_at: Set(ledger.last_run_at),
    })
}

fn ledger_from_model(model: sync_ledger::Model) -> SyncResult<Ledger> {
    let entries: Vec<CheckpointEntry> = serde_json::from_value(model.entries)
        .map_err(|e| SyncError::Ledger(format!("Failed to decode entries: {}", e)))?;
    let cursor = usize::try_from(model.cursor)
        .map_err(|_| SyncError::Ledger(format!("Negative cursor {}", model.cursor)))?;

    Ok(Ledger {
        entries,
        cursor,
        last_run_at: model.last_run_at,
    })
}

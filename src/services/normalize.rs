//! Decomposes a protocol detail into flat TVL and token rows

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::collections::{BTreeMap, HashMap};

use crate::error::{SyncError, SyncResult};
use crate::models::protocol::{ChainSeries, ProtocolDetail, TokenRow, TokenSample, TvlRow};

/// All rows derived from one detail fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRows {
    pub tvl: Vec<TvlRow>,
    pub tokens: Vec<TokenRow>,
}

impl NormalizedRows {
    pub fn is_empty(&self) -> bool {
        self.tvl.is_empty() && self.tokens.is_empty()
    }
}

/// token -> (timestamp -> USD value)
type ValuationIndex<'a> = HashMap<&'a str, HashMap<i64, f64>>;

/// Flatten every chain of `detail` into rows for `protocol_id`.
///
/// The result is always the complete row set for the protocol: callers
/// replace, never merge. A sample repeated for the same natural key keeps
/// its last occurrence.
pub fn normalize_detail(protocol_id: &str, detail: &ProtocolDetail) -> SyncResult<NormalizedRows> {
    let mut rows = NormalizedRows::default();

    for (chain, series) in &detail.chain_tvls {
        rows.tvl.extend(tvl_rows(protocol_id, chain, series)?);
        rows.tokens.extend(token_rows(protocol_id, chain, series)?);
    }

    Ok(rows)
}

fn tvl_rows(protocol_id: &str, chain: &str, series: &ChainSeries) -> SyncResult<Vec<TvlRow>> {
    let mut by_timestamp: BTreeMap<i64, f64> = BTreeMap::new();
    for sample in &series.tvl {
        by_timestamp.insert(sample.date, sample.total_liquidity_usd);
    }

    let mut rows = Vec::with_capacity(by_timestamp.len());
    for (timestamp, value) in by_timestamp {
        let Some(tvl) = to_decimal(protocol_id, "tvl", value)? else {
            warn_out_of_range(protocol_id, chain, "tvl", timestamp, value);
            continue;
        };

        rows.push(TvlRow {
            protocol_id: protocol_id.to_string(),
            chain: chain.to_string(),
            timestamp,
            tvl,
        });
    }

    Ok(rows)
}

fn token_rows(protocol_id: &str, chain: &str, series: &ChainSeries) -> SyncResult<Vec<TokenRow>> {
    let valuations = valuation_index(&series.tokens_in_usd);

    let mut holdings: BTreeMap<(&str, i64), f64> = BTreeMap::new();
    for sample in &series.tokens {
        for (token, amount) in &sample.tokens {
            holdings.insert((token.as_str(), sample.date), *amount);
        }
    }

    let mut rows = Vec::with_capacity(holdings.len());
    for ((token, timestamp), amount) in holdings {
        // No valuation sample for this (token, timestamp) values it at zero
        let amount_usd = valuations
            .get(token)
            .and_then(|by_ts| by_ts.get(&timestamp))
            .copied()
            .unwrap_or(0.0);

        let Some(amount) = to_decimal(protocol_id, "token amount", amount)? else {
            warn_out_of_range(protocol_id, chain, token, timestamp, amount);
            continue;
        };
        let Some(amount_usd) = to_decimal(protocol_id, "token usd amount", amount_usd)? else {
            warn_out_of_range(protocol_id, chain, token, timestamp, amount_usd);
            continue;
        };

        rows.push(TokenRow {
            protocol_id: protocol_id.to_string(),
            chain: chain.to_string(),
            token: token.to_string(),
            timestamp,
            amount,
            amount_usd,
        });
    }

    Ok(rows)
}

fn valuation_index(samples: &[TokenSample]) -> ValuationIndex<'_> {
    let mut index: ValuationIndex<'_> = HashMap::new();
    for sample in samples {
        for (token, value) in &sample.tokens {
            index
                .entry(token.as_str())
                .or_default()
                .insert(sample.date, *value);
        }
    }
    index
}

/// `value` as a decimal, or `None` when its magnitude is beyond `Decimal`
pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(value).or_else(|| Decimal::from_f64(value))
}

/// Non-finite values are an error; finite ones out of range come back as `None`
fn to_decimal(protocol_id: &str, field: &'static str, value: f64) -> SyncResult<Option<Decimal>> {
    if !value.is_finite() {
        return Err(SyncError::InvalidValue {
            protocol_id: protocol_id.to_string(),
            field,
            value,
        });
    }

    Ok(decimal_from_f64(value))
}

fn warn_out_of_range(protocol_id: &str, chain: &str, series: &str, timestamp: i64, value: f64) {
    tracing::warn!(
        protocol_id = %protocol_id,
        chain = %chain,
        series = %series,
        timestamp = timestamp,
        value = value,
        "Sample out of decimal range, skipping"
    );
}

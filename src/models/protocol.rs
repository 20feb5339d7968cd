//! Catalog wire types and the normalized rows derived from them

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Protocol entry from the catalog list endpoint (`/protocols`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSummary {
    pub id: String,
    pub name: String,
    /// Lookup key for the detail endpoint
    pub slug: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chains: Vec<String>,
    #[serde(default)]
    pub tvl: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chain_tvls: BTreeMap<String, f64>,
}

impl ProtocolSummary {
    /// Fold the detail's current snapshot into this summary
    pub fn merge_detail(&mut self, detail: &ProtocolDetail) {
        if !detail.current_chain_tvls.is_empty() {
            self.chain_tvls = detail.current_chain_tvls.clone();
        }
        if let Some(last) = detail.tvl.last() {
            self.tvl = Some(last.total_liquidity_usd);
        }
    }
}

/// Protocol detail from `/protocol/{slug}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolDetail {
    #[serde(default)]
    pub id: Option<String>,
    /// Aggregate total-value series across all chains
    #[serde(default, deserialize_with = "null_as_default")]
    pub tvl: Vec<TvlSample>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_chain_tvls: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chain_tvls: BTreeMap<String, ChainSeries>,
}

/// The three series the catalog publishes per chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSeries {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tvl: Vec<TvlSample>,
    /// Token holdings, native units
    #[serde(default, deserialize_with = "null_as_default")]
    pub tokens: Vec<TokenSample>,
    /// Token holdings valued in USD
    #[serde(default, deserialize_with = "null_as_default")]
    pub tokens_in_usd: Vec<TokenSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvlSample {
    pub date: i64,
    #[serde(rename = "totalLiquidityUSD")]
    pub total_liquidity_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSample {
    pub date: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tokens: BTreeMap<String, f64>,
}

/// (protocol, chain, timestamp) -> total value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TvlRow {
    pub protocol_id: String,
    pub chain: String,
    pub timestamp: i64,
    pub tvl: Decimal,
}

/// (protocol, chain, token, timestamp) -> holdings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRow {
    pub protocol_id: String,
    pub chain: String,
    pub token: String,
    pub timestamp: i64,
    pub amount: Decimal,
    pub amount_usd: Decimal,
}

/// The catalog emits `null` for series it has no data for
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_decodes_catalog_shape() {
        let json = r#"{
            "id": "111",
            "name": "Aave",
            "slug": "aave",
            "symbol": "AAVE",
            "category": "Lending",
            "chains": ["Ethereum", "Polygon"],
            "tvl": 1500.5,
            "chainTvls": {"Ethereum": 1000.5, "Polygon": 500.0},
            "logo": "https://example.invalid/aave.png"
        }"#;

        let summary: ProtocolSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.id, "111");
        assert_eq!(summary.slug, "aave");
        assert_eq!(summary.chains.len(), 2);
        assert_eq!(summary.chain_tvls["Polygon"], 500.0);
    }

    #[test]
    fn test_detail_tolerates_null_series() {
        let json = r#"{
            "id": "111",
            "currentChainTvls": {"Ethereum": 10.0},
            "chainTvls": {
                "Ethereum": {
                    "tvl": [{"date": 1700000000, "totalLiquidityUSD": 10.0}],
                    "tokens": null,
                    "tokensInUsd": null
                }
            }
        }"#;

        let detail: ProtocolDetail = serde_json::from_str(json).unwrap();
        let eth = &detail.chain_tvls["Ethereum"];
        assert_eq!(eth.tvl.len(), 1);
        assert!(eth.tokens.is_empty());
        assert!(eth.tokens_in_usd.is_empty());
        assert!(detail.tvl.is_empty());
    }

    #[test]
    fn test_merge_detail_overrides_current_snapshot() {
        let mut summary = ProtocolSummary {
            id: "1".to_string(),
            name: "Uniswap".to_string(),
            slug: "uniswap".to_string(),
            symbol: None,
            category: None,
            chains: vec!["Ethereum".to_string()],
            tvl: Some(1.0),
            chain_tvls: BTreeMap::from([("Ethereum".to_string(), 1.0)]),
        };
        let detail = ProtocolDetail {
            tvl: vec![
                TvlSample { date: 1, total_liquidity_usd: 5.0 },
                TvlSample { date: 2, total_liquidity_usd: 7.0 },
            ],
            current_chain_tvls: BTreeMap::from([
                ("Ethereum".to_string(), 4.0),
                ("Arbitrum".to_string(), 3.0),
            ]),
            ..Default::default()
        };

        summary.merge_detail(&detail);
        assert_eq!(summary.tvl, Some(7.0));
        assert_eq!(summary.chain_tvls.len(), 2);
        assert_eq!(summary.chain_tvls["Arbitrum"], 3.0);
    }

    #[test]
    fn test_merge_detail_keeps_summary_when_detail_empty() {
        let mut summary = ProtocolSummary {
            id: "1".to_string(),
            name: "Curve".to_string(),
            slug: "curve".to_string(),
            symbol: None,
            category: None,
            chains: vec![],
            tvl: Some(9.0),
            chain_tvls: BTreeMap::from([("Ethereum".to_string(), 9.0)]),
        };
        summary.merge_detail(&ProtocolDetail::default());
        assert_eq!(summary.tvl, Some(9.0));
        assert_eq!(summary.chain_tvls["Ethereum"], 9.0);
    }
}

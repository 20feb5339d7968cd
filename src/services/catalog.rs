//! Catalog service client: protocol list and per-protocol detail

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{SyncError, SyncResult};
use crate::models::protocol::{ProtocolDetail, ProtocolSummary};

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Every protocol the catalog currently lists
    async fn list_summaries(&self) -> SyncResult<Vec<ProtocolSummary>>;

    /// Detail with per-chain series, looked up by slug
    async fn get_detail(&self, slug: &str) -> SyncResult<ProtocolDetail>;
}

#[derive(Clone)]
pub struct LlamaCatalogService {
    client: Client,
    base_url: Url,
}

impl LlamaCatalogService {
    pub fn new(base_url: String, timeout: Duration) -> SyncResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            SyncError::Transport(format!("Invalid catalog base URL {}: {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::Transport(format!(
                "Catalog base URL {} cannot carry a path",
                base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, key: &str) -> SyncResult<T> {
        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SyncError::NotFound(key.to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SyncError::Transport(format!(
                "Catalog API error {}: {}",
                status, error_text
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SyncError::Transport(format!("Malformed response for {}: {}", key, e)))
    }
}

#[async_trait]
impl CatalogClient for LlamaCatalogService {
    async fn list_summaries(&self) -> SyncResult<Vec<ProtocolSummary>> {
        tracing::info!("Fetching protocol list from catalog");

        let url = self.endpoint(&["protocols"]);
        let summaries: Vec<ProtocolSummary> = self.get_json(url, "protocols").await?;

        tracing::info!("Fetched {} protocols from catalog", summaries.len());

        Ok(summaries)
    }

    async fn get_detail(&self, slug: &str) -> SyncResult<ProtocolDetail> {
        tracing::debug!(slug = %slug, "Fetching protocol detail");

        let url = self.endpoint(&["protocol", slug]);
        let detail: ProtocolDetail = self.get_json(url, slug).await?;

        tracing::debug!(
            slug = %slug,
            chains = detail.chain_tvls.len(),
            "Fetched protocol detail"
        );

        Ok(detail)
    }
}

//! Model catalog client.
//!
//! The catalog is an external registry of available models. Each request
//! fetches one snapshot, which then feeds both the selector preamble and
//! capability execution — the two never see different catalogs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// One catalog record. Decoding is tolerant: the catalog service grows
/// fields over time and we only depend on the ones below.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub registry: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CatalogEntry {
    /// Case-insensitive match on the model's name or friendly name.
    pub fn matches(&self, query: &str) -> bool {
        self.name.eq_ignore_ascii_case(query) || self.friendly_name.eq_ignore_ascii_case(query)
    }

    /// The read-only projection embedded in the selector preamble.
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            friendly_name: self.friendly_name.clone(),
            name: self.name.clone(),
            publisher: self.publisher.clone(),
            registry: self.registry.clone(),
            description: self.summary.clone(),
        }
    }
}

/// Projection of a catalog entry used to build the selector's preamble.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub friendly_name: String,
    pub name: String,
    pub publisher: String,
    pub registry: String,
    pub description: String,
}

/// Resolve a model reference against a snapshot.
pub fn find_model<'a>(catalog: &'a [CatalogEntry], query: &str) -> Option<&'a CatalogEntry> {
    catalog.iter().find(|entry| entry.matches(query))
}

/// Summaries for every entry, in catalog order.
pub fn summaries(catalog: &[CatalogEntry]) -> Vec<ModelSummary> {
    catalog.iter().map(CatalogEntry::summary).collect()
}

/// Catalog seam; tests substitute a fixed snapshot.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// Fetch the current snapshot, authorized as the calling user.
    async fn snapshot(&self, token: &str) -> Result<Vec<CatalogEntry>, AgentError>;
}

/// `ModelCatalog` over the platform's catalog HTTP API.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelCatalog for CatalogClient {
    async fn snapshot(&self, token: &str) -> Result<Vec<CatalogEntry>, AgentError> {
        let response = self
            .http
            .get(self.models_url())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| AgentError::Catalog(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Catalog(format!(
                "catalog request failed with status {}",
                status
            )));
        }

        let entries = response
            .json::<Vec<CatalogEntry>>()
            .await
            .map_err(|e| AgentError::Catalog(format!("invalid catalog response: {}", e)))?;
        log::debug!("catalog snapshot: {} models", entries.len());
        Ok(entries)
    }
}

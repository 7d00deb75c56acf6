// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pinecone similarity-index adapter for Kindred.
//!
//! Facts live in two integrated-embedding indexes, one per fact category.
//! Each `user_id/persona_id` pair is a Pinecone namespace inside both.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use kindred_config::model::PineconeConfig;
use kindred_core::error::KindredError;
use kindred_core::traits::{PluginAdapter, SimilarityIndex};
use kindred_core::types::{AdapterType, FactCategory, FactRecord, HealthStatus, IndexHit, Namespace};
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::client::PineconeClient;

/// Environment variable consulted when the config carries no API key.
pub const API_KEY_ENV: &str = "PINECONE_API_KEY";

/// Pinecone adapter implementing [`SimilarityIndex`].
pub struct PineconeIndex {
    client: PineconeClient,
    user_host: Url,
    agent_host: Url,
}

impl PineconeIndex {
    /// Builds the adapter from config. Both index hosts are required.
    pub fn new(config: &PineconeConfig) -> Result<Self, KindredError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = PineconeClient::new(
            &api_key,
            &config.api_version,
            Duration::from_secs(config.timeout_secs),
        )?;
        let user_host = parse_host("pinecone.user_index_host", config.user_index_host.as_deref())?;
        let agent_host = parse_host("pinecone.agent_index_host", config.agent_index_host.as_deref())?;

        info!(user_host = %user_host, agent_host = %agent_host, "Pinecone index adapter initialized");
        Ok(Self::with_hosts(client, user_host, agent_host))
    }

    pub fn with_hosts(client: PineconeClient, user_host: Url, agent_host: Url) -> Self {
        Self {
            client,
            user_host,
            agent_host,
        }
    }

    /// Data-plane host of the index holding `category`.
    pub fn host(&self, category: FactCategory) -> &Url {
        match category {
            FactCategory::User => &self.user_host,
            FactCategory::Agent => &self.agent_host,
        }
    }
}

#[async_trait]
impl PluginAdapter for PineconeIndex {
    fn name(&self) -> &str {
        "pinecone"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Index
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        let mut failures = Vec::new();
        for category in FactCategory::ALL {
            if let Err(e) = self.client.describe_index_stats(self.host(category)).await {
                warn!(category = %category, error = %e, "index health check failed");
                failures.push(format!("{category}: {e}"));
            }
        }

        Ok(match failures.len() {
            0 => HealthStatus::Healthy,
            n if n == FactCategory::ALL.len() => HealthStatus::Unhealthy(failures.join("; ")),
            _ => HealthStatus::Degraded(failures.join("; ")),
        })
    }
}

#[async_trait]
impl SimilarityIndex for PineconeIndex {
    async fn upsert(
        &self,
        category: FactCategory,
        namespace: &Namespace,
        records: &[FactRecord],
    ) -> Result<(), KindredError> {
        if records.is_empty() {
            return Ok(());
        }
        debug!(category = %category, namespace = %namespace, records = records.len(), "upserting records");
        self.client
            .upsert_records(self.host(category), &namespace.to_string(), records)
            .await
    }

    async fn query(
        &self,
        category: FactCategory,
        namespace: &Namespace,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<IndexHit>, KindredError> {
        self.client
            .search_records(self.host(category), &namespace.to_string(), text, top_k)
            .await
    }
}

fn parse_host(key: &str, host: Option<&str>) -> Result<Url, KindredError> {
    let host = host
        .filter(|h| !h.is_empty())
        .ok_or_else(|| KindredError::Config(format!("{key} is not set")))?;
    Url::parse(host).map_err(|e| KindredError::Config(format!("{key} is not a valid URL: {e}")))
}

/// Resolves the API key from config, falling back to the environment.
fn resolve_api_key(config_key: Option<&str>) -> Result<String, KindredError> {
    if let Some(key) = config_key.filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    std::env::var(API_KEY_ENV).map_err(|_| {
        KindredError::Config(format!(
            "Pinecone API key not found. Set pinecone.api_key in config or {API_KEY_ENV} environment variable."
        ))
    })
}

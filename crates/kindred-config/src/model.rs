// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Kindred memory service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Kindred configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KindredConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// OpenRouter structured completion settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Pinecone similarity index settings.
    #[serde(default)]
    pub pinecone: PineconeConfig,

    /// Memory consolidation settings.
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of this service instance.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "kindred".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// OpenRouter API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenRouterConfig {
    /// OpenRouter API key. `None` requires the `OPENROUTER_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_openrouter_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openrouter_base_url(),
            timeout_secs: default_openrouter_timeout_secs(),
        }
    }
}

fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_openrouter_timeout_secs() -> u64 {
    120
}

/// Pinecone index configuration.
///
/// User facts and agent facts live in two separate indexes, each addressed
/// by its data-plane host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PineconeConfig {
    /// Pinecone API key. `None` requires the `PINECONE_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Value sent in the `X-Pinecone-API-Version` header.
    #[serde(default = "default_pinecone_api_version")]
    pub api_version: String,

    /// Data-plane host of the index holding user facts.
    #[serde(default)]
    pub user_index_host: Option<String>,

    /// Data-plane host of the index holding agent facts.
    #[serde(default)]
    pub agent_index_host: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_pinecone_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_version: default_pinecone_api_version(),
            user_index_host: None,
            agent_index_host: None,
            timeout_secs: default_pinecone_timeout_secs(),
        }
    }
}

fn default_pinecone_api_version() -> String {
    "2025-01".to_string()
}

fn default_pinecone_timeout_secs() -> u64 {
    30
}

/// Memory consolidation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Enable consolidation. When false, turns are stored but never distilled.
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,

    /// Number of unconsolidated turns that triggers a consolidation run.
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// A top match must score strictly above this value before a merge is attempted.
    /// Expressed on the index's native similarity scale.
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold: f32,

    /// Model used to extract candidate facts from a window of turns.
    #[serde(default = "default_fact_model")]
    pub extraction_model: String,

    /// Model used to decide whether two facts should be merged.
    #[serde(default = "default_fact_model")]
    pub reconcile_model: String,

    /// Serialize consolidation runs per user/persona namespace.
    #[serde(default = "default_serialize_per_namespace")]
    pub serialize_per_namespace: bool,

    /// Mark turns as consolidated even when the run failed.
    /// Losing the window's facts is preferred over retrying it.
    #[serde(default)]
    pub mark_on_failure: bool,

    /// Number of facts returned per partition by recall.
    #[serde(default = "default_recall_top_k")]
    pub recall_top_k: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            window_size: default_window_size(),
            merge_threshold: default_merge_threshold(),
            extraction_model: default_fact_model(),
            reconcile_model: default_fact_model(),
            serialize_per_namespace: default_serialize_per_namespace(),
            mark_on_failure: false,
            recall_top_k: default_recall_top_k(),
        }
    }
}

fn default_memory_enabled() -> bool {
    true
}

fn default_window_size() -> usize {
    30
}

fn default_merge_threshold() -> f32 {
    0.5
}

fn default_fact_model() -> String {
    "anthropic/claude-3.5-haiku".to_string()
}

fn default_serialize_per_namespace() -> bool {
    true
}

fn default_recall_top_k() -> usize {
    10
}

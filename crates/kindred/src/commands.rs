// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kindred consolidate`, `kindred recall`, and `kindred config`.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use kindred_config::model::KindredConfig;
use kindred_core::{ConversationTurn, KindredError, Namespace};
use kindred_memory::{ConsolidationEngine, FactRecall, GetFactsTool, ToolContext, ToolRegistry};
use kindred_openrouter::OpenRouterCompletion;
use kindred_pinecone::PineconeIndex;
use tracing::info;

/// Builds an engine backed by OpenRouter and Pinecone.
pub fn build_engine(config: &KindredConfig) -> Result<ConsolidationEngine, KindredError> {
    let index = Arc::new(PineconeIndex::new(&config.pinecone)?);
    let completion = Arc::new(OpenRouterCompletion::new(&config.openrouter)?);
    Ok(ConsolidationEngine::from_config(&config.memory, index, completion))
}

/// Builds a registry holding the `get_facts` tool over Pinecone.
pub fn build_tools(config: &KindredConfig) -> Result<ToolRegistry, KindredError> {
    let index = Arc::new(PineconeIndex::new(&config.pinecone)?);
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(GetFactsTool::new(FactRecall::new(
        index,
        config.memory.recall_top_k,
    ))));
    Ok(registry)
}

pub async fn run_consolidate(
    config: &KindredConfig,
    namespace: &Namespace,
    transcript: &Path,
    trigger_id: Option<&str>,
) -> Result<(), KindredError> {
    let turns = read_transcript(transcript)?;
    info!(namespace = %namespace, turns = turns.len(), "consolidating transcript");

    let engine = build_engine(config)?;
    let report = match trigger_id {
        Some(trigger_id) => engine.consolidate_as(namespace, trigger_id, &turns).await?,
        None => engine.consolidate(namespace, &turns).await?,
    };
    println!("{}", to_pretty_json(&report)?);
    Ok(())
}

pub async fn run_recall(
    config: &KindredConfig,
    namespace: Namespace,
    user_query: Option<String>,
    agent_query: Option<String>,
) -> Result<(), KindredError> {
    let registry = build_tools(config)?;
    let ctx = ToolContext { namespace };
    let input = serde_json::json!({
        "user_query": user_query.unwrap_or_default(),
        "agent_query": agent_query.unwrap_or_default(),
    });

    let output = registry.invoke("get_facts", &ctx, input).await?;
    if output.is_error {
        return Err(KindredError::Internal(output.content));
    }
    println!("{}", output.content);
    Ok(())
}

/// Parses a JSON array of turns, oldest first.
pub fn read_transcript(path: &Path) -> Result<Vec<ConversationTurn>, KindredError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        KindredError::Config(format!("cannot read transcript {}: {e}", path.display()))
    })?;
    parse_transcript(&raw)
        .map_err(|e| KindredError::Config(format!("invalid transcript {}: {e}", path.display())))
}

fn parse_transcript(raw: &str) -> Result<Vec<ConversationTurn>, serde_json::Error> {
    serde_json::from_str(raw)
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, KindredError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| KindredError::Internal(format!("failed to encode output: {e}")))
}

/// Human-readable summary of the effective configuration. API keys are never printed.
pub fn config_summary(config: &KindredConfig) -> String {
    let mut out = String::new();
    let memory = &config.memory;
    let _ = writeln!(out, "service.name              = {}", config.service.name);
    let _ = writeln!(out, "service.log_level         = {}", config.service.log_level);
    let _ = writeln!(out, "openrouter.base_url       = {}", config.openrouter.base_url);
    let _ = writeln!(
        out,
        "openrouter.api_key        = {}",
        key_state(config.openrouter.api_key.as_deref(), kindred_openrouter::API_KEY_ENV)
    );
    let _ = writeln!(out, "pinecone.api_version      = {}", config.pinecone.api_version);
    let _ = writeln!(
        out,
        "pinecone.api_key          = {}",
        key_state(config.pinecone.api_key.as_deref(), kindred_pinecone::API_KEY_ENV)
    );
    let _ = writeln!(
        out,
        "pinecone.user_index_host  = {}",
        config.pinecone.user_index_host.as_deref().unwrap_or("(unset)")
    );
    let _ = writeln!(
        out,
        "pinecone.agent_index_host = {}",
        config.pinecone.agent_index_host.as_deref().unwrap_or("(unset)")
    );
    let _ = writeln!(out, "memory.enabled            = {}", memory.enabled);
    let _ = writeln!(out, "memory.window_size        = {}", memory.window_size);
    let _ = writeln!(out, "memory.merge_threshold    = {}", memory.merge_threshold);
    let _ = writeln!(out, "memory.extraction_model   = {}", memory.extraction_model);
    let _ = writeln!(out, "memory.reconcile_model    = {}", memory.reconcile_model);
    let _ = writeln!(out, "memory.serialize_per_namespace = {}", memory.serialize_per_namespace);
    let _ = writeln!(out, "memory.mark_on_failure    = {}", memory.mark_on_failure);
    let _ = writeln!(out, "memory.recall_top_k       = {}", memory.recall_top_k);
    out
}

fn key_state(configured: Option<&str>, env: &str) -> String {
    if configured.is_some_and(|k| !k.is_empty()) {
        "set (config)".to_string()
    } else if std::env::var(env).is_ok_and(|k| !k.is_empty()) {
        format!("set (${env})")
    } else {
        "missing".to_string()
    }
}

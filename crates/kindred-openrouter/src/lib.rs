// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenRouter structured-completion adapter for Kindred.
//!
//! This crate implements [`StructuredCompletion`] on top of the OpenRouter
//! chat-completions API using `response_format: json_schema`. Model output
//! is parsed and validated against the requested schema before it is
//! returned.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use kindred_config::model::OpenRouterConfig;
use kindred_core::error::KindredError;
use kindred_core::traits::{PluginAdapter, StructuredCompletion};
use kindred_core::types::{AdapterType, CompletionRequest, HealthStatus, OutputSchema};
use tracing::{debug, info};

use crate::client::OpenRouterClient;
use crate::types::{ChatMessage, ChatRequest, ResponseFormat};

/// Environment variable consulted when the config carries no API key.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// OpenRouter adapter implementing [`StructuredCompletion`].
///
/// API key resolution order: config -> `OPENROUTER_API_KEY` env var -> error.
pub struct OpenRouterCompletion {
    client: OpenRouterClient,
}

impl OpenRouterCompletion {
    pub fn new(config: &OpenRouterConfig) -> Result<Self, KindredError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = OpenRouterClient::new(
            &api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(endpoint = client.endpoint(), "OpenRouter completion adapter initialized");
        Ok(Self { client })
    }

    pub fn with_client(client: OpenRouterClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for OpenRouterCompletion {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        // A completion call would spend tokens.
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl StructuredCompletion for OpenRouterCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<serde_json::Value, KindredError> {
        let schema = request.schema.clone();
        let chat = to_chat_request(request);

        let response = self.client.chat(&chat).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| KindredError::schema("model returned no content"))?;

        debug!(schema = %schema.name, chars = content.len(), "structured output received");
        parse_structured_output(&content, &schema)
    }
}

fn to_chat_request(request: CompletionRequest) -> ChatRequest {
    ChatRequest {
        model: request.model,
        messages: request
            .messages
            .into_iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: m.content,
            })
            .collect(),
        response_format: ResponseFormat::json_schema(
            request.schema.name,
            request.schema.strict,
            request.schema.schema,
        ),
    }
}

/// Parse model text as JSON and validate it against `schema`.
///
/// Output wrapped in a Markdown code fence is accepted.
pub fn parse_structured_output(
    content: &str,
    schema: &OutputSchema,
) -> Result<serde_json::Value, KindredError> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| KindredError::schema(format!("output is not valid JSON: {e}")))?;

    let validator = jsonschema::validator_for(&schema.schema).map_err(|e| {
        KindredError::schema(format!("output schema `{}` is invalid: {e}", schema.name))
    })?;

    let violations: Vec<String> = validator
        .iter_errors(&value)
        .map(|e| format!("{} at `{}`", e, e.instance_path))
        .collect();
    if !violations.is_empty() {
        return Err(KindredError::schema(format!(
            "output does not match schema `{}`: {}",
            schema.name,
            violations.join("; ")
        )));
    }

    Ok(value)
}

/// Remove a surrounding ```json / ``` fence, if present.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Resolves the API key from config, falling back to the environment.
fn resolve_api_key(config_key: Option<&str>) -> Result<String, KindredError> {
    if let Some(key) = config_key.filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    std::env::var(API_KEY_ENV).map_err(|_| {
        KindredError::Config(format!(
            "OpenRouter API key not found. Set openrouter.api_key in config or {API_KEY_ENV} environment variable."
        ))
    })
}

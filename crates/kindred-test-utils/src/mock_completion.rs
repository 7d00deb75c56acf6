// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock structured-completion adapter.
//!
//! Responses are queued per output-schema name so extraction ("facts") and
//! reconciliation ("resolution") calls can be scripted independently. An
//! empty queue yields a completion error.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use kindred_core::traits::{PluginAdapter, StructuredCompletion};
use kindred_core::types::{AdapterType, CompletionRequest, HealthStatus};
use kindred_core::KindredError;

type Scripted = Result<serde_json::Value, KindredError>;

/// A completion service returning pre-configured responses.
#[derive(Default)]
pub struct MockCompletion {
    responses: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw result for requests using the schema named `schema`.
    pub async fn push(&self, schema: &str, response: Scripted) {
        self.responses
            .lock()
            .await
            .entry(schema.to_string())
            .or_default()
            .push_back(response);
    }

    /// Queue a well-formed extraction result.
    pub async fn push_extraction(&self, user_facts: &[&str], agent_facts: &[&str]) {
        let value = serde_json::json!({
            "facts": { "user_facts": user_facts, "agent_facts": agent_facts }
        });
        self.push("facts", Ok(value)).await;
    }

    /// Queue a reconciliation result; an empty string means no merge.
    pub async fn push_resolution(&self, resolved_fact: &str) {
        let value = serde_json::json!({ "resolved_fact": resolved_fact });
        self.push("resolution", Ok(value)).await;
    }

    /// Every request received so far, in call order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of requests made with the schema named `schema`.
    pub async fn calls_for(&self, schema: &str) -> usize {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.schema.name == schema)
            .count()
    }
}

#[async_trait]
impl PluginAdapter for MockCompletion {
    fn name(&self) -> &str {
        "mock-completion"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl StructuredCompletion for MockCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<serde_json::Value, KindredError> {
        let schema = request.schema.name.clone();
        self.requests.lock().await.push(request);

        self.responses
            .lock()
            .await
            .get_mut(&schema)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(KindredError::completion(format!(
                    "no scripted response for schema `{schema}`"
                )))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::types::{CompletionMessage, OutputSchema};

    fn request(schema: &str) -> CompletionRequest {
        CompletionRequest {
            model: "test-model".to_string(),
            messages: vec![CompletionMessage::user("hi")],
            schema: OutputSchema {
                name: schema.to_string(),
                strict: true,
                schema: serde_json::json!({}),
            },
        }
    }

    #[tokio::test]
    async fn queues_are_independent_per_schema() {
        let mock = MockCompletion::new();
        mock.push_resolution("merged").await;
        mock.push_extraction(&["u"], &[]).await;

        let extraction = mock.complete(request("facts")).await.unwrap();
        assert_eq!(extraction["facts"]["user_facts"][0], "u");
        let resolution = mock.complete(request("resolution")).await.unwrap();
        assert_eq!(resolution["resolved_fact"], "merged");
        assert_eq!(mock.calls_for("facts").await, 1);
        assert_eq!(mock.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn empty_queue_is_completion_error() {
        let mock = MockCompletion::new();
        let err = mock.complete(request("facts")).await.unwrap_err();
        assert!(matches!(err, KindredError::Completion { .. }));
    }
}

// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-based merge decision between a stored fact and an incoming one.

use std::sync::Arc;

use kindred_core::error::KindredError;
use kindred_core::traits::StructuredCompletion;
use kindred_core::types::{CompletionMessage, CompletionRequest, OutputSchema};
use serde::Deserialize;

use crate::prompts::{RECONCILE_SYSTEM, reconcile_prompt};
use crate::types::Resolution;

#[derive(Debug, Deserialize)]
struct ReconcileResponse {
    resolved_fact: String,
}

/// Decides whether two facts describe the same topic and merges them if so.
pub struct FactReconciler {
    completion: Arc<dyn StructuredCompletion>,
    model: String,
}

impl FactReconciler {
    pub fn new(completion: Arc<dyn StructuredCompletion>, model: String) -> Self {
        Self { completion, model }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Reconcile `incoming` against `existing`.
    ///
    /// On conflict the incoming statement wins. Unrelated facts yield
    /// [`Resolution::NoMerge`].
    pub async fn reconcile(&self, existing: &str, incoming: &str) -> Result<Resolution, KindredError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                CompletionMessage::system(RECONCILE_SYSTEM),
                CompletionMessage::user(reconcile_prompt(existing, incoming)),
            ],
            schema: resolution_schema(),
        };

        let value = self.completion.complete(request).await?;
        parse_resolution(value)
    }
}

/// Strict schema for `{resolved_fact: string}`.
pub fn resolution_schema() -> OutputSchema {
    OutputSchema {
        name: "resolution".to_string(),
        strict: true,
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "resolved_fact": {
                    "type": "string",
                    "description": "The merged fact, or an empty string if the facts are about different topics."
                }
            },
            "required": ["resolved_fact"],
            "additionalProperties": false
        }),
    }
}

/// Map the wire payload onto a [`Resolution`]; blank text means no merge.
pub fn parse_resolution(value: serde_json::Value) -> Result<Resolution, KindredError> {
    let response: ReconcileResponse = serde_json::from_value(value)
        .map_err(|e| KindredError::schema(format!("malformed resolution output: {e}")))?;

    let merged = response.resolved_fact.trim();
    if merged.is_empty() {
        Ok(Resolution::NoMerge)
    } else {
        Ok(Resolution::Merged(merged.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_is_merged() {
        let value = serde_json::json!({ "resolved_fact": " User has a golden retriever named Max. " });
        assert_eq!(
            parse_resolution(value).unwrap(),
            Resolution::Merged("User has a golden retriever named Max.".to_string())
        );
    }

    #[test]
    fn empty_text_is_no_merge() {
        let value = serde_json::json!({ "resolved_fact": "" });
        assert_eq!(parse_resolution(value).unwrap(), Resolution::NoMerge);
    }

    #[test]
    fn whitespace_text_is_no_merge() {
        let value = serde_json::json!({ "resolved_fact": "  \n " });
        assert_eq!(parse_resolution(value).unwrap(), Resolution::NoMerge);
    }

    #[test]
    fn wrong_type_is_schema_error() {
        let value = serde_json::json!({ "resolved_fact": {} });
        assert!(matches!(
            parse_resolution(value),
            Err(KindredError::Schema { .. })
        ));
    }

    #[test]
    fn schema_is_strict_single_field() {
        let schema = resolution_schema();
        assert_eq!(schema.name, "resolution");
        assert_eq!(schema.schema["required"], serde_json::json!(["resolved_fact"]));
    }
}

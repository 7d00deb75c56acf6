// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-based fact extraction from a window of conversation turns.
//!
//! One structured-completion call splits the window into facts about the
//! user and facts the agent stated about itself. Unlike reconciliation, an
//! extraction failure is never softened into an empty result.

use std::sync::Arc;

use kindred_core::error::KindredError;
use kindred_core::traits::StructuredCompletion;
use kindred_core::types::{CompletionMessage, CompletionRequest, ConversationTurn, OutputSchema};
use serde::Deserialize;
use tracing::debug;

use crate::prompts::{EXTRACTION_SYSTEM, extraction_prompt};
use crate::types::ExtractedFacts;

/// Length range the extraction contract asks the model to respect.
pub const FACT_LENGTH_TARGET: std::ops::RangeInclusive<usize> = 100..=500;

/// Wire shape of the extraction response.
#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    facts: ExtractedFacts,
}

/// Turns conversation windows into candidate facts.
pub struct ChunkExtractor {
    completion: Arc<dyn StructuredCompletion>,
    model: String,
}

impl ChunkExtractor {
    /// Creates an extractor that calls `model` through `completion`.
    pub fn new(completion: Arc<dyn StructuredCompletion>, model: String) -> Self {
        Self { completion, model }
    }

    /// Returns the configured extraction model.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Extract user and agent facts from turns ordered oldest first.
    ///
    /// Blank entries are dropped; everything else is kept in model order.
    /// Completion or decoding failures are returned as errors.
    pub async fn extract(&self, turns: &[ConversationTurn]) -> Result<ExtractedFacts, KindredError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                CompletionMessage::system(EXTRACTION_SYSTEM),
                CompletionMessage::user(extraction_prompt(&render_transcript(turns))),
            ],
            schema: extraction_schema(),
        };

        let value = self.completion.complete(request).await?;
        let mut facts = parse_extraction(value)?;
        facts.user_facts = clean_facts(facts.user_facts);
        facts.agent_facts = clean_facts(facts.agent_facts);

        debug!(
            user_facts = facts.user_facts.len(),
            agent_facts = facts.agent_facts.len(),
            "extracted candidate facts"
        );
        Ok(facts)
    }
}

/// Render turns as `role: content` lines.
pub fn render_transcript(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strict schema for `{facts: {user_facts: [string], agent_facts: [string]}}`.
pub fn extraction_schema() -> OutputSchema {
    let fact_list = |about: &str| {
        serde_json::json!({
            "type": "array",
            "description": format!("Factual details about the {about}."),
            "items": {
                "type": "string",
                "description": format!("One self-contained factual detail about the {about}.")
            }
        })
    };

    OutputSchema {
        name: "facts".to_string(),
        strict: true,
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "facts": {
                    "type": "object",
                    "properties": {
                        "user_facts": fact_list("user"),
                        "agent_facts": fact_list("agent"),
                    },
                    "required": ["user_facts", "agent_facts"],
                    "additionalProperties": false
                }
            },
            "required": ["facts"],
            "additionalProperties": false
        }),
    }
}

/// Decode the completion payload into extracted facts.
pub fn parse_extraction(value: serde_json::Value) -> Result<ExtractedFacts, KindredError> {
    serde_json::from_value::<ExtractionResponse>(value)
        .map(|response| response.facts)
        .map_err(|e| KindredError::schema(format!("malformed extraction output: {e}")))
}

/// Trim entries and drop blank ones. Lengths outside the target are kept.
fn clean_facts(facts: Vec<String>) -> Vec<String> {
    facts
        .into_iter()
        .filter_map(|fact| {
            let trimmed = fact.trim();
            if trimmed.is_empty() {
                return None;
            }
            let chars = trimmed.chars().count();
            if !FACT_LENGTH_TARGET.contains(&chars) {
                debug!(chars, "extracted fact outside length target");
            }
            Some(trimmed.to_string())
        })
        .collect()
}

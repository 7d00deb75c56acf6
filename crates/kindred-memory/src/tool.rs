// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tools the persona model can call, and the registry that exposes them.
//!
//! Tools are registered explicitly at startup. The registry produces
//! function definitions in the OpenAI chat-completions format used by
//! OpenRouter.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use kindred_core::error::KindredError;
use kindred_core::types::Namespace;
use serde::{Deserialize, Serialize};

use crate::recall::FactRecall;

/// Caller-side context of a tool call. Never taken from model input.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub namespace: Namespace,
}

/// Output from a tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// JSON or text handed back to the model.
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used for lookup and in function definitions.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the tool's arguments.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Run the tool with arguments parsed from the model's call.
    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, KindredError>;
}

/// Tools available to the persona, indexed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool under its `name()`, replacing any previous one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Function definitions for every registered tool, sorted by name.
    ///
    /// ```json
    /// { "type": "function", "function": { "name": "...", "description": "...", "parameters": { ... } } }
    /// ```
    pub fn tool_definitions(&self) -> Vec<serde_json::Value> {
        let mut tools: Vec<&Arc<dyn Tool>> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.parameters_schema(),
                    }
                })
            })
            .collect()
    }

    /// Look up and invoke `name`. Unknown tools produce an error output, not an `Err`.
    pub async fn invoke(
        &self,
        name: &str,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, KindredError> {
        match self.get(name) {
            Some(tool) => tool.invoke(ctx, input).await,
            None => Ok(ToolOutput::error(format!("unknown tool: {name}"))),
        }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Deserialize)]
struct GetFactsInput {
    #[serde(default)]
    user_query: Option<String>,
    #[serde(default)]
    agent_query: Option<String>,
}

/// `get_facts`: searches the caller's stored facts about the user and the persona.
pub struct GetFactsTool {
    recall: FactRecall,
}

impl GetFactsTool {
    pub fn new(recall: FactRecall) -> Self {
        Self { recall }
    }
}

#[async_trait]
impl Tool for GetFactsTool {
    fn name(&self) -> &str {
        "get_facts"
    }

    fn description(&self) -> &str {
        "Search for relevant facts about the user and/or yourself."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "user_query": {
                    "type": "string",
                    "description": "The query to search for relevant facts about the user."
                },
                "agent_query": {
                    "type": "string",
                    "description": "The query to search for relevant facts about yourself."
                }
            },
            "required": ["user_query", "agent_query"],
            "additionalProperties": false
        })
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, KindredError> {
        let input: GetFactsInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(e) => return Ok(ToolOutput::error(format!("invalid get_facts arguments: {e}"))),
        };

        let facts = self
            .recall
            .recall(
                &ctx.namespace,
                input.user_query.as_deref(),
                input.agent_query.as_deref(),
            )
            .await?;

        let content = serde_json::to_string(&facts)
            .map_err(|e| KindredError::Internal(format!("failed to serialize facts: {e}")))?;
        Ok(ToolOutput {
            content,
            is_error: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the input back"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object", "properties": { "text": { "type": "string" } } })
        }

        async fn invoke(
            &self,
            ctx: &ToolContext,
            input: serde_json::Value,
        ) -> Result<ToolOutput, KindredError> {
            Ok(ToolOutput {
                content: format!("{}: {}", ctx.namespace, input["text"].as_str().unwrap_or("")),
                is_error: false,
            })
        }
    }

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "named"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object" })
        }

        async fn invoke(
            &self,
            _ctx: &ToolContext,
            _input: serde_json::Value,
        ) -> Result<ToolOutput, KindredError> {
            Ok(ToolOutput {
                content: String::new(),
                is_error: false,
            })
        }
    }

    fn ctx() -> ToolContext {
        ToolContext {
            namespace: Namespace::new("u", "p"),
        }
    }

    #[test]
    fn definitions_use_function_format_sorted_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("zeta")));
        registry.register(Arc::new(NamedTool("alpha")));

        let defs = registry.tool_definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0]["type"], "function");
        assert_eq!(defs[0]["function"]["name"], "alpha");
        assert_eq!(defs[1]["function"]["name"], "zeta");
        assert!(defs[0]["function"]["parameters"].is_object());
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(NamedTool("dup")));
        registry.register(Arc::new(NamedTool("dup")));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn invoke_passes_context() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let out = registry
            .invoke("echo", &ctx(), serde_json::json!({ "text": "hi" }))
            .await
            .unwrap();
        assert_eq!(out.content, "u/p: hi");
        assert!(!out.is_error);
    }

    #[tokio::test]
    async fn unknown_tool_is_error_output() {
        let registry = ToolRegistry::new();
        let out = registry
            .invoke("missing", &ctx(), serde_json::json!({}))
            .await
            .unwrap();
        assert!(out.is_error);
        assert!(out.content.contains("missing"));
    }
}

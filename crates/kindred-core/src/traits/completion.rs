// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured completion trait for schema-constrained LLM calls.

use async_trait::async_trait;

use crate::error::KindredError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CompletionRequest;

/// Adapter for language model calls whose output must match a JSON Schema.
#[async_trait]
pub trait StructuredCompletion: PluginAdapter {
    /// Runs the transcript and returns output conforming to `request.schema`.
    ///
    /// Output that cannot be parsed or validated yields [`KindredError::Schema`].
    async fn complete(&self, request: CompletionRequest)
    -> Result<serde_json::Value, KindredError>;
}

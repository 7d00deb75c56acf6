// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the memory pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Completion,
    Index,
    ConversationStore,
}

// --- Conversation types ---

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single stored conversation turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Store-assigned identifier.
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Model-generated description of an attached image, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_description: Option<String>,
}

/// A turn that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTurn {
    pub role: Role,
    pub content: String,
    pub attachment_description: Option<String>,
}

impl NewTurn {
    /// A plain text turn without attachment.
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachment_description: None,
        }
    }
}

/// Identifies one conversation in the external conversation store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub user_id: String,
    pub persona_id: String,
    /// Delivery channel (web, telegram, imessage, ...).
    pub channel: String,
}

impl ConversationKey {
    pub fn new(
        user_id: impl Into<String>,
        persona_id: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            persona_id: persona_id.into(),
            channel: channel.into(),
        }
    }

    /// The fact namespace this conversation writes into.
    ///
    /// All channels of one user/persona pair share a namespace.
    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.user_id.clone(), self.persona_id.clone())
    }
}

// --- Fact types ---

/// Owning scope for facts: one user talking to one persona.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    pub user_id: String,
    pub persona_id: String,
}

impl Namespace {
    pub fn new(user_id: impl Into<String>, persona_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            persona_id: persona_id.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.persona_id)
    }
}

/// Which index partition a fact belongs to.
///
/// The two partitions never cross-match: every index call names its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FactCategory {
    /// Facts about the human user.
    User,
    /// Facts the persona has stated about itself.
    Agent,
}

impl FactCategory {
    /// Both categories in processing order.
    pub const ALL: [FactCategory; 2] = [FactCategory::User, FactCategory::Agent];
}

/// A durable fact as stored in the similarity index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    pub id: String,
    pub text: String,
    /// RFC 3339 UTC timestamp of the last write.
    pub timestamp: String,
}

/// Stored fields returned alongside a query hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitFields {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: String,
}

/// One ranked result of a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub id: String,
    /// Relevance on the index's native similarity scale.
    pub score: f32,
    pub fields: HitFields,
}

// --- Completion types ---

/// A single message in a completion transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    /// "system", "user" or "assistant".
    pub role: String,
    pub content: String,
}

impl CompletionMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A named JSON Schema the model output must conform to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSchema {
    pub name: String,
    pub strict: bool,
    pub schema: serde_json::Value,
}

/// A request for schema-constrained model output.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Provider model identifier (e.g., "anthropic/claude-3.5-haiku").
    pub model: String,
    pub messages: Vec<CompletionMessage>,
    pub schema: OutputSchema,
}

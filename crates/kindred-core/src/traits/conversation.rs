// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation store trait for the relational message backend.

use async_trait::async_trait;

use crate::error::KindredError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConversationKey, ConversationTurn, NewTurn};

/// Adapter for the store that owns raw conversation turns.
///
/// The memory pipeline only reads windows of turns and flags them as
/// consolidated; it never edits turn content.
#[async_trait]
pub trait ConversationStore: PluginAdapter {
    /// Persists a new turn and returns it with its assigned id.
    async fn append_turn(
        &self,
        key: &ConversationKey,
        turn: NewTurn,
    ) -> Result<ConversationTurn, KindredError>;

    /// Returns the oldest `limit` unconsolidated turns, oldest first.
    async fn unconsolidated_turns(
        &self,
        key: &ConversationKey,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, KindredError>;

    /// Flags the given turns as consolidated.
    async fn mark_consolidated(
        &self,
        key: &ConversationKey,
        turn_ids: &[String],
    ) -> Result<(), KindredError>;
}

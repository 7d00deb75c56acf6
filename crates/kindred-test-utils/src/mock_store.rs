// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory conversation store with per-turn consolidation flags.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use kindred_core::traits::{ConversationStore, PluginAdapter};
use kindred_core::types::{AdapterType, ConversationKey, ConversationTurn, HealthStatus, NewTurn};
use kindred_core::KindredError;

#[derive(Debug, Clone)]
struct StoredTurn {
    turn: ConversationTurn,
    consolidated: bool,
}

#[derive(Default)]
struct State {
    conversations: HashMap<ConversationKey, Vec<StoredTurn>>,
    fail_appends: bool,
    fail_fetches: bool,
    fail_marks: bool,
    mark_calls: usize,
}

/// Conversation store backed by a map of key to ordered turns.
#[derive(Default)]
pub struct InMemoryConversationStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_appends(&self, fail: bool) {
        self.state.lock().await.fail_appends = fail;
    }

    pub async fn fail_fetches(&self, fail: bool) {
        self.state.lock().await.fail_fetches = fail;
    }

    pub async fn fail_marks(&self, fail: bool) {
        self.state.lock().await.fail_marks = fail;
    }

    /// All turns of a conversation, oldest first.
    pub async fn turns(&self, key: &ConversationKey) -> Vec<ConversationTurn> {
        self.state
            .lock()
            .await
            .conversations
            .get(key)
            .map(|turns| turns.iter().map(|t| t.turn.clone()).collect())
            .unwrap_or_default()
    }

    /// Ids of turns flagged consolidated, oldest first.
    pub async fn consolidated_ids(&self, key: &ConversationKey) -> Vec<String> {
        self.state
            .lock()
            .await
            .conversations
            .get(key)
            .map(|turns| {
                turns
                    .iter()
                    .filter(|t| t.consolidated)
                    .map(|t| t.turn.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of `mark_consolidated` calls, including failed ones.
    pub async fn mark_calls(&self) -> usize {
        self.state.lock().await.mark_calls
    }
}

#[async_trait]
impl PluginAdapter for InMemoryConversationStore {
    fn name(&self) -> &str {
        "memory-conversation-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ConversationStore
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        Ok(HealthStatus::Healthy)
    }
}

fn storage_error(what: &str) -> KindredError {
    KindredError::Storage {
        source: Box::new(std::io::Error::other(format!("injected {what} failure"))),
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn append_turn(
        &self,
        key: &ConversationKey,
        turn: NewTurn,
    ) -> Result<ConversationTurn, KindredError> {
        let mut state = self.state.lock().await;
        if state.fail_appends {
            return Err(storage_error("append"));
        }

        let stored = ConversationTurn {
            id: uuid::Uuid::new_v4().to_string(),
            role: turn.role,
            content: turn.content,
            attachment_description: turn.attachment_description,
        };
        state
            .conversations
            .entry(key.clone())
            .or_default()
            .push(StoredTurn {
                turn: stored.clone(),
                consolidated: false,
            });
        Ok(stored)
    }

    async fn unconsolidated_turns(
        &self,
        key: &ConversationKey,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, KindredError> {
        let state = self.state.lock().await;
        if state.fail_fetches {
            return Err(storage_error("fetch"));
        }

        Ok(state
            .conversations
            .get(key)
            .map(|turns| {
                turns
                    .iter()
                    .filter(|t| !t.consolidated)
                    .take(limit)
                    .map(|t| t.turn.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn mark_consolidated(
        &self,
        key: &ConversationKey,
        turn_ids: &[String],
    ) -> Result<(), KindredError> {
        let mut state = self.state.lock().await;
        state.mark_calls += 1;
        if state.fail_marks {
            return Err(storage_error("mark"));
        }

        if let Some(turns) = state.conversations.get_mut(key) {
            for stored in turns.iter_mut() {
                if turn_ids.contains(&stored.turn.id) {
                    stored.consolidated = true;
                }
            }
        }
        Ok(())
    }
}

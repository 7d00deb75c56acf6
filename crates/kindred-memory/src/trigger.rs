// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn recording with window-based consolidation.
//!
//! Every saved assistant turn checks whether the conversation has a full
//! window of unconsolidated turns. If it does, that window is consolidated
//! and its turns are marked so they are never consolidated again.
//!
//! Created fact ids are prefixed with the id of the assistant turn whose
//! save fired the run. A window left unmarked is retried from a later turn,
//! so a retry never reuses ids an earlier attempt may have written.

use std::sync::Arc;

use kindred_config::model::MemoryConfig;
use kindred_core::error::KindredError;
use kindred_core::traits::ConversationStore;
use kindred_core::types::{ConversationKey, ConversationTurn, NewTurn, Role};
use tracing::{debug, error, info, warn};

use crate::engine::ConsolidationEngine;
use crate::gate::NamespaceGate;
use crate::types::ConsolidationReport;

/// When and how the trigger consolidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerPolicy {
    /// Consolidation is skipped entirely when false.
    pub enabled: bool,
    /// Unconsolidated turns needed before a run starts; also the run's window.
    pub window_size: usize,
    pub serialize_per_namespace: bool,
    /// Mark the window consolidated even when the run failed.
    pub mark_on_failure: bool,
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            window_size: 30,
            serialize_per_namespace: true,
            mark_on_failure: false,
        }
    }
}

impl From<&MemoryConfig> for TriggerPolicy {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            enabled: config.enabled,
            window_size: config.window_size,
            serialize_per_namespace: config.serialize_per_namespace,
            mark_on_failure: config.mark_on_failure,
        }
    }
}

/// Result of one trigger evaluation.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// Not enough unconsolidated turns yet.
    Pending { unconsolidated: usize },
    /// The window was consolidated and marked.
    Consolidated(ConsolidationReport),
    /// Facts were written but the window could not be marked; it will be consolidated again.
    MarkFailed(ConsolidationReport),
    /// Fetching or consolidating the window failed.
    Failed { error: KindredError, marked: bool },
}

/// A stored turn plus what its save triggered.
#[derive(Debug)]
pub struct RecordedTurn {
    pub turn: ConversationTurn,
    /// `None` for user turns and when consolidation is disabled.
    pub consolidation: Option<TriggerOutcome>,
}

/// Saves turns and consolidates full windows.
pub struct ConsolidationTrigger {
    store: Arc<dyn ConversationStore>,
    engine: Arc<ConsolidationEngine>,
    policy: TriggerPolicy,
    gate: NamespaceGate,
}

impl ConsolidationTrigger {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        engine: Arc<ConsolidationEngine>,
        policy: TriggerPolicy,
    ) -> Self {
        Self {
            store,
            engine,
            policy,
            gate: NamespaceGate::new(),
        }
    }

    pub fn policy(&self) -> &TriggerPolicy {
        &self.policy
    }

    /// Persist a turn; assistant turns then evaluate consolidation.
    ///
    /// Only a failure to store the turn is returned as an error. Consolidation
    /// problems are logged and reported through [`RecordedTurn::consolidation`].
    pub async fn record_turn(
        &self,
        key: &ConversationKey,
        turn: NewTurn,
    ) -> Result<RecordedTurn, KindredError> {
        let turn = self.store.append_turn(key, turn).await?;

        let consolidation = if turn.role == Role::Assistant && self.policy.enabled {
            Some(self.maybe_consolidate(key, &turn.id).await)
        } else {
            None
        };

        Ok(RecordedTurn {
            turn,
            consolidation,
        })
    }

    /// Consolidate the conversation's oldest unconsolidated window if it is full.
    ///
    /// `trigger_turn_id` prefixes created fact ids and must not have fired a
    /// run before.
    pub async fn maybe_consolidate(
        &self,
        key: &ConversationKey,
        trigger_turn_id: &str,
    ) -> TriggerOutcome {
        let namespace = key.namespace();
        let guard = if self.policy.serialize_per_namespace {
            Some(self.gate.acquire(&namespace).await)
        } else {
            None
        };

        let outcome = self.evaluate(key, trigger_turn_id).await;

        drop(guard);
        self.gate.release_idle();
        outcome
    }

    async fn evaluate(&self, key: &ConversationKey, trigger_turn_id: &str) -> TriggerOutcome {
        let namespace = key.namespace();

        let window = match self
            .store
            .unconsolidated_turns(key, self.policy.window_size)
            .await
        {
            Ok(window) => window,
            Err(error) => {
                warn!(namespace = %namespace, channel = %key.channel, error = %error, "could not fetch unconsolidated turns");
                return TriggerOutcome::Failed {
                    error,
                    marked: false,
                };
            }
        };

        if window.len() < self.policy.window_size {
            debug!(
                namespace = %namespace,
                unconsolidated = window.len(),
                window_size = self.policy.window_size,
                "consolidation window not full"
            );
            return TriggerOutcome::Pending {
                unconsolidated: window.len(),
            };
        }

        let turn_ids: Vec<String> = window.iter().map(|t| t.id.clone()).collect();

        match self
            .engine
            .consolidate_as(&namespace, trigger_turn_id, &window)
            .await
        {
            Ok(report) => match self.store.mark_consolidated(key, &turn_ids).await {
                Ok(()) => {
                    info!(
                        namespace = %namespace,
                        turns = turn_ids.len(),
                        facts = report.total_written(),
                        "window consolidated"
                    );
                    TriggerOutcome::Consolidated(report)
                }
                Err(e) => {
                    error!(namespace = %namespace, error = %e, "facts written but window not marked consolidated");
                    TriggerOutcome::MarkFailed(report)
                }
            },
            Err(error) => {
                let marked = self.policy.mark_on_failure && self.mark_after_failure(key, &turn_ids).await;
                warn!(
                    namespace = %namespace,
                    error = %error,
                    marked,
                    "consolidation failed"
                );
                TriggerOutcome::Failed { error, marked }
            }
        }
    }

    async fn mark_after_failure(&self, key: &ConversationKey, turn_ids: &[String]) -> bool {
        match self.store.mark_consolidated(key, turn_ids).await {
            Ok(()) => true,
            Err(e) => {
                error!(namespace = %key.namespace(), error = %e, "could not mark failed window consolidated");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_memory_defaults() {
        let from_config = TriggerPolicy::from(&MemoryConfig::default());
        assert_eq!(from_config, TriggerPolicy::default());
        assert_eq!(from_config.window_size, 30);
        assert!(!from_config.mark_on_failure);
    }
}

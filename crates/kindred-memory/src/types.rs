// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types for the consolidation pipeline.

use kindred_core::{FactCategory, FactRecord, Namespace};
use serde::{Deserialize, Serialize};

/// Candidate facts extracted from one window of conversation turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFacts {
    /// Statements about the human user, in extraction order.
    pub user_facts: Vec<String>,
    /// Statements the persona made about itself, in extraction order.
    pub agent_facts: Vec<String>,
}

impl ExtractedFacts {
    /// The candidate list for one category.
    pub fn for_category(&self, category: FactCategory) -> &[String] {
        match category {
            FactCategory::User => &self.user_facts,
            FactCategory::Agent => &self.agent_facts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_facts.is_empty() && self.agent_facts.is_empty()
    }
}

/// Outcome of reconciling an incoming fact against a stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Both facts describe the same topic; this text replaces the stored one.
    Merged(String),
    /// The facts are about different topics and must stay separate.
    NoMerge,
}

/// Whether a staged record mints a new id or overwrites a matched one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StagedAction {
    Created,
    Updated,
}

/// A record staged for upsert, with the decision that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedRecord {
    pub action: StagedAction,
    pub record: FactRecord,
}

/// What one category's pass staged and wrote.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryOutcome {
    pub staged: Vec<StagedRecord>,
}

impl CategoryOutcome {
    pub fn created(&self) -> usize {
        self.count(StagedAction::Created)
    }

    pub fn updated(&self) -> usize {
        self.count(StagedAction::Updated)
    }

    fn count(&self, action: StagedAction) -> usize {
        self.staged.iter().filter(|s| s.action == action).count()
    }

    /// The plain records, in staging order.
    pub fn records(&self) -> Vec<FactRecord> {
        self.staged.iter().map(|s| s.record.clone()).collect()
    }
}

/// Summary of one consolidation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidationReport {
    pub namespace: Namespace,
    /// Prefix of every created id: the turn that fired the run, or the
    /// window's newest turn. `None` when the run was given no turns.
    pub trigger_turn_id: Option<String>,
    pub user: CategoryOutcome,
    pub agent: CategoryOutcome,
}

impl ConsolidationReport {
    pub(crate) fn empty(namespace: Namespace, trigger_turn_id: Option<String>) -> Self {
        Self {
            namespace,
            trigger_turn_id,
            user: CategoryOutcome::default(),
            agent: CategoryOutcome::default(),
        }
    }

    pub fn outcome(&self, category: FactCategory) -> &CategoryOutcome {
        match category {
            FactCategory::User => &self.user,
            FactCategory::Agent => &self.agent,
        }
    }

    pub(crate) fn outcome_mut(&mut self, category: FactCategory) -> &mut CategoryOutcome {
        match category {
            FactCategory::User => &mut self.user,
            FactCategory::Agent => &mut self.agent,
        }
    }

    /// Total records written across both categories.
    pub fn total_written(&self) -> usize {
        self.user.staged.len() + self.agent.staged.len()
    }
}

/// Current UTC time in the timestamp format stored on fact records.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged(action: StagedAction, id: &str) -> StagedRecord {
        StagedRecord {
            action,
            record: FactRecord {
                id: id.to_string(),
                text: "text".to_string(),
                timestamp: "2026-03-01T00:00:00.000Z".to_string(),
            },
        }
    }

    #[test]
    fn extracted_facts_selects_category() {
        let facts = ExtractedFacts {
            user_facts: vec!["u".to_string()],
            agent_facts: vec!["a1".to_string(), "a2".to_string()],
        };
        assert_eq!(facts.for_category(FactCategory::User), ["u".to_string()]);
        assert_eq!(facts.for_category(FactCategory::Agent).len(), 2);
        assert!(!facts.is_empty());
        assert!(ExtractedFacts::default().is_empty());
    }

    #[test]
    fn outcome_counts_actions() {
        let outcome = CategoryOutcome {
            staged: vec![
                staged(StagedAction::Created, "t_0"),
                staged(StagedAction::Updated, "old"),
                staged(StagedAction::Created, "t_1"),
            ],
        };
        assert_eq!(outcome.created(), 2);
        assert_eq!(outcome.updated(), 1);
        assert_eq!(outcome.records().len(), 3);
    }

    #[test]
    fn timestamp_is_rfc3339_utc_millis() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok(), "got {ts}");
        assert_eq!(ts.len(), "2026-03-01T00:00:00.000Z".len());
    }
}

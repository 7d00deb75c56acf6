// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read path: similarity search over a namespace's stored facts.

use std::sync::Arc;

use kindred_core::error::KindredError;
use kindred_core::traits::SimilarityIndex;
use kindred_core::types::{FactCategory, IndexHit, Namespace};
use serde::Serialize;
use tracing::debug;

/// A stored fact as shown to the persona model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecalledFact {
    pub text: String,
    /// Timestamp of the last write to the record.
    pub uploaded_at: String,
}

impl From<IndexHit> for RecalledFact {
    fn from(hit: IndexHit) -> Self {
        Self {
            text: hit.fields.text,
            uploaded_at: hit.fields.timestamp,
        }
    }
}

/// Facts recalled for one persona turn. "You" is the persona.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecalledFacts {
    pub facts_about_user: Vec<RecalledFact>,
    pub facts_about_you: Vec<RecalledFact>,
}

/// Queries both fact partitions of a namespace.
pub struct FactRecall {
    index: Arc<dyn SimilarityIndex>,
    top_k: usize,
}

impl FactRecall {
    pub fn new(index: Arc<dyn SimilarityIndex>, top_k: usize) -> Self {
        Self { index, top_k }
    }

    /// Search user facts with `user_query` and agent facts with `agent_query`.
    ///
    /// A missing or blank query skips its partition and yields an empty list.
    pub async fn recall(
        &self,
        namespace: &Namespace,
        user_query: Option<&str>,
        agent_query: Option<&str>,
    ) -> Result<RecalledFacts, KindredError> {
        Ok(RecalledFacts {
            facts_about_user: self.search(FactCategory::User, namespace, user_query).await?,
            facts_about_you: self.search(FactCategory::Agent, namespace, agent_query).await?,
        })
    }

    async fn search(
        &self,
        category: FactCategory,
        namespace: &Namespace,
        query: Option<&str>,
    ) -> Result<Vec<RecalledFact>, KindredError> {
        let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
            return Ok(Vec::new());
        };

        let hits = self.index.query(category, namespace, query, self.top_k).await?;
        debug!(namespace = %namespace, category = %category, hits = hits.len(), "recalled facts");
        Ok(hits.into_iter().map(RecalledFact::from).collect())
    }
}

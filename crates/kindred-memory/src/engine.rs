// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consolidation engine: extraction, per-candidate matching, and upsert.
//!
//! For each category the engine queries the best stored match of every
//! candidate. A match scoring strictly above the merge threshold goes to the
//! reconciler; a merge overwrites the matched record, anything else becomes a
//! new record with id `{trigger_turn_id}_{n}`. Each category's batch is
//! written in a single upsert.
//!
//! The engine does not serialize runs itself; callers that may run it
//! concurrently for one namespace go through [`crate::gate::NamespaceGate`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use kindred_config::model::MemoryConfig;
use kindred_core::error::KindredError;
use kindred_core::traits::{SimilarityIndex, StructuredCompletion};
use kindred_core::types::{ConversationTurn, FactCategory, FactRecord, IndexHit, Namespace};
use tracing::{debug, error, info, warn};

use crate::extractor::ChunkExtractor;
use crate::reconciler::FactReconciler;
use crate::recording;
use crate::types::{ConsolidationReport, Resolution, StagedAction, StagedRecord, now_timestamp};

/// Orchestrates one consolidation run per namespace.
pub struct ConsolidationEngine {
    index: Arc<dyn SimilarityIndex>,
    extractor: ChunkExtractor,
    reconciler: FactReconciler,
    merge_threshold: f32,
}

impl ConsolidationEngine {
    /// Creates an engine from its collaborators.
    pub fn new(
        index: Arc<dyn SimilarityIndex>,
        extractor: ChunkExtractor,
        reconciler: FactReconciler,
        merge_threshold: f32,
    ) -> Self {
        Self {
            index,
            extractor,
            reconciler,
            merge_threshold,
        }
    }

    /// Creates an engine whose extractor and reconciler share one completion service.
    pub fn from_config(
        config: &MemoryConfig,
        index: Arc<dyn SimilarityIndex>,
        completion: Arc<dyn StructuredCompletion>,
    ) -> Self {
        Self::new(
            index,
            ChunkExtractor::new(completion.clone(), config.extraction_model.clone()),
            FactReconciler::new(completion, config.reconcile_model.clone()),
            config.merge_threshold,
        )
    }

    pub fn merge_threshold(&self) -> f32 {
        self.merge_threshold
    }

    /// Consolidate a window of turns (oldest first) into the namespace's facts.
    ///
    /// Extraction failures and upsert failures are returned as errors. A failed
    /// query or reconciliation only downgrades that candidate to a create.
    /// An empty window is a no-op.
    ///
    /// Created ids are prefixed with the newest turn's id. Callers that may
    /// consolidate the same window more than once use [`Self::consolidate_as`].
    pub async fn consolidate(
        &self,
        namespace: &Namespace,
        turns: &[ConversationTurn],
    ) -> Result<ConsolidationReport, KindredError> {
        match turns.last() {
            Some(newest) => self.consolidate_as(namespace, &newest.id, turns).await,
            None => self.consolidate_as(namespace, "", turns).await,
        }
    }

    /// Like [`Self::consolidate`], with created ids prefixed by `trigger_id`.
    ///
    /// `trigger_id` must differ between attempts at the same window. Ids from
    /// an earlier attempt may already be stored, and a reused prefix would
    /// overwrite them with unrelated facts.
    pub async fn consolidate_as(
        &self,
        namespace: &Namespace,
        trigger_id: &str,
        turns: &[ConversationTurn],
    ) -> Result<ConsolidationReport, KindredError> {
        if turns.is_empty() {
            debug!(namespace = %namespace, "no turns to consolidate");
            return Ok(ConsolidationReport::empty(namespace.clone(), None));
        }

        let started = Instant::now();
        let result = self.run(namespace, trigger_id, turns).await;
        let outcome = if result.is_ok() { "success" } else { "failure" };
        recording::record_run(outcome, started.elapsed().as_secs_f64());
        result
    }

    async fn run(
        &self,
        namespace: &Namespace,
        trigger_id: &str,
        turns: &[ConversationTurn],
    ) -> Result<ConsolidationReport, KindredError> {
        let facts = self.extractor.extract(turns).await.inspect_err(|e| {
            warn!(namespace = %namespace, error = %e, "fact extraction failed");
        })?;

        let mut report = ConsolidationReport::empty(namespace.clone(), Some(trigger_id.to_string()));

        for category in FactCategory::ALL {
            let staged = self
                .stage_category(category, namespace, trigger_id, facts.for_category(category))
                .await;
            if staged.is_empty() {
                continue;
            }

            let records: Vec<FactRecord> = staged.iter().map(|s| s.record.clone()).collect();
            if let Err(e) = self.index.upsert(category, namespace, &records).await {
                error!(
                    namespace = %namespace,
                    category = %category,
                    records = records.len(),
                    error = %e,
                    "fact upsert failed, batch lost"
                );
                return Err(e);
            }

            let outcome = report.outcome_mut(category);
            outcome.staged = staged;
            recording::record_category(category, outcome.created(), outcome.updated());
        }

        info!(
            namespace = %namespace,
            trigger = trigger_id,
            user_created = report.user.created(),
            user_updated = report.user.updated(),
            agent_created = report.agent.created(),
            agent_updated = report.agent.updated(),
            "consolidation complete"
        );
        Ok(report)
    }

    /// Decide create-or-update for every candidate of one category.
    async fn stage_category(
        &self,
        category: FactCategory,
        namespace: &Namespace,
        trigger_id: &str,
        candidates: &[String],
    ) -> Vec<StagedRecord> {
        let mut batch = StagingBatch::new(trigger_id);

        for candidate in candidates {
            if let Some(hit) = self.best_match(category, namespace, candidate).await {
                if hit.score > self.merge_threshold {
                    // A record already merged in this batch is reconciled against its new text.
                    let existing = batch
                        .staged_text(&hit.id)
                        .unwrap_or(&hit.fields.text)
                        .to_string();

                    match self.reconciler.reconcile(&existing, candidate).await {
                        Ok(Resolution::Merged(text)) => {
                            debug!(category = %category, id = %hit.id, score = hit.score, "merging into existing fact");
                            batch.update(hit.id, text);
                            continue;
                        }
                        Ok(Resolution::NoMerge) => {
                            debug!(category = %category, id = %hit.id, score = hit.score, "reconciler declined merge");
                        }
                        Err(e) => {
                            warn!(
                                namespace = %namespace,
                                category = %category,
                                id = %hit.id,
                                error = %e,
                                "reconciliation failed, storing candidate as new fact"
                            );
                        }
                    }
                } else {
                    debug!(category = %category, id = %hit.id, score = hit.score, "best match below merge threshold");
                }
            }

            batch.create(candidate.clone());
        }

        batch.into_staged()
    }

    /// Top-1 hit for a candidate; a failed query counts as no match.
    async fn best_match(
        &self,
        category: FactCategory,
        namespace: &Namespace,
        candidate: &str,
    ) -> Option<IndexHit> {
        match self.index.query(category, namespace, candidate, 1).await {
            Ok(hits) => hits.into_iter().next(),
            Err(e) => {
                warn!(
                    namespace = %namespace,
                    category = %category,
                    error = %e,
                    "similarity query failed, storing candidate as new fact"
                );
                None
            }
        }
    }
}

/// Records staged for one category, keyed by id so no id is staged twice.
struct StagingBatch<'a> {
    trigger_id: &'a str,
    counter: usize,
    staged: Vec<StagedRecord>,
    positions: HashMap<String, usize>,
}

impl<'a> StagingBatch<'a> {
    fn new(trigger_id: &'a str) -> Self {
        Self {
            trigger_id,
            counter: 0,
            staged: Vec::new(),
            positions: HashMap::new(),
        }
    }

    fn staged_text(&self, id: &str) -> Option<&str> {
        self.positions
            .get(id)
            .map(|&pos| self.staged[pos].record.text.as_str())
    }

    /// Overwrite a matched record. Replaces an earlier staging of the same id in place.
    fn update(&mut self, id: String, text: String) {
        let record = FactRecord {
            id: id.clone(),
            text,
            timestamp: now_timestamp(),
        };
        match self.positions.get(&id) {
            Some(&pos) => self.staged[pos].record = record,
            None => self.push(StagedAction::Updated, record),
        }
    }

    /// Mint `{trigger}_{counter}`, skipping ids already staged in this batch.
    fn create(&mut self, text: String) {
        let id = loop {
            let id = format!("{}_{}", self.trigger_id, self.counter);
            self.counter += 1;
            if !self.positions.contains_key(&id) {
                break id;
            }
        };
        let record = FactRecord {
            id,
            text,
            timestamp: now_timestamp(),
        };
        self.push(StagedAction::Created, record);
    }

    fn push(&mut self, action: StagedAction, record: FactRecord) {
        self.positions.insert(record.id.clone(), self.staged.len());
        self.staged.push(StagedRecord { action, record });
    }

    fn into_staged(self) -> Vec<StagedRecord> {
        self.staged
    }
}

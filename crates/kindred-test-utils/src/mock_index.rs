// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock similarity index.
//!
//! Upserts land in an in-memory store with replace-by-id semantics. Query
//! results are scripted per category and query text; unscripted queries
//! return no hits. Every call is captured for assertions.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use kindred_core::traits::{PluginAdapter, SimilarityIndex};
use kindred_core::types::{AdapterType, FactCategory, FactRecord, HealthStatus, IndexHit, Namespace};
use kindred_core::KindredError;

/// One captured `upsert` call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertCall {
    pub category: FactCategory,
    pub namespace: Namespace,
    pub records: Vec<FactRecord>,
}

/// One captured `query` call.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCall {
    pub category: FactCategory,
    pub namespace: Namespace,
    pub text: String,
    pub top_k: usize,
}

#[derive(Default)]
struct State {
    stored: HashMap<(FactCategory, Namespace), Vec<FactRecord>>,
    scripted: HashMap<(FactCategory, String), Vec<IndexHit>>,
    failing_queries: HashSet<FactCategory>,
    failing_upserts: HashSet<FactCategory>,
    upserts: Vec<UpsertCall>,
    queries: Vec<QueryCall>,
}

/// An in-memory index with scripted similarity results.
#[derive(Default)]
pub struct MockIndex {
    state: Arc<Mutex<State>>,
}

impl MockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `hits` for queries of `text` in `category`, in any namespace.
    pub async fn script_query(&self, category: FactCategory, text: &str, hits: Vec<IndexHit>) {
        self.state
            .lock()
            .await
            .scripted
            .insert((category, text.to_string()), hits);
    }

    /// Make every query in `category` fail.
    pub async fn fail_queries(&self, category: FactCategory) {
        self.state.lock().await.failing_queries.insert(category);
    }

    /// Make every upsert in `category` fail.
    pub async fn fail_upserts(&self, category: FactCategory) {
        self.state.lock().await.failing_upserts.insert(category);
    }

    /// Clear every query and upsert failure set on `category`.
    pub async fn restore(&self, category: FactCategory) {
        let mut state = self.state.lock().await;
        state.failing_queries.remove(&category);
        state.failing_upserts.remove(&category);
    }

    /// Seed stored records without recording an upsert call.
    pub async fn seed(&self, category: FactCategory, namespace: &Namespace, records: Vec<FactRecord>) {
        let mut state = self.state.lock().await;
        let stored = state.stored.entry((category, namespace.clone())).or_default();
        for record in records {
            replace_or_push(stored, record);
        }
    }

    /// Records currently stored for a category and namespace.
    pub async fn stored(&self, category: FactCategory, namespace: &Namespace) -> Vec<FactRecord> {
        self.state
            .lock()
            .await
            .stored
            .get(&(category, namespace.clone()))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn upserts(&self) -> Vec<UpsertCall> {
        self.state.lock().await.upserts.clone()
    }

    pub async fn queries(&self) -> Vec<QueryCall> {
        self.state.lock().await.queries.clone()
    }
}

fn replace_or_push(stored: &mut Vec<FactRecord>, record: FactRecord) {
    match stored.iter_mut().find(|r| r.id == record.id) {
        Some(existing) => *existing = record,
        None => stored.push(record),
    }
}

#[async_trait]
impl PluginAdapter for MockIndex {
    fn name(&self) -> &str {
        "mock-index"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Index
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SimilarityIndex for MockIndex {
    async fn upsert(
        &self,
        category: FactCategory,
        namespace: &Namespace,
        records: &[FactRecord],
    ) -> Result<(), KindredError> {
        let mut state = self.state.lock().await;
        state.upserts.push(UpsertCall {
            category,
            namespace: namespace.clone(),
            records: records.to_vec(),
        });
        if state.failing_upserts.contains(&category) {
            return Err(KindredError::index(format!("injected upsert failure for {category}")));
        }

        let stored = state.stored.entry((category, namespace.clone())).or_default();
        for record in records {
            replace_or_push(stored, record.clone());
        }
        Ok(())
    }

    async fn query(
        &self,
        category: FactCategory,
        namespace: &Namespace,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<IndexHit>, KindredError> {
        let mut state = self.state.lock().await;
        state.queries.push(QueryCall {
            category,
            namespace: namespace.clone(),
            text: text.to_string(),
            top_k,
        });
        if state.failing_queries.contains(&category) {
            return Err(KindredError::index(format!("injected query failure for {category}")));
        }

        let mut hits = state
            .scripted
            .get(&(category, text.to_string()))
            .cloned()
            .unwrap_or_default();
        hits.truncate(top_k);
        Ok(hits)
    }
}

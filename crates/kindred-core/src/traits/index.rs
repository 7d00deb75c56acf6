// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Similarity index trait for namespaced nearest-neighbor fact storage.

use async_trait::async_trait;

use crate::error::KindredError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{FactCategory, FactRecord, IndexHit, Namespace};

/// Adapter for a text similarity index with server-side embedding.
///
/// Each [`FactCategory`] maps to its own partition; implementations must
/// never return records of one category from a query against the other.
#[async_trait]
pub trait SimilarityIndex: PluginAdapter {
    /// Writes records into the category partition of a namespace.
    ///
    /// A record whose id already exists replaces the stored one.
    async fn upsert(
        &self,
        category: FactCategory,
        namespace: &Namespace,
        records: &[FactRecord],
    ) -> Result<(), KindredError>;

    /// Returns up to `top_k` hits for `text`, ordered by descending score.
    async fn query(
        &self,
        category: FactCategory,
        namespace: &Namespace,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<IndexHit>, KindredError>;
}

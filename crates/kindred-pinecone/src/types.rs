// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pinecone integrated-records API request/response types.

use kindred_core::types::{FactRecord, HitFields, IndexHit};
use serde::{Deserialize, Serialize};

/// Fields returned with every search hit.
pub const RETURNED_FIELDS: [&str; 2] = ["text", "timestamp"];

/// One NDJSON line of an upsert body. `text` is the embedded field.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertRecord<'a> {
    #[serde(rename = "_id")]
    pub id: &'a str,
    pub text: &'a str,
    pub timestamp: &'a str,
}

impl<'a> From<&'a FactRecord> for UpsertRecord<'a> {
    fn from(record: &'a FactRecord) -> Self {
        Self {
            id: &record.id,
            text: &record.text,
            timestamp: &record.timestamp,
        }
    }
}

/// Render records as newline-delimited JSON.
pub fn to_ndjson(records: &[FactRecord]) -> Result<String, serde_json::Error> {
    let mut body = String::new();
    for record in records {
        body.push_str(&serde_json::to_string(&UpsertRecord::from(record))?);
        body.push('\n');
    }
    Ok(body)
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest<'a> {
    pub query: SearchQuery<'a>,
    pub fields: [&'static str; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchQuery<'a> {
    pub inputs: SearchInputs<'a>,
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchInputs<'a> {
    pub text: &'a str,
}

impl<'a> SearchRequest<'a> {
    pub fn text(text: &'a str, top_k: usize) -> Self {
        Self {
            query: SearchQuery {
                inputs: SearchInputs { text },
                top_k,
            },
            fields: RETURNED_FIELDS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub result: SearchResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score")]
    pub score: f32,
    #[serde(default)]
    pub fields: HitFields,
}

impl From<SearchHit> for IndexHit {
    fn from(hit: SearchHit) -> Self {
        IndexHit {
            id: hit.id,
            score: hit.score,
            fields: hit.fields,
        }
    }
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

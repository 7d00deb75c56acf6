// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for Pinecone index hosts.
//!
//! Provides [`PineconeClient`] which handles API-key authentication,
//! namespace path encoding, and a single retry on transient errors.

use std::time::Duration;

use kindred_core::KindredError;
use kindred_core::types::{FactRecord, IndexHit};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response, Url};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, SearchRequest, SearchResponse, to_ndjson};

/// HTTP client shared by all index hosts.
#[derive(Debug, Clone)]
pub struct PineconeClient {
    client: reqwest::Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl PineconeClient {
    /// Creates a client sending `Api-Key` and `X-Pinecone-API-Version` on every request.
    pub fn new(api_key: &str, api_version: &str, timeout: Duration) -> Result<Self, KindredError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| KindredError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert(
            "x-pinecone-api-version",
            HeaderValue::from_str(api_version).map_err(|e| {
                KindredError::Config(format!("invalid API version header value: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| KindredError::Index {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Shortens the retry delay (tests only).
    #[cfg(test)]
    pub(crate) fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Upserts records into `namespace` on `host` as NDJSON.
    pub async fn upsert_records(
        &self,
        host: &Url,
        namespace: &str,
        records: &[FactRecord],
    ) -> Result<(), KindredError> {
        let url = namespace_url(host, namespace, "upsert")?;
        let body = to_ndjson(records).map_err(|e| KindredError::Index {
            message: format!("failed to encode records: {e}"),
            source: Some(Box::new(e)),
        })?;

        self.send(|| {
            self.client
                .post(url.clone())
                .header(CONTENT_TYPE, "application/x-ndjson")
                .body(body.clone())
        })
        .await?;
        Ok(())
    }

    /// Text search in `namespace` on `host`, returning hits by descending score.
    pub async fn search_records(
        &self,
        host: &Url,
        namespace: &str,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<IndexHit>, KindredError> {
        let url = namespace_url(host, namespace, "search")?;
        let request = SearchRequest::text(text, top_k);

        let response = self
            .send(|| self.client.post(url.clone()).json(&request))
            .await?;
        let body = response.text().await.map_err(|e| KindredError::Index {
            message: format!("failed to read search response: {e}"),
            source: Some(Box::new(e)),
        })?;
        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| KindredError::Index {
            message: format!("failed to parse search response: {e}"),
            source: Some(Box::new(e)),
        })?;

        Ok(parsed.result.hits.into_iter().map(IndexHit::from).collect())
    }

    /// Fetches index statistics; used as a health check.
    pub async fn describe_index_stats(&self, host: &Url) -> Result<(), KindredError> {
        let url = host_url(host, &["describe_index_stats"])?;
        self.send(|| self.client.post(url.clone()).json(&serde_json::json!({})))
            .await?;
        Ok(())
    }

    /// Sends the request built by `build`, retrying once on transient statuses.
    async fn send<F>(&self, build: F) -> Result<Response, KindredError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying index request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = build().send().await.map_err(|e| KindredError::Index {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

            let status = response.status();
            debug!(status = %status, attempt, url = %response.url(), "index response received");

            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("Pinecone API error ({status}): {}", api_err.error.message),
                Err(_) => format!("API returned {status}: {body}"),
            };

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(KindredError::index(message));
                continue;
            }

            return Err(KindredError::index(message));
        }

        Err(last_error.unwrap_or_else(|| KindredError::index("index request failed after retries")))
    }
}

/// `{host}/records/namespaces/{namespace}/{action}` with the namespace as one encoded segment.
pub fn namespace_url(host: &Url, namespace: &str, action: &str) -> Result<Url, KindredError> {
    host_url(host, &["records", "namespaces", namespace, action])
}

/// Appends `segments` to the host's path, each percent-encoded on its own.
pub fn host_url(host: &Url, segments: &[&str]) -> Result<Url, KindredError> {
    let mut url = host.clone();
    url.path_segments_mut()
        .map_err(|()| KindredError::index(format!("index host {host} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Returns true for HTTP status codes worth one retry.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

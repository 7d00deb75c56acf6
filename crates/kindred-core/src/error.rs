// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Kindred memory service.

use thiserror::Error;

/// The primary error type used across all Kindred adapter traits and core operations.
#[derive(Debug, Error)]
pub enum KindredError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Similarity index errors (unreachable host, rejected query or upsert).
    #[error("index error: {message}")]
    Index {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Structured completion errors (API failure, model not found, transport).
    #[error("completion error: {message}")]
    Completion {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Model output could not be parsed or did not conform to the requested schema.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// Conversation store errors (connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Requested adapter was not found or not configured.
    #[error("adapter not found: {adapter_type}/{name}")]
    AdapterNotFound { adapter_type: String, name: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KindredError {
    /// Shorthand for an index error without an underlying source.
    pub fn index(message: impl Into<String>) -> Self {
        KindredError::Index {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a completion error without an underlying source.
    pub fn completion(message: impl Into<String>) -> Self {
        KindredError::Completion {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a schema conformance error.
    pub fn schema(message: impl Into<String>) -> Self {
        KindredError::Schema {
            message: message.into(),
        }
    }
}

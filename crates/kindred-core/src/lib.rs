// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Kindred memory service.
//!
//! This crate provides the trait definitions, error type, and domain types
//! shared by the memory pipeline and its adapters. Every external
//! collaborator (similarity index, structured completion, conversation
//! store) is reached through a trait defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::KindredError;
pub use types::{
    AdapterType, CompletionMessage, CompletionRequest, ConversationKey, ConversationTurn,
    FactCategory, FactRecord, HealthStatus, HitFields, IndexHit, Namespace, NewTurn,
    OutputSchema, Role,
};

pub use traits::{ConversationStore, PluginAdapter, SimilarityIndex, StructuredCompletion};

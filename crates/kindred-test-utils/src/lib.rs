// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Kindred.
//!
//! Mock adapters for deterministic, CI-runnable tests without external
//! services.
//!
//! # Components
//!
//! - [`MockCompletion`] - scripted structured-completion responses, keyed by schema name
//! - [`MockIndex`] - in-memory similarity index with scripted query hits and failure injection
//! - [`InMemoryConversationStore`] - conversation store with consolidation flags
//! - [`fixtures`] - turn and hit builders

pub mod fixtures;
pub mod mock_completion;
pub mod mock_index;
pub mod mock_store;

pub use mock_completion::MockCompletion;
pub use mock_index::{MockIndex, QueryCall, UpsertCall};
pub use mock_store::InMemoryConversationStore;

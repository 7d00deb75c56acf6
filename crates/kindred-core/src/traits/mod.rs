// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the external collaborators of the memory pipeline.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod completion;
pub mod conversation;
pub mod index;

pub use adapter::PluginAdapter;
pub use completion::StructuredCompletion;
pub use conversation::ConversationStore;
pub use index::SimilarityIndex;

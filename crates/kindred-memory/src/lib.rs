// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory for Kindred personas.
//!
//! Conversation windows are distilled into durable facts about the user and
//! about the persona, merged with what is already stored, and written to a
//! similarity index partitioned by `user_id/persona_id`.
//!
//! ## Architecture
//!
//! - **ChunkExtractor**: LLM extraction of candidate facts from a window
//! - **FactReconciler**: LLM merge decision between a stored and an incoming fact
//! - **ConsolidationEngine**: per-candidate create-or-merge and batched upsert
//! - **NamespaceGate**: one consolidation run per namespace at a time
//! - **ConsolidationTrigger**: turn recording with window-based consolidation
//! - **FactRecall** / **GetFactsTool**: the read path exposed to the persona

pub mod engine;
pub mod extractor;
pub mod gate;
pub mod prompts;
pub mod recall;
pub mod reconciler;
pub mod recording;
pub mod tool;
pub mod trigger;
pub mod types;

pub use engine::ConsolidationEngine;
pub use extractor::ChunkExtractor;
pub use gate::NamespaceGate;
pub use recall::{FactRecall, RecalledFact, RecalledFacts};
pub use reconciler::FactReconciler;
pub use tool::{GetFactsTool, Tool, ToolContext, ToolOutput, ToolRegistry};
pub use trigger::{ConsolidationTrigger, RecordedTurn, TriggerOutcome, TriggerPolicy};
pub use types::*;

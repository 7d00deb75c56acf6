// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints that serde attributes cannot express, such as
//! threshold ranges, non-empty model names, and index host URLs.

use crate::diagnostic::ConfigError;
use crate::model::KindredConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &KindredConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let memory = &config.memory;

    if memory.window_size == 0 {
        errors.push(invalid("memory.window_size must be at least 1".to_string()));
    }

    if !memory.merge_threshold.is_finite() || !(-1.0..=1.0).contains(&memory.merge_threshold) {
        errors.push(invalid(format!(
            "memory.merge_threshold must be within [-1.0, 1.0], got {}",
            memory.merge_threshold
        )));
    }

    if memory.extraction_model.trim().is_empty() {
        errors.push(invalid("memory.extraction_model must not be empty".to_string()));
    }

    if memory.reconcile_model.trim().is_empty() {
        errors.push(invalid("memory.reconcile_model must not be empty".to_string()));
    }

    if memory.recall_top_k == 0 {
        errors.push(invalid("memory.recall_top_k must be at least 1".to_string()));
    }

    if config.openrouter.base_url.trim().is_empty() {
        errors.push(invalid("openrouter.base_url must not be empty".to_string()));
    }

    for (key, host) in [
        ("pinecone.user_index_host", &config.pinecone.user_index_host),
        ("pinecone.agent_index_host", &config.pinecone.agent_index_host),
    ] {
        if let Some(host) = host {
            if !host.starts_with("https://") && !host.starts_with("http://") {
                errors.push(invalid(format!(
                    "{key} `{host}` must start with https:// or http://"
                )));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Validation { message }
}

// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./kindred.toml` > `~/.config/kindred/kindred.toml` > `/etc/kindred/kindred.toml`
//! with environment variable overrides via `KINDRED_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KindredConfig;

/// Top-level sections that environment variables may address.
const ENV_SECTIONS: &[&str] = &["service", "openrouter", "pinecone", "memory"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/kindred/kindred.toml` (system-wide)
/// 3. `~/.config/kindred/kindred.toml` (user XDG config)
/// 4. `./kindred.toml` (local directory)
/// 5. `KINDRED_*` environment variables
pub fn load_config() -> Result<KindredConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KindredConfig::default()))
        .merge(Toml::file("/etc/kindred/kindred.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("kindred/kindred.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("kindred.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<KindredConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KindredConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KindredConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KindredConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `KINDRED_MEMORY_WINDOW_SIZE` must
/// map to `memory.window_size`, not `memory.window.size`.
fn env_provider() -> Env {
    Env::prefixed("KINDRED_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key to its dotted config path.
///
/// Only the first underscore after a known section name becomes a dot.
fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kindred doctor` command implementation.
//!
//! Checks that the configuration is usable and that the completion and
//! index adapters can be built and reached.

use std::time::{Duration, Instant};

use kindred_config::model::KindredConfig;
use kindred_core::{HealthStatus, KindredError, PluginAdapter};
use kindred_openrouter::OpenRouterCompletion;
use kindred_pinecone::PineconeIndex;

/// Status of a diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }

    /// One output line, e.g. `[OK]   Index  healthy (12ms)`.
    fn render(&self) -> String {
        let tag = match self.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({}ms)",
            self.name,
            self.message,
            self.duration.as_millis()
        )
    }
}

/// Run every check and print the results. Any failed check is an error.
pub async fn run_doctor(config: &KindredConfig) -> Result<(), KindredError> {
    let results = vec![
        check_config(config),
        check_completion(config).await,
        check_index(config).await,
        check_memory_baseline(),
    ];

    println!();
    println!("  kindred doctor");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", result.render());
    }
    println!();

    let failed = results.iter().filter(|r| r.status == CheckStatus::Fail).count();
    let warned = results.iter().filter(|r| r.status == CheckStatus::Warn).count();
    match failed + warned {
        0 => println!("  All checks passed."),
        1 => println!("  1 issue found."),
        n => println!("  {n} issues found."),
    }
    println!();

    if failed > 0 {
        return Err(KindredError::Internal(format!("{failed} check(s) failed")));
    }
    Ok(())
}

/// The config already passed validation at startup; report the settings that matter.
fn check_config(config: &KindredConfig) -> CheckResult {
    let start = Instant::now();
    let memory = &config.memory;
    if !memory.enabled {
        return CheckResult::new("Configuration", CheckStatus::Warn, "consolidation disabled", start);
    }
    CheckResult::new(
        "Configuration",
        CheckStatus::Pass,
        format!(
            "window {} turns, merge above {}",
            memory.window_size, memory.merge_threshold
        ),
        start,
    )
}

async fn check_completion(config: &KindredConfig) -> CheckResult {
    let start = Instant::now();
    match OpenRouterCompletion::new(&config.openrouter) {
        Ok(adapter) => from_health("Completion", adapter.health_check().await, start),
        Err(e) => CheckResult::new("Completion", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_index(config: &KindredConfig) -> CheckResult {
    let start = Instant::now();
    match PineconeIndex::new(&config.pinecone) {
        Ok(adapter) => from_health("Index", adapter.health_check().await, start),
        Err(e) => CheckResult::new("Index", CheckStatus::Fail, e.to_string(), start),
    }
}

fn from_health(
    name: &str,
    health: Result<HealthStatus, KindredError>,
    start: Instant,
) -> CheckResult {
    match health {
        Ok(HealthStatus::Healthy) => CheckResult::new(name, CheckStatus::Pass, "healthy", start),
        Ok(HealthStatus::Degraded(reason)) => {
            CheckResult::new(name, CheckStatus::Warn, format!("degraded: {reason}"), start)
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            CheckResult::new(name, CheckStatus::Fail, format!("unhealthy: {reason}"), start)
        }
        Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    }
}

fn check_memory_baseline() -> CheckResult {
    let start = Instant::now();

    #[cfg(not(target_env = "msvc"))]
    {
        let _ = tikv_jemalloc_ctl::epoch::advance();
        let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
        let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
        let allocated_mb = allocated as f64 / (1024.0 * 1024.0);
        let resident_mb = resident as f64 / (1024.0 * 1024.0);
        CheckResult::new(
            "Memory baseline",
            CheckStatus::Pass,
            format!("heap: {allocated_mb:.1} MB, resident: {resident_mb:.1} MB"),
            start,
        )
    }

    #[cfg(target_env = "msvc")]
    {
        CheckResult::new(
            "Memory baseline",
            CheckStatus::Warn,
            "jemalloc not available on MSVC",
            start,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_maps_to_status() {
        let start = Instant::now();
        assert_eq!(from_health("x", Ok(HealthStatus::Healthy), start).status, CheckStatus::Pass);
        assert_eq!(
            from_health("x", Ok(HealthStatus::Degraded("agent: 503".into())), start).status,
            CheckStatus::Warn
        );
        assert_eq!(
            from_health("x", Ok(HealthStatus::Unhealthy("down".into())), start).status,
            CheckStatus::Fail
        );
        assert_eq!(
            from_health("x", Err(KindredError::index("boom")), start).status,
            CheckStatus::Fail
        );
    }

    #[test]
    fn disabled_memory_warns() {
        let mut config = KindredConfig::default();
        config.memory.enabled = false;
        assert_eq!(check_config(&config).status, CheckStatus::Warn);
        assert_eq!(check_config(&KindredConfig::default()).status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn index_without_hosts_fails() {
        let mut config = KindredConfig::default();
        config.pinecone.api_key = Some("pc-test".into());

        let result = check_index(&config).await;

        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.message.contains("user_index_host"), "got: {}", result.message);
    }

    #[tokio::test]
    async fn completion_with_key_is_healthy() {
        let mut config = KindredConfig::default();
        config.openrouter.api_key = Some("sk-or-test".into());
        assert_eq!(check_completion(&config).await.status, CheckStatus::Pass);
    }

    #[test]
    fn render_uses_plain_tags() {
        let result = CheckResult {
            name: "Index".into(),
            status: CheckStatus::Warn,
            message: "degraded: agent: 503".into(),
            duration: Duration::from_millis(7),
        };
        let line = result.render();
        assert!(line.starts_with("    [WARN] Index"));
        assert!(line.ends_with("degraded: agent: 503 (7ms)"));
    }

    #[test]
    fn memory_baseline_reports() {
        let status = check_memory_baseline().status;
        assert!(status == CheckStatus::Pass || status == CheckStatus::Warn);
    }
}

// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers for consolidation.
//!
//! Uses the metrics-rs facade so any installed recorder can collect these.
//! Without a recorder every call is a no-op.

use kindred_core::FactCategory;
use metrics::{describe_counter, describe_histogram};

/// Register metric descriptions. Call once after installing a recorder.
pub fn register_metrics() {
    describe_counter!("kindred_facts_created_total", "Fact records created by consolidation");
    describe_counter!(
        "kindred_facts_updated_total",
        "Fact records overwritten with a merged statement"
    );
    describe_counter!(
        "kindred_consolidation_runs_total",
        "Consolidation runs by outcome"
    );
    describe_histogram!(
        "kindred_consolidation_duration_seconds",
        "Wall-clock duration of one consolidation run"
    );
}

pub(crate) fn record_category(category: FactCategory, created: usize, updated: usize) {
    let category = category.to_string();
    metrics::counter!("kindred_facts_created_total", "category" => category.clone())
        .increment(created as u64);
    metrics::counter!("kindred_facts_updated_total", "category" => category)
        .increment(updated as u64);
}

pub(crate) fn record_run(outcome: &'static str, seconds: f64) {
    metrics::counter!("kindred_consolidation_runs_total", "outcome" => outcome).increment(1);
    metrics::histogram!("kindred_consolidation_duration_seconds").record(seconds);
}

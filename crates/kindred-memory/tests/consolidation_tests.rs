// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end consolidation engine tests against mock collaborators.

use std::collections::HashSet;
use std::sync::Arc;

use kindred_config::model::MemoryConfig;
use kindred_core::types::{FactCategory, Namespace};
use kindred_core::KindredError;
use kindred_memory::{ConsolidationEngine, StagedAction};
use kindred_test_utils::fixtures::{FIXED_TIMESTAMP, hit, window};
use kindred_test_utils::{MockCompletion, MockIndex};
use proptest::prelude::*;

const TACOS: &str = "User likes tacos.";

struct Fixture {
    index: Arc<MockIndex>,
    completion: Arc<MockCompletion>,
    engine: ConsolidationEngine,
    namespace: Namespace,
}

fn fixture() -> Fixture {
    let index = Arc::new(MockIndex::new());
    let completion = Arc::new(MockCompletion::new());
    let engine =
        ConsolidationEngine::from_config(&MemoryConfig::default(), index.clone(), completion.clone());
    Fixture {
        index,
        completion,
        engine,
        namespace: Namespace::new("user-1", "persona-1"),
    }
}

// --- Scenario A: new fact, empty index ---

#[tokio::test]
async fn new_fact_without_match_is_created_with_trigger_id() {
    let f = fixture();
    f.completion.push_extraction(&[TACOS], &[]).await;
    let turns = window(4);

    let report = f.engine.consolidate(&f.namespace, &turns).await.unwrap();

    assert_eq!(report.trigger_turn_id.as_deref(), Some("turn-3"));
    assert_eq!(report.user.created(), 1);
    assert_eq!(report.user.updated(), 0);
    let record = &report.user.staged[0].record;
    assert_eq!(record.id, "turn-3_0");
    assert_eq!(record.text, TACOS);
    assert!(report.agent.staged.is_empty());

    let upserts = f.index.upserts().await;
    assert_eq!(upserts.len(), 1, "only the non-empty category is written");
    assert_eq!(upserts[0].category, FactCategory::User);
    assert_eq!(upserts[0].namespace, f.namespace);
    assert_eq!(upserts[0].records, vec![record.clone()]);
}

// --- Scenario B: strong match merged ---

#[tokio::test]
async fn strong_match_with_merge_overwrites_matched_record() {
    let f = fixture();
    let incoming = "User has a golden retriever named Max.";
    let merged = "User has a golden retriever named Max who is extremely important to them.";
    f.completion.push_extraction(&[incoming], &[]).await;
    f.completion.push_resolution(merged).await;
    f.index
        .script_query(
            FactCategory::User,
            incoming,
            vec![hit("old-7", 0.9, "User has a dog named Max who is extremely important to them.")],
        )
        .await;

    let report = f.engine.consolidate(&f.namespace, &window(2)).await.unwrap();

    assert_eq!(report.user.updated(), 1);
    assert_eq!(report.user.created(), 0);
    let record = &report.user.staged[0].record;
    assert_eq!(record.id, "old-7");
    assert_eq!(record.text, merged);
    assert_ne!(record.timestamp, FIXED_TIMESTAMP, "timestamp is refreshed");

    let requests = f.completion.requests().await;
    let reconcile = &requests[1];
    assert_eq!(reconcile.schema.name, "resolution");
    assert!(reconcile.messages[1].content.contains("User has a dog named Max"));
    assert!(reconcile.messages[1].content.contains(incoming));
}

// --- Scenario C: strong match, reconciler declines ---

#[tokio::test]
async fn strong_match_without_merge_creates_and_leaves_match_untouched() {
    let f = fixture();
    f.completion.push_extraction(&[TACOS], &[]).await;
    f.completion.push_resolution("").await;
    f.index
        .script_query(FactCategory::User, TACOS, vec![hit("old-1", 0.9, "User has a cat.")])
        .await;

    let report = f.engine.consolidate(&f.namespace, &window(2)).await.unwrap();

    assert_eq!(report.user.created(), 1);
    assert_eq!(report.user.updated(), 0);
    assert_eq!(report.user.staged[0].record.id, "turn-1_0");
    let written: Vec<String> = f.index.upserts().await[0]
        .records
        .iter()
        .map(|r| r.id.clone())
        .collect();
    assert!(!written.contains(&"old-1".to_string()));
}

// --- Scenario D: weak match skips reconciliation ---

#[tokio::test]
async fn weak_match_is_created_without_reconciling() {
    let f = fixture();
    f.completion.push_extraction(&[TACOS], &[]).await;
    f.index
        .script_query(FactCategory::User, TACOS, vec![hit("old-1", 0.4, "User likes burritos.")])
        .await;

    let report = f.engine.consolidate(&f.namespace, &window(2)).await.unwrap();

    assert_eq!(report.user.created(), 1);
    assert_eq!(f.completion.calls_for("resolution").await, 0);
}

#[tokio::test]
async fn score_equal_to_threshold_is_not_a_match() {
    let f = fixture();
    f.completion.push_extraction(&[TACOS], &[]).await;
    f.index
        .script_query(FactCategory::User, TACOS, vec![hit("old-1", 0.5, "User likes burritos.")])
        .await;

    let report = f.engine.consolidate(&f.namespace, &window(2)).await.unwrap();

    assert_eq!(report.user.created(), 1);
    assert_eq!(f.completion.calls_for("resolution").await, 0);
}

// --- Scenario E: extraction failure ---

#[tokio::test]
async fn malformed_extraction_fails_without_touching_index() {
    let f = fixture();
    f.completion
        .push("facts", Ok(serde_json::json!({ "user_facts": [TACOS] })))
        .await;

    let err = f.engine.consolidate(&f.namespace, &window(4)).await.unwrap_err();

    assert!(matches!(err, KindredError::Schema { .. }), "got {err:?}");
    assert!(f.index.queries().await.is_empty());
    assert!(f.index.upserts().await.is_empty());
}

#[tokio::test]
async fn extraction_transport_error_is_surfaced() {
    let f = fixture();
    f.completion
        .push("facts", Err(KindredError::completion("upstream 503")))
        .await;

    let err = f.engine.consolidate(&f.namespace, &window(2)).await.unwrap_err();
    assert!(matches!(err, KindredError::Completion { .. }));
}

// --- Batch and category behavior ---

#[tokio::test]
async fn empty_window_is_a_no_op() {
    let f = fixture();
    let report = f.engine.consolidate(&f.namespace, &[]).await.unwrap();

    assert_eq!(report.total_written(), 0);
    assert!(report.trigger_turn_id.is_none());
    assert!(f.completion.requests().await.is_empty());
}

#[tokio::test]
async fn nothing_extracted_writes_nothing() {
    let f = fixture();
    f.completion.push_extraction(&[], &[]).await;

    let report = f.engine.consolidate(&f.namespace, &window(2)).await.unwrap();

    assert_eq!(report.total_written(), 0);
    assert!(f.index.upserts().await.is_empty());
}

#[tokio::test]
async fn categories_have_independent_counters_and_partitions() {
    let f = fixture();
    f.completion
        .push_extraction(&["User lives in Denver.", "User is a nurse."], &["I grew up in Lisbon."])
        .await;

    let report = f.engine.consolidate(&f.namespace, &window(6)).await.unwrap();

    let user_ids: Vec<_> = report.user.records().into_iter().map(|r| r.id).collect();
    let agent_ids: Vec<_> = report.agent.records().into_iter().map(|r| r.id).collect();
    assert_eq!(user_ids, ["turn-5_0", "turn-5_1"]);
    assert_eq!(agent_ids, ["turn-5_0"]);

    let upserts = f.index.upserts().await;
    assert_eq!(upserts.len(), 2);
    assert_eq!(upserts[0].category, FactCategory::User);
    assert_eq!(upserts[1].category, FactCategory::Agent);

    let queries = f.index.queries().await;
    assert!(queries.iter().all(|q| q.top_k == 1));
    assert!(queries
        .iter()
        .any(|q| q.category == FactCategory::Agent && q.text == "I grew up in Lisbon."));
}

#[tokio::test]
async fn two_candidates_merging_into_same_record_produce_one_update() {
    let f = fixture();
    let first = "User has a dog named Max.";
    let second = "User's dog Max is a golden retriever.";
    f.completion.push_extraction(&[first, second], &[]).await;
    f.completion.push_resolution("User has a dog named Max, loves him.").await;
    f.completion
        .push_resolution("User has a golden retriever named Max, loves him.")
        .await;
    for text in [first, second] {
        f.index
            .script_query(FactCategory::User, text, vec![hit("old-1", 0.8, "User loves their dog.")])
            .await;
    }

    let report = f.engine.consolidate(&f.namespace, &window(2)).await.unwrap();

    assert_eq!(report.user.staged.len(), 1);
    let record = &report.user.staged[0].record;
    assert_eq!(record.id, "old-1");
    assert_eq!(record.text, "User has a golden retriever named Max, loves him.");

    // The second reconciliation sees the first merge, not the stored text.
    let requests = f.completion.requests().await;
    assert!(requests[2].messages[1].content.contains("User has a dog named Max, loves him."));
}

#[tokio::test]
async fn merged_and_created_records_share_one_upsert() {
    let f = fixture();
    f.completion.push_extraction(&["merge me", "brand new"], &[]).await;
    f.completion.push_resolution("merged text").await;
    f.index
        .script_query(FactCategory::User, "merge me", vec![hit("old-3", 0.95, "stored")])
        .await;

    let report = f.engine.consolidate(&f.namespace, &window(2)).await.unwrap();

    let actions: Vec<_> = report.user.staged.iter().map(|s| s.action).collect();
    assert_eq!(actions, [StagedAction::Updated, StagedAction::Created]);
    assert_eq!(report.user.staged[1].record.id, "turn-1_0");
    assert_eq!(f.index.upserts().await.len(), 1);
    assert_eq!(f.index.stored(FactCategory::User, &f.namespace).await.len(), 2);
}

// --- Degraded and fatal index behavior ---

#[tokio::test]
async fn reconciliation_failure_stores_candidate_as_new() {
    let f = fixture();
    f.completion.push_extraction(&[TACOS], &[]).await;
    f.completion
        .push("resolution", Err(KindredError::completion("timeout")))
        .await;
    f.index
        .script_query(FactCategory::User, TACOS, vec![hit("old-1", 0.9, "User likes food.")])
        .await;

    let report = f.engine.consolidate(&f.namespace, &window(2)).await.unwrap();

    assert_eq!(report.user.created(), 1);
    assert_eq!(report.user.staged[0].record.id, "turn-1_0");
}

#[tokio::test]
async fn query_failure_stores_candidate_as_new() {
    let f = fixture();
    f.completion.push_extraction(&[TACOS], &[]).await;
    f.index.fail_queries(FactCategory::User).await;

    let report = f.engine.consolidate(&f.namespace, &window(2)).await.unwrap();

    assert_eq!(report.user.created(), 1);
    assert_eq!(f.completion.calls_for("resolution").await, 0);
}

#[tokio::test]
async fn upsert_failure_is_returned() {
    let f = fixture();
    f.completion.push_extraction(&[TACOS], &[]).await;
    f.index.fail_upserts(FactCategory::User).await;

    let err = f.engine.consolidate(&f.namespace, &window(2)).await.unwrap_err();

    assert!(matches!(err, KindredError::Index { .. }));
    assert!(f.index.stored(FactCategory::User, &f.namespace).await.is_empty());
}

#[tokio::test]
async fn agent_upsert_failure_after_user_write_is_returned() {
    let f = fixture();
    f.completion.push_extraction(&[TACOS], &["I grew up in Lisbon."]).await;
    f.index.fail_upserts(FactCategory::Agent).await;

    let err = f.engine.consolidate(&f.namespace, &window(2)).await;

    assert!(err.is_err());
    assert_eq!(f.index.stored(FactCategory::User, &f.namespace).await.len(), 1);
}

#[tokio::test]
async fn retried_window_with_new_trigger_does_not_overwrite() {
    let f = fixture();
    let turns = window(2);
    f.completion
        .push_extraction(&["User has a dog named Max.", "User is a nurse."], &["I grew up in Lisbon."])
        .await;
    f.index.fail_upserts(FactCategory::Agent).await;
    assert!(f.engine.consolidate_as(&f.namespace, "fire-1", &turns).await.is_err());
    let first = f.index.stored(FactCategory::User, &f.namespace).await;

    f.index.restore(FactCategory::Agent).await;
    f.completion.push_extraction(&["User moved to Denver."], &[]).await;
    let report = f
        .engine
        .consolidate_as(&f.namespace, "fire-2", &turns)
        .await
        .unwrap();

    assert_eq!(report.trigger_turn_id.as_deref(), Some("fire-2"));
    assert_eq!(report.user.staged[0].record.id, "fire-2_0");
    let stored = f.index.stored(FactCategory::User, &f.namespace).await;
    assert_eq!(stored.len(), 3);
    assert_eq!(&stored[..2], &first[..]);
    assert_eq!(stored[0].id, "fire-1_0");
}

#[tokio::test]
async fn namespaces_are_isolated() {
    let f = fixture();
    let other = Namespace::new("user-1", "persona-2");
    f.completion.push_extraction(&[TACOS], &[]).await;

    f.engine.consolidate(&f.namespace, &window(2)).await.unwrap();

    assert_eq!(f.index.stored(FactCategory::User, &f.namespace).await.len(), 1);
    assert!(f.index.stored(FactCategory::User, &other).await.is_empty());
}

// --- Duplicate-id freedom ---

/// How the index and reconciler treat one candidate.
#[derive(Debug, Clone)]
enum Script {
    NoMatch,
    Match { id: usize, score: f32, merge: bool },
}

fn script_strategy() -> impl Strategy<Value = Script> {
    prop_oneof![
        Just(Script::NoMatch),
        (0usize..4, 0.0f32..1.0, any::<bool>())
            .prop_map(|(id, score, merge)| Script::Match { id, score, merge }),
    ]
}

/// Matchable ids include ones shaped like the ids this run mints.
fn matched_id(id: usize) -> String {
    match id {
        0 => "old-0".to_string(),
        1 => "old-1".to_string(),
        n => format!("turn-1_{}", n - 2),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn staged_ids_are_unique(scripts in prop::collection::vec(script_strategy(), 0..8)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let report = rt.block_on(async {
            let f = fixture();
            let candidates: Vec<String> = (0..scripts.len()).map(|i| format!("candidate {i}")).collect();
            let refs: Vec<&str> = candidates.iter().map(String::as_str).collect();
            f.completion.push_extraction(&refs, &[]).await;

            for (candidate, script) in candidates.iter().zip(&scripts) {
                if let Script::Match { id, score, merge } = script {
                    f.index
                        .script_query(FactCategory::User, candidate, vec![hit(&matched_id(*id), *score, "stored")])
                        .await;
                    if *score > 0.5 {
                        let resolved = if *merge { format!("merged {candidate}") } else { String::new() };
                        f.completion.push_resolution(&resolved).await;
                    }
                }
            }

            f.engine.consolidate(&f.namespace, &window(2)).await.unwrap()
        });

        let ids: Vec<String> = report.user.records().into_iter().map(|r| r.id).collect();
        let unique: HashSet<&String> = ids.iter().collect();
        prop_assert_eq!(unique.len(), ids.len(), "duplicate ids in {:?}", ids);
        prop_assert!(ids.len() <= scripts.len());
        for staged in &report.user.staged {
            if staged.action == StagedAction::Created {
                prop_assert!(staged.record.id.starts_with("turn-1_"));
            }
        }
    }
}

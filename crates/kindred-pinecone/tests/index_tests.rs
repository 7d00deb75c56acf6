// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pinecone adapter tests against mock index hosts.

use kindred_config::model::PineconeConfig;
use kindred_core::traits::{PluginAdapter, SimilarityIndex};
use kindred_core::types::{FactCategory, FactRecord, HealthStatus, Namespace};
use kindred_core::KindredError;
use kindred_pinecone::PineconeIndex;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Hosts {
    user: MockServer,
    agent: MockServer,
}

async fn hosts() -> Hosts {
    Hosts {
        user: MockServer::start().await,
        agent: MockServer::start().await,
    }
}

fn index(hosts: &Hosts) -> PineconeIndex {
    PineconeIndex::new(&PineconeConfig {
        api_key: Some("pc-test".into()),
        user_index_host: Some(hosts.user.uri()),
        agent_index_host: Some(hosts.agent.uri()),
        ..PineconeConfig::default()
    })
    .unwrap()
}

fn namespace() -> Namespace {
    Namespace::new("user-1", "persona-1")
}

#[tokio::test]
async fn query_goes_to_category_host_and_namespace() {
    let hosts = hosts().await;
    Mock::given(method("POST"))
        .and(path("/records/namespaces/user-1%2Fpersona-1/search"))
        .and(body_json(serde_json::json!({
            "query": { "inputs": { "text": "I grew up in Lisbon." }, "top_k": 1 },
            "fields": ["text", "timestamp"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": { "hits": [{
                "_id": "t3_0",
                "_score": 0.77,
                "fields": { "text": "Agent grew up in Lisbon.", "timestamp": "2025-01-01T00:00:00.000Z" }
            }] }
        })))
        .expect(1)
        .mount(&hosts.agent)
        .await;

    let hits = index(&hosts)
        .query(FactCategory::Agent, &namespace(), "I grew up in Lisbon.", 1)
        .await
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "t3_0");
    assert_eq!(hits[0].fields.text, "Agent grew up in Lisbon.");
    assert!(hosts.user.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn upsert_writes_every_record() {
    let hosts = hosts().await;
    Mock::given(method("POST"))
        .and(path("/records/namespaces/user-1%2Fpersona-1/upsert"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&hosts.user)
        .await;

    let records = vec![
        FactRecord {
            id: "t3_0".into(),
            text: "User likes tacos.".into(),
            timestamp: "2025-01-01T00:00:00.000Z".into(),
        },
        FactRecord {
            id: "old-1".into(),
            text: "User has a golden retriever named Max.".into(),
            timestamp: "2025-01-01T00:00:00.000Z".into(),
        },
    ];
    index(&hosts)
        .upsert(FactCategory::User, &namespace(), &records)
        .await
        .unwrap();

    let requests = hosts.user.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    let ids: Vec<String> = body
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["t3_0", "old-1"]);
}

#[tokio::test]
async fn empty_upsert_sends_nothing() {
    let hosts = hosts().await;
    index(&hosts)
        .upsert(FactCategory::User, &namespace(), &[])
        .await
        .unwrap();
    assert!(hosts.user.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_upsert_is_index_error() {
    let hosts = hosts().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": "INVALID_ARGUMENT", "message": "Record text is empty" }
        })))
        .mount(&hosts.user)
        .await;

    let err = index(&hosts)
        .upsert(
            FactCategory::User,
            &namespace(),
            &[FactRecord {
                id: "t_0".into(),
                text: String::new(),
                timestamp: "ts".into(),
            }],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, KindredError::Index { .. }));
}

#[tokio::test]
async fn health_is_degraded_when_one_host_fails() {
    let hosts = hosts().await;
    Mock::given(method("POST"))
        .and(path("/describe_index_stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "namespaces": {} })))
        .mount(&hosts.user)
        .await;
    Mock::given(method("POST"))
        .and(path("/describe_index_stats"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&hosts.agent)
        .await;

    let status = index(&hosts).health_check().await.unwrap();
    assert!(matches!(status, HealthStatus::Degraded(ref msg) if msg.starts_with("agent")));
}

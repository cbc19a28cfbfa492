//! Supabase adapter against a mocked PostgREST endpoint.

#![cfg(feature = "supabase")]

use dbtest_core::{test_database, DatabaseConfig, EngineKind, Operation, TestSuiteConfig};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TABLE_PATH: &str = "/rest/v1/db_connection_test";

fn config(server: &MockServer) -> TestSuiteConfig {
    TestSuiteConfig::new(DatabaseConfig::new(EngineKind::Supabase).with_supabase(
        server.uri(),
        Some("anon-key".into()),
        Some("service-key".into()),
    ))
    .silent(true)
    .with_retry_attempts(1)
}

async fn mount_root(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/"))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "swagger": "2.0" })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_suite_over_rest() {
    let server = MockServer::start().await;
    mount_root(&server).await;

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("select", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "old-1", "test_message": "earlier", "created_at": "2026-01-01T00:00:00Z" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TABLE_PATH))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "id": "abc-123", "test_message": "hi", "created_at": "2026-01-01T00:00:01Z" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(TABLE_PATH))
        .and(query_param("id", "eq.abc-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "abc-123" }])))
        .expect(1)
        .mount(&server)
        .await;

    let suite = test_database(config(&server)).await.expect("suite");

    assert!(suite.overall, "{suite:#?}");
    let ops: Vec<_> = suite.results.iter().map(|r| r.operation).collect();
    assert_eq!(
        ops,
        [Operation::Read, Operation::Write, Operation::Delete, Operation::Connection]
    );
    assert_eq!(suite.results[0].details.as_ref().unwrap()["rowCount"], 1);
    assert_eq!(suite.results[2].details.as_ref().unwrap()["deletedCount"], 1);
    assert_eq!(
        suite.results[3].details.as_ref().unwrap()["keyRole"],
        "service_role"
    );
}

#[tokio::test]
async fn missing_table_points_at_setup() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "42P01",
            "message": "relation \"public.db_connection_test\" does not exist"
        })))
        .mount(&server)
        .await;

    let suite = test_database(config(&server)).await.expect("suite");

    assert!(!suite.overall);
    assert_eq!(suite.results.len(), 1);
    let error = suite.results[0].error.as_deref().unwrap();
    assert!(error.contains("does not exist"), "{error}");
    assert!(error.contains("db-test setup -d supabase"), "{error}");
}

#[tokio::test]
async fn unauthorized_key_is_a_connection_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid API key" })),
        )
        .mount(&server)
        .await;

    let suite = test_database(config(&server)).await.expect("suite");

    assert!(!suite.overall);
    assert_eq!(suite.results[0].operation, Operation::Connection);
    assert_eq!(
        suite.results[0].error.as_deref(),
        Some("Supabase connection failed: HTTP 401 Unauthorized: Invalid API key")
    );
}

#[tokio::test]
async fn write_sends_probe_message_body() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    // Only a body that is exactly the probe message shape matches; anything else 404s.
    Mock::given(method("POST"))
        .and(path(TABLE_PATH))
        .and(body_json(json!({ "test_message": "fixed" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": 7 }])))
        .mount(&server)
        .await;

    let cfg = config(&server);
    let tester = dbtest_core::DbTester::new(cfg).expect("tester");
    tester.adapter().connect().await.expect("connect");
    let write = tester.adapter().test_write("fixed").await.expect("write");
    assert!(write.success, "{write:?}");
    assert_eq!(write.inserted_id().as_deref(), Some("7"));
}

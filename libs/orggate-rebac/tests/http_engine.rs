#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the HTTP relation engine client.

use httpmock::prelude::*;
use orggate_rebac::{EngineError, HttpEngineConfig, HttpRelationEngine, RelationEngine, RelationTuple};

fn engine_for(server: &MockServer) -> HttpRelationEngine {
    HttpRelationEngine::new(&HttpEngineConfig {
        base_url: server.base_url(),
        timeout_ms: 500,
    })
    .expect("client construction")
}

#[tokio::test]
async fn check_parses_allow() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/check")
                .json_body_obj(&RelationTuple::new("user:u", "can_read", "container:c"));
            then.status(200).json_body(serde_json::json!({"allowed": true}));
        })
        .await;

    let engine = engine_for(&server);
    let allowed = engine.check("user:u", "can_read", "container:c").await.unwrap();

    assert!(allowed);
    mock.assert_async().await;
}

#[tokio::test]
async fn check_parses_deny() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/check");
            then.status(200).json_body(serde_json::json!({"allowed": false}));
        })
        .await;

    let engine = engine_for(&server);
    let allowed = engine.check("user:u", "can_manage", "container:c").await.unwrap();

    assert!(!allowed);
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/check");
            then.status(503);
        })
        .await;

    let engine = engine_for(&server);
    let err = engine.check("user:u", "can_read", "container:c").await.unwrap_err();

    assert!(matches!(err, EngineError::Unavailable(_)));
}

#[tokio::test]
async fn unreachable_engine_is_unavailable() {
    // Bind a listener, take its port, then drop it so connections are refused.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let engine = HttpRelationEngine::new(&HttpEngineConfig {
        base_url: format!("http://127.0.0.1:{port}"),
        timeout_ms: 200,
    })
    .unwrap();

    let err = engine.check("user:u", "can_read", "container:c").await.unwrap_err();
    assert!(matches!(err, EngineError::Unavailable(_)));
}

#[tokio::test]
async fn tuple_write_round_trip() {
    let server = MockServer::start_async().await;
    let tuple = RelationTuple::new("user:u", "admin", "container:c");

    let write = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/tuples").json_body_obj(&tuple);
            then.status(204);
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v1/tuples").json_body_obj(&tuple);
            then.status(204);
        })
        .await;

    let engine = engine_for(&server);
    engine.write_tuple(&tuple).await.unwrap();
    engine.delete_tuple(&tuple).await.unwrap();

    write.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn deleting_missing_tuple_is_ok() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v1/tuples");
            then.status(404);
        })
        .await;

    let engine = engine_for(&server);
    let tuple = RelationTuple::new("user:u", "admin", "container:c");
    assert!(engine.delete_tuple(&tuple).await.is_ok());
}

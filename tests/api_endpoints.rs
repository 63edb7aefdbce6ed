//! Integration tests for the HashLedger HTTP gateway
//!
//! These tests drive the full router: status codes, JSON shapes and the
//! tamper-then-verify demonstration flow.

use std::sync::Arc;

use axum_test::TestServer;
use hashledger::api::{build_api_router, Node};
use hashledger::blockchain::DEFAULT_GENESIS_DATA;
use hashledger::ledger::Ledger;
use hashledger::node::NodeState;
use serde_json::{json, Value};
use tokio::sync::RwLock;

fn test_server() -> (TestServer, Arc<Ledger>) {
    let ledger = Arc::new(Ledger::new(DEFAULT_GENESIS_DATA).expect("Failed to create ledger"));
    let api_node = Arc::new(Node::new(ledger.clone()));
    let server = TestServer::new(build_api_router(api_node)).expect("Failed to create test server");
    (server, ledger)
}

#[tokio::test]
async fn test_list_and_get_genesis() {
    let (server, _) = test_server();

    let response = server.get("/api/blocks").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    let blocks = json.as_array().expect("block list");
    assert_eq!(blocks.len(), 1);

    let genesis = &blocks[0];
    assert_eq!(genesis["id"], 1);
    assert_eq!(genesis["data"], "Genesis Block");
    assert_eq!(genesis["previousHash"], "0".repeat(64));
    assert_eq!(genesis["currentHash"].as_str().unwrap().len(), 64);
    assert!(genesis["timestamp"].as_str().unwrap().ends_with('Z'));

    let response = server.get("/api/blocks/1").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json, *genesis);
}

#[tokio::test]
async fn test_append_returns_created_block() {
    let (server, _) = test_server();

    let response = server.post("/api/blocks").json(&json!({ "data": "A" })).await;
    assert_eq!(response.status_code(), 201);
    let block: Value = response.json();
    assert_eq!(block["id"], 2);
    assert_eq!(block["data"], "A");

    let genesis: Value = server.get("/api/blocks/1").await.json();
    assert_eq!(block["previousHash"], genesis["currentHash"]);
}

#[tokio::test]
async fn test_append_rejects_blank_data() {
    let (server, ledger) = test_server();

    for body in [json!({ "data": "" }), json!({ "data": "   " }), json!({})] {
        let response = server.post("/api/blocks").json(&body).await;
        assert_eq!(response.status_code(), 400);
        let json: Value = response.json();
        assert!(json["error"].is_string());
    }
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn test_null_data_is_rejected_like_missing_data() {
    let (server, ledger) = test_server();
    server.post("/api/blocks").json(&json!({ "data": "A" })).await;

    let response = server.post("/api/blocks").json(&json!({ "data": null })).await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    let response = server.put("/api/blocks/2").json(&json!({ "data": null })).await;
    assert_eq!(response.status_code(), 400);

    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.get(2).unwrap().data, "A");
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let (server, ledger) = test_server();

    // Wrong content type
    let response = server.post("/api/blocks").text("A").await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    // Unparseable JSON
    let response = server
        .post("/api/blocks")
        .text("{\"data\": ")
        .content_type("application/json")
        .await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    // Non-numeric ids
    let response = server.get("/api/blocks/abc").await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    let response = server
        .put("/api/blocks/abc")
        .json(&json!({ "data": "x" }))
        .await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn test_tamper_then_verify() {
    let (server, _) = test_server();
    server.post("/api/blocks").json(&json!({ "data": "A" })).await;
    server.post("/api/blocks").json(&json!({ "data": "B" })).await;

    let response = server.get("/api/blocks/verify").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json, json!({ "valid": true, "totalBlocks": 3, "errors": [] }));

    let before: Value = server.get("/api/blocks/2").await.json();
    let response = server
        .put("/api/blocks/2")
        .json(&json!({ "data": "A-modified" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let tampered: Value = response.json();
    assert_eq!(tampered["data"], "A-modified");
    assert_eq!(tampered["currentHash"], before["currentHash"]);

    let json: Value = server.get("/api/blocks/verify").await.json();
    assert_eq!(
        json,
        json!({
            "valid": false,
            "totalBlocks": 3,
            "errors": [
                "Block #2: hash mismatch (data altered)",
                "Block #3: previous-hash link broken (chain compromised from block #2)"
            ]
        })
    );
}

#[tokio::test]
async fn test_tamper_error_statuses() {
    let (server, _) = test_server();
    server.post("/api/blocks").json(&json!({ "data": "A" })).await;

    let response = server.put("/api/blocks/1").json(&json!({ "data": "x" })).await;
    assert_eq!(response.status_code(), 403);

    let response = server.put("/api/blocks/999").json(&json!({ "data": "x" })).await;
    assert_eq!(response.status_code(), 404);

    let response = server.put("/api/blocks/2").json(&json!({ "data": " " })).await;
    assert_eq!(response.status_code(), 400);

    let json: Value = server.get("/api/blocks/verify").await.json();
    assert_eq!(json["valid"], true);
}

#[tokio::test]
async fn test_unknown_block_is_404() {
    let (server, _) = test_server();

    let response = server.get("/api/blocks/999").await;
    assert_eq!(response.status_code(), 404);
    let json: Value = response.json();
    assert_eq!(json["error"], "Block #999 not found");
}

#[tokio::test]
async fn test_health_and_stats() {
    let ledger = Arc::new(Ledger::new(DEFAULT_GENESIS_DATA).unwrap());
    let state = Arc::new(RwLock::new(NodeState::Booting));
    let api_node = Arc::new(Node::new_shared(ledger, Some(state.clone())));
    let server = TestServer::new(build_api_router(api_node)).unwrap();

    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), 503);

    *state.write().await = NodeState::Ready;
    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["blocks"], 1);

    server.post("/api/blocks").json(&json!({ "data": "A" })).await;
    server.put("/api/blocks/2").json(&json!({ "data": "B" })).await;
    server.get("/api/blocks/42").await;

    let json: Value = server.get("/api/stats").await.json();
    assert_eq!(json["blocksAppended"], 1);
    assert_eq!(json["blocksTampered"], 1);
    assert_eq!(json["totalBlocks"], 2);
    // health x2, append, tamper, 404 are all recorded before this request
    assert_eq!(json["totalRequests"], 5);
    assert_eq!(json["failedRequests"], 2);
    assert!(json["uptimeSeconds"].is_number());
}

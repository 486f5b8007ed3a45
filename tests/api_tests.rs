use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use artsy_interactions::api::{create_router, AppState};
use artsy_interactions::config::Config;
use artsy_interactions::services::MemorySink;

fn create_test_server() -> TestServer {
    let state = AppState::in_memory();
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

async fn create_session(server: &TestServer) -> String {
    let response = server.post("/sessions").await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_shown_items_are_tracked_as_ignores() {
    let server = create_test_server();
    let session = create_session(&server).await;

    let response = server
        .post(&format!("/sessions/{session}/shown"))
        .json(&json!({
            "user_id": "u1",
            "items": [["a", 0.9], ["b", 0.8]]
        }))
        .await;
    response.assert_status_ok();

    let response = server.get(&format!("/sessions/{session}/interactions")).await;
    response.assert_status_ok();
    let records: Vec<Value> = response.json();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["artwork_id"], "a");
    assert_eq!(records[0]["prev_artwork_id"], "a");
    assert_eq!(records[1]["artwork_id"], "b");
    assert_eq!(records[1]["prev_artwork_id"], "a");
    assert_eq!(records[1]["interaction_type"], "ignore");
    assert_eq!(records[1]["interaction_score"], 0);

    let response = server.get(&format!("/sessions/{session}/users/u1/items")).await;
    let current: Vec<String> = response.json();
    assert_eq!(current, vec!["a", "b"]);
}

#[tokio::test]
async fn test_like_hides_item_and_records_transaction() {
    let sink = Arc::new(MemorySink::new());
    let state = AppState::new(sink.clone(), Config::default());
    let server = TestServer::new(create_router(state)).unwrap();
    let session = create_session(&server).await;

    let response = server
        .post(&format!("/sessions/{session}/track"))
        .json(&json!({
            "user_id": "u1",
            "artwork_id": "a1",
            "interaction_type": "like"
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["transaction_recorded"], true);

    let response = server
        .get(&format!("/sessions/{session}/users/u1/items/a1/visible"))
        .await;
    let body: Value = response.json();
    assert_eq!(body["visible"], false);

    let transactions = sink.transactions().await;
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].artwork_id, "a1");
}

#[tokio::test]
async fn test_invalid_interaction_type_is_rejected() {
    let server = create_test_server();
    let session = create_session(&server).await;

    let response = server
        .post(&format!("/sessions/{session}/track"))
        .json(&json!({
            "user_id": "u1",
            "artwork_id": "a1",
            "interaction_type": "purchase"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let records: Vec<Value> = server
        .get(&format!("/sessions/{session}/interactions"))
        .await
        .json();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_flush_moves_rows_to_sink_and_keeps_likes() {
    let sink = Arc::new(MemorySink::new());
    let state = AppState::new(sink.clone(), Config::default());
    let server = TestServer::new(create_router(state)).unwrap();
    let session = create_session(&server).await;

    for (item, kind) in [("a1", "click"), ("a1", "like"), ("a2", "click")] {
        server
            .post(&format!("/sessions/{session}/track"))
            .json(&json!({"user_id": "u1", "artwork_id": item, "interaction_type": kind}))
            .await
            .assert_status_ok();
    }

    let response = server.post(&format!("/sessions/{session}/flush")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["inserted"], 3);

    let rows = sink.interactions().await;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].prev_item_id, "a1");

    let records: Vec<Value> = server
        .get(&format!("/sessions/{session}/interactions"))
        .await
        .json();
    assert!(records.is_empty());

    let body: Value = server
        .get(&format!("/sessions/{session}/users/u1/items/a1/visible"))
        .await
        .json();
    assert_eq!(body["visible"], false);
}

#[tokio::test]
async fn test_recommendations_skip_liked_items() {
    let server = create_test_server();
    let session = create_session(&server).await;

    server
        .post(&format!("/sessions/{session}/track"))
        .json(&json!({"user_id": "u1", "artwork_id": "b", "interaction_type": "like"}))
        .await
        .assert_status_ok();

    let response = server
        .post(&format!("/sessions/{session}/recommendations"))
        .json(&json!({
            "user_id": "u1",
            "ranked": [["a", 0.9], ["b", 0.8], ["c", 0.7], ["d", 0.6]],
            "page_size": 2
        }))
        .await;
    response.assert_status_ok();
    let page: Value = response.json();
    assert_eq!(page["shown"], json!([["a", 0.9], ["c", 0.7]]));
    assert_eq!(page["extras"], json!([["d", 0.6]]));
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let server = create_test_server();
    let response = server
        .get("/sessions/6c8e4f57-2f0b-4a43-9a0e-0b6f2a1d7c11/interactions")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_session_is_gone() {
    let server = create_test_server();
    let session = create_session(&server).await;

    server
        .delete(&format!("/sessions/{session}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .post(&format!("/sessions/{session}/clear"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_synthesize_returns_chained_history() {
    let server = create_test_server();

    let response = server
        .post("/synthesize")
        .json(&json!({
            "likes": [
                {"t_dat": 1_700_000_000_000i64, "user_id": "u1", "artwork_id": "a1"},
                {"t_dat": 1_700_100_000_000i64, "user_id": "u2", "artwork_id": "a2"}
            ],
            "catalog": ["a1", "a2", "a3", "a4"],
            "seed": 17
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let events = body["events"].as_array().unwrap();
    assert!(!events.is_empty());
    assert_eq!(events[0]["user_id"], "u1");
    assert_eq!(events[0]["prev_artwork_id"], "START");
    assert_eq!(body["summary"]["likes"], 2);
}

#[tokio::test]
async fn test_synthesize_rejects_missing_columns() {
    let server = create_test_server();

    let response = server
        .post("/synthesize")
        .json(&json!({ "likes": [{"user_id": "u1"}] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("t_dat"));
}

#[tokio::test]
async fn test_synthesize_empty_likes() {
    let server = create_test_server();

    let response = server.post("/synthesize").json(&json!({ "likes": [] })).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["events"], json!([]));
}

//! Live server tests over a real socket

use serde_json::{json, Value};
use ses_mock::api::{ApiServer, AppState};
use ses_mock::rate_limit::FixedLimit;
use ses_mock::storage::MemoryStorage;
use ses_mock::SesError;
use std::sync::Arc;

/// Serve the API on an ephemeral port and return its base URL
async fn spawn_server(limit: u32) -> String {
    let state = AppState::new(
        Arc::new(MemoryStorage::new()),
        Arc::new(FixedLimit::new(limit)),
        false,
    );
    let server = ApiServer::new(state, "127.0.0.1:0".to_string());
    let router = server.router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_send_and_stats_over_http() {
    let base = spawn_server(1).await;
    let client = reqwest::Client::new();

    let send = json!({
        "from": "a@x.com",
        "to": ["b@x.com", "c@x.com"],
        "subject": "Hi",
        "body": "Hello there"
    });

    let response = client
        .post(format!("{}/send-email", base))
        .json(&send)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("{}/send-email", base))
        .json(&send)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 429);

    let stats: Value = client
        .get(format!("{}/stats", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        stats,
        json!({
            "total_emails_sent": 2,
            "total_emails_blocked": 0,
            "total_rate_limited": 1
        })
    );
}

#[tokio::test]
async fn test_block_over_http() {
    let base = spawn_server(5).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/block-email", base))
        .json(&json!({ "email": "bad@x.com", "reason": "abuse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("{}/send-email", base))
        .json(&json!({
            "from": "bad@x.com",
            "to": ["b@x.com"],
            "subject": "Hi",
            "body": "Hello"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["reason"], "Email is blocked: abuse");
}

#[tokio::test]
async fn test_run_reports_bind_failure() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap();

    let state = AppState::new(
        Arc::new(MemoryStorage::new()),
        Arc::new(FixedLimit::new(5)),
        false,
    );
    let server = ApiServer::new(state, addr.to_string());

    let result = server.run().await;
    assert!(matches!(result, Err(SesError::Io(_))));
}

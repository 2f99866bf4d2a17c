//! Integration tests for the HTTP API

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use ses_mock::api::{ApiServer, AppState};
use ses_mock::rate_limit::FixedLimit;
use ses_mock::storage::SqliteStorage;
use std::sync::Arc;
use tower::ServiceExt;

async fn setup_router(limit: u32) -> Router {
    let storage = Arc::new(SqliteStorage::connect("sqlite::memory:").await.unwrap());
    let state = AppState::new(storage, Arc::new(FixedLimit::new(limit)), false);
    ApiServer::new(state, "127.0.0.1:0".to_string()).router()
}

async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

fn send_body(from: &str, to: &[&str]) -> Value {
    json!({
        "from": from,
        "to": to,
        "subject": "Quarterly report",
        "body": "Please find the numbers attached."
    })
}

async fn stats(router: &Router) -> Value {
    let (status, body) = call(router, Method::GET, "/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_health() {
    let router = setup_router(5).await;
    let (status, body) = call(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_send_email_admitted() {
    let router = setup_router(5).await;

    let (status, body) = call(
        &router,
        Method::POST,
        "/send-email",
        Some(send_body("a@x.com", &["b@x.com", "c@x.com", "d@x.com"])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Email processed successfully");

    let stats = stats(&router).await;
    assert_eq!(stats["total_emails_sent"], 3);
    assert_eq!(stats["total_emails_blocked"], 0);
    assert_eq!(stats["total_rate_limited"], 0);
}

#[tokio::test]
async fn test_large_body_admitted() {
    let router = setup_router(5).await;

    let body = "x".repeat(3 * 1024 * 1024);
    let (status, response) = call(
        &router,
        Method::POST,
        "/send-email",
        Some(json!({
            "from": "a@x.com",
            "to": ["b@x.com"],
            "subject": "Attachment inline",
            "body": body
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], "Email processed successfully");

    let stats = stats(&router).await;
    assert_eq!(stats["total_emails_sent"], 1);
}

#[tokio::test]
async fn test_blocked_recipient_rejected() {
    let router = setup_router(5).await;

    let (status, _) = call(
        &router,
        Method::POST,
        "/block-email",
        Some(json!({ "email": "b@x.com", "reason": "spam" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &router,
        Method::POST,
        "/send-email",
        Some(send_body("a@x.com", &["b@x.com", "c@x.com"])),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "One or more recipients are blocked");

    let stats = stats(&router).await;
    assert_eq!(stats["total_emails_blocked"], 1);
    assert_eq!(stats["total_emails_sent"], 0);
}

#[tokio::test]
async fn test_blocked_sender_rejected_with_reason() {
    let router = setup_router(5).await;

    call(
        &router,
        Method::POST,
        "/block-email",
        Some(json!({ "email": "a@x.com", "reason": "chargeback fraud" })),
    )
    .await;

    let (status, body) = call(
        &router,
        Method::POST,
        "/send-email",
        Some(send_body("a@x.com", &["b@x.com"])),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Sender is blocked");
    assert!(body["reason"].as_str().unwrap().contains("chargeback fraud"));
}

#[tokio::test]
async fn test_rate_limited_after_quota() {
    let router = setup_router(2).await;

    for _ in 0..2 {
        let (status, _) = call(
            &router,
            Method::POST,
            "/send-email",
            Some(send_body("a@x.com", &["b@x.com", "c@x.com"])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(
        &router,
        Method::POST,
        "/send-email",
        Some(send_body("a@x.com", &["b@x.com"])),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Email sending limit reached");

    // Another sender is unaffected
    let (status, _) = call(
        &router,
        Method::POST,
        "/send-email",
        Some(send_body("other@x.com", &["b@x.com"])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let stats = stats(&router).await;
    assert_eq!(stats["total_emails_sent"], 5);
    assert_eq!(stats["total_rate_limited"], 1);
}

#[tokio::test]
async fn test_unblock_flow() {
    let router = setup_router(5).await;

    let (status, body) = call(&router, Method::DELETE, "/unblock-email/nobody@x.com", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Email not found in blocked list");

    call(
        &router,
        Method::POST,
        "/block-email",
        Some(json!({ "email": "a@x.com", "reason": "spam" })),
    )
    .await;

    let (status, _) = call(&router, Method::DELETE, "/unblock-email/a@x.com", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &router,
        Method::POST,
        "/send-email",
        Some(send_body("a@x.com", &["b@x.com"])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, blocked) = call(&router, Method::GET, "/blocked-emails", None).await;
    assert_eq!(blocked, json!([]));
}

#[tokio::test]
async fn test_self_block_listed_and_enforced() {
    let router = setup_router(5).await;

    let (status, body) = call(
        &router,
        Method::POST,
        "/self-block-email",
        Some(json!({ "email": "me@x.com", "self_cooldown_days": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Email is now in self-cooldown");

    let (status, blocked) = call(&router, Method::GET, "/blocked-emails", None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = blocked.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["email_address"], "me@x.com");
    assert_eq!(entries[0]["is_blocked"], true);
    assert_eq!(entries[0]["reason"], "Self cooldown");
    assert_eq!(entries[0]["self_cooldown_days"], 3);
    assert!(entries[0]["self_cooldown_date"].is_string());

    let (status, body) = call(
        &router,
        Method::POST,
        "/send-email",
        Some(send_body("me@x.com", &["b@x.com"])),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["reason"].as_str().unwrap().contains("Self cooldown"));
}

#[tokio::test]
async fn test_newsletter_flow() {
    let router = setup_router(5).await;

    let (status, _) = call(
        &router,
        Method::POST,
        "/newsletter/subscribe",
        Some(json!({ "email": "reader@x.com", "category": "Tech" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, subscribers) = call(&router, Method::GET, "/newsletter/subscribers", None).await;
    assert_eq!(
        subscribers,
        json!([{ "email_address": "reader@x.com", "category": "Tech" }])
    );

    // Subscribers are not blocked
    let (_, blocked) = call(&router, Method::GET, "/blocked-emails", None).await;
    assert_eq!(blocked, json!([]));

    let (status, _) = call(
        &router,
        Method::DELETE,
        "/newsletter/unsubscribe/reader@x.com",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, subscribers) = call(&router, Method::GET, "/newsletter/subscribers", None).await;
    assert_eq!(subscribers, json!([]));

    let (status, body) = call(
        &router,
        Method::DELETE,
        "/newsletter/unsubscribe/stranger@x.com",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Email not found in subscriber list");
}

#[tokio::test]
async fn test_invalid_requests_rejected() {
    let router = setup_router(5).await;

    let bad_bodies = vec![
        ("/send-email", json!({ "from": "a@x.com", "to": ["b@x.com"], "subject": "Hi" })),
        ("/send-email", json!({ "from": "nope", "to": ["b@x.com"], "subject": "Hi", "body": "x" })),
        ("/send-email", json!({ "from": "a@x.com", "to": [], "subject": "Hi", "body": "x" })),
        ("/send-email", json!({ "from": "a@x.com", "to": ["bad"], "subject": "Hi", "body": "x" })),
        ("/block-email", json!({ "email": "a@x.com" })),
        ("/block-email", json!({ "email": "a@x.com", "reason": "" })),
        ("/self-block-email", json!({ "email": "a@x.com", "self_cooldown_days": 0 })),
        ("/self-block-email", json!({ "email": "a@x.com", "self_cooldown_days": 99_999_999_999_i64 })),
        ("/self-block-email", json!({ "email": "a@x.com", "self_cooldown_days": "two" })),
        ("/newsletter/subscribe", json!({ "email": "a@x.com" })),
    ];

    for (uri, body) in bad_bodies {
        let (status, response) = call(&router, Method::POST, uri, Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", uri, body);
        assert_eq!(response["error"], "Invalid request format");
    }

    // Rejected requests never reach admission control
    let stats = stats(&router).await;
    assert_eq!(stats["total_emails_sent"], 0);
    assert_eq!(stats["total_emails_blocked"], 0);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let router = setup_router(5).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/send-email")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

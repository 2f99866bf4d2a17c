//! API request handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

use crate::admission::{AdmissionGate, Decision, SendRequest};
use crate::audit::AuditLog;
use crate::blocklist::BlockEvaluator;
use crate::error::SesError;
use crate::newsletter::NewsletterManager;
use crate::rate_limit::{LimitSource, SendRateLimiter};
use crate::registry::AddressRegistry;
use crate::storage::Storage;
use crate::utils::validate_email;

/// Shared application state
pub struct AppState {
    pub gate: AdmissionGate,
    pub evaluator: Arc<BlockEvaluator>,
    pub newsletter: NewsletterManager,
    pub audit: Arc<AuditLog>,
    pub limiter: Arc<SendRateLimiter>,
}

impl AppState {
    /// Wire the admission engine on top of `storage`
    pub fn new(
        storage: Arc<dyn Storage>,
        limits: Arc<dyn LimitSource>,
        release_expired_cooldowns: bool,
    ) -> Self {
        let registry = Arc::new(AddressRegistry::new(Arc::clone(&storage)));
        let evaluator = Arc::new(
            BlockEvaluator::new(Arc::clone(&registry))
                .release_expired_cooldowns(release_expired_cooldowns),
        );
        let limiter = Arc::new(SendRateLimiter::new(limits));
        let audit = Arc::new(AuditLog::new(storage));

        Self {
            gate: AdmissionGate::new(
                Arc::clone(&evaluator),
                Arc::clone(&limiter),
                Arc::clone(&audit),
            ),
            evaluator,
            newsletter: NewsletterManager::new(registry),
            audit,
            limiter,
        }
    }
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ApiError {
    pub fn new(msg: &str) -> Self {
        Self {
            error: msg.to_string(),
            reason: None,
        }
    }

    pub fn with_reason(msg: &str, reason: String) -> Self {
        Self {
            error: msg.to_string(),
            reason: Some(reason),
        }
    }
}

/// Success response carrying a message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(msg: &str) -> Self {
        Self {
            message: msg.to_string(),
        }
    }
}

/// Block request body
#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    pub email: String,
    pub reason: String,
}

/// Self-cooldown request body
#[derive(Debug, Deserialize)]
pub struct SelfBlockRequest {
    pub email: String,
    pub self_cooldown_days: i64,
}

/// Newsletter subscription request body
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
    pub category: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn invalid_format() -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::new("Invalid request format")),
    )
}

/// Map a service error to a response, logging storage failures
fn failure(err: SesError, not_found_msg: &str) -> (StatusCode, Json<ApiError>) {
    match err {
        SesError::NotFound(_) => (StatusCode::NOT_FOUND, Json(ApiError::new(not_found_msg))),
        SesError::Validation(_) | SesError::InvalidEmail(_) => invalid_format(),
        e => {
            error!("Request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new("Internal server error")),
            )
        }
    }
}

fn require_text(value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(invalid_format());
    }
    Ok(())
}

fn require_email(value: &str) -> ApiResult<()> {
    validate_email(value).map_err(|e| {
        warn!("Rejected request: {}", e);
        invalid_format()
    })
}

fn validate_send_request(req: &SendRequest) -> ApiResult<()> {
    require_email(&req.from)?;
    if req.to.is_empty() {
        return Err(invalid_format());
    }
    for recipient in &req.to {
        require_email(recipient)?;
    }
    require_text(&req.subject)?;
    require_text(&req.body)
}

/// GET /health - Liveness probe
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /send-email - Run a send request through admission control
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = payload.map_err(|_| invalid_format())?;
    validate_send_request(&req)?;

    let decision = state
        .gate
        .admit(&req)
        .await
        .map_err(|e| failure(e, "Not found"))?;

    let response = match decision {
        Decision::Admit { .. } => (
            StatusCode::OK,
            Json(MessageResponse::new("Email processed successfully")),
        )
            .into_response(),
        Decision::RejectBlockedSender { reason } => (
            StatusCode::FORBIDDEN,
            Json(ApiError::with_reason("Sender is blocked", reason)),
        )
            .into_response(),
        Decision::RejectBlockedRecipient { .. } => (
            StatusCode::FORBIDDEN,
            Json(ApiError::new("One or more recipients are blocked")),
        )
            .into_response(),
        Decision::RejectRateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ApiError::new("Email sending limit reached")),
        )
            .into_response(),
    };

    Ok(response)
}

/// GET /stats - Audit totals per outcome
pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let stats = state
        .audit
        .stats()
        .await
        .map_err(|e| failure(e, "Not found"))?;
    Ok(Json(stats))
}

/// POST /block-email - Administratively block an address
pub async fn block_email(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BlockRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = payload.map_err(|_| invalid_format())?;
    require_email(&req.email)?;
    require_text(&req.reason)?;

    state
        .evaluator
        .block(&req.email, &req.reason)
        .await
        .map_err(|e| failure(e, "Not found"))?;

    Ok(Json(MessageResponse::new("Email blocked successfully")))
}

/// DELETE /unblock-email/:email - Clear the block flag of an address
pub async fn unblock_email(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .evaluator
        .unblock(&email)
        .await
        .map_err(|e| failure(e, "Email not found in blocked list"))?;

    Ok(Json(MessageResponse::new("Email unblocked successfully")))
}

/// GET /blocked-emails - List blocked addresses
pub async fn list_blocked_emails(
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let blocked = state
        .evaluator
        .list_blocked()
        .await
        .map_err(|e| failure(e, "Not found"))?;
    Ok(Json(blocked))
}

/// POST /self-block-email - Start a self-imposed cooldown
pub async fn self_block_email(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SelfBlockRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = payload.map_err(|_| invalid_format())?;
    require_email(&req.email)?;

    state
        .evaluator
        .self_block(&req.email, req.self_cooldown_days, Utc::now())
        .await
        .map_err(|e| failure(e, "Not found"))?;

    Ok(Json(MessageResponse::new("Email is now in self-cooldown")))
}

/// POST /newsletter/subscribe - Subscribe an address to a category
pub async fn subscribe_newsletter(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = payload.map_err(|_| invalid_format())?;
    require_email(&req.email)?;
    require_text(&req.category)?;

    state
        .newsletter
        .subscribe(&req.email, &req.category)
        .await
        .map_err(|e| failure(e, "Not found"))?;

    Ok(Json(MessageResponse::new("Subscribed successfully")))
}

/// DELETE /newsletter/unsubscribe/:email - Cancel a subscription
pub async fn unsubscribe_newsletter(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .newsletter
        .unsubscribe(&email)
        .await
        .map_err(|e| failure(e, "Email not found in subscriber list"))?;

    Ok(Json(MessageResponse::new("Unsubscribed successfully")))
}

/// GET /newsletter/subscribers - List subscribers
pub async fn list_subscribers(
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let subscribers = state
        .newsletter
        .list_subscribers()
        .await
        .map_err(|e| failure(e, "Not found"))?;
    Ok(Json(subscribers))
}

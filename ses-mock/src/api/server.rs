//! API Server - HTTP server for the REST API

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::{self, AppState};
use crate::error::Result;

/// API Server configuration
pub struct ApiServer {
    state: Arc<AppState>,
    addr: String,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(state: AppState, addr: String) -> Self {
        Self {
            state: Arc::new(state),
            addr,
        }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let sending_routes = Router::new()
            .route("/send-email", post(handlers::send_email))
            .route("/stats", get(handlers::get_stats));

        let blocklist_routes = Router::new()
            .route("/block-email", post(handlers::block_email))
            .route("/unblock-email/:email", delete(handlers::unblock_email))
            .route("/blocked-emails", get(handlers::list_blocked_emails))
            .route("/self-block-email", post(handlers::self_block_email));

        let newsletter_routes = Router::new()
            .route("/subscribe", post(handlers::subscribe_newsletter))
            .route("/unsubscribe/:email", delete(handlers::unsubscribe_newsletter))
            .route("/subscribers", get(handlers::list_subscribers));

        Router::new()
            .route("/health", get(handlers::health))
            .merge(sending_routes)
            .merge(blocklist_routes)
            .nest("/newsletter", newsletter_routes)
            // Message content has no size limit
            .layer(DefaultBodyLimit::disable())
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// Start the API server
    pub async fn run(&self) -> Result<()> {
        let router = self.router();

        info!("Starting API server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}

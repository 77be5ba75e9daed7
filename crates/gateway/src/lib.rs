//! The HTTP gateway.
//!
//! A thin axum layer over the chat pipeline: handlers resolve the caller's
//! principal, check scope through the authorization guard, and delegate to
//! the orchestrator or the session store. All domain logic lives below
//! this crate; the gateway only translates between HTTP and the domain
//! types.

pub mod api;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use laxbot_auth::AuthGuard;
use laxbot_chat::{ChatOrchestrator, QuizGenerator};
use laxbot_config::GatewayConfig;
use laxbot_store::SessionStore;

/// Shared handler state. Everything is behind an `Arc`, so cloning per
/// request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub guard: Arc<AuthGuard>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub quiz: Arc<QuizGenerator>,
    pub sessions: Arc<SessionStore>,
}

/// Build the full application router.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => warn!(
            origin = %config.cors_origin,
            "Invalid CORS origin, browser clients will be refused"
        ),
    }

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(api::post_chat))
        .route("/api/chat/messages", get(api::get_messages))
        .route("/api/chat/sessions", get(api::get_sessions))
        .route("/api/chat/child/messages", get(api::get_child_messages))
        .route("/api/chat/session", delete(api::delete_session))
        .route("/api/chat/message", delete(api::delete_message))
        // Images arrive base64-inlined in the JSON body, so the limit has
        // to cover a full photo upload.
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(router: Router, config: &GatewayConfig) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Gateway listening");
    axum::serve(listener, router).await
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

//! REST API Routes Module
//!
//! Route handlers organized by entity, each exposing a `create_router`
//! over the shared [`AppState`]:
//! - Shift templates and the schedule (assign/cell/auto/grid)
//! - Leave and swap requests with the approval workflow
//! - Conversations, their messages, and transfer history
//! - Message categories, conversation tags, and online/workload stats
//! - Health check endpoints plus the real-time upgrade at /ws

pub mod category;
pub mod conversation;
pub mod leave;
pub mod message;
pub mod schedule;
pub mod shift;
pub mod stats;
pub mod tag;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::ws::ws_handler;

// Re-export route creation functions for convenience
pub use category::create_router as category_router;
pub use conversation::create_router as conversation_router;
pub use leave::create_router as leave_router;
pub use message::create_router as message_router;
pub use schedule::create_router as schedule_router;
pub use shift::create_router as shift_router;
pub use stats::create_router as stats_router;
pub use tag::create_router as tag_router;

// ============================================================================
// HEALTH ENDPOINTS
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

/// GET /health/ping - Simple pong response
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}

/// GET /health/ready - Readiness with version and uptime
pub async fn readiness(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };
    (StatusCode::OK, Json(response))
}

fn health_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}

// ============================================================================
// CORS
// ============================================================================

fn build_cors_layer(cors_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if cors_origins.is_empty() {
        // Development mode: allow all origins
        tracing::info!("CORS: development mode, allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!("CORS: allowing origins: {:?}", cors_origins);
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete API router: entity routes under /api/v1, health
/// checks under /health, and the real-time upgrade at /ws.
pub fn create_api_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);

    let api_routes = Router::new()
        .nest("/shifts", shift::create_router())
        .nest("/schedule", schedule::create_router())
        .nest("/leaves", leave::create_router())
        .nest(
            "/conversations",
            conversation::create_router().merge(message::create_router()),
        )
        .nest("/categories", category::create_router())
        .nest("/tags", tag::create_router())
        .nest("/stats", stats::create_router());

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_router())
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Deskline API - REST/WebSocket Layer
//!
//! HTTP and real-time surface for the Deskline support platform. Exposes
//! REST endpoints (Axum) for shift/schedule management, leave approvals,
//! conversations, and categories, plus a WebSocket hub for live chat
//! between users and agents.

pub mod config;
pub mod error;
pub mod hub;
pub mod macros;
pub mod routes;
pub mod services;
pub mod state;
pub mod types;
pub mod validation;
pub mod ws;

// Re-export commonly used types
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use hub::Hub;
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;

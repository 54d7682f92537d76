//! API Configuration Module
//!
//! Configuration for the HTTP server, CORS, the real-time hub, and message
//! encryption. Loaded from environment variables with development defaults.

use std::time::Duration;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// Runtime configuration for the Deskline API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind host for the HTTP server.
    pub bind_host: String,

    /// Bind port for the HTTP server.
    pub bind_port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Secret the message encryptor derives its key from.
    pub encryption_secret: String,

    /// Per-connection outbound buffer capacity. A full buffer evicts the
    /// connection instead of blocking the hub.
    pub ws_send_buffer: usize,

    /// Maximum inbound frame size in bytes.
    pub ws_max_frame_bytes: usize,

    /// How long to wait for any inbound traffic (including pongs) before
    /// treating a connection as dead.
    pub ws_pong_wait: Duration,

    /// Ping interval; kept under `ws_pong_wait` so a healthy peer always
    /// answers in time.
    pub ws_ping_period: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let pong_wait = Duration::from_secs(60);
        Self {
            bind_host: "0.0.0.0".to_string(),
            bind_port: 8080,
            cors_origins: Vec::new(), // Empty = allow all
            encryption_secret: "deskline-dev-secret".to_string(),
            ws_send_buffer: 256,
            ws_max_frame_bytes: 512 * 1024,
            ws_pong_wait: pong_wait,
            ws_ping_period: pong_wait * 9 / 10,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `DESKLINE_BIND`: Bind host (default: 0.0.0.0)
    /// - `DESKLINE_PORT` / `PORT`: Bind port (default: 8080)
    /// - `DESKLINE_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `DESKLINE_ENCRYPTION_SECRET`: Message-content encryption secret
    /// - `DESKLINE_WS_SEND_BUFFER`: Per-connection outbound buffer (default: 256)
    /// - `DESKLINE_WS_MAX_FRAME_BYTES`: Max inbound frame size (default: 524288)
    /// - `DESKLINE_WS_PONG_WAIT_SECS`: Read deadline (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_host =
            std::env::var("DESKLINE_BIND").unwrap_or(defaults.bind_host);
        let bind_port = std::env::var("DESKLINE_PORT")
            .ok()
            .or_else(|| std::env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.bind_port);

        let cors_origins = std::env::var("DESKLINE_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let encryption_secret = std::env::var("DESKLINE_ENCRYPTION_SECRET")
            .unwrap_or(defaults.encryption_secret);

        let ws_send_buffer = std::env::var("DESKLINE_WS_SEND_BUFFER")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.ws_send_buffer);

        let ws_max_frame_bytes = std::env::var("DESKLINE_WS_MAX_FRAME_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.ws_max_frame_bytes);

        let ws_pong_wait = std::env::var("DESKLINE_WS_PONG_WAIT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.ws_pong_wait);

        Self {
            bind_host,
            bind_port,
            cors_origins,
            encryption_secret,
            ws_send_buffer,
            ws_max_frame_bytes,
            ws_pong_wait,
            ws_ping_period: ws_pong_wait * 9 / 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_ping_under_pong_wait() {
        let config = ApiConfig::default();
        assert!(config.ws_ping_period < config.ws_pong_wait);
    }
}

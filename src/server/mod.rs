//! HTTP surface for text extraction.
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | GET  | `/health` | | `{ status, version }` |
//! | POST | `/extract-text` | multipart `file` | [`ExtractTextResponse`] |
//! | POST | `/extract-hwpx-text` | multipart `file` (HWPX only) | `{ text }` |
//! | POST | `/extract-text/base64` | `{ data, filename }` | [`ExtractTextResponse`] |
//! | POST | `/extract-text/url` | `{ url }` | [`ExtractTextResponse`] |
//!
//! Errors are `{ error, detail? }` with 400 for bad input and 500 otherwise.
//! `detail` is only filled in when [`ServerConfig::expose_error_detail`] is
//! set, which should stay off in production.

mod handlers;
mod types;

pub use handlers::*;
pub use types::*;

use crate::config::ExtractionConfig;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Listener and request-handling settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address. Default: `127.0.0.1:3000`.
    pub addr: String,
    /// Maximum request body size. Default: 50 MiB.
    pub body_limit_bytes: usize,
    /// Include internal error messages in responses. Default: false.
    pub expose_error_detail: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
            body_limit_bytes: 50 * 1024 * 1024,
            expose_error_detail: false,
        }
    }
}

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ExtractionConfig>,
    pub expose_error_detail: bool,
}

impl AppState {
    pub fn new(config: ExtractionConfig, server: &ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            expose_error_detail: server.expose_error_detail,
        }
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/extract-text", post(extract_upload))
        .route("/extract-hwpx-text", post(extract_hwpx_upload))
        .route("/extract-text/base64", post(extract_base64))
        .route("/extract-text/url", post(extract_url))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server
pub async fn serve(config: ExtractionConfig, server: ServerConfig) -> Result<(), std::io::Error> {
    tracing::info!("Starting API server on {}", server.addr);

    let app = build_router(AppState::new(config, &server), server.body_limit_bytes);
    let listener = tokio::net::TcpListener::bind(&server.addr).await?;

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.body_limit_bytes, 52_428_800);
        assert!(!config.expose_error_detail);
    }

    #[test]
    fn app_state_shares_config() {
        let state = AppState::new(ExtractionConfig::default(), &ServerConfig::default());
        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
    }
}

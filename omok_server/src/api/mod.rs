//! HTTP/WebSocket API for the omok server.
//!
//! # Endpoints Overview
//!
//! ## WebSocket
//! - `GET /ws?wallet=<address>` - Establish a player connection
//!
//! ## Health Check
//! - `GET /health` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use omok::{
//!     ledger::LoggingChipLedger,
//!     reward::{CommandPayout, DispatcherConfig, RewardDispatcher},
//!     session::{SessionConfig, SessionRegistry},
//! };
//! use omok_server::api::{AppState, create_router};
//! use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let payout = Arc::new(CommandPayout::new("true", vec![]));
//! let (rewards, _worker) = RewardDispatcher::spawn(payout, DispatcherConfig::default());
//! let registry = SessionRegistry::new(SessionConfig::default(), rewards, Arc::new(LoggingChipLedger));
//!
//! let app = create_router(AppState::new(Arc::new(registry)));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use omok::session::SessionRegistry;
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub connections: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            connections: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of open WebSocket connections
    pub fn open_connections(&self) -> u64 {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Create the API router.
///
/// ```text
/// GET  /health                 - Health check
/// GET  /ws?wallet=<address>    - WebSocket player connection
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:3001/health
/// # {"status":"healthy","version":"0.1.0","sessions":{"active_count":2,"waiting":true},...}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let active_count = state.registry.active_sessions().await;
    let stats = state.registry.rewards().stats();

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": {
            "active_count": active_count,
            "waiting": state.registry.waiting_connection().is_some(),
        },
        "connections": state.open_connections(),
        "rewards": {
            "enqueued": stats.enqueued,
            "succeeded": stats.succeeded,
            "failed": stats.failed,
            "pending": stats.pending(),
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}

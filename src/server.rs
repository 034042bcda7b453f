//! HTTP surface for the dashboard and assistant.
//!
//! This module provides an HTTP server that:
//! - Serves the ranked context feed via GET /context/top
//! - Exposes and updates ambient context via /context/status, /context/mood
//!   and /context/focus
//! - Reports environment signals via GET /context/snapshot
//!
//! # Architecture
//!
//! ```text
//! Dashboard / Assistant ──→ GET /context/top ──→ TopContextGetter ──→ RecordStore
//!                       ──→ GET /context/snapshot ──→ SignalSource (x3, bounded)
//! ```
//!
//! A feed with failing sources is still served with `200`; the response
//! lists the types that were left out.

use crate::ambient::{ContextState, SharedContextManager};
use crate::config::{SignalConfig, SourceSelection};
use crate::core::{RankedContext, RankingError, TopContextGetter};
use crate::sources::{get_context_snapshot, ContextSnapshot, SignalSource, StubSignals};
use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Ambient context owner
    pub manager: SharedContextManager,
    /// Ranker for the context feed
    pub ranker: Arc<TopContextGetter>,
    /// Environment signal source
    pub signals: Arc<dyn SignalSource>,
    /// Timeouts and defaults for the signal source
    pub signal_config: SignalConfig,
}

impl ServerConfig {
    /// Create a new server configuration using stub signals.
    pub fn new(port: u16, manager: SharedContextManager, ranker: Arc<TopContextGetter>) -> Self {
        Self {
            port,
            manager,
            ranker,
            signals: Arc::new(StubSignals::new()),
            signal_config: SignalConfig::default(),
        }
    }

    /// Use a different signal source.
    pub fn with_signals(mut self, signals: Arc<dyn SignalSource>, config: SignalConfig) -> Self {
        self.signals = signals;
        self.signal_config = config;
        self
    }
}

/// Shared server state
pub struct ServerState {
    manager: SharedContextManager,
    ranker: Arc<TopContextGetter>,
    signals: Arc<dyn SignalSource>,
    signal_config: SignalConfig,
}

impl ServerState {
    /// Create new server state
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            manager: config.manager.clone(),
            ranker: config.ranker.clone(),
            signals: config.signals.clone(),
            signal_config: config.signal_config.clone(),
        }
    }
}

/// Query parameters for the context feed
#[derive(Debug, Deserialize)]
pub struct TopQuery {
    /// Maximum number of items; non-positive values yield an empty feed
    pub limit: Option<i64>,
    /// Comma-separated type filter
    pub types: Option<String>,
}

/// Mood update request
#[derive(Debug, Deserialize)]
pub struct MoodRequest {
    pub mood: Option<String>,
}

/// Focused app update request
#[derive(Debug, Deserialize)]
pub struct FocusRequest {
    pub app: Option<String>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
        }),
    )
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /context/top
async fn top_context(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<TopQuery>,
) -> Result<Json<RankedContext>, ApiError> {
    let selection = SourceSelection::from_csv(query.types.as_deref().unwrap_or(""))
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, "INVALID_TYPE", e))?;

    let limit = match query.limit {
        Some(n) if n <= 0 => 0,
        Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
        None => state.ranker.default_limit(),
    };

    let ranked = state
        .ranker
        .rank(limit, &selection.types)
        .await
        .map_err(|e| match e {
            RankingError::AllSourcesFailed(_) => {
                tracing::error!("Context feed unavailable: {}", e);
                api_error(StatusCode::SERVICE_UNAVAILABLE, "SOURCES_UNAVAILABLE", e)
            }
        })?;

    Ok(Json(ranked))
}

/// GET /context/status
async fn status(State(state): State<Arc<ServerState>>) -> Json<ContextState> {
    Json(state.manager.status())
}

/// POST /context/mood
///
/// A missing or empty mood leaves the current one in place.
async fn set_mood(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<MoodRequest>,
) -> Result<Json<ContextState>, ApiError> {
    let updated = state
        .manager
        .set_mood_str(request.mood.as_deref().unwrap_or(""))
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, "INVALID_MOOD", e))?;
    tracing::info!("Mood is now {}", updated.mood);
    Ok(Json(updated))
}

/// POST /context/focus
async fn set_focus(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<FocusRequest>,
) -> Json<ContextState> {
    Json(state.manager.set_focused_app(request.app))
}

/// GET /context/snapshot
async fn snapshot(State(state): State<Arc<ServerState>>) -> Json<ContextSnapshot> {
    Json(get_context_snapshot(state.signals.as_ref(), &state.signal_config).await)
}

/// Build the router without binding a socket.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/context/top", get(top_context))
        .route("/context/status", get(status))
        .route("/context/mood", post(set_mood))
        .route("/context/focus", post(set_focus))
        .route("/context/snapshot", get(snapshot))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::new(&config));
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Context server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}

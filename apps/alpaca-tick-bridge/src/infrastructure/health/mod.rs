//! Health Check and Metrics Endpoint
//!
//! HTTP endpoint reporting upstream connection status, subscription counts
//! and Prometheus metrics.
//!
//! # Endpoints
//!
//! - `GET /health` - JSON health status (503 while the upstream is down)
//! - `GET /healthz` - liveness check
//! - `GET /readyz` - readiness check (ready once the upstream is authenticated)
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::services::TickBridge;
use crate::infrastructure::aggregator::TickAggregator;
use crate::infrastructure::alpaca::AlpacaStreamClient;
use crate::infrastructure::metrics::get_metrics_handle;

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Bridge version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Upstream stream status.
    pub upstream: UpstreamStatus,
    /// Subscription statistics.
    pub subscriptions: SubscriptionStatus,
    /// Downstream subscriber count.
    pub subscribers: usize,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Upstream authenticated and streaming.
    Healthy,
    /// Upstream not available.
    Unhealthy,
}

/// Upstream stream status.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamStatus {
    /// Whether the stream is connected and authenticated.
    pub connected: bool,
    /// Symbols requested on the quote channel.
    pub quote_symbols: usize,
    /// Symbols requested on the trade channel.
    pub trade_symbols: usize,
}

/// Subscription statistics.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatus {
    /// Symbols with a live upstream subscription.
    pub symbols: usize,
    /// Upstream channels held open.
    pub upstream_channels: usize,
    /// Exchange time zones resolved so far.
    pub cached_time_zones: usize,
}

// =============================================================================
// Health Server State
// =============================================================================

/// Shared state for the health server.
pub struct HealthServerState {
    version: String,
    started_at: Instant,
    bridge: Arc<TickBridge>,
    aggregator: Arc<TickAggregator>,
    stream: Arc<AlpacaStreamClient>,
}

impl HealthServerState {
    /// Create new health server state.
    #[must_use]
    pub fn new(
        version: String,
        bridge: Arc<TickBridge>,
        aggregator: Arc<TickAggregator>,
        stream: Arc<AlpacaStreamClient>,
    ) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            bridge,
            aggregator,
            stream,
        }
    }
}

// =============================================================================
// Health Server
// =============================================================================

/// Build the health router.
#[must_use]
pub fn router(state: Arc<HealthServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Health check HTTP server.
pub struct HealthServer {
    port: u16,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Create a new health server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HealthServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the health server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let app = router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "Health server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);
    let status_code = match response.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    if state.stream.is_connected() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

fn build_health_response(state: &HealthServerState) -> HealthResponse {
    let desired = state.stream.subscriptions();
    let upstream = UpstreamStatus {
        connected: state.stream.is_connected(),
        quote_symbols: desired.quotes.len(),
        trade_symbols: desired.trades.len(),
    };

    let stats = state.bridge.registry().stats();
    let subscriptions = SubscriptionStatus {
        symbols: stats.symbol_count,
        upstream_channels: stats.upstream_channels,
        cached_time_zones: state.bridge.event_handler().time_zones().len(),
    };

    HealthResponse {
        status: determine_health_status(&upstream),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        upstream,
        subscriptions,
        subscribers: state.aggregator.subscriber_count(),
    }
}

const fn determine_health_status(upstream: &UpstreamStatus) -> HealthStatus {
    if upstream.connected {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Health server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================

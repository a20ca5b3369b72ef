//! Prometheus metrics for monitoring match server health.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener
//! when `METRICS_BIND` is set.
//!
//! # Metrics Categories
//!
//! - **WebSocket Metrics**: Active and total connections
//! - **Session Metrics**: Sessions started, ended by reason, active sessions, moves
//! - **Reward Metrics**: Payouts succeeded, failed and pending
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use omok_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::sessions_started_total();
//! metrics::websocket_connections_active(10);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use omok::reward::DispatcherStats;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Set current active WebSocket connections count.
pub fn websocket_connections_active(count: u64) {
    metrics::gauge!("websocket_connections_active").set(count as f64);
}

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

// ============================================================================
// Session Metrics
// ============================================================================

/// Increment sessions started counter.
pub fn sessions_started_total() {
    metrics::counter!("sessions_started_total").increment(1);
}

/// Increment sessions ended counter for one termination reason.
pub fn sessions_ended_total(reason: &str) {
    metrics::counter!("sessions_ended_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Set current active sessions count.
pub fn active_sessions(count: usize) {
    metrics::gauge!("active_sessions").set(count as f64);
}

/// Increment accepted moves counter.
pub fn moves_applied_total() {
    metrics::counter!("moves_applied_total").increment(1);
}

/// Increment refused moves counter.
pub fn moves_rejected_total(reason: &str) {
    metrics::counter!("moves_rejected_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

// ============================================================================
// Reward Metrics
// ============================================================================

/// Publish the reward dispatcher counters.
pub fn reward_payouts(stats: DispatcherStats) {
    metrics::gauge!("reward_payouts_succeeded").set(stats.succeeded as f64);
    metrics::gauge!("reward_payouts_failed").set(stats.failed as f64);
    metrics::gauge!("reward_payouts_pending").set(stats.pending() as f64);
}

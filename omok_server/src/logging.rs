//! Structured logging configuration.
//!
//! The engine crate logs through the `log` facade; the subscriber installed
//! here forwards those records alongside native `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var and default to
/// `info` with noisy transport crates turned down.
///
/// # Example
///
/// ```no_run
/// use omok_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tungstenite=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a finished session with structured fields
pub fn log_session_closed(session_id: &str, reason: &str, move_count: usize, winner: Option<&str>) {
    tracing::info!(
        session_id = session_id,
        reason = reason,
        move_count = move_count,
        winner = winner,
        "Session closed"
    );
}

/// Log a WebSocket connection lifecycle event
pub fn log_connection_event(event: &str, connection_id: &str, wallet: &str) {
    tracing::info!(
        event = event,
        connection_id = connection_id,
        wallet = wallet,
        "WebSocket connection"
    );
}

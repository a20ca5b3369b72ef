//! Omok match server.
//!
//! Pairs WebSocket clients into two-player sessions, each run by its own
//! session actor, and pays winners through a sequential reward dispatcher.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Error;
use log::{error, info, warn};
use omok::{
    ledger::LoggingChipLedger,
    reward::{CommandPayout, RewardDispatcher},
    session::SessionRegistry,
};
use omok_server::{
    api,
    config::ServerConfig,
    logging, metrics,
};
use pico_args::Arguments;
use tokio::sync::broadcast::error::RecvError;

const HELP: &str = "\
Run an omok match server

USAGE:
  omok_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3001]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:3001)
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  BOARD_SIZE               Board edge length [default: 15]
  TURN_DURATION_SECS       Seconds per turn [default: 30]
  REWARD_COMMAND           Transfer CLI [default: spl-token]
  REWARD_MINT              Token mint passed to the transfer CLI
  REWARD_AMOUNT            Tokens per win [default: 18]
  PAYOUT_TIMEOUT_SECS      Upper bound on one payout [default: 60]
  (See .env file for all configuration options)
";

/// How often gauges are refreshed from registry and dispatcher state
const METRICS_SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;

    logging::init();

    let config = ServerConfig::from_env(bind_override)?;
    config.validate()?;

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(|e| anyhow::anyhow!(e))?;
        info!("Metrics exporter listening on {}", metrics_bind);
    }

    info!(
        "Starting omok server at {} (board {}x{}, {}s turns)",
        config.bind,
        config.session.board_size,
        config.session.board_size,
        config.session.turn_duration_ticks
    );

    // Reward dispatcher
    let payout = Arc::new(CommandPayout::spl_token(
        config.reward.command.clone(),
        &config.reward.mint,
        &config.reward.amount,
    ));
    let (rewards, reward_worker) =
        RewardDispatcher::spawn(payout, config.reward.dispatcher_config());
    info!(
        "Rewards paid with '{}' ({} per win, timeout {:?})",
        config.reward.command, config.reward.amount, config.reward.payout_timeout
    );

    let registry = Arc::new(SessionRegistry::new(
        config.session.clone(),
        rewards,
        Arc::new(LoggingChipLedger),
    ));

    spawn_summary_recorder(&registry);
    spawn_metrics_sampler(registry.clone());

    let app = api::create_router(api::AppState::new(registry.clone()));

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    // Finish payouts for games that already ended, one payout timeout per
    // request still queued.
    let pending = registry.rewards().stats().pending();
    if pending > 0 {
        info!("Waiting for {} pending reward(s)", pending);
        let limit = config
            .reward
            .payout_timeout
            .saturating_mul(u32::try_from(pending).unwrap_or(u32::MAX));
        let stats = registry.rewards().drain(limit).await;
        if stats.pending() > 0 {
            warn!(
                "Abandoning {} reward(s) at shutdown ({} sent, {} failed)",
                stats.pending(),
                stats.succeeded,
                stats.failed
            );
        }
    }
    reward_worker.abort();

    Ok(())
}

/// Record every closed session in logs and metrics
fn spawn_summary_recorder(registry: &SessionRegistry) {
    let mut summaries = registry.subscribe();
    tokio::spawn(async move {
        loop {
            match summaries.recv().await {
                Ok(summary) => {
                    let reason = summary.reason.to_string();
                    metrics::sessions_ended_total(&reason);
                    logging::log_session_closed(
                        &summary.session_id.to_string(),
                        &reason,
                        summary.move_count,
                        summary.winner.as_deref(),
                    );
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("Session summary recorder missed {} summaries", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Refresh gauges from registry and dispatcher state
fn spawn_metrics_sampler(registry: Arc<SessionRegistry>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(METRICS_SAMPLE_INTERVAL);
        loop {
            ticker.tick().await;
            metrics::active_sessions(registry.active_sessions().await);
            metrics::reward_payouts(registry.rewards().stats());
        }
    });
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}

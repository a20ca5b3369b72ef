//! Sequential reward dispatcher.
//!
//! Requests go into an unbounded channel and a single worker task drains it
//! in arrival order. The worker waits for each payout to resolve (success,
//! failure, or timeout) before it takes the next request, so at most one
//! payout is ever in flight. Failures are logged and never stop the queue.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle, time::timeout};

use super::{errors::PayoutError, payout::RewardPayout};
use crate::session::SessionId;

/// Default bound on a single payout
pub const DEFAULT_PAYOUT_TIMEOUT: Duration = Duration::from_secs(60);

/// How often `drain` checks the counters
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A pending reward for a session winner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardRequest {
    pub winner_address: String,
    pub session_id: Option<SessionId>,
    pub requested_at: DateTime<Utc>,
}

impl RewardRequest {
    pub fn new(winner_address: impl Into<String>) -> Self {
        Self {
            winner_address: winner_address.into(),
            session_id: None,
            requested_at: Utc::now(),
        }
    }

    pub fn for_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Time spent between the request and `now`
    pub fn waited(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.requested_at)
    }
}

/// Dispatcher configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Upper bound on one payout before it is treated as failed
    pub payout_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            payout_timeout: DEFAULT_PAYOUT_TIMEOUT,
        }
    }
}

#[derive(Debug, Default)]
struct DispatcherCounters {
    enqueued: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Dispatcher counters at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatcherStats {
    pub enqueued: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl DispatcherStats {
    /// Requests accepted but not yet resolved
    pub fn pending(&self) -> u64 {
        self.enqueued.saturating_sub(self.succeeded + self.failed)
    }
}

/// Handle for enqueueing rewards. Cheap to clone; the worker stops once
/// every handle is dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct RewardDispatcher {
    sender: mpsc::UnboundedSender<RewardRequest>,
    counters: Arc<DispatcherCounters>,
}

impl RewardDispatcher {
    /// Start the worker task and return a handle to it
    pub fn spawn(
        payout: Arc<dyn RewardPayout>,
        config: DispatcherConfig,
    ) -> (Self, JoinHandle<()>) {
        let (sender, inbox) = mpsc::unbounded_channel();
        let counters = Arc::new(DispatcherCounters::default());

        let worker = RewardWorker {
            inbox,
            payout,
            config,
            counters: counters.clone(),
        };
        let task = tokio::spawn(worker.run());

        (Self { sender, counters }, task)
    }

    /// Append a request to the queue. Never waits; returns `false` only if
    /// the worker has already stopped.
    pub fn enqueue(&self, request: RewardRequest) -> bool {
        let address = request.winner_address.clone();
        // Count first so the worker can never resolve more than was enqueued.
        self.counters.enqueued.fetch_add(1, Ordering::SeqCst);
        match self.sender.send(request) {
            Ok(()) => {
                log::info!("Reward request added for {}", address);
                true
            }
            Err(_) => {
                self.counters.enqueued.fetch_sub(1, Ordering::SeqCst);
                log::error!("Reward dispatcher stopped; dropping reward for {}", address);
                false
            }
        }
    }

    /// Wait until every accepted request has resolved, or until `limit`
    /// passes. Returns the counters as they stand at that point.
    pub async fn drain(&self, limit: Duration) -> DispatcherStats {
        let settled = async {
            while self.stats().pending() > 0 {
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
        };
        let _ = timeout(limit, settled).await;
        self.stats()
    }

    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            enqueued: self.counters.enqueued.load(Ordering::SeqCst),
            succeeded: self.counters.succeeded.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
        }
    }
}

struct RewardWorker {
    inbox: mpsc::UnboundedReceiver<RewardRequest>,
    payout: Arc<dyn RewardPayout>,
    config: DispatcherConfig,
    counters: Arc<DispatcherCounters>,
}

impl RewardWorker {
    async fn run(mut self) {
        log::info!("Reward dispatcher starting");

        while let Some(request) = self.inbox.recv().await {
            self.process(request).await;
        }

        log::info!("Reward dispatcher stopped");
    }

    async fn process(&self, request: RewardRequest) {
        let address = request.winner_address.as_str();
        let result = match timeout(self.config.payout_timeout, self.payout.pay(address)).await {
            Ok(result) => result,
            Err(_) => Err(PayoutError::Timeout(self.config.payout_timeout)),
        };

        let waited_ms = request.waited(Utc::now()).num_milliseconds();
        let session = request
            .session_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());

        match result {
            Ok(()) => {
                self.counters.succeeded.fetch_add(1, Ordering::SeqCst);
                log::info!(
                    "Reward sent to {} (session {}, {} ms after request)",
                    address,
                    session,
                    waited_ms
                );
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::SeqCst);
                let origin = if e.is_local() { "locally" } else { "at the backend" };
                log::error!(
                    "Reward for {} (session {}) failed {} after {} ms: {}",
                    address,
                    session,
                    origin,
                    waited_ms,
                    e
                );
            }
        }
    }
}

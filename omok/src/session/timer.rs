//! Per-turn countdown.
//!
//! The timer is a spawned ticker task that feeds `SessionMessage::Tick` into
//! the owning session's inbox. Every (re)start bumps a generation counter and
//! the session drops ticks whose generation is not current, so a tick already
//! queued when the timer was restarted or cancelled has no effect.

use std::time::Duration;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

use super::messages::SessionMessage;

/// Cancellable turn timer bound to one session
#[derive(Debug)]
pub struct TurnTimer {
    inbox: mpsc::Sender<SessionMessage>,
    tick_interval: Duration,
    ticks: u32,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl TurnTimer {
    pub fn new(inbox: mpsc::Sender<SessionMessage>, tick_interval: Duration, ticks: u32) -> Self {
        Self {
            inbox,
            tick_interval,
            ticks,
            generation: 0,
            task: None,
        }
    }

    /// Generation of the most recent start
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel any running countdown and start a fresh one
    pub fn restart(&mut self) {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let inbox = self.inbox.clone();
        let period = self.tick_interval;
        let ticks = self.ticks;

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            for _ in 0..ticks {
                ticker.tick().await;
                if inbox.send(SessionMessage::Tick { generation }).await.is_err() {
                    break;
                }
            }
        }));
    }

    /// Stop the countdown. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        // Invalidate ticks that were already queued before the abort.
        self.generation += 1;
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

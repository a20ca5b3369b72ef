//! Per-match state machine.
//!
//! A `GameSession` is owned by exactly one [`SessionActor`](super::SessionActor),
//! which feeds it events one at a time. Every path that ends the game goes
//! through [`GameSession::force_terminate`], whose status guard lets only the
//! first trigger through; [`GameSession::close`] then runs the cleanup once.

use std::collections::HashSet;
use tokio::sync::mpsc;

use super::{
    SessionId,
    config::SessionConfig,
    messages::{
        MoveOutcome, MoveRejection, ServerEvent, SessionMessage, SessionSnapshot, SessionStatus,
        SessionSummary, TerminationReason,
    },
    timer::TurnTimer,
};
use crate::{
    connection::{Connection, ConnectionId},
    game::{Board, Color, Coord, is_winning_move},
    matchmaking::Pairing,
    reward::{RewardDispatcher, RewardRequest},
};

/// One two-player match
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    board: Board,
    pairing: Pairing,
    /// Connections still attached to this session
    attached: HashSet<ConnectionId>,
    current: Color,
    status: SessionStatus,
    reason: Option<TerminationReason>,
    winner: Option<Color>,
    turn_duration: u32,
    time_left: u32,
    timer: TurnTimer,
}

impl GameSession {
    /// Create a session. Ticks from its timer are delivered to `inbox`.
    pub fn new(
        id: SessionId,
        config: &SessionConfig,
        pairing: Pairing,
        inbox: mpsc::Sender<SessionMessage>,
    ) -> Self {
        let attached = [pairing.black.id(), pairing.white.id()].into_iter().collect();

        Self {
            id,
            board: Board::new(config.board_size),
            pairing,
            attached,
            current: Color::FIRST,
            status: SessionStatus::Active,
            reason: None,
            winner: None,
            turn_duration: config.turn_duration_ticks,
            time_left: config.turn_duration_ticks,
            timer: TurnTimer::new(inbox, config.tick_interval, config.turn_duration_ticks),
        }
    }

    /// Announce the match to both players and start the first turn
    pub fn start(&mut self) {
        for color in [Color::Black, Color::White] {
            self.pairing.connection(color).notify(ServerEvent::MatchStarted {
                session_id: self.id,
                color,
            });
        }
        self.restart_turn();
        log::info!(
            "Session {} started: black={} white={}",
            self.id,
            self.pairing.black.wallet_address(),
            self.pairing.white.wallet_address()
        );
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn current_color(&self) -> Color {
        self.current
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.reason
    }

    /// Wallet address of the winner, once decided
    pub fn winner_address(&self) -> Option<&str> {
        self.winner
            .map(|color| self.pairing.connection(color).wallet_address())
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Place a stone for `connection_id`.
    ///
    /// Refused moves leave the session untouched.
    pub fn apply_move(
        &mut self,
        connection_id: ConnectionId,
        color: Color,
        at: Coord,
    ) -> Result<MoveOutcome, MoveRejection> {
        if self.status != SessionStatus::Active {
            return Err(MoveRejection::SessionNotActive);
        }
        if self.pairing.color_of(connection_id) != Some(color) {
            return Err(MoveRejection::NotYourColor);
        }
        if color != self.current {
            return Err(MoveRejection::NotYourTurn);
        }
        if !self.board.contains(at) {
            return Err(MoveRejection::OutOfBounds);
        }
        if !self.board.place(at, color) {
            return Err(MoveRejection::CellOccupied);
        }

        self.broadcast(ServerEvent::MoveApplied {
            x: at.x,
            y: at.y,
            color,
        });

        if is_winning_move(&self.board, at, color) {
            self.force_terminate(TerminationReason::Win, Some(color));
            return Ok(MoveOutcome::Won);
        }

        self.current = color.opponent();
        self.restart_turn();
        Ok(MoveOutcome::Placed { next: self.current })
    }

    /// Handle one tick of the turn timer. Ticks from a cancelled or
    /// superseded countdown, or arriving after the game ended, are ignored.
    pub fn on_tick(&mut self, generation: u64) {
        if self.status != SessionStatus::Active || generation != self.timer.generation() {
            return;
        }

        self.time_left = self.time_left.saturating_sub(1);
        self.broadcast(ServerEvent::TimerTick {
            remaining: self.time_left,
        });

        if self.time_left == 0 {
            log::info!(
                "Session {}: {} ran out of time",
                self.id,
                self.current
            );
            self.force_terminate(TerminationReason::Timeout, Some(self.current.opponent()));
        }
    }

    /// Explicit game-over from a participant naming the winner
    pub fn declare_game_over(&mut self, connection_id: ConnectionId, winner: Color) -> bool {
        if self.pairing.color_of(connection_id).is_none() {
            log::warn!(
                "Session {}: game-over from non-participant {} ignored",
                self.id,
                connection_id
            );
            return false;
        }
        self.force_terminate(TerminationReason::Forfeit, Some(winner))
    }

    /// Detach a participant whose transport went away.
    ///
    /// While the game is still running, the last live participant wins. If
    /// nobody live remains the session ends without a winner.
    pub fn leave(&mut self, connection_id: ConnectionId) -> bool {
        if !self.attached.remove(&connection_id) {
            return false;
        }
        if self.status != SessionStatus::Active {
            return false;
        }

        let remaining: Vec<Color> = [Color::Black, Color::White]
            .into_iter()
            .filter(|&color| {
                let conn = self.pairing.connection(color);
                self.attached.contains(&conn.id()) && conn.is_live()
            })
            .collect();

        match remaining.as_slice() {
            [survivor] => {
                let survivor = *survivor;
                self.pairing
                    .connection(survivor)
                    .notify(ServerEvent::OpponentLeft {
                        move_count: self.board.stone_count(),
                    });
                self.force_terminate(TerminationReason::Disconnect, Some(survivor))
            }
            [] => self.force_terminate(TerminationReason::Disconnect, None),
            _ => false,
        }
    }

    /// Move from Active to Terminating. Only the first call has an effect;
    /// returns whether this call was the one that ended the game.
    pub fn force_terminate(&mut self, reason: TerminationReason, winner: Option<Color>) -> bool {
        if self.status != SessionStatus::Active {
            log::debug!(
                "Session {}: ignoring {} after termination",
                self.id,
                reason
            );
            return false;
        }

        self.timer.cancel();
        self.status = SessionStatus::Terminating;
        self.reason = Some(reason);
        self.winner = winner;

        log::info!(
            "Session {} terminating ({}), winner: {}",
            self.id,
            reason,
            self.winner_address().unwrap_or("none")
        );
        true
    }

    /// Run the termination cleanup: stop the timer, tell the players, detach
    /// them, and queue the winner's reward. Does nothing unless the session
    /// is Terminating, so it runs at most once.
    pub fn close(&mut self, rewards: &RewardDispatcher) -> Option<SessionSummary> {
        if self.status != SessionStatus::Terminating {
            return None;
        }

        self.timer.cancel();

        let winner = self.winner_address().map(str::to_string);
        self.broadcast(ServerEvent::SessionEnded {
            winner: winner.clone(),
        });
        self.attached.clear();
        self.status = SessionStatus::Closed;

        if let Some(address) = &winner {
            rewards.enqueue(RewardRequest::new(address.clone()).for_session(self.id));
        }

        let reason = self.reason.unwrap_or(TerminationReason::Disconnect);
        log::info!("Session {} closed ({})", self.id, reason);

        Some(SessionSummary {
            session_id: self.id,
            reason,
            winner,
            move_count: self.board.stone_count(),
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            status: self.status,
            current_color: self.current,
            time_left: self.time_left,
            move_count: self.board.stone_count(),
            black_wallet: self.pairing.black.wallet_address().to_string(),
            white_wallet: self.pairing.white.wallet_address().to_string(),
        }
    }

    fn restart_turn(&mut self) {
        self.time_left = self.turn_duration;
        self.timer.restart();
    }

    fn broadcast(&self, event: ServerEvent) {
        for color in [Color::Black, Color::White] {
            let conn: &Connection = self.pairing.connection(color);
            if self.attached.contains(&conn.id()) {
                conn.notify(event.clone());
            }
        }
    }
}

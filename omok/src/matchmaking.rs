//! Single-slot matchmaking queue.
//!
//! The first connection to ask for a match is parked in the slot; the next
//! one takes it and the two are paired. Which of them plays black (and so
//! moves first) is decided by a coin flip.

use rand::seq::SliceRandom;
use std::sync::{Mutex, PoisonError};

use crate::connection::{Connection, ConnectionId};
use crate::game::Color;

/// Two connections paired for a session, keyed by color
#[derive(Debug, Clone)]
pub struct Pairing {
    pub black: Connection,
    pub white: Connection,
}

impl Pairing {
    pub fn connection(&self, color: Color) -> &Connection {
        match color {
            Color::Black => &self.black,
            Color::White => &self.white,
        }
    }

    /// Color assigned to `connection_id`, if it is part of this pairing
    pub fn color_of(&self, connection_id: ConnectionId) -> Option<Color> {
        if self.black.id() == connection_id {
            Some(Color::Black)
        } else if self.white.id() == connection_id {
            Some(Color::White)
        } else {
            None
        }
    }

    pub fn wallet_addresses(&self) -> Vec<String> {
        vec![
            self.black.wallet_address().to_string(),
            self.white.wallet_address().to_string(),
        ]
    }
}

/// Outcome of a match request
#[derive(Debug)]
pub enum MatchOutcome {
    /// Parked in the slot until an opponent arrives
    Waiting,
    /// Paired with the connection that was waiting
    Matched(Pairing),
}

/// Matchmaking queue holding at most one waiting connection
#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    slot: Mutex<Option<Connection>>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `connection`, or pair it with whoever is already waiting.
    ///
    /// A connection that is already in the slot stays there; it is never
    /// paired with itself.
    pub fn request_match(&self, connection: Connection) -> MatchOutcome {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        match slot.take() {
            None => {
                log::debug!("Connection {} waiting for an opponent", connection.id());
                *slot = Some(connection);
                MatchOutcome::Waiting
            }
            Some(waiting) if waiting.id() == connection.id() => {
                *slot = Some(waiting);
                MatchOutcome::Waiting
            }
            Some(waiting) => {
                drop(slot);
                MatchOutcome::Matched(assign_colors(waiting, connection))
            }
        }
    }

    /// Clear the slot if it holds `connection_id`. Returns whether it did.
    pub fn cancel_if_waiting(&self, connection_id: ConnectionId) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|c| c.id() == connection_id) {
            *slot = None;
            log::debug!("Connection {} left the matchmaking slot", connection_id);
            true
        } else {
            false
        }
    }

    /// Connection currently waiting, if any
    pub fn waiting(&self) -> Option<ConnectionId> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Connection::id)
    }
}

/// Randomly decide which of the two plays black
fn assign_colors(waiting: Connection, newcomer: Connection) -> Pairing {
    let mut pair = [waiting, newcomer];
    pair.shuffle(&mut rand::rng());
    let [black, white] = pair;
    Pairing { black, white }
}

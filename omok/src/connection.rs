//! Transport-side connection handle.
//!
//! The transport layer owns the socket; the core only keeps this handle,
//! which carries the connection's identity, its wallet address, and a
//! bounded outbox of [`ServerEvent`]s. Dropping the receiving half of the
//! outbox marks the connection as gone, so transports should drop it before
//! reporting the disconnect.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::session::messages::ServerEvent;

/// Connection identifier
pub type ConnectionId = Uuid;

/// Default outbox capacity used by [`Connection::channel`]
pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;

/// Handle to a live client connection
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    wallet_address: String,
    outbox: mpsc::Sender<ServerEvent>,
}

impl Connection {
    /// Create a handle with a fresh identifier around an existing outbox
    pub fn new(wallet_address: impl Into<String>, outbox: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_address: wallet_address.into(),
            outbox,
        }
    }

    /// Create a handle together with the receiving end of its outbox
    pub fn channel(
        wallet_address: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(wallet_address, tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }

    /// Whether the transport still holds the receiving end of the outbox
    pub fn is_live(&self) -> bool {
        !self.outbox.is_closed()
    }

    /// Push an event without waiting. Returns `false` if it was dropped.
    pub fn notify(&self, event: ServerEvent) -> bool {
        match self.outbox.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                log::warn!(
                    "Connection {} outbox full, dropping {:?}",
                    self.id,
                    event
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("Connection {} is gone, event not delivered", self.id);
                false
            }
        }
    }
}

use system::ConnectionId;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;

use crate::connection::ConnectionEvent;

pub type ConnectionTx = Sender<ConnectionEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("outbox is full")]
    Full,
    #[error("connection is gone")]
    Closed,
}

/// Open connections in the order they were registered.
///
/// Owned by the relay task alone, which is what serialises register, unregister and the
/// broadcast snapshot against each other.
pub struct ConnectionRegistry {
    connections: Vec<(ConnectionId, ConnectionTx)>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Vec::new(),
        }
    }

    pub fn register(&mut self, connection_id: ConnectionId, tx: ConnectionTx) {
        if let Some(entry) = self
            .connections
            .iter_mut()
            .find(|(id, _)| *id == connection_id)
        {
            log::warn!("Connection {} registered twice", connection_id);
            entry.1 = tx;
        } else {
            self.connections.push((connection_id, tx));
        }
    }

    /// Removing an absent connection is a no-op.
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Option<ConnectionTx> {
        let index = self
            .connections
            .iter()
            .position(|(id, _)| id == connection_id)?;
        Some(self.connections.remove(index).1)
    }

    pub fn snapshot(&self) -> Vec<(ConnectionId, ConnectionTx)> {
        self.connections.clone()
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub fn deliver(tx: &ConnectionTx, event: ConnectionEvent) -> Result<(), DeliveryError> {
    tx.try_send(event).map_err(|err| match err {
        TrySendError::Full(_) => DeliveryError::Full,
        TrySendError::Closed(_) => DeliveryError::Closed,
    })
}

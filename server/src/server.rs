//! Broadcast relay.
//!
//! A single task owns the [`ConnectionRegistry`]; connection actors reach it only through
//! [`RelayHandle`], so every membership change and every broadcast snapshot is applied in the
//! order the commands arrive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use system::ConnectionId;

use crate::connection::{ConnectionCommand, ConnectionEvent};
use crate::registry::{deliver, ConnectionRegistry};

pub type ServerTx = UnboundedSender<ConnectionCommand>;

pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
#[error("relay task has terminated")]
pub struct RelayClosed;

/// What happened to one broadcast.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: Vec<ConnectionId>,
    pub evicted: Vec<ConnectionId>,
}

struct Server {
    connections: ConnectionRegistry,
}

impl Server {
    fn new() -> Self {
        Self {
            connections: ConnectionRegistry::new(),
        }
    }

    fn handle_connection_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect { connection_id, tx } => {
                self.connections.register(connection_id, tx);
                log::info!(
                    "Connection {} registered ({} open)",
                    connection_id,
                    self.connections.len()
                );
            }
            ConnectionCommand::Disconnect { from } => {
                if self.connections.unregister(&from).is_some() {
                    log::info!(
                        "Connection {} unregistered ({} open)",
                        from,
                        self.connections.len()
                    );
                }
            }
            ConnectionCommand::Broadcast { from, message } => {
                let report = self.broadcast(&message);
                log::debug!(
                    "Relayed {} bytes from {} to {} connection(s)",
                    message.len(),
                    from,
                    report.delivered.len()
                );
            }
        }
    }

    /// Sends `message` to everyone registered at the time of the call, the sender included.
    /// Peers that cannot take the message are dropped from the registry.
    fn broadcast(&mut self, message: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for (connection_id, tx) in self.connections.snapshot() {
            match deliver(&tx, ConnectionEvent::Relay(message.to_owned())) {
                Ok(()) => report.delivered.push(connection_id),
                Err(err) => {
                    log::warn!("Evicting connection {}: {}", connection_id, err);
                    self.connections.unregister(&connection_id);
                    report.evicted.push(connection_id);
                }
            }
        }
        report
    }
}

/// Cheap, cloneable entry point into the relay task.
#[derive(Clone)]
pub struct RelayHandle {
    srv_tx: ServerTx,
    connection_id_source: Arc<AtomicU64>,
    outbox_capacity: usize,
}

impl RelayHandle {
    pub fn next_connection_id(&self) -> ConnectionId {
        self.connection_id_source.fetch_add(1, Ordering::Relaxed)
    }

    pub fn outbox_capacity(&self) -> usize {
        self.outbox_capacity
    }

    pub fn send(&self, command: ConnectionCommand) -> Result<(), RelayClosed> {
        self.srv_tx.send(command).map_err(|_| RelayClosed)
    }
}

pub fn spawn_server(outbox_capacity: usize) -> RelayHandle {
    let (srv_tx, mut srv_rx) = unbounded_channel::<ConnectionCommand>();

    tokio::spawn(async move {
        let mut server = Server::new();

        while let Some(command) = srv_rx.recv().await {
            server.handle_connection_command(command);
        }
        log::info!("Relay terminated");
    });

    RelayHandle {
        srv_tx,
        connection_id_source: Arc::new(AtomicU64::new(1)),
        outbox_capacity: outbox_capacity.max(1),
    }
}

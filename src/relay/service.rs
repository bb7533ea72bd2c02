use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use super::router::Relay;
use super::types::{ConnectionId, Dispatch, Outgoing, RelayStatus};
use crate::protocol::Event;

/// A scheduled delivery handed to a connection's courier.
#[derive(Debug)]
pub struct Delivery {
    pub deliver_at: Instant,
    pub outgoing: Outgoing,
}

pub type Courier = mpsc::UnboundedSender<Delivery>;

enum RelayCommand {
    Connect {
        id: ConnectionId,
        courier: Courier,
    },
    Inbound {
        id: ConnectionId,
        event: Event,
    },
    Disconnected {
        id: ConnectionId,
    },
    Status {
        reply: oneshot::Sender<RelayStatus>,
    },
}

/// Cloneable entry point to the relay actor.
#[derive(Clone)]
pub struct RelayHandle {
    commands: mpsc::UnboundedSender<RelayCommand>,
}

impl RelayHandle {
    /// Spawns the actor owning the relay state.
    pub fn spawn(latency: Duration) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            RelayService::new(latency).run(receiver).await;
        });

        Self { commands }
    }

    pub fn connect(&self, id: ConnectionId, courier: Courier) {
        self.send(RelayCommand::Connect { id, courier });
    }

    pub fn inbound(&self, id: ConnectionId, event: Event) {
        self.send(RelayCommand::Inbound { id, event });
    }

    pub fn disconnected(&self, id: ConnectionId) {
        self.send(RelayCommand::Disconnected { id });
    }

    pub async fn status(&self) -> anyhow::Result<RelayStatus> {
        let (reply, receiver) = oneshot::channel();
        self.commands
            .send(RelayCommand::Status { reply })
            .map_err(|_| anyhow::anyhow!("relay service has stopped"))?;
        Ok(receiver.await?)
    }

    fn send(&self, command: RelayCommand) {
        if self.commands.send(command).is_err() {
            tracing::error!("Relay service has stopped; dropping command");
        }
    }
}

struct RelayService {
    relay: Relay,
    couriers: HashMap<ConnectionId, Courier>,
}

impl RelayService {
    fn new(latency: Duration) -> Self {
        Self {
            relay: Relay::new(latency),
            couriers: HashMap::new(),
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<RelayCommand>) {
        tracing::info!(
            "Relay service started (latency {:?})",
            self.relay.latency()
        );

        while let Some(command) = commands.recv().await {
            match command {
                RelayCommand::Connect { id, courier } => {
                    tracing::info!("Connection opened: {}", id);
                    self.couriers.insert(id, courier);
                }
                RelayCommand::Inbound { id, event } => {
                    tracing::debug!("Received '{}' from {}", event.name(), id);
                    let dispatches = self.relay.route(&id, event);
                    self.schedule(dispatches);
                }
                RelayCommand::Disconnected { id } => {
                    self.couriers.remove(&id);
                    let dispatches = self.relay.connection_lost(&id);
                    self.schedule(dispatches);
                }
                RelayCommand::Status { reply } => {
                    let mut status = self.relay.status();
                    status.connections = self.couriers.len();
                    let _ = reply.send(status);
                }
            }
        }

        tracing::info!("Relay service stopped");
    }

    fn schedule(&mut self, dispatches: Vec<Dispatch>) {
        let now = Instant::now();

        for dispatch in dispatches {
            let Some(courier) = self.couriers.get(&dispatch.to) else {
                tracing::debug!("Dropping delivery for closed connection {}", dispatch.to);
                continue;
            };

            let delivery = Delivery {
                deliver_at: now + dispatch.delay,
                outgoing: dispatch.outgoing,
            };

            if courier.send(delivery).is_err() {
                tracing::debug!("Courier for {} is gone", dispatch.to);
                self.couriers.remove(&dispatch.to);
            }
        }
    }
}

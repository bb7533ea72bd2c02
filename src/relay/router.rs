//! Relay State Machine
//!
//! Pure routing logic: every entry point takes the current input and returns the deliveries it
//! implies. Scheduling, sockets and timers live in `service` and `handlers`.

use std::time::Duration;

use super::registry::RoleRegistry;
use super::types::{ConnectionId, Dispatch, RelayStatus};
use crate::protocol::{Event, Role};

pub const EVICTION_REASON: &str = "Another device took your role";

pub struct Relay {
    registry: RoleRegistry,
    storage_disconnected: bool,
    latency: Duration,
}

impl Relay {
    pub fn new(latency: Duration) -> Self {
        Self {
            registry: RoleRegistry::new(),
            storage_disconnected: false,
            latency,
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn is_storage_disconnected(&self) -> bool {
        self.storage_disconnected
    }

    /// Binds `connection` to the role named `name`, evicting the previous holder.
    ///
    /// The evicted connection receives `force-disconnect` after one latency interval and is severed
    /// right after it; the new holder is confirmed one interval later.
    pub fn select_role(&mut self, connection: &ConnectionId, name: &str) -> Vec<Dispatch> {
        let role: Role = match name.parse() {
            Ok(role) => role,
            Err(e) => {
                tracing::debug!("Ignoring role selection from {}: {}", connection, e);
                return Vec::new();
            }
        };

        let mut dispatches = Vec::new();
        let mut confirm_after = self.latency;

        if let Some(evicted) = self.registry.bind(role, connection.clone()) {
            tracing::info!(
                "Evicting {} from role \"{}\" in favour of {}",
                evicted,
                role,
                connection
            );
            dispatches.push(Dispatch::event(
                evicted.clone(),
                Event::ForceDisconnect(EVICTION_REASON.to_string()),
                self.latency,
            ));
            dispatches.push(Dispatch::sever(evicted, self.latency));
            confirm_after = self.latency * 2;
        }

        tracing::info!("Registered \"{}\" as {}", role, connection);
        dispatches.push(Dispatch::event(
            connection.clone(),
            Event::RoleConfirmed(role),
            confirm_after,
        ));

        dispatches
    }

    /// Applies the routing table to an event received from `from`.
    pub fn route(&mut self, from: &ConnectionId, event: Event) -> Vec<Dispatch> {
        match event {
            Event::SelectRole(name) => self.select_role(from, &name),
            Event::RequestValues(_) | Event::ComputedResult(_) => {
                self.forward(from, Role::Compute, Role::Storage, event, true)
            }
            Event::ValuesFound(_) | Event::ValuesNotFound(_) => {
                self.forward(from, Role::Storage, Role::Compute, event, false)
            }
            Event::RequestReconnect => self.forward(
                from,
                Role::Compute,
                Role::Storage,
                Event::ReconnectRequested,
                false,
            ),
            Event::StorageDisconnect => {
                if self.registry.role_of(from) != Some(Role::Storage) {
                    return Vec::new();
                }
                tracing::info!("Storage peer disconnected");
                self.storage_disconnected = true;
                self.notify_compute(Event::StorageDisconnected)
            }
            Event::StorageReconnect(snapshot) => {
                if self.registry.role_of(from) != Some(Role::Storage) {
                    return Vec::new();
                }
                tracing::info!("Storage peer reconnected");
                self.storage_disconnected = false;
                self.notify_compute(Event::StorageReconnected(snapshot.unwrap_or_default()))
            }
            other => {
                tracing::debug!("Relay does not route '{}' from {}", other.name(), from);
                Vec::new()
            }
        }
    }

    /// Clears the binding of a lost connection and tells compute when storage went away.
    pub fn connection_lost(&mut self, connection: &ConnectionId) -> Vec<Dispatch> {
        let Some(role) = self.registry.release(connection) else {
            tracing::info!("Unbound connection {} disconnected", connection);
            return Vec::new();
        };

        tracing::info!("\"{}\" disconnected: {}", role, connection);

        if role == Role::Storage {
            self.storage_disconnected = true;
            return self.notify_compute(Event::StorageDisconnected);
        }

        Vec::new()
    }

    pub fn status(&self) -> RelayStatus {
        RelayStatus {
            compute: self.registry.holder(Role::Compute).cloned(),
            storage: self.registry.holder(Role::Storage).cloned(),
            storage_disconnected: self.storage_disconnected,
            connections: self.registry.len(),
        }
    }

    fn forward(
        &self,
        from: &ConnectionId,
        sender: Role,
        destination: Role,
        event: Event,
        gated: bool,
    ) -> Vec<Dispatch> {
        if self.registry.role_of(from) != Some(sender) {
            tracing::debug!(
                "Dropping '{}' from {}: sender is not \"{}\"",
                event.name(),
                from,
                sender
            );
            return Vec::new();
        }

        let Some(to) = self.registry.holder(destination) else {
            tracing::debug!("Dropping '{}': no \"{}\" bound", event.name(), destination);
            return Vec::new();
        };

        if gated && self.storage_disconnected {
            tracing::debug!("Dropping '{}': storage is disconnected", event.name());
            return Vec::new();
        }

        tracing::debug!("{} '{}' -> {}", sender, event.name(), destination);
        vec![Dispatch::event(to.clone(), event, self.latency)]
    }

    fn notify_compute(&self, event: Event) -> Vec<Dispatch> {
        match self.registry.holder(Role::Compute) {
            Some(compute) => vec![Dispatch::event(compute.clone(), event, self.latency)],
            None => Vec::new(),
        }
    }
}

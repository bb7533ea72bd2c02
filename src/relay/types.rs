use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::protocol::Event;

/// Identity of one transport connection at the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the relay hands to a connection's courier.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Event(Event),
    /// Close the connection after everything queued before it has been delivered.
    Sever,
}

/// A delivery decided by the relay state machine, not yet scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub to: ConnectionId,
    pub outgoing: Outgoing,
    pub delay: Duration,
}

impl Dispatch {
    pub fn event(to: ConnectionId, event: Event, delay: Duration) -> Self {
        Self {
            to,
            outgoing: Outgoing::Event(event),
            delay,
        }
    }

    pub fn sever(to: ConnectionId, delay: Duration) -> Self {
        Self {
            to,
            outgoing: Outgoing::Sever,
            delay,
        }
    }
}

/// Snapshot of the relay served on `/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayStatus {
    pub compute: Option<ConnectionId>,
    pub storage: Option<ConnectionId>,
    pub storage_disconnected: bool,
    pub connections: usize,
}

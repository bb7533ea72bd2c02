use std::collections::HashMap;

use super::types::ConnectionId;
use crate::protocol::Role;

/// Relay-side role table: zero or one connection per role, at most one role per connection.
#[derive(Debug, Default)]
pub struct RoleRegistry {
    bindings: HashMap<Role, ConnectionId>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `role` to `connection`, releasing any other role the connection held.
    ///
    /// Returns the previous holder when it was a different connection.
    pub fn bind(&mut self, role: Role, connection: ConnectionId) -> Option<ConnectionId> {
        if let Some(previous) = self.role_of(&connection)
            && previous != role
        {
            self.bindings.remove(&previous);
        }

        match self.bindings.insert(role, connection.clone()) {
            Some(previous) if previous != connection => Some(previous),
            _ => None,
        }
    }

    pub fn holder(&self, role: Role) -> Option<&ConnectionId> {
        self.bindings.get(&role)
    }

    pub fn role_of(&self, connection: &ConnectionId) -> Option<Role> {
        self.bindings
            .iter()
            .find(|(_, bound)| *bound == connection)
            .map(|(role, _)| *role)
    }

    /// Clears whatever role `connection` holds.
    pub fn release(&mut self, connection: &ConnectionId) -> Option<Role> {
        let role = self.role_of(connection)?;
        self.bindings.remove(&role);
        Some(role)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

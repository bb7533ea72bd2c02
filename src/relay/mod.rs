//! Relay Module
//!
//! Routes events between exactly one compute peer and one storage peer.
//!
//! ## Core Mechanisms
//! - **Role exclusivity**: `RoleRegistry` keeps at most one connection per role. Selecting a taken
//!   role evicts the previous holder (`force-disconnect`, then the connection is severed).
//! - **Role-scoped routing**: `Relay` forwards an event only when the sender holds the role the event
//!   expects and the destination role is bound. Storage-bound events are dropped while storage is
//!   flagged disconnected.
//! - **Simulated latency**: every delivery is stamped `now + latency` and drained per connection in
//!   order, so delays never block other connections and never reorder a channel.
//! - **Actor**: `service` owns the relay state in a single task; the axum `handlers` only talk to it
//!   through channels.

pub mod handlers;
pub mod registry;
pub mod router;
pub mod service;
pub mod types;

//! Wire Protocol Module
//!
//! Defines the named events exchanged between the compute peer, the storage peer and the relay.
//!
//! ## Core Concepts
//! - **Envelope**: every frame is a JSON object `{"event": <name>, "payload": <json>}`.
//! - **Typed events**: frames are decoded once, at the edge, into `Event`. Everything behind the
//!   transport works with typed values only.
//! - **Lenient indices**: numeric payload fields accept JSON integers and decimal strings, since map
//!   keys always arrive as strings.

pub mod event;
pub mod types;

pub use event::{Envelope, Event, ValueMap};
pub use types::{MAX_INDEX, Role, Snapshot, ValuePair};

#[cfg(test)]
mod tests;

//! Peer Runtime Module
//!
//! Hosts a role agent (compute or storage) on a relay connection.
//!
//! ## Core Concepts
//! - **Agents are state machines**: an `Agent` never touches the network or the clock. It receives
//!   one `Input` at a time and answers with a list of `Effect`s.
//! - **Runtime owns time**: the runtime paces outbound messages by the simulated latency, feeds
//!   `Input::Resume` back once a `SendAndResume` message has left, and runs the countdown ticker.
//! - **One inbox**: socket events, local commands, resumes and ticks are serialized through a single
//!   loop, so agent state is only ever touched from one task.

pub mod countdown;
pub mod runtime;
pub mod types;

pub use runtime::{Peer, spawn_peer};
pub use types::{Agent, Effect, Input};

#[cfg(test)]
mod tests;

//! Compute Module
//!
//! The compute peer drives the Fibonacci resolution and every protocol decision.
//!
//! ## Core Mechanisms
//! - **One resolution routine**: `ComputeAgent::resolve` walks the target down to known
//!   dependencies. With storage reachable a missing pair becomes a single-flight `request-values`;
//!   without it the dependencies are queued and computed locally.
//! - **Ascending drain**: blocked targets wait in the `PendingQueue` behind their dependencies and
//!   the queue is always popped smallest first.
//! - **Yield after push**: each `computed-result` suspends resolution until the runtime reports the
//!   message delivered (`Input::Resume`).
//! - **Disconnect countdown**: losing storage mid-session pauses the run and starts a generation
//!   tagged countdown. A reconnect snapshot cancels it; expiry resets the session.

pub mod agent;
pub mod types;

pub use agent::ComputeAgent;
pub use types::{ComputeCommand, ComputeStatus, Countdown, Phase};

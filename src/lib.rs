//! Fibonacci Handoff Library
//!
//! Computes Fibonacci(N) split across two cooperating peers that talk through a relay.
//! The binary (`main.rs`) wires these modules to a WebSocket transport and a CLI.
//!
//! ## Architecture Modules
//! - **`protocol`**: The typed event set shared by every participant and its JSON envelope codec.
//! - **`memo`**: Grow-only memo cache, pending-dependency queue and the single-flight request guard.
//! - **`relay`**: Role registry, routing rules with simulated latency, and the axum transport front-end.
//! - **`compute`**: The compute peer's state machine (dependency resolution, degradation, reconciliation).
//! - **`storage`**: The storage peer's state machine and its snapshot persistence.
//! - **`peer`**: The runtime that connects an agent to the relay and executes its effects.

pub mod compute;
pub mod config;
pub mod error;
pub mod memo;
pub mod peer;
pub mod protocol;
pub mod relay;
pub mod storage;

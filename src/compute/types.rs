use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Computing,
    AwaitingRemote,
    StorageDisconnected,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Computing => "computing",
            Phase::AwaitingRemote => "awaiting remote",
            Phase::StorageDisconnected => "storage disconnected",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Local requests issued by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeCommand {
    /// Start a new session. Signed so that negative input can be rejected rather than wrapped.
    StartTarget(i64),
    /// Ask a paused storage peer to come back.
    RequestReconnect,
}

/// Running storage-disconnect countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub generation: u64,
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeStatus {
    pub confirmed: bool,
    pub phase: Phase,
    pub target: Option<u64>,
    pub original_target: Option<u64>,
    pub last_resolved: Option<u64>,
    /// Value of the original target once memoized.
    pub result: Option<u64>,
    pub cached: usize,
    pub pending: usize,
    pub message_count: u64,
    /// Seconds left before the session is reset.
    pub countdown: Option<u32>,
    pub storage_reachable: bool,
}

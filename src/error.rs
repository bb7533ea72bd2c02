//! Error types surfaced by the protocol codec and the persistence layer.
//!
//! Wrong-role/wrong-state inputs and the storage timeout are not errors in the type
//! sense: the agents answer them with "no effects" and a session reset respectively.

use std::path::PathBuf;
use thiserror::Error;

/// A frame or payload that could not be turned into a typed `Event`.
///
/// Frames that fail to decode are logged and dropped; they never change agent state.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("invalid payload for '{event}': {reason}")]
    InvalidPayload { event: &'static str, reason: String },

    #[error("field '{field}' is not a non-negative integer: {value}")]
    NotAnIndex { field: String, value: String },
}

/// Failure to read or write the persisted snapshot.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("no snapshot at {0}")]
    Missing(PathBuf),

    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

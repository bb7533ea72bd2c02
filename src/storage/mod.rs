//! Storage Module
//!
//! The storage peer keeps the authoritative memo cache, answers dependency lookups and persists
//! every accepted batch.
//!
//! ## Core Concepts
//! - **Exact answers**: a lookup is answered with both requested values or with `values-not-found`,
//!   never with half a pair.
//! - **Idempotent stores**: `computed-result` batches go through the insert-only `MemoCache` merge,
//!   so replays and duplicates leave the cache unchanged.
//! - **Persistence**: snapshots are written through a `SnapshotStore`. Restore failures fall back to
//!   the base values and never reach the caller.
//! - **Manual pause**: the operator can take storage offline and bring it back; while paused, value
//!   traffic is ignored.

pub mod agent;
pub mod persistence;

pub use agent::{StorageAgent, StorageCommand, StorageStatus};
pub use persistence::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};

//! Memoization Module
//!
//! Shared state types used by both peers while resolving Fibonacci indices.
//!
//! ## Core Concepts
//! - **MemoCache**: grow-only index -> value map seeded with the base cases. Merges are
//!   insert-only and rejected when they would contradict the recurrence.
//! - **PendingQueue**: indices waiting for resolution, always popped smallest first.
//! - **RequestTracker**: single-flight guard, at most one outstanding lookup per dependency pair.

pub mod cache;
pub mod queue;
pub mod request;

pub use cache::{MemoCache, Merge, MergeSummary};
pub use queue::PendingQueue;
pub use request::RequestTracker;

#[cfg(test)]
mod tests;

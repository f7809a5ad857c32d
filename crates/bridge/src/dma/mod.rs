//! DMA engine.
//!
//! Device-initiated host memory accesses are queued as operations and split into
//! sub-operations that fit one transport message. It provides:
//! 1. **Splitting:** Sub-operations of at most the chunk bound, issued in increasing
//!    offset order without gaps.
//! 2. **Flow control:** At most `max_pending` sub-operations in flight across all
//!    operations.
//! 3. **Ordering:** Operations retire strictly in enqueue order; a completion that
//!    finishes any operation but the oldest is fatal.

/// Operation queue, sub-operation table and completion handling.
pub mod engine;

pub use engine::{DmaCompletion, DmaCounters, DmaEngine};

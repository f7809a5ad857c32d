//! Common types and constants shared by every engine of the bridge.
//!
//! This module provides:
//! 1. **Constants:** Default bounds for DMA splitting, packet sizes and AXI encodings.
//! 2. **Data types:** Transfer direction and register access descriptors.
//! 3. **Error Handling:** The crate-wide `BridgeError` and `Result` alias.

/// Constants used throughout the bridge.
pub mod constants;

/// Shared data type definitions.
pub mod data;

/// Error types.
pub mod error;

pub use data::{Direction, RegisterOp};
pub use error::{BridgeError, Result};

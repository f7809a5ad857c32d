//! Clock-edge bridge between an RTL simulation model and a PCIe/Ethernet message transport.
//!
//! This crate drives a cycle-accurate hardware model one clock edge at a time and connects
//! it to an asynchronous, timestamped message transport. It provides:
//! 1. **Bus engines:** AXI-Lite register access, AXI burst subordinates and AXI-Stream
//!    endpoints, each split into a sampling `step` and a committing `step_apply`.
//! 2. **DMA:** An in-order DMA engine that splits host memory accesses into bounded
//!    sub-operations under a global concurrency limit.
//! 3. **Transport:** The logical message schema, the `Channel` abstraction, a bounded retry
//!    policy for outbound sends and an in-process loopback link.
//! 4. **Simulation:** The tick loop (sync, drain, falling edge, rising edge, apply), the
//!    message dispatcher, interrupt and packet bridging, control registers and statistics.

/// AXI bus engines (AXI-Lite manager, burst subordinates, AXI-Stream endpoints).
pub mod axi;
/// Signal Interface: the narrow capability through which engines reach the hardware model.
pub mod bus;
/// Common types, constants and the crate error type.
pub mod common;
/// Bridge configuration (defaults, JSON loading, validation).
pub mod config;
/// Device adapter strategy hooks.
pub mod device;
/// DMA engine splitting host memory accesses into bounded sub-operations.
pub mod dma;
/// Level-sensitive interrupt emitter.
pub mod irq;
/// Packet bridge between the network link and the device stream ports.
pub mod net;
/// Simulation loop, dispatcher and process-level control.
pub mod sim;
/// Bridge statistics collection and reporting.
pub mod stats;
/// Transport message schema, channel trait, retry policy and loopback link.
pub mod transport;

/// Root configuration type; use `Config::default()` or load it from JSON.
pub use crate::config::Config;
/// Crate-wide error and result types.
pub use crate::common::error::{BridgeError, Result};
/// Top-level simulation driver.
pub use crate::sim::Simulator;

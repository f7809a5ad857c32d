//! Packet bridge between the network link and the device stream ports.
//!
//! Received packets wait in a bounded queue that feeds the device's stream input;
//! frames the device transmits on its stream output go out as packet messages.

/// Receive queue, transmit assembly and drop accounting.
pub mod bridge;

pub use bridge::PacketBridge;

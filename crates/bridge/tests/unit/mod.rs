//! # Unit Components
//!
//! This module organizes the tests for each building block of the bridge, from
//! the bus engines up to the full simulation loop.


/// AXI burst subordinate tests.
///
/// Covers burst acceptance, beat lanes and strobes, per-id ordering and the
/// rejection of unsupported burst shapes.
pub mod burst;


/// Device adapter tests.
pub mod device;



/// Packet bridge and AXI-Stream endpoint tests.
pub mod net;

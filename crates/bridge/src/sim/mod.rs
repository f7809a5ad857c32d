//! Simulation loop and process-level control.
//!
//! Provides the [`Simulator`] driver, its inbound message dispatcher, the
//! simulation-control register window and POSIX signal handling.

/// Simulation-control registers (bar 1).
pub mod control;
mod dispatch;
/// Stop and report requests (SIGINT, SIGUSR1).
pub mod signals;
/// The tick loop.
pub mod simulator;

pub use control::{ControlRegisters, TraceAction};
pub use signals::StopFlag;
pub use simulator::Simulator;

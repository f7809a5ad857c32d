//! AXI bus engines.
//!
//! Every engine follows the same two-phase contract around a rising clock edge:
//! 1. **`step`:** Called after the clock was raised and before the model is evaluated.
//!    Samples the handshake signals as the model drove them during the last cycle,
//!    advances the engine state and stages the next inputs.
//! 2. **`step_apply`:** Called after the evaluation. Writes the staged inputs so the
//!    model sees them during the following cycle.
//!
//! A transfer on any channel happens at the edge where the engine samples both
//! `valid` and `ready` high.

/// Device-initiated burst reads and writes (bridge is subordinate).
pub mod burst;
/// Register access engine (bridge is AXI-Lite manager).
pub mod lite;
/// AXI-Stream packet endpoints.
pub mod stream;

pub use burst::{AxiSubordinateRead, AxiSubordinateWrite, BurstRead, BurstWrite};
pub use lite::{AxiLiteManager, RegisterCompletion};
pub use stream::{AxiStreamManager, AxiStreamSubordinate};

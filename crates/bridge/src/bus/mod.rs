//! Signal Interface to the hardware model.
//!
//! Engines never see the concrete RTL model; they reach it through [`HardwareModel`],
//! a narrow named-signal capability. It provides:
//! 1. **Access:** Byte-level reads and writes of named wires, with `u64` convenience
//!    helpers for wires up to 64 bits.
//! 2. **Evaluation:** One `eval` call settles the model after inputs changed.
//! 3. **Lifecycle:** Optional trace start/stop and a final `finalize`.
//!
//! [`SignalStore`] is a plain in-memory implementation used as the backing store of
//! test models, and the port structs in [`ports`] build the wire names of the AXI
//! buses from a per-port prefix.

/// AXI port wire-name sets.
pub mod ports;

/// In-memory signal storage.
pub mod store;

use std::path::Path;

pub use ports::{AxiLitePort, AxiReadPort, AxiStreamPort, AxiWritePort};
pub use store::SignalStore;

/// Named-signal access to a cycle-accurate hardware model.
///
/// Multi-byte signals are little-endian byte strings. Implementations copy
/// `min(buf.len(), width)` bytes and zero the rest of `buf` on reads; writes copy
/// `min(data.len(), width)` bytes and zero the remaining signal bytes.
pub trait HardwareModel {
    /// Reads the current value of a signal into `buf`.
    fn read_signal(&self, name: &str, buf: &mut [u8]);

    /// Drives a model input.
    fn write_signal(&mut self, name: &str, data: &[u8]);

    /// Evaluates the model until its outputs settle.
    fn eval(&mut self);

    /// Runs final blocks and flushes any open trace. Called once at shutdown.
    fn finalize(&mut self) {}

    /// Starts writing a waveform trace to `path`.
    fn trace_start(&mut self, _path: &Path) {}

    /// Closes the current waveform trace, if any.
    fn trace_stop(&mut self) {}

    /// Reads a signal of at most 64 bits.
    fn get(&self, name: &str) -> u64 {
        let mut buf = [0u8; 8];
        self.read_signal(name, &mut buf);
        u64::from_le_bytes(buf)
    }

    /// Drives a signal of at most 64 bits.
    fn set(&mut self, name: &str, value: u64) {
        self.write_signal(name, &value.to_le_bytes());
    }

    /// Reads a single-bit signal.
    fn get_bit(&self, name: &str) -> bool {
        self.get(name) & 1 != 0
    }

    /// Drives a single-bit signal.
    fn set_bit(&mut self, name: &str, value: bool) {
        self.set(name, u64::from(value));
    }
}

impl<M: HardwareModel + ?Sized> HardwareModel for Box<M> {
    fn read_signal(&self, name: &str, buf: &mut [u8]) {
        (**self).read_signal(name, buf);
    }

    fn write_signal(&mut self, name: &str, data: &[u8]) {
        (**self).write_signal(name, data);
    }

    fn eval(&mut self) {
        (**self).eval();
    }

    fn finalize(&mut self) {
        (**self).finalize();
    }

    fn trace_start(&mut self, path: &Path) {
        (**self).trace_start(path);
    }

    fn trace_stop(&mut self) {
        (**self).trace_stop();
    }
}

//! In-memory signal storage.
//!
//! A `SignalStore` keeps every wire as a little-endian byte vector of fixed width.
//! It implements [`HardwareModel`] with a no-op `eval`, so engines can be exercised
//! against it directly, and it serves as the wire state of the behavioral models
//! used in tests.

use std::collections::HashMap;

use super::HardwareModel;

/// Named wires with fixed byte widths.
#[derive(Clone, Debug, Default)]
pub struct SignalStore {
    wires: HashMap<String, Vec<u8>>,
}

impl SignalStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a wire of `width` bytes, initialized to zero.
    ///
    /// Re-declaring an existing wire resets it.
    pub fn declare(&mut self, name: &str, width: usize) {
        let _ = self.wires.insert(name.to_string(), vec![0; width]);
    }

    /// Returns the width of a wire in bytes, if it exists.
    pub fn width(&self, name: &str) -> Option<usize> {
        self.wires.get(name).map(Vec::len)
    }

    /// Returns the raw bytes of a wire.
    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        self.wires.get(name).map(Vec::as_slice)
    }

    /// Reads a wire; unknown wires read as zero.
    pub fn read(&self, name: &str, buf: &mut [u8]) {
        buf.fill(0);
        if let Some(wire) = self.wires.get(name) {
            let n = wire.len().min(buf.len());
            buf[..n].copy_from_slice(&wire[..n]);
        }
    }

    /// Writes a wire. Writing an undeclared wire declares it with the data length.
    pub fn write(&mut self, name: &str, data: &[u8]) {
        match self.wires.get_mut(name) {
            Some(wire) => {
                let n = wire.len().min(data.len());
                wire[..n].copy_from_slice(&data[..n]);
                wire[n..].fill(0);
            }
            None => {
                let _ = self.wires.insert(name.to_string(), data.to_vec());
            }
        }
    }
}

impl HardwareModel for SignalStore {
    fn read_signal(&self, name: &str, buf: &mut [u8]) {
        self.read(name, buf);
    }

    fn write_signal(&mut self, name: &str, data: &[u8]) {
        self.write(name, data);
    }

    fn eval(&mut self) {}
}

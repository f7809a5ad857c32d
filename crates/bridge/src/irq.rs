//! Level-sensitive interrupt emitter.
//!
//! The device drives an interrupt vector signal; every rising edge on which a bit is
//! set produces one MSI message for that bit. A bit held high raises its vector again
//! on every cycle, so devices are expected to pulse their interrupt lines.

use tracing::trace;

use crate::bus::HardwareModel;
use crate::common::constants::IRQ_VECTOR_BITS;
use crate::common::error::Result;
use crate::transport::{D2hMsg, MessageSink};

/// Samples the interrupt vector and emits interrupt messages.
#[derive(Clone, Debug)]
pub struct InterruptEmitter {
    signal: String,
    raised: u64,
}

impl InterruptEmitter {
    /// Creates an emitter sampling `signal`.
    pub fn new(signal: impl Into<String>) -> Self {
        Self {
            signal: signal.into(),
            raised: 0,
        }
    }

    /// Samples the vector and sends one interrupt per asserted bit, lowest bit first.
    ///
    /// # Returns
    ///
    /// The number of interrupts sent.
    pub fn step<M: HardwareModel + ?Sized>(
        &mut self,
        model: &M,
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<u32> {
        let vector = model.get(&self.signal);
        if vector == 0 {
            return Ok(0);
        }

        let mut sent = 0;
        for bit in 0..IRQ_VECTOR_BITS {
            if (vector >> bit) & 1 != 0 {
                trace!(vector = bit, "raising interrupt");
                out.send(D2hMsg::Interrupt { vector: bit as u16 })?;
                sent += 1;
            }
        }
        self.raised += u64::from(sent);
        Ok(sent)
    }

    /// Interrupt messages sent so far.
    pub const fn raised(&self) -> u64 {
        self.raised
    }
}

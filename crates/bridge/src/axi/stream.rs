//! AXI-Stream packet endpoints.

use std::collections::VecDeque;

use tracing::trace;

use crate::bus::{AxiStreamPort, HardwareModel};
use crate::common::error::{BridgeError, Result};

/// Feeds queued packets into a device stream input, one bus-width beat per cycle.
///
/// The queue is bounded; [`AxiStreamManager::try_push`] hands a packet back when it
/// is full.
#[derive(Debug)]
pub struct AxiStreamManager {
    port: AxiStreamPort,
    width: usize,
    capacity: usize,
    queue: VecDeque<Vec<u8>>,
    offset: usize,
    tvalid: bool,
    tdata: Vec<u8>,
    tkeep: u64,
    tlast: bool,
}

impl AxiStreamManager {
    /// Creates a manager for the port named by `prefix`.
    pub fn new(prefix: &str, width: usize, capacity: usize) -> Self {
        Self {
            port: AxiStreamPort::new(prefix),
            width,
            capacity,
            queue: VecDeque::new(),
            offset: 0,
            tvalid: false,
            tdata: vec![0; width],
            tkeep: 0,
            tlast: false,
        }
    }

    /// Queues a packet, or returns it when the queue is full.
    pub fn try_push(&mut self, packet: Vec<u8>) -> std::result::Result<(), Vec<u8>> {
        if self.is_full() {
            return Err(packet);
        }
        self.queue.push_back(packet);
        Ok(())
    }

    /// Whether another packet would be refused.
    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.capacity
    }

    /// Packets queued, including the one being transferred.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no packet is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Samples `tready`, advances the current packet and stages the next beat.
    pub fn step<M: HardwareModel + ?Sized>(&mut self, model: &M) {
        if self.tvalid && model.get_bit(&self.port.tready) {
            self.offset += self.width;
            if self.tlast {
                if let Some(done) = self.queue.pop_front() {
                    trace!(len = done.len(), "stream packet delivered");
                }
                self.offset = 0;
            }
        }

        self.tdata.fill(0);
        self.tkeep = 0;
        self.tlast = false;
        self.tvalid = false;

        let Some(packet) = self.queue.front() else {
            return;
        };
        let end = (self.offset + self.width).min(packet.len());
        let chunk = &packet[self.offset.min(end)..end];
        self.tdata[..chunk.len()].copy_from_slice(chunk);
        self.tkeep = if chunk.len() >= 64 { u64::MAX } else { (1u64 << chunk.len()) - 1 };
        self.tlast = end == packet.len();
        self.tvalid = true;
    }

    /// Drives the staged beat into the model.
    pub fn step_apply<M: HardwareModel + ?Sized>(&self, model: &mut M) {
        let p = &self.port;
        model.set_bit(&p.tvalid, self.tvalid);
        model.write_signal(&p.tdata, &self.tdata);
        model.set(&p.tkeep, self.tkeep);
        model.set_bit(&p.tlast, self.tlast);
    }
}

/// Assembles frames from a device stream output; always ready.
#[derive(Debug)]
pub struct AxiStreamSubordinate {
    port: AxiStreamPort,
    ready: bool,
    max_frame: usize,
    frame: Vec<u8>,
    beat: Vec<u8>,
}

impl AxiStreamSubordinate {
    /// Creates a subordinate for the port named by `prefix`.
    pub fn new(prefix: &str, width: usize, max_frame: usize) -> Self {
        Self {
            port: AxiStreamPort::new(prefix),
            ready: false,
            max_frame,
            frame: Vec::with_capacity(max_frame),
            beat: vec![0; width],
        }
    }

    /// Samples one beat.
    ///
    /// # Returns
    ///
    /// The frame completed by a `tlast` beat.
    pub fn step<M: HardwareModel + ?Sized>(&mut self, model: &M) -> Result<Option<Vec<u8>>> {
        let p = &self.port;
        let accepted = self.ready && model.get_bit(&p.tvalid);
        self.ready = true;
        if !accepted {
            return Ok(None);
        }

        model.read_signal(&p.tdata, &mut self.beat);
        let tkeep = model.get(&p.tkeep);
        for (i, byte) in self.beat.iter().enumerate().take(64) {
            if (tkeep >> i) & 1 != 0 {
                self.frame.push(*byte);
            }
        }
        if self.frame.len() > self.max_frame {
            return Err(BridgeError::FrameTooLarge {
                len: self.frame.len(),
                max: self.max_frame,
            });
        }

        if model.get_bit(&p.tlast) {
            let frame = std::mem::replace(&mut self.frame, Vec::with_capacity(self.max_frame));
            trace!(len = frame.len(), "stream frame assembled");
            return Ok(Some(frame));
        }
        Ok(None)
    }

    /// Drives `tready`.
    pub fn step_apply<M: HardwareModel + ?Sized>(&self, model: &mut M) {
        model.set_bit(&self.port.tready, self.ready);
    }
}

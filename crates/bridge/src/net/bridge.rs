//! Packet bridge implementation.

use tracing::{trace, warn};

use crate::axi::{AxiStreamManager, AxiStreamSubordinate};
use crate::bus::HardwareModel;
use crate::common::constants::MAX_PACKET_LEN;
use crate::common::error::{BridgeError, Result};
use crate::config::NetworkConfig;
use crate::transport::{MessageSink, NetMsg};

/// Drops between two repeated "receive queue full" warnings.
const DROP_WARN_INTERVAL: u64 = 1024;

/// Connects the network channel to the device stream ports.
#[derive(Debug)]
pub struct PacketBridge {
    rx: AxiStreamManager,
    tx: AxiStreamSubordinate,
    received: u64,
    dropped: u64,
    sent: u64,
}

impl PacketBridge {
    /// Creates the bridge for the configured stream ports.
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            rx: AxiStreamManager::new(&config.rx_prefix, config.stream_width, config.rx_queue_packets),
            tx: AxiStreamSubordinate::new(&config.tx_prefix, config.stream_width, config.max_frame),
            received: 0,
            dropped: 0,
            sent: 0,
        }
    }

    /// Queues an inbound packet for the device.
    ///
    /// # Returns
    ///
    /// `false` if the receive queue was full and the packet was dropped.
    pub fn deliver(&mut self, packet: Vec<u8>) -> bool {
        let len = packet.len();
        if self.rx.try_push(packet).is_err() {
            self.dropped += 1;
            if self.dropped == 1 || self.dropped % DROP_WARN_INTERVAL == 0 {
                warn!(len, dropped = self.dropped, "receive queue full, dropping packet");
            }
            return false;
        }
        self.received += 1;
        trace!(len, queued = self.rx.len(), "packet queued for device");
        true
    }

    /// Advances both stream ports by one cycle and sends a finished frame.
    pub fn step<M: HardwareModel + ?Sized>(
        &mut self,
        model: &M,
        out: &mut dyn MessageSink<NetMsg>,
    ) -> Result<()> {
        self.rx.step(model);
        if let Some(frame) = self.tx.step(model)? {
            if frame.len() > MAX_PACKET_LEN {
                return Err(BridgeError::FrameTooLarge {
                    len: frame.len(),
                    max: MAX_PACKET_LEN,
                });
            }
            let max = out.max_out_payload();
            if frame.len() > max {
                return Err(BridgeError::PayloadTooLarge {
                    what: "network frame",
                    len: frame.len(),
                    max,
                });
            }
            trace!(len = frame.len(), "device transmitted frame");
            out.send(NetMsg::Packet(frame))?;
            self.sent += 1;
        }
        Ok(())
    }

    /// Drives the staged stream inputs.
    pub fn step_apply<M: HardwareModel + ?Sized>(&self, model: &mut M) {
        self.rx.step_apply(model);
        self.tx.step_apply(model);
    }

    /// Packets waiting for the device.
    pub fn rx_queued(&self) -> usize {
        self.rx.len()
    }

    /// Packets accepted into the receive queue.
    pub const fn received(&self) -> u64 {
        self.received
    }

    /// Packets dropped on a full receive queue.
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Frames sent to the network.
    pub const fn sent(&self) -> u64 {
        self.sent
    }
}

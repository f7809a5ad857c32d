//! Device adapter hooks.
//!
//! The simulator does not decide on its own how a device-initiated burst becomes host
//! traffic or how a finished register access is answered; it calls a [`DeviceAdapter`].
//! It provides:
//! 1. **DMA hooks:** Turning accepted AXI bursts into DMA engine operations.
//! 2. **Register hooks:** Turning finished AXI-Lite accesses into completion messages.
//!
//! [`PcieAdapter`] is the standard adapter for AXI devices behind a PCIe link.

use std::fmt::Write as _;

use tracing::{enabled, trace, Level};

use crate::axi::{BurstRead, BurstWrite, RegisterCompletion};
use crate::common::data::Direction;
use crate::common::error::Result;
use crate::config::DeviceConfig;
use crate::dma::DmaEngine;
use crate::transport::{D2hMsg, MessageSink};

/// Strategy hooks called by the simulator for device-specific behavior.
pub trait DeviceAdapter {
    /// Device name for logs.
    fn name(&self) -> &str;

    /// Starts the host read for an accepted read burst.
    ///
    /// The DMA operation must carry `burst.tag` as its opaque value so the data can be
    /// routed back to the burst.
    fn issue_dma_read(
        &mut self,
        dma: &mut DmaEngine,
        burst: &BurstRead,
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<()>;

    /// Starts the host write for a write burst whose data phase finished.
    fn issue_dma_write(
        &mut self,
        dma: &mut DmaEngine,
        burst: BurstWrite,
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<()>;

    /// Answers a finished register read.
    ///
    /// # Arguments
    ///
    /// * `done` - The finished access and the bus data.
    /// * `len` - Access length requested by the host.
    /// * `out` - Outbound PCIe messages.
    fn register_read_complete(
        &mut self,
        done: &RegisterCompletion,
        len: usize,
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<()>;

    /// Answers a finished register write. Posted writes are not answered.
    fn register_write_complete(
        &mut self,
        done: &RegisterCompletion,
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<()>;
}

/// Standard adapter: bursts map one-to-one onto DMA operations.
#[derive(Clone, Debug)]
pub struct PcieAdapter {
    name: String,
    dump_payloads: bool,
}

impl PcieAdapter {
    /// Creates an adapter.
    pub fn new(name: impl Into<String>, dump_payloads: bool) -> Self {
        Self {
            name: name.into(),
            dump_payloads,
        }
    }

    /// Creates an adapter from the device configuration.
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self::new(config.name.clone(), config.dump_payloads)
    }

    fn dump(&self, what: &str, addr: u64, data: &[u8]) {
        if self.dump_payloads && enabled!(Level::TRACE) {
            trace!(device = %self.name, addr, len = data.len(), "{what}\n{}", hex_dump(addr, data));
        }
    }
}

impl DeviceAdapter for PcieAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn issue_dma_read(
        &mut self,
        dma: &mut DmaEngine,
        burst: &BurstRead,
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<()> {
        trace!(device = %self.name, tag = burst.tag, id = burst.id, addr = burst.addr, len = burst.len, "DMA read");
        let _ = dma.issue_read(burst.addr, burst.len, burst.tag, out)?;
        Ok(())
    }

    fn issue_dma_write(
        &mut self,
        dma: &mut DmaEngine,
        burst: BurstWrite,
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<()> {
        trace!(device = %self.name, tag = burst.tag, id = burst.id, addr = burst.addr, len = burst.data.len(), "DMA write");
        self.dump("DMA write payload", burst.addr, &burst.data);
        let _ = dma.issue_write(burst.addr, burst.data, burst.tag, out)?;
        Ok(())
    }

    fn register_read_complete(
        &mut self,
        done: &RegisterCompletion,
        len: usize,
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<()> {
        let mut data = done.data.to_le_bytes().to_vec();
        data.resize(len, 0);
        trace!(device = %self.name, req_id = done.op.req_id, offset = done.op.offset, value = done.data, "register read complete");
        out.send(D2hMsg::ReadComp {
            req_id: done.op.req_id,
            data,
        })
    }

    fn register_write_complete(
        &mut self,
        done: &RegisterCompletion,
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<()> {
        debug_assert_eq!(done.op.direction, Direction::Write);
        if done.op.posted {
            return Ok(());
        }
        trace!(device = %self.name, req_id = done.op.req_id, offset = done.op.offset, "register write complete");
        out.send(D2hMsg::WriteComp {
            req_id: done.op.req_id,
        })
    }
}

/// Formats `data` as 16-byte hex lines prefixed with their address.
pub fn hex_dump(addr: u64, data: &[u8]) -> String {
    let mut text = String::with_capacity(data.len() * 3 + data.len() / 16 * 20);
    for (i, line) in data.chunks(16).enumerate() {
        let _ = write!(text, "{:016x}:", addr + (i * 16) as u64);
        for byte in line {
            let _ = write!(text, " {byte:02x}");
        }
        text.push('\n');
    }
    text
}

//! Inbound message dispatch.
//!
//! Routes each message drained from a channel:
//! 1. **Register accesses:** Bar 0 to the AXI-Lite engine, bar 1 to the control
//!    registers; any other bar is fatal.
//! 2. **DMA completions:** To the DMA engine, whose finished operations go back to the
//!    burst engines.
//! 3. **Packets:** To the packet bridge receive queue.
//! 4. **Control:** Device control and sync are ignored; terminate ends the run.

use tracing::{debug, info, trace, warn};

use super::simulator::Simulator;
use crate::bus::HardwareModel;
use crate::common::constants::{BAR_CONTROL, BAR_REGISTERS};
use crate::common::data::RegisterOp;
use crate::common::error::{BridgeError, Result};
use crate::config::RegisterPolicy;
use crate::transport::{D2hMsg, H2dMsg, MessageSink, NetMsg, Outbound};

impl<M: HardwareModel> Simulator<M> {
    /// Handles one message from the PCIe channel.
    pub(super) fn dispatch_pcie(&mut self, msg: H2dMsg) -> Result<()> {
        trace!(ts = self.now, kind = msg.kind(), "pcie message");
        match msg {
            H2dMsg::Read {
                req_id,
                bar,
                offset,
                len,
            } => self.register_read(req_id, bar, offset, len),
            H2dMsg::Write {
                req_id,
                bar,
                offset,
                data,
                posted,
            } => self.register_write(req_id, bar, offset, &data, posted),
            H2dMsg::ReadComp { req_id, data } => {
                let mut out = Outbound::new(&mut *self.pcie, self.retry, self.now);
                self.dma.handle_read_completion(req_id, &data, &mut out)?;
                self.stats.alloc_stalls += out.stalls();
                self.route_dma_completions()
            }
            H2dMsg::WriteComp { req_id } => {
                let mut out = Outbound::new(&mut *self.pcie, self.retry, self.now);
                self.dma.handle_write_completion(req_id, &mut out)?;
                self.stats.alloc_stalls += out.stalls();
                self.route_dma_completions()
            }
            H2dMsg::DevCtrl { flags } => {
                debug!(flags, "device control ignored");
                Ok(())
            }
            H2dMsg::Sync => Ok(()),
            H2dMsg::Terminate => {
                info!(ts = self.now, "host requested termination");
                self.exiting = true;
                Ok(())
            }
        }
    }

    /// Handles one message from the network channel.
    pub(super) fn dispatch_net(&mut self, msg: NetMsg) {
        match msg {
            NetMsg::Packet(data) => {
                if let Some(packets) = self.packets.as_mut() {
                    let _ = packets.deliver(data);
                }
            }
            NetMsg::Sync => {}
            NetMsg::Terminate => {
                info!(ts = self.now, "network peer requested termination");
                self.exiting = true;
            }
        }
    }

    fn register_read(&mut self, req_id: u64, bar: u8, offset: u64, len: usize) -> Result<()> {
        self.stats.mmio_reads += 1;
        match bar {
            BAR_REGISTERS => {
                self.check_width(offset, len)?;
                let op = RegisterOp::read(req_id, offset);
                let op = if self.register_in_window(offset)? { op } else { op.unmapped() };
                self.lite.issue(op);
                Ok(())
            }
            BAR_CONTROL if self.control.is_some() => {
                let data = match &self.control {
                    Some(control) => control.read(offset, len)?,
                    None => return Err(BridgeError::UnexpectedBar(bar)),
                };
                self.send(D2hMsg::ReadComp { req_id, data })
            }
            _ => Err(BridgeError::UnexpectedBar(bar)),
        }
    }

    fn register_write(&mut self, req_id: u64, bar: u8, offset: u64, data: &[u8], posted: bool) -> Result<()> {
        self.stats.mmio_writes += 1;
        if posted {
            self.stats.mmio_posted_writes += 1;
        }
        match bar {
            BAR_REGISTERS => {
                self.check_width(offset, data.len())?;
                let mut value = [0u8; 8];
                value[..data.len()].copy_from_slice(data);
                let op = RegisterOp::write(req_id, offset, u64::from_le_bytes(value), posted);
                let op = if self.register_in_window(offset)? { op } else { op.unmapped() };
                self.lite.issue(op);
                Ok(())
            }
            BAR_CONTROL if self.control.is_some() => {
                let action = match self.control.as_mut() {
                    Some(control) => control.write(offset, data)?,
                    None => return Err(BridgeError::UnexpectedBar(bar)),
                };
                if let Some(action) = action {
                    self.apply_trace(action);
                }
                self.complete_write(req_id, posted)
            }
            _ => Err(BridgeError::UnexpectedBar(bar)),
        }
    }

    fn complete_write(&mut self, req_id: u64, posted: bool) -> Result<()> {
        if posted {
            return Ok(());
        }
        self.send(D2hMsg::WriteComp { req_id })
    }

    fn check_width(&self, offset: u64, len: usize) -> Result<()> {
        let width = self.lite.width();
        if len != width {
            return Err(BridgeError::UnsupportedWidth { len, offset, width });
        }
        Ok(())
    }

    /// Applies the register policy to an access at `offset`.
    ///
    /// # Returns
    ///
    /// `false` if the access falls outside the window and must be answered without
    /// touching the bus. It still queues behind earlier accesses.
    fn register_in_window(&self, offset: u64) -> Result<bool> {
        let end = offset.saturating_add(self.lite.width() as u64);
        if end <= self.bar0_len {
            return Ok(true);
        }
        match self.policy {
            RegisterPolicy::Strict => Err(BridgeError::RegisterOutOfRange {
                offset,
                window: self.bar0_len,
            }),
            RegisterPolicy::Lenient => {
                warn!(offset, window = self.bar0_len, "register access outside window ignored");
                Ok(false)
            }
        }
    }

    fn send(&mut self, msg: D2hMsg) -> Result<()> {
        let mut out = Outbound::new(&mut *self.pcie, self.retry, self.now);
        out.send(msg)?;
        self.stats.alloc_stalls += out.stalls();
        Ok(())
    }
}

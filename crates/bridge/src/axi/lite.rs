//! AXI-Lite register access engine.
//!
//! Host register accesses are queued FIFO and replayed one at a time as single-beat
//! AXI-Lite transactions:
//! 1. **Read:** `arvalid` until `arready`, then `rready` until `rvalid`.
//! 2. **Write:** `awvalid` and `wvalid` each held until their own `ready`, then
//!    `bready` until `bvalid`.
//!
//! A finished access is returned from `step` as a [`RegisterCompletion`]; whether a
//! completion message is sent is up to the device adapter (posted writes have none).
//! Accesses marked `unmapped` keep their place in the queue but skip the handshake:
//! they complete with zero data once they reach the head.

use std::collections::VecDeque;

use tracing::{trace, warn};

use crate::bus::{AxiLitePort, HardwareModel};
use crate::common::constants::AXI_RESP_OKAY;
use crate::common::data::{Direction, RegisterOp};

/// A register access whose bus handshake finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterCompletion {
    /// The original access.
    pub op: RegisterOp,
    /// Data returned by the bus (reads only, zero for writes).
    pub data: u64,
    /// Response code from `rresp`/`bresp`.
    pub resp: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LiteState {
    Idle,
    ReadAddr,
    ReadData,
    WriteReq { addr_done: bool, data_done: bool },
    WriteResp,
}

#[derive(Clone, Copy, Debug, Default)]
struct Staged {
    araddr: u64,
    arvalid: bool,
    rready: bool,
    awaddr: u64,
    awvalid: bool,
    wdata: u64,
    wvalid: bool,
    bready: bool,
}

/// AXI-Lite manager driving the device's register port.
#[derive(Debug)]
pub struct AxiLiteManager {
    port: AxiLitePort,
    width: usize,
    queue: VecDeque<RegisterOp>,
    current: Option<RegisterOp>,
    state: LiteState,
    staged: Staged,
}

impl AxiLiteManager {
    /// Creates an engine for the port named by `prefix` with `width`-byte registers.
    pub fn new(prefix: &str, width: usize) -> Self {
        Self {
            port: AxiLitePort::new(prefix),
            width: width.clamp(1, 8),
            queue: VecDeque::new(),
            current: None,
            state: LiteState::Idle,
            staged: Staged::default(),
        }
    }

    /// Queues a register read.
    pub fn issue_read(&mut self, req_id: u64, offset: u64) {
        self.queue.push_back(RegisterOp::read(req_id, offset));
    }

    /// Queues a register write.
    pub fn issue_write(&mut self, req_id: u64, offset: u64, value: u64, posted: bool) {
        self.queue.push_back(RegisterOp::write(req_id, offset, value, posted));
    }

    /// Queues a prepared access.
    pub fn issue(&mut self, op: RegisterOp) {
        self.queue.push_back(op);
    }

    /// Accesses queued behind the one in flight.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Whether no access is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }

    /// Register width in bytes.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Samples the port, advances the handshake and stages the next inputs.
    pub fn step<M: HardwareModel + ?Sized>(&mut self, model: &M) -> Option<RegisterCompletion> {
        let mut done = None;
        let p = &self.port;

        match self.state {
            LiteState::Idle => {}
            LiteState::ReadAddr => {
                if model.get_bit(&p.arready) {
                    self.state = LiteState::ReadData;
                }
            }
            LiteState::ReadData => {
                if model.get_bit(&p.rvalid) {
                    let mut buf = [0u8; 8];
                    model.read_signal(&p.rdata, &mut buf[..self.width]);
                    let resp = model.get(&p.rresp) as u8;
                    done = self.finish(u64::from_le_bytes(buf), resp);
                }
            }
            LiteState::WriteReq {
                mut addr_done,
                mut data_done,
            } => {
                addr_done |= model.get_bit(&p.awready);
                data_done |= model.get_bit(&p.wready);
                self.state = if addr_done && data_done {
                    LiteState::WriteResp
                } else {
                    LiteState::WriteReq { addr_done, data_done }
                };
            }
            LiteState::WriteResp => {
                if model.get_bit(&p.bvalid) {
                    let resp = model.get(&p.bresp) as u8;
                    done = self.finish(0, resp);
                }
            }
        }

        if self.state == LiteState::Idle {
            let unmapped_head = self.queue.front().is_some_and(|op| op.unmapped);
            if unmapped_head {
                if done.is_none() {
                    done = self.queue.pop_front().map(|op| {
                        trace!(req_id = op.req_id, offset = op.offset, "unmapped register access answered");
                        RegisterCompletion {
                            op,
                            data: 0,
                            resp: AXI_RESP_OKAY,
                        }
                    });
                }
            } else if let Some(op) = self.queue.pop_front() {
                trace!(req_id = op.req_id, offset = op.offset, dir = op.direction.as_str(), "register access started");
                self.state = match op.direction {
                    Direction::Read => LiteState::ReadAddr,
                    Direction::Write => LiteState::WriteReq {
                        addr_done: false,
                        data_done: false,
                    },
                };
                self.current = Some(op);
            }
        }

        self.stage();
        done
    }

    fn finish(&mut self, data: u64, resp: u8) -> Option<RegisterCompletion> {
        self.state = LiteState::Idle;
        let op = self.current.take()?;
        if resp != AXI_RESP_OKAY {
            warn!(req_id = op.req_id, offset = op.offset, resp, "register access answered with error response");
        }
        trace!(req_id = op.req_id, offset = op.offset, data, "register access done");
        Some(RegisterCompletion { op, data, resp })
    }

    fn stage(&mut self) {
        let (offset, value) = self.current.as_ref().map_or((0, 0), |op| (op.offset, op.value));
        let mut s = Staged::default();
        match self.state {
            LiteState::Idle => {}
            LiteState::ReadAddr => {
                s.araddr = offset;
                s.arvalid = true;
            }
            LiteState::ReadData => s.rready = true,
            LiteState::WriteReq { addr_done, data_done } => {
                s.awaddr = offset;
                s.awvalid = !addr_done;
                s.wdata = value;
                s.wvalid = !data_done;
            }
            LiteState::WriteResp => s.bready = true,
        }
        self.staged = s;
    }

    /// Drives the staged inputs into the model.
    pub fn step_apply<M: HardwareModel + ?Sized>(&self, model: &mut M) {
        let p = &self.port;
        let s = &self.staged;
        let strb = if self.width >= 8 { 0xff } else { (1u64 << self.width) - 1 };

        model.set(&p.araddr, s.araddr);
        model.set_bit(&p.arvalid, s.arvalid);
        model.set_bit(&p.rready, s.rready);
        model.set(&p.awaddr, s.awaddr);
        model.set_bit(&p.awvalid, s.awvalid);
        model.write_signal(&p.wdata, &s.wdata.to_le_bytes()[..self.width]);
        model.set(&p.wstrb, if s.wvalid { strb } else { 0 });
        model.set_bit(&p.wvalid, s.wvalid);
        model.set_bit(&p.bready, s.bready);
    }
}

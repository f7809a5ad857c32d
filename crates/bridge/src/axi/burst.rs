//! AXI burst subordinates.
//!
//! The device's AXI manager port reaches host memory through these two engines. Each
//! accepted burst gets an internal tag; the simulator hands the burst to the DMA engine
//! with that tag as the opaque value and reports the DMA completion back by tag.
//!
//! Only INCR bursts are supported. A burst moves `(len + 1) << size` bytes; narrow
//! beats sit at their address lane within the data bus.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::bus::{AxiReadPort, AxiWritePort, HardwareModel};
use crate::common::constants::{AXI_BURST_FIXED, AXI_BURST_INCR, AXI_BURST_WRAP, AXI_RESP_OKAY};
use crate::common::data::Direction;
use crate::common::error::{BridgeError, Result};

/// A device read burst accepted on the AR channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurstRead {
    /// Internal tag; report the data back with [`AxiSubordinateRead::read_done`].
    pub tag: u64,
    /// AXI transaction id.
    pub id: u64,
    /// Start address.
    pub addr: u64,
    /// Bytes to read.
    pub len: usize,
}

/// A device write burst whose data phase finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurstWrite {
    /// Internal tag; acknowledge with [`AxiSubordinateWrite::write_done`].
    pub tag: u64,
    /// AXI transaction id.
    pub id: u64,
    /// Start address.
    pub addr: u64,
    /// Bytes written by the device, strobed bytes cleared to zero.
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug)]
struct Shape {
    beat: usize,
    beats: usize,
}

impl Shape {
    fn decode(burst: u8, size: u64, len: u64, width: usize, direction: Direction) -> Result<Self> {
        if burst != AXI_BURST_INCR {
            let kind = match burst {
                AXI_BURST_FIXED => "FIXED",
                AXI_BURST_WRAP => "WRAP",
                _ => "reserved",
            };
            warn!(kind, dir = direction.as_str(), "only INCR bursts are supported");
            return Err(BridgeError::UnsupportedBurst { burst, direction });
        }
        let beat = 1usize << size.min(12);
        if beat > width {
            return Err(BridgeError::BeatTooWide { beat, width });
        }
        Ok(Self {
            beat,
            beats: len as usize + 1,
        })
    }

    const fn bytes(self) -> usize {
        self.beat * self.beats
    }

    /// Byte lane of beat `index` of a burst starting at `addr`.
    const fn lane(self, addr: u64, index: usize, width: usize) -> usize {
        ((addr as usize + index * self.beat) % width) & !(self.beat - 1)
    }
}

#[derive(Debug)]
struct ReadBurst {
    tag: u64,
    id: u64,
    addr: u64,
    shape: Shape,
    data: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
struct ReadStaged {
    arready: bool,
    rvalid: bool,
    rid: u64,
    rdata: Vec<u8>,
    rlast: bool,
}

/// Read-side subordinate: AR requests in, R beats out.
#[derive(Debug)]
pub struct AxiSubordinateRead {
    port: AxiReadPort,
    width: usize,
    max_pending: usize,
    next_tag: u64,
    outstanding: VecDeque<ReadBurst>,
    active: Option<(u64, usize)>,
    staged: ReadStaged,
}

impl AxiSubordinateRead {
    /// Creates the engine for the port named by `prefix`.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Wire prefix of the device's AXI manager port.
    /// * `width` - Data bus width in bytes.
    /// * `max_pending` - Bursts accepted before `arready` is withdrawn.
    pub fn new(prefix: &str, width: usize, max_pending: usize) -> Self {
        Self {
            port: AxiReadPort::new(prefix),
            width,
            max_pending: max_pending.max(1),
            next_tag: 0,
            outstanding: VecDeque::new(),
            active: None,
            staged: ReadStaged {
                rdata: vec![0; width],
                ..ReadStaged::default()
            },
        }
    }

    /// Bursts accepted and not yet fully returned.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Samples the port and stages the next inputs.
    ///
    /// # Returns
    ///
    /// A newly accepted burst, which must be turned into a host read.
    pub fn step<M: HardwareModel + ?Sized>(&mut self, model: &M) -> Result<Option<BurstRead>> {
        let p = &self.port;
        let mut accepted = None;

        if self.staged.arready && model.get_bit(&p.arvalid) {
            let shape = Shape::decode(
                model.get(&p.arburst) as u8,
                model.get(&p.arsize),
                model.get(&p.arlen),
                self.width,
                Direction::Read,
            )?;
            let burst = ReadBurst {
                tag: self.next_tag,
                id: model.get(&p.arid),
                addr: model.get(&p.araddr),
                shape,
                data: None,
            };
            self.next_tag += 1;
            debug!(tag = burst.tag, id = burst.id, addr = burst.addr, len = shape.bytes(), "AXI read burst accepted");
            accepted = Some(BurstRead {
                tag: burst.tag,
                id: burst.id,
                addr: burst.addr,
                len: shape.bytes(),
            });
            self.outstanding.push_back(burst);
        }

        if self.staged.rvalid && model.get_bit(&p.rready) {
            if let Some((tag, index)) = self.active.take() {
                let beats = self.find(tag).map_or(0, |b| b.shape.beats);
                if index + 1 < beats {
                    self.active = Some((tag, index + 1));
                } else {
                    self.outstanding.retain(|b| b.tag != tag);
                    trace!(tag, "AXI read burst returned");
                }
            }
        }

        if self.active.is_none() {
            self.active = self.next_ready().map(|tag| (tag, 0));
        }

        self.stage();
        Ok(accepted)
    }

    /// Supplies the host data for burst `tag`.
    pub fn read_done(&mut self, tag: u64, data: Vec<u8>) -> Result<()> {
        let burst = self
            .outstanding
            .iter_mut()
            .find(|b| b.tag == tag && b.data.is_none())
            .ok_or(BridgeError::UnexpectedBusResponse("read completion"))?;
        let mut data = data;
        data.resize(burst.shape.bytes(), 0);
        burst.data = Some(data);
        Ok(())
    }

    fn find(&self, tag: u64) -> Option<&ReadBurst> {
        self.outstanding.iter().find(|b| b.tag == tag)
    }

    /// Oldest burst with data whose id has no older burst still waiting.
    fn next_ready(&self) -> Option<u64> {
        let mut blocked = Vec::new();
        for burst in &self.outstanding {
            if burst.data.is_some() && !blocked.contains(&burst.id) {
                return Some(burst.tag);
            }
            blocked.push(burst.id);
        }
        None
    }

    fn stage(&mut self) {
        self.staged.arready = self.outstanding.len() < self.max_pending;
        self.staged.rdata.fill(0);
        self.staged.rvalid = false;
        self.staged.rlast = false;
        self.staged.rid = 0;

        let Some((tag, index)) = self.active else {
            return;
        };
        let width = self.width;
        let Some(burst) = self.outstanding.iter().find(|b| b.tag == tag) else {
            return;
        };
        let Some(data) = &burst.data else {
            return;
        };
        let shape = burst.shape;
        let lane = shape.lane(burst.addr, index, width);
        let src = &data[index * shape.beat..(index + 1) * shape.beat];
        self.staged.rdata[lane..lane + shape.beat].copy_from_slice(src);
        self.staged.rvalid = true;
        self.staged.rid = burst.id;
        self.staged.rlast = index + 1 == shape.beats;
    }

    /// Drives the staged inputs into the model.
    pub fn step_apply<M: HardwareModel + ?Sized>(&self, model: &mut M) {
        let p = &self.port;
        let s = &self.staged;
        model.set_bit(&p.arready, s.arready);
        model.set_bit(&p.rvalid, s.rvalid);
        model.set(&p.rid, s.rid);
        model.write_signal(&p.rdata, &s.rdata);
        model.set_bit(&p.rlast, s.rlast);
        model.set(&p.rresp, u64::from(AXI_RESP_OKAY));
    }
}

#[derive(Debug)]
struct WriteBurst {
    tag: u64,
    id: u64,
    addr: u64,
    shape: Shape,
    received: usize,
    data: Vec<u8>,
    issued: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct WriteStaged {
    awready: bool,
    wready: bool,
    bvalid: bool,
    bid: u64,
}

/// Write-side subordinate: AW requests and W beats in, B responses out.
///
/// W beats are matched to bursts in AW order. The B response for a burst is held back
/// until its host write has been acknowledged.
#[derive(Debug)]
pub struct AxiSubordinateWrite {
    port: AxiWritePort,
    width: usize,
    max_pending: usize,
    next_tag: u64,
    bursts: VecDeque<WriteBurst>,
    responses: VecDeque<(u64, u64)>,
    staged: WriteStaged,
}

impl AxiSubordinateWrite {
    /// Creates the engine for the port named by `prefix`.
    pub fn new(prefix: &str, width: usize, max_pending: usize) -> Self {
        Self {
            port: AxiWritePort::new(prefix),
            width,
            max_pending: max_pending.max(1),
            next_tag: 0,
            bursts: VecDeque::new(),
            responses: VecDeque::new(),
            staged: WriteStaged::default(),
        }
    }

    /// Bursts accepted and not yet acknowledged on the B channel.
    pub fn outstanding(&self) -> usize {
        self.bursts.len()
    }

    /// Samples the port and stages the next inputs.
    ///
    /// # Returns
    ///
    /// A burst whose data phase finished, which must be turned into a host write.
    pub fn step<M: HardwareModel + ?Sized>(&mut self, model: &M) -> Result<Option<BurstWrite>> {
        let mut finished = None;

        if self.staged.wready && model.get_bit(&self.port.wvalid) {
            finished = self.take_beat(model);
        }

        let p = &self.port;
        if self.staged.awready && model.get_bit(&p.awvalid) {
            let shape = Shape::decode(
                model.get(&p.awburst) as u8,
                model.get(&p.awsize),
                model.get(&p.awlen),
                self.width,
                Direction::Write,
            )?;
            let burst = WriteBurst {
                tag: self.next_tag,
                id: model.get(&p.awid),
                addr: model.get(&p.awaddr),
                shape,
                received: 0,
                data: vec![0; shape.bytes()],
                issued: false,
            };
            self.next_tag += 1;
            debug!(tag = burst.tag, id = burst.id, addr = burst.addr, len = shape.bytes(), "AXI write burst accepted");
            self.bursts.push_back(burst);
        }

        if self.staged.bvalid && model.get_bit(&p.bready) {
            if let Some((tag, _)) = self.responses.pop_front() {
                self.bursts.retain(|b| b.tag != tag);
                trace!(tag, "AXI write burst acknowledged");
            }
        }

        self.stage();
        Ok(finished)
    }

    fn take_beat<M: HardwareModel + ?Sized>(&mut self, model: &M) -> Option<BurstWrite> {
        let width = self.width;
        let p = &self.port;
        let burst = self.bursts.iter_mut().find(|b| b.received < b.shape.beats)?;

        let mut wdata = vec![0u8; width];
        model.read_signal(&p.wdata, &mut wdata);
        let wstrb = model.get(&p.wstrb);
        let shape = burst.shape;
        let lane = shape.lane(burst.addr, burst.received, width);
        let base = burst.received * shape.beat;
        for j in 0..shape.beat {
            if (wstrb >> (lane + j)) & 1 != 0 {
                burst.data[base + j] = wdata[lane + j];
            }
        }
        burst.received += 1;

        let last = model.get_bit(&p.wlast) || burst.received == shape.beats;
        if !last {
            return None;
        }
        burst.data.truncate(burst.received * shape.beat);
        burst.received = shape.beats;
        burst.issued = true;
        Some(BurstWrite {
            tag: burst.tag,
            id: burst.id,
            addr: burst.addr,
            data: std::mem::take(&mut burst.data),
        })
    }

    /// Marks burst `tag` as written to host memory; its B response follows.
    pub fn write_done(&mut self, tag: u64) -> Result<()> {
        let burst = self
            .bursts
            .iter()
            .find(|b| b.tag == tag && b.issued)
            .ok_or(BridgeError::UnexpectedBusResponse("write completion"))?;
        self.responses.push_back((burst.tag, burst.id));
        Ok(())
    }

    fn stage(&mut self) {
        self.staged.awready = self.bursts.len() < self.max_pending;
        self.staged.wready = self.bursts.iter().any(|b| b.received < b.shape.beats);
        match self.responses.front() {
            Some(&(_, id)) => {
                self.staged.bvalid = true;
                self.staged.bid = id;
            }
            None => {
                self.staged.bvalid = false;
                self.staged.bid = 0;
            }
        }
    }

    /// Drives the staged inputs into the model.
    pub fn step_apply<M: HardwareModel + ?Sized>(&self, model: &mut M) {
        let p = &self.port;
        let s = &self.staged;
        model.set_bit(&p.awready, s.awready);
        model.set_bit(&p.wready, s.wready);
        model.set_bit(&p.bvalid, s.bvalid);
        model.set(&p.bid, s.bid);
        model.set(&p.bresp, u64::from(AXI_RESP_OKAY));
    }
}

use std::collections::{HashMap, VecDeque};

use rtlbridge_core::bus::{AxiReadPort, AxiWritePort, HardwareModel, SignalStore};
use rtlbridge_core::common::constants::AXI_BURST_INCR;

#[derive(Clone, Debug)]
struct ReadCmd {
    id: u64,
    addr: u64,
    beats: usize,
}

#[derive(Clone, Debug)]
struct WriteCmd {
    id: u64,
    addr: u64,
    data: Vec<u8>,
}

#[derive(Debug)]
struct WriteProgress {
    cmd: WriteCmd,
    beat: usize,
    addr_done: bool,
}

/// AXI manager that plays back queued full-width INCR bursts.
///
/// Read data is collected per transaction id; `read_results` lists every finished
/// read burst in the order its last beat arrived, `write_acks` the ids of every B
/// response.
#[derive(Debug)]
pub struct DmaMaster {
    rd: AxiReadPort,
    wr: AxiWritePort,
    width: usize,
    reads: VecDeque<ReadCmd>,
    writes: VecDeque<WriteCmd>,
    active_write: Option<WriteProgress>,
    partial: HashMap<u64, Vec<u8>>,
    pub read_results: Vec<(u64, Vec<u8>)>,
    pub write_acks: Vec<u64>,
}

impl DmaMaster {
    pub fn new(prefix: &str, width: usize) -> Self {
        Self {
            rd: AxiReadPort::new(prefix),
            wr: AxiWritePort::new(prefix),
            width,
            reads: VecDeque::new(),
            writes: VecDeque::new(),
            active_write: None,
            partial: HashMap::new(),
            read_results: Vec::new(),
            write_acks: Vec::new(),
        }
    }

    pub fn declare(&self, store: &mut SignalStore) {
        store.declare(&self.rd.rdata, self.width);
        store.declare(&self.wr.wdata, self.width);
    }

    /// Queues a read of `len` bytes; `len` must be a multiple of the bus width.
    pub fn push_read(&mut self, id: u64, addr: u64, len: usize) {
        assert_eq!(len % self.width, 0, "test bursts are full-width");
        self.reads.push_back(ReadCmd {
            id,
            addr,
            beats: len / self.width,
        });
    }

    /// Queues a write of `data`; its length must be a multiple of the bus width.
    pub fn push_write(&mut self, id: u64, addr: u64, data: Vec<u8>) {
        assert_eq!(data.len() % self.width, 0, "test bursts are full-width");
        self.writes.push_back(WriteCmd { id, addr, data });
    }

    /// Whether every queued burst has been answered.
    pub fn is_idle(&self) -> bool {
        self.reads.is_empty() && self.writes.is_empty() && self.active_write.is_none() && self.partial.is_empty()
    }

    fn size(&self) -> u64 {
        u64::from(self.width.trailing_zeros())
    }

    pub fn reset(&mut self, store: &mut SignalStore) {
        store.set_bit(&self.rd.arvalid, false);
        store.set_bit(&self.rd.rready, true);
        store.set_bit(&self.wr.awvalid, false);
        store.set_bit(&self.wr.wvalid, false);
        store.set_bit(&self.wr.wlast, false);
        store.set_bit(&self.wr.bready, true);
    }

    pub fn posedge(&mut self, store: &mut SignalStore) {
        self.read_edge(store);
        self.write_edge(store);
    }

    fn read_edge(&mut self, store: &mut SignalStore) {
        let p = &self.rd;
        let arvalid = store.get_bit(&p.arvalid);
        let arready = store.get_bit(&p.arready);
        let rvalid = store.get_bit(&p.rvalid);
        let rready = store.get_bit(&p.rready);

        if rvalid && rready {
            let id = store.get(&p.rid);
            let mut beat = vec![0u8; self.width];
            store.read(&p.rdata, &mut beat);
            self.partial.entry(id).or_default().extend_from_slice(&beat);
            if store.get_bit(&p.rlast) {
                let data = self.partial.remove(&id).unwrap_or_default();
                self.read_results.push((id, data));
            }
        }

        if arvalid && !arready {
            return;
        }
        store.set_bit(&p.arvalid, false);
        if let Some(cmd) = self.reads.pop_front() {
            store.set(&p.arid, cmd.id);
            store.set(&p.araddr, cmd.addr);
            store.set(&p.arlen, cmd.beats as u64 - 1);
            store.set(&p.arsize, self.size());
            store.set(&p.arburst, u64::from(AXI_BURST_INCR));
            store.set_bit(&p.arvalid, true);
            let _ = self.partial.insert(cmd.id, Vec::new());
        }
    }

    fn write_edge(&mut self, store: &mut SignalStore) {
        let size = self.size();
        let width = self.width;
        let p = &self.wr;
        let awvalid = store.get_bit(&p.awvalid);
        let awready = store.get_bit(&p.awready);
        let wvalid = store.get_bit(&p.wvalid);
        let wready = store.get_bit(&p.wready);

        if store.get_bit(&p.bvalid) && store.get_bit(&p.bready) {
            self.write_acks.push(store.get(&p.bid));
        }

        let mut finished = false;
        if let Some(progress) = self.active_write.as_mut() {
            if awvalid && awready {
                progress.addr_done = true;
                store.set_bit(&p.awvalid, false);
            }
            if wvalid && wready {
                progress.beat += 1;
                let beats = progress.cmd.data.len() / width;
                if progress.beat == beats {
                    store.set_bit(&p.wvalid, false);
                    store.set_bit(&p.wlast, false);
                } else {
                    drive_beat(store, p, &progress.cmd.data, progress.beat, width);
                }
            }
            finished = progress.addr_done && progress.beat == progress.cmd.data.len() / width;
        }
        if finished {
            self.active_write = None;
        }

        if self.active_write.is_some() {
            return;
        }
        let Some(cmd) = self.writes.pop_front() else {
            return;
        };
        let beats = cmd.data.len() / width;
        store.set(&p.awid, cmd.id);
        store.set(&p.awaddr, cmd.addr);
        store.set(&p.awlen, beats as u64 - 1);
        store.set(&p.awsize, size);
        store.set(&p.awburst, u64::from(AXI_BURST_INCR));
        store.set_bit(&p.awvalid, true);
        drive_beat(store, p, &cmd.data, 0, width);
        self.active_write = Some(WriteProgress {
            cmd,
            beat: 0,
            addr_done: false,
        });
    }
}

fn drive_beat(store: &mut SignalStore, p: &AxiWritePort, data: &[u8], beat: usize, width: usize) {
    let beats = data.len() / width;
    store.write(&p.wdata, &data[beat * width..(beat + 1) * width]);
    store.set(&p.wstrb, if width >= 64 { u64::MAX } else { (1u64 << width) - 1 });
    store.set_bit(&p.wlast, beat + 1 == beats);
    store.set_bit(&p.wvalid, true);
}

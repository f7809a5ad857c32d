//! DMA operation queue and sub-operation bookkeeping.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use crate::common::data::Direction;
use crate::common::error::{BridgeError, Result};
use crate::config::DmaConfig;
use crate::transport::{D2hMsg, MessageSink};

/// A finished DMA operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DmaCompletion {
    /// Tag supplied when the operation was issued.
    pub opaque: u64,
    /// Read (host to device) or write (device to host).
    pub direction: Direction,
    /// The operation buffer: data read from the host, or the bytes written.
    pub data: Vec<u8>,
}

/// Sub-operation counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DmaCounters {
    /// Read sub-operations issued.
    pub reads: u64,
    /// Write sub-operations issued.
    pub writes: u64,
    /// Bytes requested by reads.
    pub read_bytes: u64,
    /// Bytes carried by writes.
    pub write_bytes: u64,
}

#[derive(Debug)]
struct DmaOperation {
    id: u64,
    addr: u64,
    buffer: Vec<u8>,
    direction: Direction,
    issue_offset: usize,
    pending: usize,
    opaque: u64,
}

impl DmaOperation {
    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn is_done(&self) -> bool {
        self.pending == 0 && self.issue_offset == self.len()
    }
}

#[derive(Debug)]
struct SubOp {
    op_id: u64,
    offset: usize,
    len: usize,
    direction: Direction,
}

/// In-order DMA engine with bounded sub-operation size and concurrency.
///
/// The engine sends `D2hMsg::Read`/`D2hMsg::Write` messages tagged with a unique
/// sub-operation handle and consumes the host's completions for those handles.
/// Finished operations are queued and collected with [`DmaEngine::take_completed`].
#[derive(Debug)]
pub struct DmaEngine {
    chunk: usize,
    max_pending: usize,
    ops: VecDeque<DmaOperation>,
    subops: HashMap<u64, SubOp>,
    next_op_id: u64,
    next_handle: u64,
    completed: VecDeque<DmaCompletion>,
    counters: DmaCounters,
}

impl DmaEngine {
    /// Creates an engine.
    ///
    /// # Arguments
    ///
    /// * `chunk` - Largest sub-operation in bytes (at least 1).
    /// * `max_pending` - Sub-operations allowed in flight (at least 1).
    pub fn new(chunk: usize, max_pending: usize) -> Self {
        Self {
            chunk: chunk.max(1),
            max_pending: max_pending.max(1),
            ops: VecDeque::new(),
            subops: HashMap::new(),
            next_op_id: 0,
            next_handle: 1,
            completed: VecDeque::new(),
            counters: DmaCounters::default(),
        }
    }

    /// Creates an engine from configuration.
    pub fn from_config(config: &DmaConfig) -> Self {
        Self::new(config.chunk_bytes, config.max_pending)
    }

    /// Queues a read of `len` bytes of host memory at `addr` and issues what fits.
    ///
    /// # Returns
    ///
    /// The operation id.
    pub fn issue_read(
        &mut self,
        addr: u64,
        len: usize,
        opaque: u64,
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<u64> {
        self.enqueue(addr, vec![0; len], Direction::Read, opaque, out)
    }

    /// Queues a write of `data` to host memory at `addr` and issues what fits.
    ///
    /// # Returns
    ///
    /// The operation id.
    pub fn issue_write(
        &mut self,
        addr: u64,
        data: Vec<u8>,
        opaque: u64,
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<u64> {
        self.enqueue(addr, data, Direction::Write, opaque, out)
    }

    fn enqueue(
        &mut self,
        addr: u64,
        buffer: Vec<u8>,
        direction: Direction,
        opaque: u64,
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<u64> {
        let id = self.next_op_id;
        self.next_op_id += 1;
        debug!(op = id, addr, len = buffer.len(), opaque, dir = direction.as_str(), "DMA operation queued");
        self.ops.push_back(DmaOperation {
            id,
            addr,
            buffer,
            direction,
            issue_offset: 0,
            pending: 0,
            opaque,
        });
        self.issue_pending(out)?;
        Ok(id)
    }

    /// Issues sub-operations while capacity allows, scanning operations head first.
    pub fn issue_pending(&mut self, out: &mut dyn MessageSink<D2hMsg>) -> Result<()> {
        self.retire_head();

        let max_out = out.max_out_payload();
        let max_in = out.max_in_payload();
        let mut idx = 0;
        while self.subops.len() < self.max_pending && idx < self.ops.len() {
            let op = &mut self.ops[idx];
            if op.issue_offset >= op.len() {
                idx += 1;
                continue;
            }

            let offset = op.issue_offset;
            let len = (op.len() - offset).min(self.chunk);
            let addr = op.addr + offset as u64;
            let handle = self.next_handle;

            let msg = match op.direction {
                Direction::Read => {
                    if len > max_in {
                        return Err(BridgeError::PayloadTooLarge {
                            what: "DMA read completion",
                            len,
                            max: max_in,
                        });
                    }
                    self.counters.reads += 1;
                    self.counters.read_bytes += len as u64;
                    D2hMsg::Read {
                        req_id: handle,
                        addr,
                        len,
                    }
                }
                Direction::Write => {
                    if len > max_out {
                        return Err(BridgeError::PayloadTooLarge {
                            what: "DMA write payload",
                            len,
                            max: max_out,
                        });
                    }
                    self.counters.writes += 1;
                    self.counters.write_bytes += len as u64;
                    D2hMsg::Write {
                        req_id: handle,
                        addr,
                        data: op.buffer[offset..offset + len].to_vec(),
                    }
                }
            };

            op.issue_offset += len;
            op.pending += 1;
            let sub = SubOp {
                op_id: op.id,
                offset,
                len,
                direction: op.direction,
            };
            trace!(handle, op = sub.op_id, offset, len, addr, "DMA sub-operation issued");
            let _ = self.subops.insert(handle, sub);
            self.next_handle += 1;
            out.send(msg)?;
        }
        Ok(())
    }

    /// Applies a host read completion for sub-operation `handle`.
    pub fn handle_read_completion(
        &mut self,
        handle: u64,
        data: &[u8],
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<()> {
        self.complete_subop(handle, Direction::Read, Some(data), out)
    }

    /// Applies a host write completion for sub-operation `handle`.
    pub fn handle_write_completion(&mut self, handle: u64, out: &mut dyn MessageSink<D2hMsg>) -> Result<()> {
        self.complete_subop(handle, Direction::Write, None, out)
    }

    fn complete_subop(
        &mut self,
        handle: u64,
        direction: Direction,
        data: Option<&[u8]>,
        out: &mut dyn MessageSink<D2hMsg>,
    ) -> Result<()> {
        let unknown = || BridgeError::UnknownDmaHandle { handle, direction };
        let sub = match self.subops.remove(&handle) {
            Some(sub) if sub.direction == direction => sub,
            Some(sub) => {
                let _ = self.subops.insert(handle, sub);
                return Err(unknown());
            }
            None => return Err(unknown()),
        };
        let pos = self
            .ops
            .iter()
            .position(|op| op.id == sub.op_id)
            .ok_or_else(unknown)?;

        let op = &mut self.ops[pos];
        if let Some(data) = data {
            if data.len() < sub.len {
                return Err(BridgeError::ShortReadCompletion {
                    handle,
                    got: data.len(),
                    expected: sub.len,
                });
            }
            op.buffer[sub.offset..sub.offset + sub.len].copy_from_slice(&data[..sub.len]);
        }
        op.pending -= 1;
        let (op_id, done) = (op.id, op.is_done());
        trace!(handle, op = op_id, offset = sub.offset, len = sub.len, "DMA sub-operation completed");

        if done && pos != 0 {
            return Err(BridgeError::OutOfOrderCompletion {
                op: op_id,
                head: self.ops.front().map(|head| head.id),
            });
        }

        self.issue_pending(out)
    }

    fn retire_head(&mut self) {
        while self.ops.front().is_some_and(DmaOperation::is_done) {
            let Some(op) = self.ops.pop_front() else {
                break;
            };
            debug!(op = op.id, opaque = op.opaque, len = op.len(), dir = op.direction.as_str(), "DMA operation done");
            self.completed.push_back(DmaCompletion {
                opaque: op.opaque,
                direction: op.direction,
                data: op.buffer,
            });
        }
    }

    /// Takes the oldest finished operation.
    pub fn take_completed(&mut self) -> Option<DmaCompletion> {
        self.completed.pop_front()
    }

    /// Sub-operations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.subops.len()
    }

    /// Operations not yet retired.
    pub fn queued_ops(&self) -> usize {
        self.ops.len()
    }

    /// Whether no operation is queued, in flight or waiting to be collected.
    pub fn is_idle(&self) -> bool {
        self.ops.is_empty() && self.completed.is_empty()
    }

    /// Largest sub-operation size.
    pub const fn chunk(&self) -> usize {
        self.chunk
    }

    /// Concurrency bound.
    pub const fn max_pending(&self) -> usize {
        self.max_pending
    }

    /// Issued sub-operation counters.
    pub const fn counters(&self) -> DmaCounters {
        self.counters
    }
}

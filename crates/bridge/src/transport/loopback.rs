//! In-process loopback link.
//!
//! `pair` returns two connected channel ends sharing a pair of timestamped queues.
//! A message sent at tick `t` becomes visible to the other end at `t + latency`.
//! Each direction holds at most `capacity` messages; a full queue reports
//! [`SendError::Full`] until the other end polls, and a message whose payload exceeds
//! `max_payload` is refused with [`SendError::TooLarge`]. Dropping or closing either
//! end closes both directions.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use super::{Channel, Payload, SendError, SyncError, SyncMarker};

/// Parameters of one loopback link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkParams {
    /// Delay between send and visibility, in ticks.
    pub latency: u64,
    /// Messages queued per direction before sends report `Full`.
    pub capacity: usize,
    /// Largest payload either end may send; also reported to both ends.
    pub max_payload: usize,
    /// Sync period in ticks; `None` disables synchronization.
    pub sync_period: Option<u64>,
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            latency: 500_000,
            capacity: 1024,
            max_payload: 4096,
            sync_period: None,
        }
    }
}

struct Queue<T> {
    msgs: VecDeque<(u64, T)>,
    closed: bool,
}

impl<T> Queue<T> {
    const fn new() -> Self {
        Self {
            msgs: VecDeque::new(),
            closed: false,
        }
    }
}

/// One end of a loopback link: sends `S`, receives `R`.
pub struct LoopbackEnd<S, R> {
    name: &'static str,
    params: LinkParams,
    tx: Rc<RefCell<Queue<S>>>,
    rx: Rc<RefCell<Queue<R>>>,
    last_tx: Option<u64>,
}

/// Creates a connected pair of loopback ends.
pub fn pair<A, B>(name: &'static str, params: LinkParams) -> (LoopbackEnd<A, B>, LoopbackEnd<B, A>) {
    let a_to_b = Rc::new(RefCell::new(Queue::new()));
    let b_to_a = Rc::new(RefCell::new(Queue::new()));
    let a = LoopbackEnd {
        name,
        params,
        tx: Rc::clone(&a_to_b),
        rx: Rc::clone(&b_to_a),
        last_tx: None,
    };
    let b = LoopbackEnd {
        name,
        params,
        tx: b_to_a,
        rx: a_to_b,
        last_tx: None,
    };
    (a, b)
}

impl<S, R> LoopbackEnd<S, R> {
    /// Closes both directions.
    pub fn close(&self) {
        self.tx.borrow_mut().closed = true;
        self.rx.borrow_mut().closed = true;
    }

    /// Whether the link has been closed by either end.
    pub fn is_closed(&self) -> bool {
        self.tx.borrow().closed
    }

    /// Messages waiting to be received by this end, due or not.
    pub fn queued(&self) -> usize {
        self.rx.borrow().msgs.len()
    }

    /// Takes the next message due at or before `now`.
    pub fn recv(&mut self, now: u64) -> Option<R> {
        let mut rx = self.rx.borrow_mut();
        match rx.msgs.front() {
            Some((ts, _)) if *ts <= now => rx.msgs.pop_front().map(|(_, msg)| msg),
            _ => None,
        }
    }

    /// Takes every message due at or before `now`.
    pub fn recv_all(&mut self, now: u64) -> Vec<R> {
        std::iter::from_fn(|| self.recv(now)).collect()
    }
}

impl<S: Payload, R> LoopbackEnd<S, R> {
    /// Sends a message, bypassing synchronization bookkeeping.
    pub fn send(&mut self, now: u64, msg: S) -> Result<(), SendError<S>> {
        let len = msg.payload_len();
        if len > self.params.max_payload {
            return Err(SendError::TooLarge { msg, len });
        }
        let mut tx = self.tx.borrow_mut();
        if tx.closed {
            return Err(SendError::Closed(msg));
        }
        if tx.msgs.len() >= self.params.capacity {
            return Err(SendError::Full(msg));
        }
        tx.msgs.push_back((now + self.params.latency, msg));
        drop(tx);
        self.last_tx = Some(now);
        Ok(())
    }
}

impl<S, R> Drop for LoopbackEnd<S, R> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<S: SyncMarker + Payload, R> Channel for LoopbackEnd<S, R> {
    type In = R;
    type Out = S;

    fn name(&self) -> &'static str {
        self.name
    }

    fn sync_enabled(&self) -> bool {
        self.params.sync_period.is_some()
    }

    fn sync(&mut self, now: u64) -> Result<(), SyncError> {
        let Some(period) = self.params.sync_period else {
            return Ok(());
        };
        let due = self.last_tx.is_none_or(|last| now >= last + period);
        if !due {
            return Ok(());
        }
        self.send(now, S::sync_marker()).map_err(|err| match err {
            SendError::Full(_) | SendError::TooLarge { .. } => SyncError::Busy,
            SendError::Closed(_) => SyncError::Closed,
        })
    }

    fn next_timestamp(&self) -> u64 {
        self.rx.borrow().msgs.front().map_or(u64::MAX, |(ts, _)| *ts)
    }

    fn poll(&mut self, now: u64) -> Option<R> {
        self.recv(now)
    }

    fn try_send(&mut self, now: u64, msg: S) -> Result<(), SendError<S>> {
        self.send(now, msg)
    }

    fn max_out_payload(&self) -> usize {
        self.params.max_payload
    }

    fn max_in_payload(&self) -> usize {
        self.params.max_payload
    }
}

impl<S, R> fmt::Debug for LoopbackEnd<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopbackEnd")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("outbound", &self.tx.borrow().msgs.len())
            .field("inbound", &self.rx.borrow().msgs.len())
            .finish_non_exhaustive()
    }
}

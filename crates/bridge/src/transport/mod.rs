//! Transport abstraction.
//!
//! This module defines how the bridge talks to the rest of the co-simulation. It provides:
//! 1. **Schema:** The logical PCIe and network messages (`msg`).
//! 2. **Channel:** The [`Channel`] trait, a timestamped bidirectional message link with
//!    synchronization and negotiated payload limits.
//! 3. **Retry:** A bounded retry policy around full channels and stalled synchronization,
//!    and the [`Outbound`] send handle engines use (`retry`).
//! 4. **Loopback:** An in-process channel pair for tests and embedding (`loopback`).

/// In-process channel pair.
pub mod loopback;
/// Message schema.
pub mod msg;
/// Bounded retry policy and outbound send handle.
pub mod retry;

use std::fmt;

pub use loopback::{LinkParams, LoopbackEnd};
pub use msg::{D2hMsg, H2dMsg, NetMsg, Payload, SyncMarker};
pub use retry::{MessageSink, Outbound, RetryPolicy};

/// Why a send did not go through; the message is handed back.
pub enum SendError<T> {
    /// No outbound slot is free right now.
    Full(T),
    /// The peer is gone; no slot will ever become free.
    Closed(T),
    /// The message carries more data than the link accepts.
    TooLarge {
        /// The rejected message.
        msg: T,
        /// Its payload length in bytes.
        len: usize,
    },
}

impl<T> SendError<T> {
    /// Returns the unsent message.
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(msg) | Self::Closed(msg) | Self::TooLarge { msg, .. } => msg,
        }
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => f.write_str("Full(..)"),
            Self::Closed(_) => f.write_str("Closed(..)"),
            Self::TooLarge { len, .. } => write!(f, "TooLarge {{ len: {len}, .. }}"),
        }
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => f.write_str("outbound channel full"),
            Self::Closed(_) => f.write_str("outbound channel closed"),
            Self::TooLarge { len, .. } => write!(f, "payload of {len} bytes exceeds the link limit"),
        }
    }
}

impl<T> std::error::Error for SendError<T> {}

/// Why a synchronization attempt failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The sync message could not be sent yet.
    #[error("sync slot busy")]
    Busy,
    /// The peer is gone.
    #[error("channel closed")]
    Closed,
}

/// A timestamped, bidirectional message link to one peer.
///
/// Timestamps are simulation ticks (picoseconds). Inbound messages carry the tick at
/// which they become visible; the bridge polls them once its own time reaches it.
pub trait Channel {
    /// Message type received from the peer.
    type In;
    /// Message type sent to the peer.
    type Out;

    /// Channel name for logs and errors.
    fn name(&self) -> &'static str;

    /// Whether the peer expects synchronization messages.
    fn sync_enabled(&self) -> bool {
        true
    }

    /// Sends a synchronization message if one is due at `now`.
    fn sync(&mut self, now: u64) -> Result<(), SyncError>;

    /// Tick of the next inbound message, or `u64::MAX` when none is queued.
    fn next_timestamp(&self) -> u64;

    /// Takes the next inbound message if its tick is at or before `now`.
    fn poll(&mut self, now: u64) -> Option<Self::In>;

    /// Sends a message stamped with `now`.
    fn try_send(&mut self, now: u64, msg: Self::Out) -> Result<(), SendError<Self::Out>>;

    /// Largest payload (bytes) an outbound message may carry.
    fn max_out_payload(&self) -> usize;

    /// Largest payload (bytes) an inbound message may carry.
    fn max_in_payload(&self) -> usize;
}

/// The device end of a PCIe link.
pub type PcieChannel = dyn Channel<In = H2dMsg, Out = D2hMsg>;

/// The device end of a network link.
pub type NetChannel = dyn Channel<In = NetMsg, Out = NetMsg>;

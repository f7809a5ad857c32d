//! Bridge error definitions.
//!
//! Every variant of [`BridgeError`] is fatal for the simulation: it propagates up to
//! [`Simulator::run`](crate::sim::Simulator::run), which stops the loop and hands the
//! error to the embedding process. Recoverable conditions (a momentarily full outbound
//! channel, a dropped packet, a lenient register miss) are logged where they occur and
//! never become a `BridgeError`.

use thiserror::Error;

use super::data::Direction;

/// Fatal bridge errors.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// An outbound message would carry more data than the transport accepts.
    ///
    /// Raised for DMA sub-operations whose data (write payload or expected read
    /// completion) does not fit a single message.
    #[error("{what} of {len} bytes does not fit into a transport message (max {max})")]
    PayloadTooLarge {
        /// Which payload overflowed.
        what: &'static str,
        /// Requested payload length.
        len: usize,
        /// Largest payload the transport accepts.
        max: usize,
    },

    /// A DMA completion carried a handle with no matching sub-operation.
    #[error("DMA {direction:?} completion for unknown handle {handle:#x}")]
    UnknownDmaHandle {
        /// Handle carried by the completion.
        handle: u64,
        /// Kind of completion that was received.
        direction: Direction,
    },

    /// A DMA operation finished while an older operation was still pending.
    #[error("DMA operation {op} finished out of order (head of queue is {head:?})")]
    OutOfOrderCompletion {
        /// Operation that finished.
        op: u64,
        /// Operation at the head of the pending list.
        head: Option<u64>,
    },

    /// A read completion returned less data than its sub-operation requested.
    #[error("DMA read completion for handle {handle:#x} carries {got} bytes, expected {expected}")]
    ShortReadCompletion {
        /// Handle of the sub-operation.
        handle: u64,
        /// Bytes carried by the completion.
        got: usize,
        /// Bytes requested by the sub-operation.
        expected: usize,
    },

    /// A register access did not match the native register width.
    #[error("register access of {len} bytes at offset {offset:#x} (native width {width})")]
    UnsupportedWidth {
        /// Requested access length.
        len: usize,
        /// Register offset.
        offset: u64,
        /// Native register width in bytes.
        width: usize,
    },

    /// A register access fell outside the register window under the strict policy.
    #[error("register access at offset {offset:#x} outside window of {window:#x} bytes")]
    RegisterOutOfRange {
        /// Register offset.
        offset: u64,
        /// Window length in bytes.
        window: u64,
    },

    /// A control-window access fell outside the control registers.
    #[error("control register access at offset {offset:#x} len {len} outside {size} bytes")]
    ControlOutOfRange {
        /// Byte offset.
        offset: u64,
        /// Access length.
        len: usize,
        /// Size of the control register block.
        size: usize,
    },

    /// The host addressed a register window the device does not expose.
    #[error("access to unexpected bar {0}")]
    UnexpectedBar(u8),

    /// The peer closed the channel; no outbound slot will ever become available.
    #[error("{0} channel closed by peer")]
    ChannelClosed(&'static str),

    /// No outbound slot became available within the retry budget.
    #[error("{channel} outbound slot unavailable after {attempts} attempts")]
    AllocExhausted {
        /// Channel name.
        channel: &'static str,
        /// Attempts made.
        attempts: u64,
    },

    /// Synchronization with the peer did not succeed within the retry budget.
    #[error("{channel} synchronization at tick {ts} failed after {attempts} attempts")]
    SyncStalled {
        /// Channel name.
        channel: &'static str,
        /// Tick being synchronized.
        ts: u64,
        /// Attempts made.
        attempts: u64,
    },

    /// An outbound frame exceeded the largest representable packet.
    #[error("outbound frame of {len} bytes exceeds maximum of {max}")]
    FrameTooLarge {
        /// Frame length.
        len: usize,
        /// Maximum frame length.
        max: usize,
    },

    /// The device issued a burst type the bridge does not support.
    #[error("unsupported AXI burst type {burst:#04b} on {direction:?} channel")]
    UnsupportedBurst {
        /// Burst encoding.
        burst: u8,
        /// Channel direction.
        direction: Direction,
    },

    /// A burst beat was wider than the data bus.
    #[error("AXI beat of {beat} bytes wider than {width}-byte data bus")]
    BeatTooWide {
        /// Bytes per beat from the size field.
        beat: usize,
        /// Data bus width in bytes.
        width: usize,
    },

    /// A bus response arrived for a transaction the bridge does not track.
    #[error("unexpected {0} on bus")]
    UnexpectedBusResponse(&'static str),

    /// The configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading the configuration file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Parsing the configuration failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the bridge.
pub type Result<T> = std::result::Result<T, BridgeError>;

//! Logical message schema of the PCIe and network links.
//!
//! These are the decoded forms of the transport messages; the shared-memory wire
//! layout belongs to the transport implementation behind [`Channel`](super::Channel).

/// Messages flowing from the host into the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum H2dMsg {
    /// Register read on a bar.
    Read {
        /// Host request id, echoed in the completion.
        req_id: u64,
        /// Register window index.
        bar: u8,
        /// Byte offset inside the window.
        offset: u64,
        /// Access length in bytes.
        len: usize,
    },
    /// Register write on a bar.
    Write {
        /// Host request id, echoed in the completion unless posted.
        req_id: u64,
        /// Register window index.
        bar: u8,
        /// Byte offset inside the window.
        offset: u64,
        /// Little-endian write data; its length is the access length.
        data: Vec<u8>,
        /// Posted writes are never acknowledged.
        posted: bool,
    },
    /// Completion of a device-initiated read of host memory.
    ReadComp {
        /// Handle of the DMA sub-operation.
        req_id: u64,
        /// Host memory contents.
        data: Vec<u8>,
    },
    /// Completion of a device-initiated write to host memory.
    WriteComp {
        /// Handle of the DMA sub-operation.
        req_id: u64,
    },
    /// Device control (bus mastering, interrupt enables). Ignored by the bridge.
    DevCtrl {
        /// Control flags.
        flags: u64,
    },
    /// Synchronization marker.
    Sync,
    /// The host asks the device simulation to exit.
    Terminate,
}

impl H2dMsg {
    /// Short label for logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Read { .. } => "read",
            Self::Write { .. } => "write",
            Self::ReadComp { .. } => "readcomp",
            Self::WriteComp { .. } => "writecomp",
            Self::DevCtrl { .. } => "devctrl",
            Self::Sync => "sync",
            Self::Terminate => "terminate",
        }
    }
}

/// Messages flowing from the device to the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum D2hMsg {
    /// Read of host memory by the device.
    Read {
        /// DMA sub-operation handle.
        req_id: u64,
        /// Host physical address.
        addr: u64,
        /// Bytes to read.
        len: usize,
    },
    /// Write of host memory by the device.
    Write {
        /// DMA sub-operation handle.
        req_id: u64,
        /// Host physical address.
        addr: u64,
        /// Bytes to write.
        data: Vec<u8>,
    },
    /// Register read completion.
    ReadComp {
        /// Host request id.
        req_id: u64,
        /// Register contents, little-endian.
        data: Vec<u8>,
    },
    /// Register write completion.
    WriteComp {
        /// Host request id.
        req_id: u64,
    },
    /// MSI interrupt.
    Interrupt {
        /// Vector number.
        vector: u16,
    },
    /// Synchronization marker.
    Sync,
}

/// Messages on the network link, identical in both directions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetMsg {
    /// One Ethernet frame.
    Packet(Vec<u8>),
    /// Synchronization marker.
    Sync,
    /// The peer asks the simulation to exit.
    Terminate,
}

/// Message types that have a synchronization marker.
pub trait SyncMarker {
    /// Returns the marker message.
    fn sync_marker() -> Self;
}

impl SyncMarker for H2dMsg {
    fn sync_marker() -> Self {
        Self::Sync
    }
}

impl SyncMarker for D2hMsg {
    fn sync_marker() -> Self {
        Self::Sync
    }
}

impl SyncMarker for NetMsg {
    fn sync_marker() -> Self {
        Self::Sync
    }
}

/// Message types whose data payload is bounded by the link.
pub trait Payload {
    /// Bytes of data carried by the message.
    fn payload_len(&self) -> usize;
}

impl Payload for H2dMsg {
    fn payload_len(&self) -> usize {
        match self {
            Self::Write { data, .. } | Self::ReadComp { data, .. } => data.len(),
            _ => 0,
        }
    }
}

impl Payload for D2hMsg {
    fn payload_len(&self) -> usize {
        match self {
            Self::Write { data, .. } | Self::ReadComp { data, .. } => data.len(),
            _ => 0,
        }
    }
}

impl Payload for NetMsg {
    fn payload_len(&self) -> usize {
        match self {
            Self::Packet(data) => data.len(),
            Self::Sync | Self::Terminate => 0,
        }
    }
}

//! Shared data types.

/// Direction of a host memory access or register access, seen from the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Data flows from the host into the device.
    Read,
    /// Data flows from the device to the host.
    Write,
}

impl Direction {
    /// Returns a short lowercase label for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// A host register access waiting for (or performing) its bus handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterOp {
    /// Request id assigned by the host; echoed in the completion.
    pub req_id: u64,
    /// Byte offset inside the register window.
    pub offset: u64,
    /// Read or write.
    pub direction: Direction,
    /// Value to write (ignored for reads).
    pub value: u64,
    /// Posted writes never produce a completion.
    pub posted: bool,
    /// Outside the register window: completes with zero data and never reaches the bus.
    pub unmapped: bool,
}

impl RegisterOp {
    /// Creates a read access.
    pub const fn read(req_id: u64, offset: u64) -> Self {
        Self {
            req_id,
            offset,
            direction: Direction::Read,
            value: 0,
            posted: false,
            unmapped: false,
        }
    }

    /// Creates a write access.
    pub const fn write(req_id: u64, offset: u64, value: u64, posted: bool) -> Self {
        Self {
            req_id,
            offset,
            direction: Direction::Write,
            value,
            posted,
            unmapped: false,
        }
    }

    /// Marks the access as falling outside the register window.
    #[must_use]
    pub const fn unmapped(mut self) -> Self {
        self.unmapped = true;
        self
    }
}

//! Simulation-control register window.
//!
//! Bar 1 exposes a small byte-addressable block the host can use to steer the
//! simulation itself. Offset 0 holds the trace enable flag: writing a non-zero value
//! opens a new waveform trace `<prefix>_<n>.vcd`, writing zero closes it.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::common::error::{BridgeError, Result};

/// Size of the control register block in bytes.
pub const CONTROL_SIZE: usize = 8;

/// Offset of the trace enable register.
pub const TRACE_ENABLE: usize = 0;

/// What the simulator must do to the model after a control write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceAction {
    /// Open a trace file at this path.
    Start(PathBuf),
    /// Close the open trace.
    Stop,
}

/// The control register block.
#[derive(Clone, Debug)]
pub struct ControlRegisters {
    regs: [u8; CONTROL_SIZE],
    trace_prefix: Option<String>,
    tracing: bool,
    traces_opened: u32,
}

impl ControlRegisters {
    /// Creates the block; traces are only opened when `trace_prefix` is set.
    pub const fn new(trace_prefix: Option<String>) -> Self {
        Self {
            regs: [0; CONTROL_SIZE],
            trace_prefix,
            tracing: false,
            traces_opened: 0,
        }
    }

    fn range(offset: u64, len: usize) -> Result<std::ops::Range<usize>> {
        let start = offset as usize;
        match start.checked_add(len) {
            Some(end) if end <= CONTROL_SIZE => Ok(start..end),
            _ => Err(BridgeError::ControlOutOfRange {
                offset,
                len,
                size: CONTROL_SIZE,
            }),
        }
    }

    /// Reads `len` bytes at `offset`.
    pub fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        Ok(self.regs[Self::range(offset, len)?].to_vec())
    }

    /// Writes `data` at `offset` and reports a trace toggle.
    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<Option<TraceAction>> {
        let range = Self::range(offset, data.len())?;
        self.regs[range].copy_from_slice(data);

        let enable = self.regs[TRACE_ENABLE] & 1 != 0;
        if enable == self.tracing {
            return Ok(None);
        }

        let Some(prefix) = &self.trace_prefix else {
            warn!("trace toggled through control window, but no trace prefix is configured");
            return Ok(None);
        };
        self.tracing = enable;
        if enable {
            let path = PathBuf::from(format!("{prefix}_{}.vcd", self.traces_opened));
            self.traces_opened += 1;
            info!(path = %path.display(), "starting trace");
            Ok(Some(TraceAction::Start(path)))
        } else {
            info!("stopping trace");
            Ok(Some(TraceAction::Stop))
        }
    }

    /// Whether a trace is open.
    pub const fn tracing(&self) -> bool {
        self.tracing
    }
}

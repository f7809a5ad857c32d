//! Bridge-wide constants.

/// Largest DMA sub-operation the engine issues by default (bytes).
pub const DEFAULT_DMA_CHUNK: usize = 4096;

/// Default number of DMA sub-operations allowed in flight (approximates PCIe flow control).
pub const DEFAULT_DMA_MAX_PENDING: usize = 16;

/// Largest frame a network packet message can carry (16-bit length field).
pub const MAX_PACKET_LEN: usize = u16::MAX as usize;

/// Number of interrupt vector bits scanned by the interrupt emitter.
pub const IRQ_VECTOR_BITS: u32 = 32;

/// AXI burst type: fixed address.
pub const AXI_BURST_FIXED: u8 = 0b00;

/// AXI burst type: incrementing address.
pub const AXI_BURST_INCR: u8 = 0b01;

/// AXI burst type: wrapping address.
pub const AXI_BURST_WRAP: u8 = 0b10;

/// AXI response: normal access success.
pub const AXI_RESP_OKAY: u8 = 0b00;

/// Picoseconds per microsecond, used to turn a clock frequency in MHz into a period.
pub const PS_PER_US: u64 = 1_000_000;

/// Index of the register window served by the AXI-Lite engine.
pub const BAR_REGISTERS: u8 = 0;

/// Index of the simulation-control register window.
pub const BAR_CONTROL: u8 = 1;

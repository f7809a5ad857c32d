//! Configuration system for the bridge.
//!
//! This module defines all configuration structures used to parameterize a bridge
//! instance. It provides:
//! 1. **Defaults:** Baseline constants (clock, link latencies, DMA bounds, signal names).
//! 2. **Structures:** Hierarchical config for general, link, DMA, retry and device settings.
//! 3. **Loading:** JSON parsing from strings or files, followed by validation.
//!
//! Every field is optional in JSON; missing fields take the values in `defaults`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::constants::{DEFAULT_DMA_CHUNK, DEFAULT_DMA_MAX_PENDING, MAX_PACKET_LEN, PS_PER_US};
use crate::common::error::{BridgeError, Result};

/// Default configuration constants for the bridge.
mod defaults {
    /// Device clock frequency (150 MHz).
    pub const CLOCK_MHZ: u64 = 150;

    /// Clock cycles the reset signals are held high before the main loop starts.
    pub const RESET_CYCLES: u32 = 1;

    /// Synchronization message period in nanoseconds.
    pub const SYNC_PERIOD_NS: u64 = 500;

    /// PCIe link latency in nanoseconds.
    pub const PCIE_LATENCY_NS: u64 = 500;

    /// Ethernet link latency in nanoseconds.
    pub const ETH_LATENCY_NS: u64 = 500;

    /// Attempts to obtain an outbound message slot before giving up.
    pub const MAX_ALLOC_SPINS: u64 = 1_000_000;

    /// Attempts to synchronize with the peer before giving up.
    pub const MAX_SYNC_SPINS: u64 = 1_000_000;

    /// Register window (bar 0) length in bytes.
    pub const BAR0_LEN: u64 = 4096;

    /// Native register width in bytes.
    pub const REGISTER_WIDTH: usize = 4;

    /// AXI burst data bus width in bytes.
    pub const DATA_WIDTH: usize = 4;

    /// Maximum device-initiated bursts tracked per direction.
    pub const MAX_BURSTS: usize = 16;

    /// Receive queue depth of the packet bridge (packets).
    pub const RX_QUEUE_PACKETS: usize = 32;

    /// Largest frame the stream endpoints assemble.
    pub const MAX_FRAME: usize = 2048;

    /// AXI-Stream data width in bytes.
    pub const STREAM_WIDTH: usize = 8;
}

/// Root configuration structure.
///
/// # Example
///
/// ```
/// use rtlbridge_core::config::{Config, RegisterPolicy};
///
/// let json = r#"{
///     "general": { "clock_mhz": 250 },
///     "dma": { "max_pending": 4 },
///     "device": {
///         "name": "corundum",
///         "bar0_len": 16777216,
///         "data_width": 16,
///         "control_window": false,
///         "register_policy": "Strict",
///         "signals": { "mmio_prefix": "s_axil_ctrl", "irq": "irq" },
///         "network": { "rx_queue_packets": 32 }
///     }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.general.clock_period_ps(), 4000);
/// assert_eq!(config.dma.max_pending, 4);
/// assert_eq!(config.dma.chunk_bytes, 4096);
/// assert_eq!(config.device.register_policy, RegisterPolicy::Strict);
/// assert!(config.device.network.is_some());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Clock, start tick, reset and tracing settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Link parameters handed to the transport.
    #[serde(default)]
    pub link: LinkConfig,
    /// DMA splitting bounds.
    #[serde(default)]
    pub dma: DmaConfig,
    /// Bounded retry budgets for busy waits.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Device shape: register window, bus widths, signal names, optional network port.
    #[serde(default)]
    pub device: DeviceConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: impl Into<String>) -> Result<()> {
            Err(BridgeError::InvalidConfig(msg.into()))
        }

        if self.general.clock_mhz == 0 || self.general.clock_mhz > PS_PER_US / 2 {
            return invalid(format!("clock_mhz {} out of range", self.general.clock_mhz));
        }
        if self.dma.chunk_bytes == 0 {
            return invalid("dma.chunk_bytes must be non-zero");
        }
        if self.dma.max_pending == 0 {
            return invalid("dma.max_pending must be non-zero");
        }
        if self.retry.max_alloc_spins == 0 || self.retry.max_sync_spins == 0 {
            return invalid("retry budgets must be non-zero");
        }

        let dev = &self.device;
        if !matches!(dev.register_width, 1 | 2 | 4 | 8) {
            return invalid(format!("register_width {} not in 1/2/4/8", dev.register_width));
        }
        if !dev.data_width.is_power_of_two() || dev.data_width > 64 {
            return invalid(format!("data_width {} not a power of two up to 64", dev.data_width));
        }
        if dev.bar0_len < dev.register_width as u64 {
            return invalid("bar0_len smaller than one register");
        }
        if dev.max_bursts == 0 {
            return invalid("device.max_bursts must be non-zero");
        }
        if dev.signals.clock.is_empty() {
            return invalid("device.signals.clock must name the clock input");
        }

        if let Some(net) = &dev.network {
            if net.max_frame == 0 || net.max_frame > MAX_PACKET_LEN {
                return invalid(format!("network.max_frame {} out of range", net.max_frame));
            }
            if net.stream_width == 0 || net.stream_width > 64 {
                return invalid(format!("network.stream_width {} out of range", net.stream_width));
            }
            if net.rx_queue_packets == 0 {
                return invalid("network.rx_queue_packets must be non-zero");
            }
        }
        Ok(())
    }
}

/// General simulation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Tick (picoseconds) at which the simulation starts.
    #[serde(default)]
    pub start_tick: u64,

    /// Device clock frequency in MHz.
    #[serde(default = "GeneralConfig::default_clock_mhz")]
    pub clock_mhz: u64,

    /// Clock cycles the reset signals stay asserted.
    #[serde(default = "GeneralConfig::default_reset_cycles")]
    pub reset_cycles: u32,

    /// Path prefix for trace files opened through the control window.
    #[serde(default)]
    pub trace_prefix: Option<String>,
}

impl GeneralConfig {
    fn default_clock_mhz() -> u64 {
        defaults::CLOCK_MHZ
    }

    fn default_reset_cycles() -> u32 {
        defaults::RESET_CYCLES
    }

    /// Clock period in picoseconds.
    pub const fn clock_period_ps(&self) -> u64 {
        PS_PER_US / self.clock_mhz
    }

    /// Tick advance per clock edge (half the period).
    pub const fn half_period_ps(&self) -> u64 {
        self.clock_period_ps() / 2
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            start_tick: 0,
            clock_mhz: defaults::CLOCK_MHZ,
            reset_cycles: defaults::RESET_CYCLES,
            trace_prefix: None,
        }
    }
}

/// Link parameters, in nanoseconds as they are given on the command line.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Synchronization period.
    pub sync_period_ns: u64,
    /// PCIe link latency.
    pub pcie_latency_ns: u64,
    /// Ethernet link latency.
    pub eth_latency_ns: u64,
}

impl LinkConfig {
    /// PCIe latency in picoseconds.
    pub const fn pcie_latency_ps(&self) -> u64 {
        self.pcie_latency_ns * 1000
    }

    /// Ethernet latency in picoseconds.
    pub const fn eth_latency_ps(&self) -> u64 {
        self.eth_latency_ns * 1000
    }

    /// Sync period in picoseconds.
    pub const fn sync_period_ps(&self) -> u64 {
        self.sync_period_ns * 1000
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            sync_period_ns: defaults::SYNC_PERIOD_NS,
            pcie_latency_ns: defaults::PCIE_LATENCY_NS,
            eth_latency_ns: defaults::ETH_LATENCY_NS,
        }
    }
}

/// DMA engine bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct DmaConfig {
    /// Largest sub-operation in bytes.
    #[serde(default = "DmaConfig::default_chunk_bytes")]
    pub chunk_bytes: usize,

    /// Sub-operations allowed in flight at once.
    #[serde(default = "DmaConfig::default_max_pending")]
    pub max_pending: usize,
}

impl DmaConfig {
    fn default_chunk_bytes() -> usize {
        DEFAULT_DMA_CHUNK
    }

    fn default_max_pending() -> usize {
        DEFAULT_DMA_MAX_PENDING
    }
}

impl Default for DmaConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: DEFAULT_DMA_CHUNK,
            max_pending: DEFAULT_DMA_MAX_PENDING,
        }
    }
}

/// Retry budgets replacing unbounded busy waits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts to allocate an outbound slot.
    pub max_alloc_spins: u64,
    /// Attempts to synchronize per tick.
    pub max_sync_spins: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_alloc_spins: defaults::MAX_ALLOC_SPINS,
            max_sync_spins: defaults::MAX_SYNC_SPINS,
        }
    }
}

/// How register accesses outside the register window are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum RegisterPolicy {
    /// Log a warning; reads return zeros, writes are dropped.
    #[default]
    Lenient,
    /// Abort the simulation.
    Strict,
}

/// Device shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Name used in log messages.
    pub name: String,
    /// Register window length in bytes.
    pub bar0_len: u64,
    /// Native register width in bytes.
    pub register_width: usize,
    /// AXI burst data bus width in bytes.
    pub data_width: usize,
    /// Maximum outstanding device bursts per direction.
    pub max_bursts: usize,
    /// Whether bar 1 exposes the simulation-control registers.
    pub control_window: bool,
    /// Out-of-window register policy.
    pub register_policy: RegisterPolicy,
    /// Emit hex dumps of payloads at trace level.
    pub dump_payloads: bool,
    /// Signal names inside the hardware model.
    pub signals: SignalConfig,
    /// Network port, for NIC-like devices.
    pub network: Option<NetworkConfig>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "device".to_string(),
            bar0_len: defaults::BAR0_LEN,
            register_width: defaults::REGISTER_WIDTH,
            data_width: defaults::DATA_WIDTH,
            max_bursts: defaults::MAX_BURSTS,
            control_window: true,
            register_policy: RegisterPolicy::default(),
            dump_payloads: false,
            signals: SignalConfig::default(),
            network: None,
        }
    }
}

/// Names of the model signals the bridge drives and samples.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Main clock input.
    pub clock: String,
    /// Additional clocks toggled together with the main clock.
    pub extra_clocks: Vec<String>,
    /// Active-high reset inputs.
    pub resets: Vec<String>,
    /// Prefix of the AXI-Lite register port (`<prefix>_araddr`, ...).
    pub mmio_prefix: String,
    /// Prefix of the AXI DMA port (`<prefix>_araddr`, ...).
    pub dma_prefix: String,
    /// Interrupt vector output, if the device raises interrupts.
    pub irq: Option<String>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            clock: "clk".to_string(),
            extra_clocks: Vec::new(),
            resets: vec!["rst".to_string()],
            mmio_prefix: "s_axil".to_string(),
            dma_prefix: "m_axi".to_string(),
            irq: None,
        }
    }
}

/// Network port of NIC-like devices.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Prefix of the stream input carrying received packets into the device.
    pub rx_prefix: String,
    /// Prefix of the stream output carrying transmitted frames out of the device.
    pub tx_prefix: String,
    /// Receive queue depth in packets.
    pub rx_queue_packets: usize,
    /// Largest frame assembled or accepted.
    pub max_frame: usize,
    /// Stream data width in bytes.
    pub stream_width: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rx_prefix: "s_axis_rx".to_string(),
            tx_prefix: "m_axis_tx".to_string(),
            rx_queue_packets: defaults::RX_QUEUE_PACKETS,
            max_frame: defaults::MAX_FRAME,
            stream_width: defaults::STREAM_WIDTH,
        }
    }
}

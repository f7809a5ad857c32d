//! Simulator: owns the hardware model, the engines and the transport channels.
//!
//! One call to [`Simulator::tick`] runs one clock cycle:
//! 1. **Sync:** Synchronize every channel at the current tick (bounded retries).
//! 2. **Drain:** Dispatch every inbound message due at or before the current tick,
//!    oldest first across channels.
//! 3. **Falling edge:** Lower the clocks, evaluate, advance half a period.
//! 4. **Rising edge:** Raise the clocks, step the register engine, the DMA engine,
//!    the packet bridge and the interrupt emitter in that order, evaluate.
//! 5. **Apply:** Drive the staged engine outputs, advance half a period.

use tracing::{debug, error, info};

use super::control::{ControlRegisters, TraceAction};
use super::signals::{self, StopFlag};
use crate::axi::{AxiLiteManager, AxiSubordinateRead, AxiSubordinateWrite};
use crate::bus::HardwareModel;
use crate::common::data::Direction;
use crate::common::error::Result;
use crate::config::{Config, NetworkConfig, RegisterPolicy, SignalConfig};
use crate::device::{DeviceAdapter, PcieAdapter};
use crate::dma::{DmaCompletion, DmaEngine};
use crate::irq::InterruptEmitter;
use crate::net::PacketBridge;
use crate::stats::BridgeStats;
use crate::transport::{NetChannel, Outbound, PcieChannel, RetryPolicy};

/// Top-level driver of one device simulation.
pub struct Simulator<M: HardwareModel> {
    pub(super) model: M,
    pub(super) pcie: Box<PcieChannel>,
    pub(super) net: Option<Box<NetChannel>>,
    pub(super) adapter: Box<dyn DeviceAdapter>,
    pub(super) retry: RetryPolicy,

    pub(super) lite: AxiLiteManager,
    pub(super) dma: DmaEngine,
    pub(super) dma_read: AxiSubordinateRead,
    pub(super) dma_write: AxiSubordinateWrite,
    pub(super) packets: Option<PacketBridge>,
    pub(super) irq: Option<InterruptEmitter>,
    pub(super) control: Option<ControlRegisters>,

    pub(super) bar0_len: u64,
    pub(super) policy: RegisterPolicy,
    signals: SignalConfig,
    reset_cycles: u32,
    network: Option<NetworkConfig>,

    pub(super) stats: BridgeStats,
    pub(super) now: u64,
    start_tick: u64,
    half_period: u64,
    pub(super) exiting: bool,
    stop: StopFlag,
}

impl<M: HardwareModel> Simulator<M> {
    /// Creates a simulator for `model` talking PCIe over `pcie`.
    ///
    /// # Arguments
    ///
    /// * `model` - The hardware model.
    /// * `config` - Validated before use.
    /// * `pcie` - Device end of the PCIe link.
    pub fn new(model: M, config: &Config, pcie: Box<PcieChannel>) -> Result<Self> {
        config.validate()?;
        let dev = &config.device;
        let sig = &dev.signals;

        Ok(Self {
            model,
            pcie,
            net: None,
            adapter: Box::new(PcieAdapter::from_config(dev)),
            retry: RetryPolicy::from_config(&config.retry),
            lite: AxiLiteManager::new(&sig.mmio_prefix, dev.register_width),
            dma: DmaEngine::from_config(&config.dma),
            dma_read: AxiSubordinateRead::new(&sig.dma_prefix, dev.data_width, dev.max_bursts),
            dma_write: AxiSubordinateWrite::new(&sig.dma_prefix, dev.data_width, dev.max_bursts),
            packets: None,
            irq: sig.irq.as_deref().map(InterruptEmitter::new),
            control: dev
                .control_window
                .then(|| ControlRegisters::new(config.general.trace_prefix.clone())),
            bar0_len: dev.bar0_len,
            policy: dev.register_policy,
            signals: sig.clone(),
            reset_cycles: config.general.reset_cycles,
            network: dev.network.clone(),
            stats: BridgeStats::default(),
            now: config.general.start_tick,
            start_tick: config.general.start_tick,
            half_period: config.general.half_period_ps().max(1),
            exiting: false,
            stop: StopFlag::new(),
        })
    }

    /// Attaches the network link and enables the packet bridge.
    pub fn with_network(mut self, link: Box<NetChannel>) -> Self {
        let net_config = self.network.clone().unwrap_or_default();
        self.packets = Some(PacketBridge::new(&net_config));
        self.net = Some(link);
        self
    }

    /// Replaces the device adapter.
    pub fn with_adapter(mut self, adapter: Box<dyn DeviceAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    /// Current simulation tick.
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Whether the host asked the simulation to terminate.
    pub const fn exiting(&self) -> bool {
        self.exiting
    }

    /// The hardware model.
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Mutable access to the hardware model.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// A handle that stops [`Simulator::run`] after the current tick.
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Statistics, with the DMA and network counters brought up to date.
    pub fn stats(&self) -> BridgeStats {
        let mut stats = self.stats.clone();
        let dma = self.dma.counters();
        stats.dma_reads = dma.reads;
        stats.dma_writes = dma.writes;
        stats.dma_read_bytes = dma.read_bytes;
        stats.dma_write_bytes = dma.write_bytes;
        if let Some(packets) = &self.packets {
            stats.packets_rx = packets.received();
            stats.packets_dropped = packets.dropped();
            stats.packets_tx = packets.sent();
        }
        stats
    }

    /// Holds the reset signals high for the configured number of cycles.
    ///
    /// Simulation time does not advance during reset.
    pub fn reset(&mut self) {
        let resets = self.signals.resets.clone();
        for name in &resets {
            self.model.set_bit(name, true);
        }
        for _ in 0..self.reset_cycles {
            self.set_clocks(false);
            self.model.eval();
            self.set_clocks(true);
            self.model.eval();
        }
        for name in &resets {
            self.model.set_bit(name, false);
        }
        self.set_clocks(false);
        self.model.eval();
        self.apply();
        self.model.eval();
        debug!(cycles = self.reset_cycles, "reset done");
    }

    /// Runs one clock cycle.
    pub fn tick(&mut self) -> Result<()> {
        if signals::take_report_request() {
            info!(ts = self.now, "main_time");
        }

        self.sync_phase()?;
        self.drain_phase()?;
        if self.exiting {
            return Ok(());
        }
        self.falling_edge();
        self.rising_edge()
    }

    /// Resets the model and ticks until the host terminates or a stop is requested.
    ///
    /// The model is finalized on every exit path.
    pub fn run(&mut self) -> Result<()> {
        info!(device = self.adapter.name(), ts = self.now, half_period = self.half_period, "simulation starting");
        self.reset();
        let result = self.run_loop();
        self.model.finalize();
        match &result {
            Ok(()) => info!(ts = self.now, "simulation finished"),
            Err(err) => error!(ts = self.now, %err, "simulation aborted"),
        }
        result
    }

    fn run_loop(&mut self) -> Result<()> {
        while !self.exiting {
            if self.stop.is_set() || signals::stop_requested() {
                info!(ts = self.now, "stop requested");
                break;
            }
            self.tick()?;
        }
        Ok(())
    }

    fn set_clocks(&mut self, level: bool) {
        self.model.set_bit(&self.signals.clock, level);
        for clock in &self.signals.extra_clocks {
            self.model.set_bit(clock, level);
        }
    }

    fn sync_phase(&mut self) -> Result<()> {
        let mut retries = self.retry.sync(&mut *self.pcie, self.now)?;
        if let Some(net) = self.net.as_mut() {
            retries += self.retry.sync(&mut **net, self.now)?;
        }
        self.stats.sync_retries += retries;
        Ok(())
    }

    /// Dispatches due messages from both channels in timestamp order.
    fn drain_phase(&mut self) -> Result<()> {
        loop {
            let pcie_ts = self.pcie.next_timestamp();
            let net_ts = self.net.as_ref().map_or(u64::MAX, |net| net.next_timestamp());
            if pcie_ts.min(net_ts) > self.now {
                return Ok(());
            }
            if pcie_ts <= net_ts {
                let Some(msg) = self.pcie.poll(self.now) else {
                    return Ok(());
                };
                self.dispatch_pcie(msg)?;
            } else {
                let Some(msg) = self.net.as_mut().and_then(|net| net.poll(self.now)) else {
                    return Ok(());
                };
                self.dispatch_net(msg);
            }
        }
    }

    fn falling_edge(&mut self) {
        self.set_clocks(false);
        self.model.eval();
        self.now += self.half_period;
    }

    fn rising_edge(&mut self) -> Result<()> {
        self.set_clocks(true);

        let mut out = Outbound::new(&mut *self.pcie, self.retry, self.now);

        if let Some(done) = self.lite.step(&self.model) {
            match done.op.direction {
                Direction::Read => self
                    .adapter
                    .register_read_complete(&done, self.lite.width(), &mut out)?,
                Direction::Write => self.adapter.register_write_complete(&done, &mut out)?,
            }
        }

        if let Some(burst) = self.dma_read.step(&self.model)? {
            self.adapter.issue_dma_read(&mut self.dma, &burst, &mut out)?;
        }
        if let Some(burst) = self.dma_write.step(&self.model)? {
            self.adapter.issue_dma_write(&mut self.dma, burst, &mut out)?;
        }
        // Only zero-length operations can finish here; host completions arrive while draining.
        while let Some(done) = self.dma.take_completed() {
            route_completion(&mut self.dma_read, &mut self.dma_write, done)?;
        }

        if let (Some(packets), Some(net)) = (self.packets.as_mut(), self.net.as_mut()) {
            let mut net_out = Outbound::new(&mut **net, self.retry, self.now);
            packets.step(&self.model, &mut net_out)?;
            self.stats.alloc_stalls += net_out.stalls();
        }

        if let Some(irq) = self.irq.as_mut() {
            self.stats.interrupts += u64::from(irq.step(&self.model, &mut out)?);
        }
        self.stats.alloc_stalls += out.stalls();

        self.model.eval();
        self.apply();
        self.now += self.half_period;
        self.stats.cycles += 1;
        self.stats.ticks = self.now - self.start_tick;
        Ok(())
    }

    fn apply(&mut self) {
        self.lite.step_apply(&mut self.model);
        self.dma_read.step_apply(&mut self.model);
        self.dma_write.step_apply(&mut self.model);
        if let Some(packets) = &self.packets {
            packets.step_apply(&mut self.model);
        }
    }

    pub(super) fn apply_trace(&mut self, action: TraceAction) {
        match action {
            TraceAction::Start(path) => self.model.trace_start(&path),
            TraceAction::Stop => self.model.trace_stop(),
        }
    }

    /// Hands finished DMA operations back to the burst engines.
    pub(super) fn route_dma_completions(&mut self) -> Result<()> {
        while let Some(done) = self.dma.take_completed() {
            route_completion(&mut self.dma_read, &mut self.dma_write, done)?;
        }
        Ok(())
    }
}

fn route_completion(
    read: &mut AxiSubordinateRead,
    write: &mut AxiSubordinateWrite,
    done: DmaCompletion,
) -> Result<()> {
    match done.direction {
        Direction::Read => read.read_done(done.opaque, done.data),
        Direction::Write => write.write_done(done.opaque),
    }
}

impl<M: HardwareModel> std::fmt::Debug for Simulator<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("device", &self.adapter.name())
            .field("now", &self.now)
            .field("exiting", &self.exiting)
            .field("dma", &self.dma)
            .finish_non_exhaustive()
    }
}

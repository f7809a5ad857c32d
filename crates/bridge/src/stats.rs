//! Bridge statistics collection and reporting.
//!
//! This module tracks what crossed the bridge during a run. It provides:
//! 1. **Time:** Ticks advanced, clock cycles evaluated and host wall time.
//! 2. **Register traffic:** MMIO reads and writes served through the register window.
//! 3. **DMA traffic:** Sub-operation messages issued per direction and bytes moved.
//! 4. **Network:** Packets received, dropped on a full queue, and transmitted.
//! 5. **Transport:** Interrupts raised, outbound allocation stalls and sync retries.

use std::time::Instant;

/// Bridge statistics structure.
///
/// Counters are plain public fields bumped by the simulator and its engines; the
/// report is printed once at shutdown.
#[derive(Clone, Debug)]
pub struct BridgeStats {
    start_time: Instant,
    /// Simulation ticks (picoseconds) advanced since start.
    pub ticks: u64,
    /// Rising clock edges evaluated.
    pub cycles: u64,

    /// Register reads received from the host.
    pub mmio_reads: u64,
    /// Register writes received from the host.
    pub mmio_writes: u64,
    /// Register writes that were posted.
    pub mmio_posted_writes: u64,

    /// DMA read sub-operations sent to the host.
    pub dma_reads: u64,
    /// DMA write sub-operations sent to the host.
    pub dma_writes: u64,
    /// Bytes requested by DMA reads.
    pub dma_read_bytes: u64,
    /// Bytes carried by DMA writes.
    pub dma_write_bytes: u64,

    /// Interrupt messages emitted.
    pub interrupts: u64,

    /// Packets delivered into the receive queue.
    pub packets_rx: u64,
    /// Packets dropped because the receive queue was full.
    pub packets_dropped: u64,
    /// Frames transmitted by the device.
    pub packets_tx: u64,

    /// Outbound sends that found the channel full at least once.
    pub alloc_stalls: u64,
    /// Failed synchronization attempts that were retried.
    pub sync_retries: u64,
}

impl Default for BridgeStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            ticks: 0,
            cycles: 0,
            mmio_reads: 0,
            mmio_writes: 0,
            mmio_posted_writes: 0,
            dma_reads: 0,
            dma_writes: 0,
            dma_read_bytes: 0,
            dma_write_bytes: 0,
            interrupts: 0,
            packets_rx: 0,
            packets_dropped: 0,
            packets_tx: 0,
            alloc_stalls: 0,
            sync_retries: 0,
        }
    }
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"mmio"`, `"dma"`, `"network"`, `"transport"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "mmio", "dma", "network", "transport"];

impl BridgeStats {
    /// Host seconds elapsed since the statistics were created.
    pub fn host_seconds(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// # Arguments
    ///
    /// * `sections` - Slice of section names to print, or empty for all.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let seconds = self.host_seconds().max(f64::EPSILON);

        if want("summary") {
            let khz = (self.cycles as f64 / seconds) / 1000.0;
            println!("\n==========================================================");
            println!("RTL BRIDGE STATISTICS");
            println!("==========================================================");
            println!("host_seconds             {seconds:.4} s");
            println!("sim_ticks                {}", self.ticks);
            println!("sim_cycles               {}", self.cycles);
            println!("sim_freq                 {khz:.2} kHz");
            println!("----------------------------------------------------------");
        }
        if want("mmio") {
            println!("REGISTER ACCESS");
            println!("  mmio.reads             {}", self.mmio_reads);
            println!("  mmio.writes            {}", self.mmio_writes);
            println!("  mmio.posted            {}", self.mmio_posted_writes);
            println!("----------------------------------------------------------");
        }
        if want("dma") {
            println!("DMA");
            println!(
                "  dma.reads              {} ({} bytes)",
                self.dma_reads, self.dma_read_bytes
            );
            println!(
                "  dma.writes             {} ({} bytes)",
                self.dma_writes, self.dma_write_bytes
            );
            println!("  irq.messages           {}", self.interrupts);
            println!("----------------------------------------------------------");
        }
        if want("network") {
            let offered = self.packets_rx + self.packets_dropped;
            let drop_rate = if offered > 0 {
                100.0 * (self.packets_dropped as f64 / offered as f64)
            } else {
                0.0
            };
            println!("NETWORK");
            println!("  net.rx                 {}", self.packets_rx);
            println!(
                "  net.rx_dropped         {} ({drop_rate:.2}%)",
                self.packets_dropped
            );
            println!("  net.tx                 {}", self.packets_tx);
            println!("----------------------------------------------------------");
        }
        if want("transport") {
            println!("TRANSPORT");
            println!("  out.alloc_stalls       {}", self.alloc_stalls);
            println!("  sync.retries           {}", self.sync_retries);
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}

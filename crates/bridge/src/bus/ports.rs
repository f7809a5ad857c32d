//! AXI port wire-name sets.
//!
//! Verilated models expose each bus as a group of top-level wires sharing a prefix,
//! e.g. `s_axil_araddr`. The structs here precompute those names once so the engines
//! do not format strings on every clock edge.

fn wire(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}_{name}")
    }
}

/// Wires of an AXI-Lite subordinate port (driven by the bridge as manager).
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct AxiLitePort {
    pub awaddr: String,
    pub awvalid: String,
    pub awready: String,
    pub wdata: String,
    pub wstrb: String,
    pub wvalid: String,
    pub wready: String,
    pub bresp: String,
    pub bvalid: String,
    pub bready: String,
    pub araddr: String,
    pub arvalid: String,
    pub arready: String,
    pub rdata: String,
    pub rresp: String,
    pub rvalid: String,
    pub rready: String,
}

impl AxiLitePort {
    /// Builds the wire names for `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            awaddr: wire(prefix, "awaddr"),
            awvalid: wire(prefix, "awvalid"),
            awready: wire(prefix, "awready"),
            wdata: wire(prefix, "wdata"),
            wstrb: wire(prefix, "wstrb"),
            wvalid: wire(prefix, "wvalid"),
            wready: wire(prefix, "wready"),
            bresp: wire(prefix, "bresp"),
            bvalid: wire(prefix, "bvalid"),
            bready: wire(prefix, "bready"),
            araddr: wire(prefix, "araddr"),
            arvalid: wire(prefix, "arvalid"),
            arready: wire(prefix, "arready"),
            rdata: wire(prefix, "rdata"),
            rresp: wire(prefix, "rresp"),
            rvalid: wire(prefix, "rvalid"),
            rready: wire(prefix, "rready"),
        }
    }
}

/// Read-address and read-data channels of an AXI manager port on the device.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct AxiReadPort {
    pub arid: String,
    pub araddr: String,
    pub arlen: String,
    pub arsize: String,
    pub arburst: String,
    pub arvalid: String,
    pub arready: String,
    pub rid: String,
    pub rdata: String,
    pub rresp: String,
    pub rlast: String,
    pub rvalid: String,
    pub rready: String,
}

impl AxiReadPort {
    /// Builds the wire names for `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            arid: wire(prefix, "arid"),
            araddr: wire(prefix, "araddr"),
            arlen: wire(prefix, "arlen"),
            arsize: wire(prefix, "arsize"),
            arburst: wire(prefix, "arburst"),
            arvalid: wire(prefix, "arvalid"),
            arready: wire(prefix, "arready"),
            rid: wire(prefix, "rid"),
            rdata: wire(prefix, "rdata"),
            rresp: wire(prefix, "rresp"),
            rlast: wire(prefix, "rlast"),
            rvalid: wire(prefix, "rvalid"),
            rready: wire(prefix, "rready"),
        }
    }
}

/// Write-address, write-data and write-response channels of an AXI manager port.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct AxiWritePort {
    pub awid: String,
    pub awaddr: String,
    pub awlen: String,
    pub awsize: String,
    pub awburst: String,
    pub awvalid: String,
    pub awready: String,
    pub wdata: String,
    pub wstrb: String,
    pub wlast: String,
    pub wvalid: String,
    pub wready: String,
    pub bid: String,
    pub bresp: String,
    pub bvalid: String,
    pub bready: String,
}

impl AxiWritePort {
    /// Builds the wire names for `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            awid: wire(prefix, "awid"),
            awaddr: wire(prefix, "awaddr"),
            awlen: wire(prefix, "awlen"),
            awsize: wire(prefix, "awsize"),
            awburst: wire(prefix, "awburst"),
            awvalid: wire(prefix, "awvalid"),
            awready: wire(prefix, "awready"),
            wdata: wire(prefix, "wdata"),
            wstrb: wire(prefix, "wstrb"),
            wlast: wire(prefix, "wlast"),
            wvalid: wire(prefix, "wvalid"),
            wready: wire(prefix, "wready"),
            bid: wire(prefix, "bid"),
            bresp: wire(prefix, "bresp"),
            bvalid: wire(prefix, "bvalid"),
            bready: wire(prefix, "bready"),
        }
    }
}

/// Wires of one AXI-Stream interface.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct AxiStreamPort {
    pub tdata: String,
    pub tkeep: String,
    pub tlast: String,
    pub tvalid: String,
    pub tready: String,
}

impl AxiStreamPort {
    /// Builds the wire names for `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            tdata: wire(prefix, "tdata"),
            tkeep: wire(prefix, "tkeep"),
            tlast: wire(prefix, "tlast"),
            tvalid: wire(prefix, "tvalid"),
            tready: wire(prefix, "tready"),
        }
    }
}

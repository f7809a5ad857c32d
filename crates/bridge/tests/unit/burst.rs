//! AXI burst subordinate tests.
//!
//! The device side of the port is played by hand through a `SignalStore`.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rtlbridge_core::BridgeError;
use rtlbridge_core::axi::{AxiSubordinateRead, AxiSubordinateWrite, BurstRead, BurstWrite};
use rtlbridge_core::bus::{HardwareModel, SignalStore};
use rtlbridge_core::common::Direction;
use rtlbridge_core::common::constants::{AXI_BURST_FIXED, AXI_BURST_INCR, AXI_BURST_WRAP};

fn present_read(store: &mut SignalStore, id: u64, addr: u64, len: u64, size: u64) {
    store.set("m_axi_arid", id);
    store.set("m_axi_araddr", addr);
    store.set("m_axi_arlen", len);
    store.set("m_axi_arsize", size);
    store.set("m_axi_arburst", u64::from(AXI_BURST_INCR));
    store.set_bit("m_axi_arvalid", true);
}

fn present_write(store: &mut SignalStore, id: u64, addr: u64, len: u64, size: u64) {
    store.set("m_axi_awid", id);
    store.set("m_axi_awaddr", addr);
    store.set("m_axi_awlen", len);
    store.set("m_axi_awsize", size);
    store.set("m_axi_awburst", u64::from(AXI_BURST_INCR));
    store.set_bit("m_axi_awvalid", true);
}

fn step_read(rd: &mut AxiSubordinateRead, store: &mut SignalStore) -> Option<BurstRead> {
    let accepted = rd.step(store).unwrap();
    rd.step_apply(store);
    accepted
}

fn step_write(wr: &mut AxiSubordinateWrite, store: &mut SignalStore) -> Option<BurstWrite> {
    let finished = wr.step(store).unwrap();
    wr.step_apply(store);
    finished
}

fn rdata(store: &SignalStore) -> Vec<u8> {
    store.bytes("m_axi_rdata").unwrap().to_vec()
}

/// Accepts one read burst and returns it, leaving `arvalid` low.
fn accept_read(rd: &mut AxiSubordinateRead, store: &mut SignalStore, id: u64, addr: u64, len: u64, size: u64) -> BurstRead {
    present_read(store, id, addr, len, size);
    let burst = match step_read(rd, store) {
        Some(burst) => burst,
        None => step_read(rd, store).unwrap(),
    };
    store.set_bit("m_axi_arvalid", false);
    burst
}

// ══════════════════════════════════════════════════════════
// 1. Read channel
// ══════════════════════════════════════════════════════════

#[test]
fn read_burst_accepted_once_arready_is_driven() {
    let mut store = SignalStore::new();
    let mut rd = AxiSubordinateRead::new("m_axi", 4, 4);
    present_read(&mut store, 5, 0x100, 3, 2);

    assert!(step_read(&mut rd, &mut store).is_none(), "arready starts low");
    assert!(store.get_bit("m_axi_arready"));

    let burst = step_read(&mut rd, &mut store).unwrap();
    assert_eq!(
        burst,
        BurstRead {
            tag: 0,
            id: 5,
            addr: 0x100,
            len: 16,
        }
    );
    assert_eq!(rd.outstanding(), 1);
}

#[test]
fn read_beats_follow_host_data() {
    let mut store = SignalStore::new();
    let mut rd = AxiSubordinateRead::new("m_axi", 4, 4);
    let burst = accept_read(&mut rd, &mut store, 5, 0x100, 3, 2);

    let _ = step_read(&mut rd, &mut store);
    assert!(!store.get_bit("m_axi_rvalid"), "no data before the host answers");

    rd.read_done(burst.tag, (0u8..16).collect()).unwrap();
    let _ = step_read(&mut rd, &mut store);
    store.set_bit("m_axi_rready", true);

    let mut beats = Vec::new();
    let mut lasts = Vec::new();
    while store.get_bit("m_axi_rvalid") {
        assert_eq!(store.get("m_axi_rid"), 5);
        beats.extend(rdata(&store));
        lasts.push(store.get_bit("m_axi_rlast"));
        let _ = step_read(&mut rd, &mut store);
    }
    assert_eq!(beats, (0u8..16).collect::<Vec<_>>());
    assert_eq!(lasts, vec![false, false, false, true]);
    assert_eq!(rd.outstanding(), 0);
}

#[test]
fn read_beat_waits_for_rready() {
    let mut store = SignalStore::new();
    let mut rd = AxiSubordinateRead::new("m_axi", 4, 4);
    let burst = accept_read(&mut rd, &mut store, 1, 0x0, 1, 2);
    rd.read_done(burst.tag, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

    for _ in 0..3 {
        let _ = step_read(&mut rd, &mut store);
        assert_eq!(rdata(&store), vec![1, 2, 3, 4]);
    }
    store.set_bit("m_axi_rready", true);
    let _ = step_read(&mut rd, &mut store);
    assert_eq!(rdata(&store), vec![5, 6, 7, 8]);
}

#[test]
fn narrow_read_beats_use_their_address_lane() {
    let mut store = SignalStore::new();
    let mut rd = AxiSubordinateRead::new("m_axi", 4, 4);
    let burst = accept_read(&mut rd, &mut store, 0, 0x102, 1, 1);
    assert_eq!(burst.len, 4);

    rd.read_done(burst.tag, vec![0xa, 0xb, 0xc, 0xd]).unwrap();
    let _ = step_read(&mut rd, &mut store);
    assert_eq!(rdata(&store), vec![0, 0, 0xa, 0xb]);

    store.set_bit("m_axi_rready", true);
    let _ = step_read(&mut rd, &mut store);
    assert_eq!(rdata(&store), vec![0xc, 0xd, 0, 0]);
}

#[test]
fn same_id_bursts_return_in_order() {
    let mut store = SignalStore::new();
    let mut rd = AxiSubordinateRead::new("m_axi", 4, 4);
    let first = accept_read(&mut rd, &mut store, 1, 0x0, 0, 2);
    let second = accept_read(&mut rd, &mut store, 1, 0x10, 0, 2);
    let other = accept_read(&mut rd, &mut store, 2, 0x20, 0, 2);

    rd.read_done(second.tag, vec![2; 4]).unwrap();
    let _ = step_read(&mut rd, &mut store);
    assert!(!store.get_bit("m_axi_rvalid"), "id 1 must wait for its older burst");

    rd.read_done(other.tag, vec![3; 4]).unwrap();
    let _ = step_read(&mut rd, &mut store);
    assert!(store.get_bit("m_axi_rvalid"));
    assert_eq!(store.get("m_axi_rid"), 2);

    store.set_bit("m_axi_rready", true);
    rd.read_done(first.tag, vec![1; 4]).unwrap();
    let mut order = Vec::new();
    for _ in 0..6 {
        if store.get_bit("m_axi_rvalid") {
            order.push(rdata(&store)[0]);
        }
        let _ = step_read(&mut rd, &mut store);
    }
    assert_eq!(order, vec![3, 1, 2]);
}

#[test]
fn arready_drops_at_max_pending() {
    let mut store = SignalStore::new();
    let mut rd = AxiSubordinateRead::new("m_axi", 4, 1);
    let _ = accept_read(&mut rd, &mut store, 0, 0x0, 0, 2);
    assert!(!store.get_bit("m_axi_arready"));

    present_read(&mut store, 1, 0x40, 0, 2);
    assert!(step_read(&mut rd, &mut store).is_none());
    assert_eq!(rd.outstanding(), 1);
}

#[rstest]
#[case::fixed(AXI_BURST_FIXED)]
#[case::wrap(AXI_BURST_WRAP)]
#[case::reserved(0b11)]
fn non_incrementing_burst_is_rejected(#[case] kind: u8) {
    let mut store = SignalStore::new();
    let mut rd = AxiSubordinateRead::new("m_axi", 4, 4);
    present_read(&mut store, 0, 0x0, 3, 2);
    store.set("m_axi_arburst", u64::from(kind));
    let _ = step_read(&mut rd, &mut store);

    let err = rd.step(&store).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::UnsupportedBurst {
            burst,
            direction: Direction::Read,
        } if burst == kind
    ));
}

#[test]
fn beat_wider_than_bus_is_rejected() {
    let mut store = SignalStore::new();
    let mut rd = AxiSubordinateRead::new("m_axi", 4, 4);
    present_read(&mut store, 0, 0x0, 0, 3);
    let _ = step_read(&mut rd, &mut store);

    let err = rd.step(&store).unwrap_err();
    assert!(matches!(err, BridgeError::BeatTooWide { beat: 8, width: 4 }));
}

#[test]
fn read_done_for_unknown_tag_is_fatal() {
    let mut rd = AxiSubordinateRead::new("m_axi", 4, 4);
    assert!(matches!(
        rd.read_done(9, vec![0; 4]),
        Err(BridgeError::UnexpectedBusResponse(_))
    ));
}

// ══════════════════════════════════════════════════════════
// 2. Write channel
// ══════════════════════════════════════════════════════════

/// Accepts one write burst, leaving `awvalid` low and `wready` driven.
fn accept_write(wr: &mut AxiSubordinateWrite, store: &mut SignalStore, id: u64, addr: u64, len: u64) {
    present_write(store, id, addr, len, 2);
    let _ = step_write(wr, store);
    if wr.outstanding() == 0 {
        let _ = step_write(wr, store);
    }
    store.set_bit("m_axi_awvalid", false);
}

fn present_beat(store: &mut SignalStore, data: [u8; 4], strb: u64, last: bool) {
    store.write("m_axi_wdata", &data);
    store.set("m_axi_wstrb", strb);
    store.set_bit("m_axi_wlast", last);
    store.set_bit("m_axi_wvalid", true);
}

#[test]
fn write_burst_collects_strobed_beats() {
    let mut store = SignalStore::new();
    let mut wr = AxiSubordinateWrite::new("m_axi", 4, 4);
    accept_write(&mut wr, &mut store, 3, 0x200, 1);
    assert_eq!(wr.outstanding(), 1);
    assert!(store.get_bit("m_axi_wready"));

    present_beat(&mut store, [1, 2, 3, 4], 0b1011, false);
    assert!(step_write(&mut wr, &mut store).is_none());

    present_beat(&mut store, [5, 6, 7, 8], 0xf, true);
    let burst = step_write(&mut wr, &mut store).unwrap();
    assert_eq!(
        burst,
        BurstWrite {
            tag: 0,
            id: 3,
            addr: 0x200,
            data: vec![1, 2, 0, 4, 5, 6, 7, 8],
        }
    );
    assert!(!store.get_bit("m_axi_wready"), "no burst left to receive data");
}

#[test]
fn early_wlast_truncates_the_burst() {
    let mut store = SignalStore::new();
    let mut wr = AxiSubordinateWrite::new("m_axi", 4, 4);
    accept_write(&mut wr, &mut store, 0, 0x0, 3);

    present_beat(&mut store, [9; 4], 0xf, true);
    let burst = step_write(&mut wr, &mut store).unwrap();
    assert_eq!(burst.data, vec![9; 4]);
}

#[test]
fn b_response_waits_for_host_acknowledge() {
    let mut store = SignalStore::new();
    let mut wr = AxiSubordinateWrite::new("m_axi", 4, 4);
    accept_write(&mut wr, &mut store, 6, 0x0, 0);
    present_beat(&mut store, [1; 4], 0xf, true);
    let burst = step_write(&mut wr, &mut store).unwrap();
    store.set_bit("m_axi_wvalid", false);

    let _ = step_write(&mut wr, &mut store);
    assert!(!store.get_bit("m_axi_bvalid"));

    wr.write_done(burst.tag).unwrap();
    let _ = step_write(&mut wr, &mut store);
    assert!(store.get_bit("m_axi_bvalid"));
    assert_eq!(store.get("m_axi_bid"), 6);
    assert_eq!(store.get("m_axi_bresp"), 0);

    store.set_bit("m_axi_bready", true);
    let _ = step_write(&mut wr, &mut store);
    assert!(!store.get_bit("m_axi_bvalid"));
    assert_eq!(wr.outstanding(), 0);
}

#[test]
fn write_done_before_data_phase_is_fatal() {
    let mut store = SignalStore::new();
    let mut wr = AxiSubordinateWrite::new("m_axi", 4, 4);
    accept_write(&mut wr, &mut store, 0, 0x0, 1);
    assert!(matches!(
        wr.write_done(0),
        Err(BridgeError::UnexpectedBusResponse(_))
    ));
    assert!(wr.write_done(42).is_err());
}

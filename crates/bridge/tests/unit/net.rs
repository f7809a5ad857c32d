//! Packet bridge and AXI-Stream endpoint tests.

use pretty_assertions::assert_eq;
use rtlbridge_core::BridgeError;
use rtlbridge_core::axi::{AxiStreamManager, AxiStreamSubordinate};
use rtlbridge_core::bus::{HardwareModel, SignalStore};
use rtlbridge_core::config::NetworkConfig;
use rtlbridge_core::net::PacketBridge;
use rtlbridge_core::transport::NetMsg;

use crate::common::mocks::sink::RecordingSink;

// ══════════════════════════════════════════════════════════
// 1. Stream manager
// ══════════════════════════════════════════════════════════

#[test]
fn manager_splits_packet_into_beats() {
    let mut store = SignalStore::new();
    let mut tx = AxiStreamManager::new("s_axis_rx", 8, 4);
    tx.try_push((1..=10).collect()).unwrap();
    store.set_bit("s_axis_rx_tready", true);

    let mut beats = Vec::new();
    for _ in 0..4 {
        tx.step(&store);
        tx.step_apply(&mut store);
        if store.get_bit("s_axis_rx_tvalid") {
            beats.push((
                store.bytes("s_axis_rx_tdata").unwrap().to_vec(),
                store.get("s_axis_rx_tkeep"),
                store.get_bit("s_axis_rx_tlast"),
            ));
        }
    }
    assert_eq!(
        beats,
        vec![
            (vec![1, 2, 3, 4, 5, 6, 7, 8], 0xff, false),
            (vec![9, 10, 0, 0, 0, 0, 0, 0], 0x03, true),
        ]
    );
    assert!(tx.is_empty());
}

#[test]
fn manager_holds_beat_without_tready() {
    let mut store = SignalStore::new();
    let mut tx = AxiStreamManager::new("s_axis_rx", 8, 4);
    tx.try_push(vec![0xaa; 12]).unwrap();
    for _ in 0..5 {
        tx.step(&store);
        tx.step_apply(&mut store);
        assert_eq!(store.get("s_axis_rx_tkeep"), 0xff);
        assert!(!store.get_bit("s_axis_rx_tlast"));
    }
    assert_eq!(tx.len(), 1);
}

#[test]
fn manager_refuses_packets_beyond_capacity() {
    let mut tx = AxiStreamManager::new("s_axis_rx", 8, 2);
    tx.try_push(vec![1]).unwrap();
    tx.try_push(vec![2]).unwrap();
    assert!(tx.is_full());
    assert_eq!(tx.try_push(vec![3]), Err(vec![3]));
    assert_eq!(tx.len(), 2);
}

// ══════════════════════════════════════════════════════════
// 2. Stream subordinate
// ══════════════════════════════════════════════════════════

fn present(store: &mut SignalStore, data: &[u8], keep: u64, last: bool) {
    store.write("m_axis_tx_tdata", data);
    store.set("m_axis_tx_tkeep", keep);
    store.set_bit("m_axis_tx_tlast", last);
    store.set_bit("m_axis_tx_tvalid", true);
}

#[test]
fn subordinate_assembles_kept_bytes_until_tlast() {
    let mut store = SignalStore::new();
    store.declare("m_axis_tx_tdata", 4);
    let mut rx = AxiStreamSubordinate::new("m_axis_tx", 4, 64);

    assert_eq!(rx.step(&store).unwrap(), None);
    rx.step_apply(&mut store);
    assert!(store.get_bit("m_axis_tx_tready"));

    present(&mut store, &[1, 2, 3, 4], 0xf, false);
    assert_eq!(rx.step(&store).unwrap(), None);
    present(&mut store, &[5, 6, 7, 8], 0b0011, true);
    assert_eq!(rx.step(&store).unwrap(), Some(vec![1, 2, 3, 4, 5, 6]));
}

#[test]
fn subordinate_ignores_beats_before_ready() {
    let mut store = SignalStore::new();
    let mut rx = AxiStreamSubordinate::new("m_axis_tx", 4, 64);
    present(&mut store, &[1, 2, 3, 4], 0xf, true);
    assert_eq!(rx.step(&store).unwrap(), None, "tready was not driven yet");
    assert_eq!(rx.step(&store).unwrap(), Some(vec![1, 2, 3, 4]));
}

#[test]
fn subordinate_rejects_oversized_frame() {
    let mut store = SignalStore::new();
    let mut rx = AxiStreamSubordinate::new("m_axis_tx", 4, 6);
    let _ = rx.step(&store).unwrap();
    present(&mut store, &[0; 4], 0xf, false);
    let _ = rx.step(&store).unwrap();
    assert!(matches!(
        rx.step(&store),
        Err(BridgeError::FrameTooLarge { len: 8, max: 6 })
    ));
}

// ══════════════════════════════════════════════════════════
// 3. Packet bridge
// ══════════════════════════════════════════════════════════

fn small_queue() -> NetworkConfig {
    NetworkConfig {
        rx_queue_packets: 2,
        ..NetworkConfig::default()
    }
}

#[test]
fn full_receive_queue_drops_packet() {
    let mut bridge = PacketBridge::new(&small_queue());
    assert!(bridge.deliver(vec![1; 60]));
    assert!(bridge.deliver(vec![2; 60]));
    assert!(!bridge.deliver(vec![3; 60]));

    assert_eq!(bridge.rx_queued(), 2);
    assert_eq!(bridge.received(), 2);
    assert_eq!(bridge.dropped(), 1);
}

#[test]
fn device_frame_becomes_packet_message() {
    let mut store = SignalStore::new();
    let mut bridge = PacketBridge::new(&NetworkConfig::default());
    let mut sink = RecordingSink::<NetMsg>::new();

    bridge.step(&store, &mut sink).unwrap();
    bridge.step_apply(&mut store);

    present(&mut store, &[0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 0], 0x0f, true);
    bridge.step(&store, &mut sink).unwrap();

    assert_eq!(sink.sent, vec![NetMsg::Packet(vec![0xde, 0xad, 0xbe, 0xef])]);
    assert_eq!(bridge.sent(), 1);
}

#[test]
fn frame_over_channel_payload_limit_is_fatal() {
    let mut store = SignalStore::new();
    let mut bridge = PacketBridge::new(&NetworkConfig::default());
    let mut sink = RecordingSink::<NetMsg>::with_limits(16, 4096);

    bridge.step(&store, &mut sink).unwrap();
    bridge.step_apply(&mut store);
    present(&mut store, &[0x11; 8], 0xff, false);
    bridge.step(&store, &mut sink).unwrap();
    present(&mut store, &[0x22; 8], 0xff, false);
    bridge.step(&store, &mut sink).unwrap();
    present(&mut store, &[0x33; 8], 0xff, true);

    assert!(matches!(
        bridge.step(&store, &mut sink),
        Err(BridgeError::PayloadTooLarge {
            what: "network frame",
            len: 24,
            max: 16,
        })
    ));
    assert!(sink.sent.is_empty());
    assert_eq!(bridge.sent(), 0);
}

//! PCIe device adapter tests.

use pretty_assertions::assert_eq;
use rtlbridge_core::axi::{BurstRead, BurstWrite, RegisterCompletion};
use rtlbridge_core::common::{Direction, RegisterOp};
use rtlbridge_core::device::{hex_dump, DeviceAdapter, PcieAdapter};
use rtlbridge_core::dma::DmaEngine;
use rtlbridge_core::transport::D2hMsg;

use crate::common::mocks::sink::RecordingSink;

fn completion(op: RegisterOp, data: u64) -> RegisterCompletion {
    RegisterCompletion { op, data, resp: 0 }
}

#[test]
fn register_read_answers_with_request_id_and_bus_data() {
    let mut adapter = PcieAdapter::new("nic", false);
    let mut sink = RecordingSink::<D2hMsg>::new();
    adapter
        .register_read_complete(&completion(RegisterOp::read(7, 0x10), 0x1122_3344), 4, &mut sink)
        .unwrap();

    assert_eq!(
        sink.sent,
        vec![D2hMsg::ReadComp {
            req_id: 7,
            data: vec![0x44, 0x33, 0x22, 0x11],
        }]
    );
}

#[test]
fn posted_write_is_not_answered() {
    let mut adapter = PcieAdapter::new("nic", false);
    let mut sink = RecordingSink::<D2hMsg>::new();
    adapter
        .register_write_complete(&completion(RegisterOp::write(1, 0x0, 5, true), 0), &mut sink)
        .unwrap();
    adapter
        .register_write_complete(&completion(RegisterOp::write(2, 0x4, 5, false), 0), &mut sink)
        .unwrap();

    assert_eq!(sink.sent, vec![D2hMsg::WriteComp { req_id: 2 }]);
}

#[test]
fn bursts_become_dma_operations_tagged_with_the_burst() {
    let mut adapter = PcieAdapter::new("nic", true);
    let mut dma = DmaEngine::new(4096, 16);
    let mut sink = RecordingSink::<D2hMsg>::new();

    let read = BurstRead {
        tag: 11,
        id: 0,
        addr: 0x8000,
        len: 64,
    };
    adapter.issue_dma_read(&mut dma, &read, &mut sink).unwrap();
    let write = BurstWrite {
        tag: 12,
        id: 1,
        addr: 0x9000,
        data: vec![0xab; 8],
    };
    adapter.issue_dma_write(&mut dma, write, &mut sink).unwrap();

    assert_eq!(
        sink.take(),
        vec![
            D2hMsg::Read {
                req_id: 1,
                addr: 0x8000,
                len: 64,
            },
            D2hMsg::Write {
                req_id: 2,
                addr: 0x9000,
                data: vec![0xab; 8],
            },
        ]
    );

    dma.handle_read_completion(1, &[0; 64], &mut sink).unwrap();
    dma.handle_write_completion(2, &mut sink).unwrap();
    let first = dma.take_completed().unwrap();
    let second = dma.take_completed().unwrap();
    assert_eq!((first.opaque, first.direction), (11, Direction::Read));
    assert_eq!((second.opaque, second.direction), (12, Direction::Write));
    assert_eq!(adapter.name(), "nic");
}

#[test]
fn hex_dump_prints_sixteen_bytes_per_line() {
    let data: Vec<u8> = (0..20).collect();
    assert_eq!(
        hex_dump(0x1000, &data),
        "0000000000001000: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f\n\
         0000000000001010: 10 11 12 13\n"
    );
}

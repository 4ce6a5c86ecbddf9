use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hex_literal::hex;
use virtrpc::{
    proto::{ErrorRecord, SchedParam},
    expected_message_len, unwrap_frame, Envelope, FrameWriter, DIRECTION_CALL, REMOTE_PROGRAM,
    REMOTE_PROTOCOL_VERSION, STATUS_OK,
};

pub fn envelope(c: &mut Criterion) {
    c.bench_function("deserialise_envelope", |b| {
        let raw = hex!(
            "20008086 00000001 0000003b 00000000 00000007 00000000"
        );

        b.iter(|| {
            let e = Envelope::from_cursor(&mut Cursor::new(raw.as_slice())).unwrap();
            black_box(e)
        })
    });

    c.bench_function("frame_call", |b| {
        let envelope = Envelope {
            program: REMOTE_PROGRAM,
            version: REMOTE_PROTOCOL_VERSION,
            procedure: 59,
            direction: DIRECTION_CALL,
            serial: 7,
            status: STATUS_OK,
        };

        b.iter(|| {
            let mut frame = FrameWriter::new();
            envelope.serialise_into(frame.cursor()).unwrap();
            black_box(frame.finish().unwrap())
        })
    });

    c.bench_function("parse_frame", |b| {
        let raw = hex!(
            "0000001c 20008086 00000001 0000003b 00000000 00000007 00000000"
        );

        b.iter(|| {
            assert_eq!(expected_message_len(raw.as_ref()).unwrap(), 28);
            let body = unwrap_frame(raw.as_ref()).unwrap();
            let e = Envelope::from_cursor(&mut Cursor::new(body)).unwrap();
            black_box(e)
        })
    });
}

pub fn bodies(c: &mut Criterion) {
    c.bench_function("deserialise_sched_param", |b| {
        // field "weight", UINT 256.
        let raw = hex!("00000006 776569676874 00000002 00000100");

        b.iter(|| {
            let p = SchedParam::from_cursor(&mut Cursor::new(raw.as_slice())).unwrap();
            black_box(p)
        })
    });

    c.bench_function("serialise_error_record", |b| {
        let rec = ErrorRecord::rpc("authentication required");

        b.iter(|| {
            let mut buf = Vec::with_capacity(128);
            rec.serialise_into(&mut buf).unwrap();
            black_box(buf)
        })
    });
}

criterion_group!(benches, envelope, bodies);
criterion_main!(benches);

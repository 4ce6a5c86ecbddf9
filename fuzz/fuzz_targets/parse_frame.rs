#![no_main]
use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use virtrpc::{unwrap_frame, Envelope, FrameWriter};

fuzz_target!(|data: &[u8]| {
    let Ok(body) = unwrap_frame(data) else { return };
    let mut c = Cursor::new(body);

    if let Ok(envelope) = Envelope::from_cursor(&mut c) {
        let rest = &body[c.position() as usize..];

        let mut frame = FrameWriter::new();
        envelope
            .serialise_into(frame.cursor())
            .expect("should be able to serialise");
        std::io::Write::write_all(frame.cursor(), rest).expect("should be able to serialise");
        let buf = frame.finish().expect("a parsed frame must re-frame");

        assert_eq!(buf.as_slice(), data);
    }
});

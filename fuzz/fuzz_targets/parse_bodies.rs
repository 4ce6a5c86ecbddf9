#![no_main]
use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use virtrpc::proto::{ErrorRecord, SchedParam};

fuzz_target!(|data: &[u8]| {
    if let Ok(p) = SchedParam::from_cursor(&mut Cursor::new(data)) {
        let mut buf = Vec::new();
        p.serialise_into(&mut buf).expect("should be able to serialise");
        let got = SchedParam::from_cursor(&mut Cursor::new(buf.as_slice())).expect("must be valid");
        // NaN payloads do not compare equal; everything else must.
        if !matches!(p.value, virtrpc::proto::SchedValue::Double(d) if d.is_nan()) {
            assert_eq!(p, got);
        }
    }

    if let Ok(e) = ErrorRecord::from_cursor(&mut Cursor::new(data)) {
        let mut buf = Vec::new();
        e.serialise_into(&mut buf).expect("should be able to serialise");
        let got =
            ErrorRecord::from_cursor(&mut Cursor::new(buf.as_slice())).expect("must be valid");
        assert_eq!(e, got);
    }
});

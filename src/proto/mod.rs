//! Wire bodies of the protocol: object references, the error record, the
//! scheduler parameter union, and the per-procedure argument and return
//! structures.
//!
//! Every type carries a symmetric `from_cursor`/`serialise_into` pair so a
//! server, a client and the tests can all round-trip it. Argument
//! structures borrow their strings and byte arrays from the request buffer;
//! return structures own their payloads, which are serialised and dropped
//! by the reply encoder.

use std::io::{Cursor, Write};

use crate::{
    limits::REMOTE_AUTH_SASL_DATA_MAX,
    wire::{read_opaque, read_presence, write_opaque, write_presence},
    Error,
};

mod error;
pub use error::*;

mod refs;
pub use refs::*;

mod sched;
pub use sched::*;

mod args;
pub use args::*;

mod rets;
pub use rets::*;

/// Reads a SASL exchange payload: a `nil` flag followed by a bounded byte
/// array.
///
/// `nil = 1` means "no payload" and maps to `None`; it is distinct from a
/// present zero-length payload, and both forms are forwarded exactly.
pub(crate) fn read_sasl_data<'a>(r: &mut Cursor<&'a [u8]>) -> Result<Option<&'a [u8]>, Error> {
    let nil = read_presence(r)?;
    let data = read_opaque(r, REMOTE_AUTH_SASL_DATA_MAX, "data", "REMOTE_AUTH_SASL_DATA_MAX")?;

    Ok(if nil { None } else { Some(data) })
}

/// Writes a SASL exchange payload, preserving nil-versus-empty.
pub(crate) fn write_sasl_data<W: Write>(
    buf: &mut W,
    data: Option<&[u8]>,
) -> Result<(), std::io::Error> {
    write_presence(buf, data.is_none())?;
    write_opaque(buf, data.unwrap_or_default())
}

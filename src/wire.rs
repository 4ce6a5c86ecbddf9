//! Codec primitives for the protocol's value vocabulary.
//!
//! Everything on the wire is big-endian. Variable-length values carry a
//! `u32` length prefix with no fill bytes; optional values carry a `u32`
//! presence flag that must be 0 or 1. Decoders take the per-field protocol
//! maximum and fail *before* slicing or allocating when the prefix exceeds
//! it.

use std::io::{Cursor, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    limits::{REMOTE_STRING_MAX, UUID_LEN},
    Error,
};

/// Returns a subslice of `len` bytes from `c` without copying if it is safe
/// to do so.
pub(crate) fn read_slice_bytes<'a>(c: &mut Cursor<&'a [u8]>, len: u32) -> Result<&'a [u8], Error> {
    let data = *c.get_ref();
    let start = c.position() as usize;
    let end = start + len as usize;

    // Validate the subslice is within the data buffer
    if end > data.len() {
        return Err(Error::InvalidLength);
    }

    c.set_position(end as u64);
    Ok(&data[start..end])
}

/// Reads a length-prefixed byte array bounded by the protocol constant
/// named `limit` with value `max`.
///
/// Returns [`Error::BoundExceeded`] without touching the payload when the
/// length prefix exceeds `max`.
pub(crate) fn read_opaque<'a>(
    c: &mut Cursor<&'a [u8]>,
    max: u32,
    field: &'static str,
    limit: &'static str,
) -> Result<&'a [u8], Error> {
    let len = c.read_u32::<BigEndian>()?;
    if len > max {
        return Err(Error::BoundExceeded { field, limit });
    }

    read_slice_bytes(c, len)
}

/// Writes a length-prefixed byte array.
pub(crate) fn write_opaque<W: Write>(buf: &mut W, data: &[u8]) -> Result<(), std::io::Error> {
    buf.write_u32::<BigEndian>(data.len() as u32)?;
    buf.write_all(data)
}

/// Reads a length-prefixed UTF-8 string bounded by `REMOTE_STRING_MAX`.
pub(crate) fn read_string<'a>(c: &mut Cursor<&'a [u8]>) -> Result<&'a str, Error> {
    read_bounded_string(c, REMOTE_STRING_MAX, "string", "REMOTE_STRING_MAX")
}

/// Reads a length-prefixed UTF-8 string with an explicit bound.
pub(crate) fn read_bounded_string<'a>(
    c: &mut Cursor<&'a [u8]>,
    max: u32,
    field: &'static str,
    limit: &'static str,
) -> Result<&'a str, Error> {
    let raw = read_opaque(c, max, field, limit)?;
    Ok(std::str::from_utf8(raw)?)
}

/// Writes a length-prefixed string.
pub(crate) fn write_string<W: Write>(buf: &mut W, s: &str) -> Result<(), std::io::Error> {
    write_opaque(buf, s.as_bytes())
}

/// Reads the presence flag of an optional value.
pub(crate) fn read_presence(c: &mut Cursor<&[u8]>) -> Result<bool, Error> {
    match c.read_u32::<BigEndian>()? {
        0 => Ok(false),
        1 => Ok(true),
        v => Err(Error::InvalidBool(v)),
    }
}

/// Writes the presence flag of an optional value.
pub(crate) fn write_presence<W: Write>(buf: &mut W, present: bool) -> Result<(), std::io::Error> {
    buf.write_u32::<BigEndian>(u32::from(present))
}

/// Reads an optional string: a presence flag followed by the string when
/// present.
///
/// `None` and `Some("")` are distinct wire forms and both round-trip.
pub(crate) fn read_opt_string<'a>(c: &mut Cursor<&'a [u8]>) -> Result<Option<&'a str>, Error> {
    if read_presence(c)? {
        Ok(Some(read_string(c)?))
    } else {
        Ok(None)
    }
}

/// Writes an optional string.
pub(crate) fn write_opt_string<W: Write>(
    buf: &mut W,
    s: Option<&str>,
) -> Result<(), std::io::Error> {
    write_presence(buf, s.is_some())?;
    if let Some(s) = s {
        write_string(buf, s)?;
    }
    Ok(())
}

/// Reads the element count of a variable-length array, checked against the
/// protocol constant named `limit` before the caller allocates anything
/// sized by it.
pub(crate) fn read_array_len(
    c: &mut Cursor<&[u8]>,
    max: u32,
    field: &'static str,
    limit: &'static str,
) -> Result<u32, Error> {
    let len = c.read_u32::<BigEndian>()?;
    if len > max {
        return Err(Error::BoundExceeded { field, limit });
    }

    Ok(len)
}

/// Reads a raw fixed-length UUID.
pub(crate) fn read_uuid(c: &mut Cursor<&[u8]>) -> Result<[u8; UUID_LEN], Error> {
    let raw = read_slice_bytes(c, UUID_LEN as u32)?;
    let mut uuid = [0; UUID_LEN];
    uuid.copy_from_slice(raw);
    Ok(uuid)
}
